//! Fungible token capability consumed by the pool
//!
//! The pool never owns token ledgers; it moves value through [`FungibleToken`] with the
//! calling account passed explicitly. Each method mirrors the usual fungible-token
//! surface. `check_transfer`/`check_transfer_from` are dry runs the pool uses to reject
//! an operation before it changes any state.
//!
//! [`InMemoryToken`] is a complete in-process ledger for tests and simulation.

use amm_math::U256;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::types::{AccountId, TokenId};

/// Reasons a token movement is refused
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("{account} holds {available} but {needed} is required")]
    InsufficientBalance {
        account: AccountId,
        needed: U256,
        available: U256,
    },

    #[error("{spender} may move {available} of {owner}'s balance but {needed} is required")]
    InsufficientAllowance {
        owner: AccountId,
        spender: AccountId,
        needed: U256,
        available: U256,
    },

    #[error("Transfer to the zero address")]
    InvalidRecipient,

    #[error("Account {0} is frozen")]
    Frozen(AccountId),

    #[error("Balance overflow for {0}")]
    Overflow(AccountId),

    #[error("Injected transfer fault")]
    InjectedFault,
}

/// Balance ledger of a single fungible token
pub trait FungibleToken: Send + Sync {
    fn id(&self) -> TokenId;

    fn decimals(&self) -> u8;

    fn balance_of(&self, account: AccountId) -> U256;

    fn allowance(&self, owner: AccountId, spender: AccountId) -> U256;

    fn approve(&self, caller: AccountId, spender: AccountId, amount: U256) -> Result<(), TokenError>;

    /// Move `amount` from `caller` to `to`
    fn transfer(&self, caller: AccountId, to: AccountId, amount: U256) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to` against the allowance granted to `spender`
    fn transfer_from(
        &self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: U256,
    ) -> Result<(), TokenError>;

    /// Whether `transfer` would succeed right now, without moving anything
    fn check_transfer(&self, from: AccountId, to: AccountId, amount: U256) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::InvalidRecipient);
        }
        let available = self.balance_of(from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                account: from,
                needed: amount,
                available,
            });
        }
        Ok(())
    }

    /// Whether `transfer_from` would succeed right now, without moving anything
    fn check_transfer_from(
        &self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: U256,
    ) -> Result<(), TokenError> {
        let available = self.allowance(from, spender);
        if available < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: from,
                spender,
                needed: amount,
                available,
            });
        }
        self.check_transfer(from, to, amount)
    }
}

/// Shared token handle
pub type SharedToken = Arc<dyn FungibleToken>;

#[derive(Debug, Default)]
struct TokenBook {
    balances: HashMap<AccountId, U256>,
    allowances: HashMap<(AccountId, AccountId), U256>,
    frozen: HashSet<AccountId>,
    total_supply: U256,
    // Counts down to an injected failure of a later transfer
    fail_in: Option<usize>,
}

impl TokenBook {
    fn balance(&self, account: &AccountId) -> U256 {
        self.balances.get(account).copied().unwrap_or_default()
    }

    fn check_move(&self, from: AccountId, to: AccountId, amount: U256) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::InvalidRecipient);
        }
        if let Some(account) = [from, to].into_iter().find(|a| self.frozen.contains(a)) {
            return Err(TokenError::Frozen(account));
        }
        let available = self.balance(&from);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                account: from,
                needed: amount,
                available,
            });
        }
        if from != to && self.balance(&to).checked_add(amount).is_none() {
            return Err(TokenError::Overflow(to));
        }
        Ok(())
    }

    fn take_fault(&mut self) -> Result<(), TokenError> {
        match self.fail_in {
            Some(remaining) if remaining <= 1 => {
                self.fail_in = None;
                Err(TokenError::InjectedFault)
            }
            Some(remaining) => {
                self.fail_in = Some(remaining - 1);
                Ok(())
            }
            None => Ok(()),
        }
    }

    fn move_balance(&mut self, from: AccountId, to: AccountId, amount: U256) -> Result<(), TokenError> {
        self.take_fault()?;
        self.check_move(from, to, amount)?;
        if from == to {
            return Ok(());
        }
        let from_balance = self.balance(&from);
        let to_balance = self.balance(&to);
        self.balances.insert(from, from_balance - amount);
        self.balances.insert(to, to_balance + amount);
        Ok(())
    }
}

/// In-process token ledger
#[derive(Debug)]
pub struct InMemoryToken {
    id: TokenId,
    symbol: String,
    decimals: u8,
    book: RwLock<TokenBook>,
}

impl InMemoryToken {
    pub fn new(id: TokenId, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            id,
            symbol: symbol.into(),
            decimals,
            book: RwLock::new(TokenBook::default()),
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn total_supply(&self) -> U256 {
        self.book.read().total_supply
    }

    /// Create `amount` new tokens for `to`
    pub fn mint(&self, to: AccountId, amount: U256) -> Result<(), TokenError> {
        if to.is_zero() {
            return Err(TokenError::InvalidRecipient);
        }
        let mut book = self.book.write();
        let supply = book
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow(to))?;
        let balance = book.balance(&to) + amount;
        book.total_supply = supply;
        book.balances.insert(to, balance);
        debug!(token = %self.symbol, %to, %amount, "minted");
        Ok(())
    }

    /// Refuse every movement into or out of `account`
    pub fn freeze(&self, account: AccountId) {
        self.book.write().frozen.insert(account);
    }

    pub fn unfreeze(&self, account: AccountId) {
        self.book.write().frozen.remove(&account);
    }

    /// Make the `n`-th upcoming transfer fail once (1 = the next one)
    ///
    /// Dry-run checks are unaffected, which lets callers exercise their recovery paths.
    pub fn fail_nth_transfer(&self, n: usize) {
        self.book.write().fail_in = Some(n.max(1));
    }
}

impl FungibleToken for InMemoryToken {
    fn id(&self) -> TokenId {
        self.id
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn balance_of(&self, account: AccountId) -> U256 {
        self.book.read().balance(&account)
    }

    fn allowance(&self, owner: AccountId, spender: AccountId) -> U256 {
        self.book
            .read()
            .allowances
            .get(&(owner, spender))
            .copied()
            .unwrap_or_default()
    }

    fn approve(&self, caller: AccountId, spender: AccountId, amount: U256) -> Result<(), TokenError> {
        if spender.is_zero() {
            return Err(TokenError::InvalidRecipient);
        }
        self.book.write().allowances.insert((caller, spender), amount);
        Ok(())
    }

    fn transfer(&self, caller: AccountId, to: AccountId, amount: U256) -> Result<(), TokenError> {
        self.book.write().move_balance(caller, to, amount)?;
        debug!(token = %self.symbol, from = %caller, %to, %amount, "transfer");
        Ok(())
    }

    fn transfer_from(
        &self,
        spender: AccountId,
        from: AccountId,
        to: AccountId,
        amount: U256,
    ) -> Result<(), TokenError> {
        let mut book = self.book.write();
        let available = book.allowances.get(&(from, spender)).copied().unwrap_or_default();
        if available < amount {
            return Err(TokenError::InsufficientAllowance {
                owner: from,
                spender,
                needed: amount,
                available,
            });
        }
        book.move_balance(from, to, amount)?;
        // Unlimited approvals are never drawn down
        if available != U256::MAX {
            book.allowances.insert((from, spender), available - amount);
        }
        debug!(token = %self.symbol, %spender, %from, %to, %amount, "transfer_from");
        Ok(())
    }

    fn check_transfer(&self, from: AccountId, to: AccountId, amount: U256) -> Result<(), TokenError> {
        self.book.read().check_move(from, to, amount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::from_low_u64(1)
    }

    fn bob() -> AccountId {
        AccountId::from_low_u64(2)
    }

    fn token() -> InMemoryToken {
        let token = InMemoryToken::new(AccountId::from_low_u64(0xA0), "USDA", 18);
        token.mint(alice(), U256::from(1_000u64)).unwrap();
        token
    }

    #[test]
    fn test_transfer_moves_balance() {
        let token = token();
        token.transfer(alice(), bob(), U256::from(400u64)).unwrap();
        assert_eq!(token.balance_of(alice()), U256::from(600u64));
        assert_eq!(token.balance_of(bob()), U256::from(400u64));
        assert_eq!(token.total_supply(), U256::from(1_000u64));
    }

    #[test]
    fn test_transfer_rejects_overdraft_and_zero_address() {
        let token = token();
        assert!(matches!(
            token.transfer(alice(), bob(), U256::from(1_001u64)),
            Err(TokenError::InsufficientBalance { .. })
        ));
        assert_eq!(
            token.transfer(alice(), AccountId::ZERO, U256::one()),
            Err(TokenError::InvalidRecipient)
        );
    }

    #[test]
    fn test_transfer_from_spends_allowance() {
        let token = token();
        token.approve(alice(), bob(), U256::from(300u64)).unwrap();
        token
            .transfer_from(bob(), alice(), bob(), U256::from(200u64))
            .unwrap();
        assert_eq!(token.allowance(alice(), bob()), U256::from(100u64));
        assert!(matches!(
            token.transfer_from(bob(), alice(), bob(), U256::from(200u64)),
            Err(TokenError::InsufficientAllowance { .. })
        ));
    }

    #[test]
    fn test_unlimited_allowance_is_not_drawn_down() {
        let token = token();
        token.approve(alice(), bob(), U256::MAX).unwrap();
        token.transfer_from(bob(), alice(), bob(), U256::from(10u64)).unwrap();
        assert_eq!(token.allowance(alice(), bob()), U256::MAX);
    }

    #[test]
    fn test_checks_match_execution() {
        let token = token();
        assert!(token
            .check_transfer_from(bob(), alice(), bob(), U256::one())
            .is_err());
        token.approve(alice(), bob(), U256::from(5u64)).unwrap();
        assert!(token
            .check_transfer_from(bob(), alice(), bob(), U256::from(5u64))
            .is_ok());

        token.freeze(bob());
        assert_eq!(
            token.check_transfer(alice(), bob(), U256::one()),
            Err(TokenError::Frozen(bob()))
        );
        token.unfreeze(bob());
        assert!(token.check_transfer(alice(), bob(), U256::one()).is_ok());
    }

    #[test]
    fn test_injected_fault_fires_once() {
        let token = token();
        token.fail_nth_transfer(2);
        token.transfer(alice(), bob(), U256::one()).unwrap();
        assert_eq!(
            token.transfer(alice(), bob(), U256::one()),
            Err(TokenError::InjectedFault)
        );
        token.transfer(alice(), bob(), U256::one()).unwrap();
        assert_eq!(token.balance_of(bob()), U256::from(2u64));
    }
}
