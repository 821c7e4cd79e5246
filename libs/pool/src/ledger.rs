//! Position Ledger
//!
//! Ownership-indexed store of liquidity positions. Positions live in a flat arena
//! indexed by id (`id - 1`), with a secondary owner → ids index so enumeration by owner
//! never scans the arena. Ids are handed out in increasing order starting at 1. A burnt
//! id leaves an empty slot behind and is never reissued.
//!
//! Only pools the admin has authorized may mint, update or burn. Ownership can be
//! transferred like any non-fungible token: per-id approvals, operator approvals and
//! `transfer_from`. Transfers touch only the owner index and the position's `owner`
//! field; amounts never change hands.

use amm_math::U256;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::access::SharedAccess;
use crate::events::LedgerEvent;
use crate::types::{AccountId, PositionId, TokenId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Pool {0} is not authorized to manage positions")]
    NotAuthorizedPool(AccountId),

    #[error("Position {0} does not exist")]
    PositionNotFound(PositionId),

    #[error("{caller} is neither owner nor approved for position {token_id}")]
    NotOwnerOrApproved {
        caller: AccountId,
        token_id: PositionId,
    },

    #[error("Invalid recipient {0}")]
    InvalidRecipient(AccountId),

    #[error("Caller {0} is not an admin")]
    CallerNotAdmin(AccountId),
}

impl LedgerError {
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::NotAuthorizedPool(_) => "NotAuthorizedPool",
            LedgerError::PositionNotFound(_) => "PositionNotFound",
            LedgerError::NotOwnerOrApproved { .. } => "NotOwnerOrApproved",
            LedgerError::InvalidRecipient(_) => "InvalidRecipient",
            LedgerError::CallerNotAdmin(_) => "CallerNotAdmin",
        }
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// A single liquidity claim against a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: PositionId,
    pub owner: AccountId,
    pub token0: TokenId,
    pub token1: TokenId,
    pub amount0: U256,
    pub amount1: U256,
    /// Unix seconds at mint
    pub created_at: u64,
}

/// Ledger state captured before a pool operation so a failed operation can be undone
#[derive(Debug, Clone)]
pub struct LedgerCheckpoint {
    len: usize,
    touched: Option<TouchedEntry>,
    events: usize,
}

#[derive(Debug, Clone)]
struct TouchedEntry {
    id: PositionId,
    position: Option<Position>,
    approval: Option<AccountId>,
}

/// Shared handle to a position ledger
pub type SharedLedger = Arc<RwLock<PositionLedger>>;

#[derive(Debug)]
pub struct PositionLedger {
    positions: Vec<Option<Position>>,
    owners: HashMap<AccountId, BTreeSet<PositionId>>,
    token_approvals: HashMap<PositionId, AccountId>,
    operator_approvals: HashSet<(AccountId, AccountId)>,
    authorized_pools: HashSet<AccountId>,
    base_uri: String,
    access: SharedAccess,
    events: Vec<LedgerEvent>,
}

impl PositionLedger {
    pub fn new(access: SharedAccess) -> Self {
        Self {
            positions: Vec::new(),
            owners: HashMap::new(),
            token_approvals: HashMap::new(),
            operator_approvals: HashSet::new(),
            authorized_pools: HashSet::new(),
            base_uri: String::new(),
            access,
            events: Vec::new(),
        }
    }

    pub fn shared(self) -> SharedLedger {
        Arc::new(RwLock::new(self))
    }

    // ---------------------------------------------------------------------
    // Administration
    // ---------------------------------------------------------------------

    /// Allow or forbid `pool` to mint, update and burn positions
    pub fn set_pool_authorization(
        &mut self,
        caller: AccountId,
        pool: AccountId,
        authorized: bool,
    ) -> LedgerResult<()> {
        self.require_admin(caller)?;
        if authorized {
            self.authorized_pools.insert(pool);
        } else {
            self.authorized_pools.remove(&pool);
        }
        self.events
            .push(LedgerEvent::PoolAuthorizationSet { pool, authorized });
        info!(%pool, authorized, by = %caller, "Pool authorization updated");
        Ok(())
    }

    pub fn is_pool_authorized(&self, pool: AccountId) -> bool {
        self.authorized_pools.contains(&pool)
    }

    pub fn set_base_uri(&mut self, caller: AccountId, base_uri: impl Into<String>) -> LedgerResult<()> {
        self.require_admin(caller)?;
        self.base_uri = base_uri.into();
        self.events.push(LedgerEvent::BaseUriSet {
            base_uri: self.base_uri.clone(),
        });
        info!(base_uri = %self.base_uri, by = %caller, "Base URI updated");
        Ok(())
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    /// Metadata URI of a live position: base URI followed by the id, empty when no base
    /// URI is set
    pub fn token_uri(&self, token_id: PositionId) -> LedgerResult<String> {
        self.position(token_id)?;
        if self.base_uri.is_empty() {
            return Ok(String::new());
        }
        Ok(format!("{}{}", self.base_uri, token_id))
    }

    // ---------------------------------------------------------------------
    // Pool-only lifecycle
    // ---------------------------------------------------------------------

    /// Record a new position for `owner`
    pub fn mint(
        &mut self,
        pool: AccountId,
        owner: AccountId,
        pair: (TokenId, TokenId),
        amounts: (U256, U256),
        created_at: u64,
    ) -> LedgerResult<PositionId> {
        self.require_pool(pool)?;
        if owner.is_zero() {
            return Err(LedgerError::InvalidRecipient(owner));
        }

        let id = PositionId(self.positions.len() as u64 + 1);
        self.positions.push(Some(Position {
            id,
            owner,
            token0: pair.0,
            token1: pair.1,
            amount0: amounts.0,
            amount1: amounts.1,
            created_at,
        }));
        self.index(owner, id);
        self.events.push(LedgerEvent::PositionMinted {
            token_id: id,
            owner,
            pool,
        });
        debug!(token_id = %id, %owner, %pool, "Position minted");
        Ok(id)
    }

    /// Overwrite the amounts of a live position
    pub fn update_position(
        &mut self,
        pool: AccountId,
        token_id: PositionId,
        amount0: U256,
        amount1: U256,
    ) -> LedgerResult<()> {
        self.require_pool(pool)?;
        let position = self.position_mut(token_id)?;
        position.amount0 = amount0;
        position.amount1 = amount1;
        self.events.push(LedgerEvent::PositionUpdated {
            token_id,
            amount0,
            amount1,
        });
        debug!(%token_id, %amount0, %amount1, "Position updated");
        Ok(())
    }

    /// Retire a position, returning it as it was just before burning
    pub fn burn(&mut self, pool: AccountId, token_id: PositionId) -> LedgerResult<Position> {
        self.require_pool(pool)?;
        self.position(token_id)?;

        let slot = Self::slot(token_id).ok_or(LedgerError::PositionNotFound(token_id))?;
        let position = self.positions[slot]
            .take()
            .ok_or(LedgerError::PositionNotFound(token_id))?;
        self.unindex(position.owner, token_id);
        self.token_approvals.remove(&token_id);
        self.events.push(LedgerEvent::PositionBurned { token_id });
        debug!(%token_id, owner = %position.owner, "Position burned");
        Ok(position)
    }

    // ---------------------------------------------------------------------
    // Views
    // ---------------------------------------------------------------------

    pub fn get_position_info(&self, token_id: PositionId) -> LedgerResult<Position> {
        self.position(token_id).cloned()
    }

    pub fn owner_of(&self, token_id: PositionId) -> LedgerResult<AccountId> {
        self.position(token_id).map(|position| position.owner)
    }

    /// Ids held by `owner`, ascending
    pub fn tokens_of_owner(&self, owner: AccountId) -> Vec<PositionId> {
        self.owners
            .get(&owner)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn balance_of(&self, owner: AccountId) -> usize {
        self.owners.get(&owner).map_or(0, BTreeSet::len)
    }

    /// Number of live positions
    pub fn total_supply(&self) -> usize {
        self.owners.values().map(BTreeSet::len).sum()
    }

    // ---------------------------------------------------------------------
    // Transferable ownership
    // ---------------------------------------------------------------------

    /// Let `approved` transfer `token_id`; `AccountId::ZERO` clears the approval
    pub fn approve(&mut self, caller: AccountId, approved: AccountId, token_id: PositionId) -> LedgerResult<()> {
        let owner = self.owner_of(token_id)?;
        if approved == owner {
            return Err(LedgerError::InvalidRecipient(approved));
        }
        if caller != owner && !self.is_approved_for_all(owner, caller) {
            return Err(LedgerError::NotOwnerOrApproved { caller, token_id });
        }

        if approved.is_zero() {
            self.token_approvals.remove(&token_id);
        } else {
            self.token_approvals.insert(token_id, approved);
        }
        self.events.push(LedgerEvent::Approval {
            owner,
            approved,
            token_id,
        });
        Ok(())
    }

    pub fn get_approved(&self, token_id: PositionId) -> LedgerResult<Option<AccountId>> {
        self.position(token_id)?;
        Ok(self.token_approvals.get(&token_id).copied())
    }

    pub fn set_approval_for_all(&mut self, caller: AccountId, operator: AccountId, approved: bool) -> LedgerResult<()> {
        if operator == caller || operator.is_zero() {
            return Err(LedgerError::InvalidRecipient(operator));
        }
        if approved {
            self.operator_approvals.insert((caller, operator));
        } else {
            self.operator_approvals.remove(&(caller, operator));
        }
        self.events.push(LedgerEvent::ApprovalForAll {
            owner: caller,
            operator,
            approved,
        });
        Ok(())
    }

    pub fn is_approved_for_all(&self, owner: AccountId, operator: AccountId) -> bool {
        self.operator_approvals.contains(&(owner, operator))
    }

    pub fn is_approved_or_owner(&self, spender: AccountId, token_id: PositionId) -> LedgerResult<bool> {
        let owner = self.owner_of(token_id)?;
        Ok(spender == owner
            || self.token_approvals.get(&token_id) == Some(&spender)
            || self.is_approved_for_all(owner, spender))
    }

    /// Move `token_id` from `from` to `to`
    ///
    /// `caller` must be the owner, the approved account or an operator of the owner.
    /// Clears the per-id approval.
    pub fn transfer_from(
        &mut self,
        caller: AccountId,
        from: AccountId,
        to: AccountId,
        token_id: PositionId,
    ) -> LedgerResult<()> {
        let owner = self.owner_of(token_id)?;
        if owner != from || !self.is_approved_or_owner(caller, token_id)? {
            return Err(LedgerError::NotOwnerOrApproved { caller, token_id });
        }
        if to.is_zero() {
            return Err(LedgerError::InvalidRecipient(to));
        }

        self.token_approvals.remove(&token_id);
        self.unindex(from, token_id);
        self.index(to, token_id);
        self.position_mut(token_id)?.owner = to;
        self.events.push(LedgerEvent::Transfer { from, to, token_id });
        info!(%token_id, %from, %to, "Position transferred");
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Rollback support
    // ---------------------------------------------------------------------

    /// Capture what a pool operation on `touched` could change
    pub fn checkpoint(&self, touched: Option<PositionId>) -> LedgerCheckpoint {
        LedgerCheckpoint {
            len: self.positions.len(),
            touched: touched.map(|id| TouchedEntry {
                id,
                position: self.position(id).ok().cloned(),
                approval: self.token_approvals.get(&id).copied(),
            }),
            events: self.events.len(),
        }
    }

    /// Undo everything since `checkpoint` was taken
    pub fn restore(&mut self, checkpoint: LedgerCheckpoint) {
        while self.positions.len() > checkpoint.len {
            if let Some(Some(position)) = self.positions.pop() {
                self.unindex(position.owner, position.id);
                self.token_approvals.remove(&position.id);
            }
        }

        if let Some(entry) = checkpoint.touched {
            if let Some(slot) = Self::slot(entry.id).filter(|slot| *slot < self.positions.len()) {
                if let Some(current) = self.positions[slot].take() {
                    self.unindex(current.owner, current.id);
                }
                if let Some(prior) = &entry.position {
                    self.index(prior.owner, prior.id);
                }
                self.positions[slot] = entry.position;
                match entry.approval {
                    Some(approved) => self.token_approvals.insert(entry.id, approved),
                    None => self.token_approvals.remove(&entry.id),
                };
            }
        }

        self.events.truncate(checkpoint.events);
        warn!("Position ledger restored to checkpoint");
    }

    pub fn events(&self) -> &[LedgerEvent] {
        &self.events
    }

    /// Drain the event journal
    pub fn take_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    // ---------------------------------------------------------------------
    // Internals
    // ---------------------------------------------------------------------

    fn require_admin(&self, caller: AccountId) -> LedgerResult<()> {
        if self.access.read().is_admin(caller) {
            Ok(())
        } else {
            Err(LedgerError::CallerNotAdmin(caller))
        }
    }

    fn require_pool(&self, pool: AccountId) -> LedgerResult<()> {
        if self.is_pool_authorized(pool) {
            Ok(())
        } else {
            warn!(%pool, "Unauthorized pool attempted a position change");
            Err(LedgerError::NotAuthorizedPool(pool))
        }
    }

    fn slot(token_id: PositionId) -> Option<usize> {
        token_id.0.checked_sub(1).and_then(|slot| usize::try_from(slot).ok())
    }

    fn position(&self, token_id: PositionId) -> LedgerResult<&Position> {
        Self::slot(token_id)
            .and_then(|slot| self.positions.get(slot))
            .and_then(Option::as_ref)
            .ok_or(LedgerError::PositionNotFound(token_id))
    }

    fn position_mut(&mut self, token_id: PositionId) -> LedgerResult<&mut Position> {
        Self::slot(token_id)
            .and_then(|slot| self.positions.get_mut(slot))
            .and_then(Option::as_mut)
            .ok_or(LedgerError::PositionNotFound(token_id))
    }

    fn index(&mut self, owner: AccountId, token_id: PositionId) {
        self.owners.entry(owner).or_default().insert(token_id);
    }

    fn unindex(&mut self, owner: AccountId, token_id: PositionId) {
        if let Some(ids) = self.owners.get_mut(&owner) {
            ids.remove(&token_id);
            if ids.is_empty() {
                self.owners.remove(&owner);
            }
        }
    }
}
