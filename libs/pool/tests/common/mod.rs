//! Shared fixture: one pool over two in-memory 18-decimal tokens, a manual clock, and
//! a ledger that already authorizes the pool.

#![allow(dead_code)]

use amm_math::{units, U256};
use pool_config::PoolConfig;
use position_pool::{
    AccessController, AccountId, FungibleToken, InMemoryToken, LiquidityPool, ManualClock,
    PoolDeployment, PositionId, PositionLedger, SharedAccess, SharedLedger,
};
use std::sync::Arc;

pub const START: u64 = 1_700_000_000;
pub const TWO_DAYS: u64 = 2 * 24 * 60 * 60;

pub fn admin() -> AccountId {
    AccountId::from_low_u64(1)
}

pub fn alice() -> AccountId {
    AccountId::from_low_u64(2)
}

pub fn bob() -> AccountId {
    AccountId::from_low_u64(3)
}

pub fn carol() -> AccountId {
    AccountId::from_low_u64(4)
}

pub fn pool_address() -> AccountId {
    AccountId::from_low_u64(0x100)
}

/// Whole tokens in 18-decimal units
pub fn tokens(whole: u64) -> U256 {
    units(whole, 18).unwrap()
}

pub struct Harness {
    pub pool: LiquidityPool,
    pub token0: Arc<InMemoryToken>,
    pub token1: Arc<InMemoryToken>,
    pub access: SharedAccess,
    pub ledger: SharedLedger,
    pub clock: ManualClock,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(PoolConfig::default())
    }

    pub fn with_config(config: PoolConfig) -> Self {
        let access = AccessController::new(admin()).shared();
        let ledger = PositionLedger::new(access.clone()).shared();
        ledger
            .write()
            .set_pool_authorization(admin(), pool_address(), true)
            .unwrap();

        let token0 = InMemoryToken::new(AccountId::from_low_u64(0xA0), "USDA", 18).shared();
        let token1 = InMemoryToken::new(AccountId::from_low_u64(0xB0), "USDB", 18).shared();
        let clock = ManualClock::new(START);

        let pool = LiquidityPool::new(
            PoolDeployment {
                address: pool_address(),
                token0: token0.clone(),
                token1: token1.clone(),
                access: access.clone(),
                ledger: ledger.clone(),
                clock: Arc::new(clock.clone()),
            },
            &config,
        )
        .unwrap();

        Self {
            pool,
            token0,
            token1,
            access,
            ledger,
            clock,
        }
    }

    /// Mint `whole` tokens of both kinds to `account` and approve the pool without limit
    pub fn fund(&self, account: AccountId, whole: u64) {
        for token in [&self.token0, &self.token1] {
            token.mint(account, tokens(whole)).unwrap();
            token.approve(account, pool_address(), U256::MAX).unwrap();
        }
    }

    /// A deadline ten minutes out
    pub fn deadline(&self) -> u64 {
        self.now() + 600
    }

    pub fn now(&self) -> u64 {
        use position_pool::Clock;
        self.clock.now()
    }

    /// Fund `account` and deposit `whole`/`whole` with no minimums
    pub fn seed(&mut self, account: AccountId, whole: u64) -> PositionId {
        self.fund(account, whole);
        let deadline = self.deadline();
        self.pool
            .add_liquidity(account, tokens(whole), tokens(whole), U256::zero(), U256::zero(), deadline)
            .unwrap()
    }

    pub fn balances_of(&self, account: AccountId) -> (U256, U256) {
        (self.token0.balance_of(account), self.token1.balance_of(account))
    }
}
