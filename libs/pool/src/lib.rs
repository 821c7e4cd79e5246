//! # Position Pool - StableSwap Liquidity with Non-Fungible Positions
//!
//! ## Purpose
//!
//! A two-asset StableSwap pool whose liquidity shares are individually owned positions
//! instead of fungible LP tokens. The pool guards every value-moving operation with
//! deadline, pause and role checks, prices swaps on the StableSwap invariant, accrues
//! swap fees per input side, and records each liquidity claim in a position ledger.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Liquidity providers, traders, admins (accounts passed explicitly)
//! - **Token Ledgers**: Any [`FungibleToken`] implementation; [`InMemoryToken`] in-process
//! - **Output Destinations**: Structured event journals on the pool, ledger and access
//!   controller, drained by the embedding service
//! - **Configuration**: [`pool_config::PoolConfig`] supplies the deployment parameters
//!
//! ## Architecture Role
//!
//! ```text
//! caller → [LiquidityPool] ──guards──→ [AccessController] (admin calls)
//!               │  │
//!               │  └──invariant math──→ amm_math::StableSwapMath
//!               │
//!               ├──settlement──→ FungibleToken × 2
//!               └──mint/update/burn──→ [PositionLedger]
//! ```
//!
//! The access controller and ledger are shared handles, so several pools (for example
//! an old and an upgraded deployment) can point at the same ones. Operations are
//! transaction-serial: each one fully commits or leaves every component as it found it.
//!
//! ## Example
//!
//! ```rust
//! use position_pool::{
//!     AccessController, AccountId, FungibleToken, InMemoryToken, LiquidityPool, ManualClock,
//!     PoolDeployment, PositionLedger,
//! };
//! use amm_math::{units, U256};
//! use pool_config::PoolConfig;
//! use std::sync::Arc;
//!
//! let admin = AccountId::from_low_u64(1);
//! let alice = AccountId::from_low_u64(2);
//! let pool_address = AccountId::from_low_u64(0x100);
//!
//! let access = AccessController::new(admin).shared();
//! let ledger = PositionLedger::new(access.clone()).shared();
//! ledger.write().set_pool_authorization(admin, pool_address, true).unwrap();
//!
//! let usda = InMemoryToken::new(AccountId::from_low_u64(0xA0), "USDA", 18).shared();
//! let usdb = InMemoryToken::new(AccountId::from_low_u64(0xB0), "USDB", 18).shared();
//! let clock = ManualClock::new(1_700_000_000);
//!
//! let mut pool = LiquidityPool::new(
//!     PoolDeployment {
//!         address: pool_address,
//!         token0: usda.clone(),
//!         token1: usdb.clone(),
//!         access,
//!         ledger,
//!         clock: Arc::new(clock.clone()),
//!     },
//!     &PoolConfig::default(),
//! )
//! .unwrap();
//!
//! let amount = units(1_000, 18).unwrap();
//! for token in [&usda, &usdb] {
//!     token.mint(alice, amount).unwrap();
//!     token.approve(alice, pool_address, U256::MAX).unwrap();
//! }
//!
//! let deadline = 1_700_000_600;
//! let id = pool
//!     .add_liquidity(alice, amount, amount, U256::zero(), U256::zero(), deadline)
//!     .unwrap();
//! assert_eq!(pool.get_position_info(id).unwrap().owner, alice);
//! assert_eq!(pool.get_balances(), (amount, amount));
//! ```

pub mod access;
pub mod clock;
pub mod error;
pub mod events;
pub mod ledger;
pub mod pool;
pub mod state;
pub mod token;
pub mod types;

pub use access::{AccessController, AccessError, Role, SharedAccess};
pub use clock::{Clock, ManualClock, SharedClock, SystemClock};
pub use error::{PoolError, PoolResult};
pub use events::{AccessEvent, LedgerEvent, PoolEvent};
pub use ledger::{LedgerCheckpoint, LedgerError, LedgerResult, Position, PositionLedger, SharedLedger};
pub use pool::{LiquidityPool, PoolDeployment};
pub use state::PoolState;
pub use token::{FungibleToken, InMemoryToken, SharedToken, TokenError};
pub use types::{AccountId, PositionId, TokenId};
