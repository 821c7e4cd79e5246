//! # AMM Math - StableSwap Invariant Engine
//!
//! ## Purpose
//!
//! Exact integer mathematics for a two-asset StableSwap pool: the invariant `D`, the
//! balance solver `get_y`, fee-adjusted swap quoting, and the reserve-ratio checks that
//! guard liquidity changes. All amounts are raw token units held in a 256-bit unsigned
//! integer so products of 18-decimal reserves never overflow.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Pool reserves, amplification coefficient, fee tier
//! - **Output Destinations**: The position pool engine, quoting views, simulators
//! - **Precision**: Native 18-decimal token units, no floating point anywhere
//!
//! ## Architecture Role
//!
//! ```text
//! Pool Reserves → [StableSwapMath] → SwapQuote (fee, net input, output)
//!       ↓                 ↓
//! Deposit Ratio → [ReservePricing] → deviation verdict / proportional amounts / rate
//! ```
//!
//! The functions here are pure: identical inputs always produce identical outputs and
//! nothing is mutated.

pub mod error;
pub mod pool_traits;
pub mod pricing;
pub mod stableswap;
pub mod u256;

pub use error::{MathError, MathResult};
pub use pool_traits::{AmmPool, PoolType, StableSwapState};
pub use pricing::{ReservePricing, PERMILLE_DENOMINATOR};
pub use stableswap::{StableSwapMath, SwapQuote, BPS_DENOMINATOR};
pub use u256::{abs_diff, mul_div, mul_div_up, to_decimal, units, U256, WAD};

/// Common types for rate views
pub use rust_decimal::Decimal;
