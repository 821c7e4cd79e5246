//! Pool trait definitions for a unified quoting interface

use crate::{MathResult, ReservePricing, StableSwapMath, SwapQuote, U256};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Pool type identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PoolType {
    StableSwap,
}

/// Unified quoting interface over a two-asset pool snapshot
pub trait AmmPool {
    /// Quote the output of an exact-input swap
    fn quote(&self, amount_in: U256, zero_for_one: bool) -> MathResult<SwapQuote>;

    /// Current reserves `(reserve0, reserve1)`
    fn get_liquidity(&self) -> (U256, U256);

    /// Swap fee in basis points
    fn get_fee_bps(&self) -> u16;

    /// Reserve rate `reserve1 / reserve0`
    fn rate(&self) -> MathResult<Decimal> {
        let (reserve0, reserve1) = self.get_liquidity();
        ReservePricing::rate(reserve0, reserve1)
    }

    fn pool_type(&self) -> PoolType;
}

/// Reserves and curve parameters of a StableSwap pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StableSwapState {
    pub reserve0: U256,
    pub reserve1: U256,
    pub amplification: u64,
    pub fee_bps: u16, // Fee in basis points (30 = 0.3%)
}

impl StableSwapState {
    /// Current invariant `D`
    pub fn invariant(&self) -> MathResult<U256> {
        StableSwapMath::calculate_d(self.reserve0, self.reserve1, self.amplification)
    }
}

impl AmmPool for StableSwapState {
    fn quote(&self, amount_in: U256, zero_for_one: bool) -> MathResult<SwapQuote> {
        StableSwapMath::calculate_swap_output(
            self.reserve0,
            self.reserve1,
            amount_in,
            zero_for_one,
            self.amplification,
            self.fee_bps,
        )
    }

    fn get_liquidity(&self) -> (U256, U256) {
        (self.reserve0, self.reserve1)
    }

    fn get_fee_bps(&self) -> u16 {
        self.fee_bps
    }

    fn pool_type(&self) -> PoolType {
        PoolType::StableSwap
    }
}
