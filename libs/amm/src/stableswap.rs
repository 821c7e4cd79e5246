//! StableSwap invariant math for a two-asset pool
//!
//! The invariant `D` for `n = 2` satisfies
//!
//! ```text
//! A·n^n·(x0 + x1) + D = A·n^n·D + D^(n+1) / (n^n·x0·x1)
//! ```
//!
//! `D` equals `x0 + x1` when the pool is balanced and falls towards `2·sqrt(x0·x1)` as
//! it becomes lopsided. Both solvers use Newton iteration on 256-bit integers and stop
//! once consecutive iterates differ by at most one unit.

use crate::error::{MathError, MathResult};
use crate::u256::{abs_diff, mul_div_up, U256};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Number of assets in the pool
const N_COINS: u64 = 2;

/// `n^n` for two assets
const N_POW_N: u64 = 4;

/// Newton iterations before giving up
pub const MAX_ITERATIONS: u32 = 255;

/// Basis-point denominator for swap fees (1 bp = 0.01%)
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Result of quoting a swap against a pair of balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapQuote {
    /// Gross input supplied by the trader
    pub amount_in: U256,
    /// Fee withheld from the input
    pub fee: U256,
    /// Input credited to the reserves (`amount_in - fee`)
    pub net_amount_in: U256,
    /// Output paid to the trader
    pub amount_out: U256,
}

/// StableSwap solver functions
pub struct StableSwapMath;

impl StableSwapMath {
    /// Compute the invariant `D` for the given reserves
    ///
    /// # Arguments
    /// * `x0`, `x1` - Pool balances in raw units
    /// * `amplification` - The `A` coefficient (positive)
    ///
    /// # Returns
    /// `D`, or zero for an empty pool
    pub fn calculate_d(x0: U256, x1: U256, amplification: u64) -> MathResult<U256> {
        if amplification == 0 {
            return Err(MathError::ZeroAmplification);
        }
        let sum = x0.checked_add(x1).ok_or(MathError::overflow("D: x0 + x1"))?;
        if sum.is_zero() {
            return Ok(U256::zero());
        }
        if x0.is_zero() || x1.is_zero() {
            return Err(MathError::EmptyReserves);
        }

        let n = U256::from(N_COINS);
        let ann = Self::ann(amplification)?;
        let ann_sum = ann.checked_mul(sum).ok_or(MathError::overflow("D: Ann·S"))?;
        let two_x0 = x0.checked_mul(n).ok_or(MathError::overflow("D: n·x0"))?;
        let two_x1 = x1.checked_mul(n).ok_or(MathError::overflow("D: n·x1"))?;

        let mut d = sum;
        for _ in 0..MAX_ITERATIONS {
            // D_P = D^3 / (n^n·x0·x1), accumulated one factor at a time
            let mut d_p = d;
            d_p = d_p.checked_mul(d).ok_or(MathError::overflow("D: D_P·D"))? / two_x0;
            d_p = d_p.checked_mul(d).ok_or(MathError::overflow("D: D_P·D"))? / two_x1;

            let d_prev = d;
            let numerator = ann_sum
                .checked_add(d_p.checked_mul(n).ok_or(MathError::overflow("D: n·D_P"))?)
                .and_then(|v| v.checked_mul(d))
                .ok_or(MathError::overflow("D: numerator"))?;
            let denominator = (ann - U256::one())
                .checked_mul(d)
                .and_then(|v| v.checked_add(d_p.checked_mul(n + U256::one())?))
                .ok_or(MathError::overflow("D: denominator"))?;
            if denominator.is_zero() {
                return Err(MathError::div_zero("D: denominator"));
            }
            d = numerator / denominator;

            if abs_diff(d, d_prev) <= U256::one() {
                return Ok(d);
            }
            // Starting from the constant-sum value the iterates only fall; a rise is
            // truncation noise in D_P, so the previous iterate is as close as it gets
            if d > d_prev {
                return Ok(d_prev);
            }
        }

        warn!(%x0, %x1, amplification, "invariant D failed to converge");
        Err(MathError::NonConvergence {
            solver: "calculate_d",
            iterations: MAX_ITERATIONS,
        })
    }

    /// Solve for the balance of the other asset given `D` and one balance
    ///
    /// Solves `y^2 + (x + D/Ann − D)·y = D^3 / (n^n·Ann·x)` by iterating
    /// `y ← (y^2 + c) / (2y + b − D)`.
    pub fn get_y(d: U256, x: U256, amplification: u64) -> MathResult<U256> {
        if amplification == 0 {
            return Err(MathError::ZeroAmplification);
        }
        if d.is_zero() {
            return Ok(U256::zero());
        }
        if x.is_zero() {
            return Err(MathError::EmptyReserves);
        }

        let n = U256::from(N_COINS);
        let ann = Self::ann(amplification)?;

        // c = D^3 / (n^n · x · Ann)
        let mut c = d;
        c = c
            .checked_mul(d)
            .ok_or(MathError::overflow("y: c·D"))?
            / x.checked_mul(n).ok_or(MathError::overflow("y: n·x"))?;
        c = c
            .checked_mul(d)
            .ok_or(MathError::overflow("y: c·D"))?
            / ann.checked_mul(n).ok_or(MathError::overflow("y: n·Ann"))?;
        let b = x
            .checked_add(d / ann)
            .ok_or(MathError::overflow("y: b"))?;

        let mut y = d;
        for _ in 0..MAX_ITERATIONS {
            let y_prev = y;
            let numerator = y
                .checked_mul(y)
                .and_then(|v| v.checked_add(c))
                .ok_or(MathError::overflow("y: numerator"))?;
            let denominator = y
                .checked_mul(n)
                .and_then(|v| v.checked_add(b))
                .ok_or(MathError::overflow("y: denominator"))?
                .checked_sub(d)
                .ok_or(MathError::underflow("y: 2y + b - D"))?;
            if denominator.is_zero() {
                return Err(MathError::div_zero("y: denominator"));
            }
            y = numerator / denominator;

            if abs_diff(y, y_prev) <= U256::one() {
                return Ok(y);
            }
        }

        warn!(%d, %x, amplification, "get_y failed to converge");
        Err(MathError::NonConvergence {
            solver: "get_y",
            iterations: MAX_ITERATIONS,
        })
    }

    /// Fee withheld from a swap input, rounded up so any non-zero rate charges at
    /// least one unit
    pub fn fee_on_input(amount_in: U256, fee_bps: u16) -> MathResult<U256> {
        if fee_bps == 0 {
            return Ok(U256::zero());
        }
        mul_div_up(
            amount_in,
            U256::from(fee_bps),
            U256::from(BPS_DENOMINATOR),
            "fee",
        )
    }

    /// Quote the output of swapping `amount_in` against `balance0`/`balance1`
    ///
    /// Pure and deterministic: the fee is taken from the input side, the net input is
    /// added to the input balance and the output balance is re-solved from `D`. One unit
    /// is held back from the output so rounding always favours the pool.
    ///
    /// # Arguments
    /// * `zero_for_one` - `true` sells token0 for token1
    pub fn calculate_swap_output(
        balance0: U256,
        balance1: U256,
        amount_in: U256,
        zero_for_one: bool,
        amplification: u64,
        fee_bps: u16,
    ) -> MathResult<SwapQuote> {
        if balance0.is_zero() || balance1.is_zero() {
            return Err(MathError::EmptyReserves);
        }

        let fee = Self::fee_on_input(amount_in, fee_bps)?;
        let net_amount_in = amount_in
            .checked_sub(fee)
            .ok_or(MathError::underflow("swap: amount_in - fee"))?;

        let (reserve_in, reserve_out) = if zero_for_one {
            (balance0, balance1)
        } else {
            (balance1, balance0)
        };

        let d = Self::calculate_d(balance0, balance1, amplification)?;
        let new_reserve_in = reserve_in
            .checked_add(net_amount_in)
            .ok_or(MathError::overflow("swap: reserve_in + net"))?;
        let new_reserve_out = Self::get_y(d, new_reserve_in, amplification)?;

        let amount_out = reserve_out
            .saturating_sub(new_reserve_out)
            .saturating_sub(U256::one());

        Ok(SwapQuote {
            amount_in,
            fee,
            net_amount_in,
            amount_out,
        })
    }

    /// `A · n^n`
    fn ann(amplification: u64) -> MathResult<U256> {
        U256::from(amplification)
            .checked_mul(U256::from(N_POW_N))
            .ok_or(MathError::overflow("Ann"))
    }
}
