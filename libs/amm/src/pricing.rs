//! Reserve-ratio pricing and the liquidity deviation guard
//!
//! Liquidity changes are checked against the current reserve ratio rather than the
//! invariant's marginal price: a deposit `(a0, a1)` is acceptable when
//! `a1/a0` is within `max_permille` of `r1/r0`. Everything is cross-multiplied so no
//! precision is lost to division.

use crate::error::{MathError, MathResult};
use crate::u256::{abs_diff, mul_div, U256, WAD};
use rust_decimal::Decimal;

/// Permille denominator for deviation limits (1 permille = 0.1%)
pub const PERMILLE_DENOMINATOR: u64 = 1_000;

/// Reserve-ratio helpers used by the liquidity guards and rate views
pub struct ReservePricing;

impl ReservePricing {
    /// Whether the deposit ratio `amount1/amount0` strays from `reserve1/reserve0` by
    /// more than `max_permille`
    ///
    /// An empty pool places no constraint on the first deposit.
    pub fn exceeds_deviation(
        amount0: U256,
        amount1: U256,
        reserve0: U256,
        reserve1: U256,
        max_permille: u16,
    ) -> MathResult<bool> {
        if reserve0.is_zero() && reserve1.is_zero() {
            return Ok(false);
        }

        // |a1/a0 - r1/r0| / (r1/r0) > max/1000
        //   <=> |a1·r0 - a0·r1| · 1000 > max · a0 · r1
        let lhs_a = amount1
            .checked_mul(reserve0)
            .ok_or(MathError::overflow("deviation: a1·r0"))?;
        let lhs_b = amount0
            .checked_mul(reserve1)
            .ok_or(MathError::overflow("deviation: a0·r1"))?;
        let lhs = abs_diff(lhs_a, lhs_b)
            .checked_mul(U256::from(PERMILLE_DENOMINATOR))
            .ok_or(MathError::overflow("deviation: lhs"))?;
        let rhs = lhs_b
            .checked_mul(U256::from(max_permille))
            .ok_or(MathError::overflow("deviation: rhs"))?;

        Ok(lhs > rhs)
    }

    /// Scale one side of a deposit down so it matches the reserve ratio exactly
    ///
    /// Returns the amounts the pool accepts. The side that is already at or below the
    /// ratio is kept whole; an empty pool accepts both sides as given.
    pub fn proportional_amounts(
        amount0: U256,
        amount1: U256,
        reserve0: U256,
        reserve1: U256,
    ) -> MathResult<(U256, U256)> {
        if reserve0.is_zero() && reserve1.is_zero() {
            return Ok((amount0, amount1));
        }
        if reserve0.is_zero() || reserve1.is_zero() {
            return Err(MathError::EmptyReserves);
        }

        let optimal1 = mul_div(amount0, reserve1, reserve0, "proportional: amount1")?;
        if optimal1 <= amount1 {
            return Ok((amount0, optimal1));
        }

        let optimal0 = mul_div(amount1, reserve0, reserve1, "proportional: amount0")?;
        Ok((optimal0.min(amount0), amount1))
    }

    /// Current reserve rate `reserve1 / reserve0`
    ///
    /// An empty pool has no rate and reports zero.
    pub fn rate(reserve0: U256, reserve1: U256) -> MathResult<Decimal> {
        if reserve0.is_zero() {
            return Ok(Decimal::ZERO);
        }
        let rate_wad = mul_div(reserve1, U256::from(WAD), reserve0, "rate")?;
        if rate_wad > U256::from(i128::MAX as u128) {
            return Err(MathError::Unrepresentable {
                value: rate_wad.to_string(),
                target: "Decimal rate",
            });
        }
        Decimal::try_from_i128_with_scale(rate_wad.low_u128() as i128, 18)
            .map(|d| d.normalize())
            .map_err(|_| MathError::Unrepresentable {
                value: rate_wad.to_string(),
                target: "Decimal rate",
            })
    }
}
