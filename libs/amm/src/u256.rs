//! 256-bit unsigned fixed-point amounts
//!
//! Token amounts, reserves and fee counters are raw integer units of a token with a
//! configured number of decimals (18 by default). Intermediate products in the invariant
//! solver need the full 256 bits, so amounts are stored in that width end to end.

use crate::error::{MathError, MathResult};
use rust_decimal::Decimal;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use uint::construct_uint;

construct_uint! {
    /// Unsigned 256-bit integer used for every amount, reserve and fee counter.
    pub struct U256(4);
}

/// 1e18, the scale of an 18-decimal token and of fixed-point rates
pub const WAD: u128 = 1_000_000_000_000_000_000;

/// Largest decimals count a token may declare
pub const MAX_DECIMALS: u8 = 36;

/// `10^decimals` as a U256
pub fn scale(decimals: u8) -> MathResult<U256> {
    if decimals > MAX_DECIMALS {
        return Err(MathError::Unrepresentable {
            value: decimals.to_string(),
            target: "token decimals",
        });
    }
    Ok(U256::from(10u8).pow(U256::from(decimals)))
}

/// Convert whole tokens into raw units: `whole * 10^decimals`
///
/// ```
/// use amm_math::{units, U256};
/// assert_eq!(units(5, 2).unwrap(), U256::from(500u64));
/// ```
pub fn units(whole: u64, decimals: u8) -> MathResult<U256> {
    U256::from(whole)
        .checked_mul(scale(decimals)?)
        .ok_or(MathError::overflow("units"))
}

/// Render raw units as a human-readable decimal number of tokens
pub fn to_decimal(amount: U256, decimals: u8) -> MathResult<Decimal> {
    if amount > U256::from(i128::MAX as u128) {
        return Err(MathError::Unrepresentable {
            value: amount.to_string(),
            target: "Decimal",
        });
    }
    let raw = amount.low_u128() as i128;
    Decimal::try_from_i128_with_scale(raw, decimals as u32)
        .map(|d| d.normalize())
        .map_err(|_| MathError::Unrepresentable {
            value: amount.to_string(),
            target: "Decimal",
        })
}

/// Absolute difference of two values
pub fn abs_diff(a: U256, b: U256) -> U256 {
    if a >= b {
        a - b
    } else {
        b - a
    }
}

/// `a * b / denominator`, rounding down
pub fn mul_div(a: U256, b: U256, denominator: U256, context: &'static str) -> MathResult<U256> {
    if denominator.is_zero() {
        return Err(MathError::div_zero(context));
    }
    a.checked_mul(b)
        .map(|p| p / denominator)
        .ok_or(MathError::overflow(context))
}

/// `a * b / denominator`, rounding up
pub fn mul_div_up(a: U256, b: U256, denominator: U256, context: &'static str) -> MathResult<U256> {
    if denominator.is_zero() {
        return Err(MathError::div_zero(context));
    }
    let product = a.checked_mul(b).ok_or(MathError::overflow(context))?;
    let quotient = product / denominator;
    if (product % denominator).is_zero() {
        Ok(quotient)
    } else {
        quotient
            .checked_add(U256::one())
            .ok_or(MathError::overflow(context))
    }
}

// Amounts cross the wire (events, snapshots) as decimal strings so JSON consumers
// never lose precision.
impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct U256Visitor;

        impl<'de> Visitor<'de> for U256Visitor {
            type Value = U256;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a decimal string or unsigned integer")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<U256, E> {
                Ok(U256::from(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<U256, E> {
                U256::from_dec_str(v).map_err(|e| E::custom(format!("invalid U256 '{}': {:?}", v, e)))
            }
        }

        deserializer.deserialize_any(U256Visitor)
    }
}
