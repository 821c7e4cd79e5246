//! Error types for invariant and fixed-point arithmetic
//!
//! Every fallible calculation in this crate returns [`MathError`]. None of these are
//! retried internally; callers surface them as whole-operation aborts.

use thiserror::Error;

/// Errors raised by the StableSwap solver and the 256-bit helpers
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MathError {
    /// An intermediate product or sum exceeded 256 bits
    #[error("Arithmetic overflow in {context}")]
    Overflow { context: &'static str },

    /// A subtraction would have gone below zero
    #[error("Arithmetic underflow in {context}")]
    Underflow { context: &'static str },

    /// Division by a zero denominator
    #[error("Division by zero in {context}")]
    DivisionByZero { context: &'static str },

    /// Newton iteration did not settle within the iteration budget
    #[error("{solver} did not converge within {iterations} iterations")]
    NonConvergence {
        solver: &'static str,
        iterations: u32,
    },

    /// One side of the pool is empty so the invariant is undefined
    #[error("Reserves must be non-zero on both sides")]
    EmptyReserves,

    /// Amplification coefficient must be positive
    #[error("Amplification coefficient must be positive")]
    ZeroAmplification,

    /// Value does not fit the requested representation
    #[error("Value {value} cannot be represented as {target}")]
    Unrepresentable { value: String, target: &'static str },
}

impl MathError {
    pub(crate) fn overflow(context: &'static str) -> Self {
        MathError::Overflow { context }
    }

    pub(crate) fn underflow(context: &'static str) -> Self {
        MathError::Underflow { context }
    }

    pub(crate) fn div_zero(context: &'static str) -> Self {
        MathError::DivisionByZero { context }
    }
}

pub type MathResult<T> = Result<T, MathError>;
