//! Error types for pool operations
//!
//! Every failure aborts the whole operation. [`PoolError::code`] gives the stable name
//! front ends map to user-facing messages.

use amm_math::{MathError, U256};
use thiserror::Error;

use crate::access::AccessError;
use crate::ledger::LedgerError;
use crate::token::TokenError;
use crate::types::{AccountId, PositionId};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Deadline {deadline} has passed (now {now})")]
    DeadlineExpired { deadline: u64, now: u64 },

    #[error("Deadline {deadline} is beyond the latest accepted {latest}")]
    DeadlineTooFar { deadline: u64, latest: u64 },

    #[error("Amounts ({amount0}, {amount1}) below minimums ({min_amount0}, {min_amount1})")]
    AmountsBelowMinimum {
        amount0: U256,
        amount1: U256,
        min_amount0: U256,
        min_amount1: U256,
    },

    #[error("Deposit ratio deviates from the pool price by more than {max_permille} permille")]
    PriceDeviationTooHigh { max_permille: u16 },

    #[error("Output {amount_out} below minimum {min_amount_out}")]
    OutputBelowMinimum { amount_out: U256, min_amount_out: U256 },

    #[error("Caller {0} is not an admin")]
    CallerNotAdmin(AccountId),

    #[error("Pool operations are paused")]
    OperationsPaused,

    #[error("Invalid parameter {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("{caller} may not modify position {token_id}")]
    NotPositionOwner {
        caller: AccountId,
        token_id: PositionId,
    },

    #[error("Reserves cannot cover ({amount0}, {amount1})")]
    InsufficientReserves { amount0: U256, amount1: U256 },

    #[error("Token transfer failed: {0}")]
    TransferFailed(#[from] TokenError),

    #[error("Math error: {0}")]
    Math(#[from] MathError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Access error: {0}")]
    Access(#[from] AccessError),
}

impl PoolError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        PoolError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }

    /// Stable taxonomy name of the failure
    pub fn code(&self) -> &'static str {
        match self {
            PoolError::DeadlineExpired { .. } => "DeadlineExpired",
            PoolError::DeadlineTooFar { .. } => "DeadlineTooFar",
            PoolError::AmountsBelowMinimum { .. } => "AmountsBelowMinimum",
            PoolError::PriceDeviationTooHigh { .. } => "PriceDeviationTooHigh",
            PoolError::OutputBelowMinimum { .. } => "OutputBelowMinimum",
            PoolError::CallerNotAdmin(_) => "CallerNotAdmin",
            PoolError::OperationsPaused => "OperationsPaused",
            PoolError::InvalidParameter { .. } => "InvalidParameter",
            PoolError::NotPositionOwner { .. } => "NotPositionOwner",
            PoolError::InsufficientReserves { .. } => "InsufficientReserves",
            PoolError::TransferFailed(_) => "TransferFailed",
            PoolError::Math(_) => "MathError",
            PoolError::Ledger(inner) => inner.code(),
            PoolError::Access(inner) => inner.code(),
        }
    }
}

pub type PoolResult<T> = Result<T, PoolError>;
