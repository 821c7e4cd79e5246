//! Structured events emitted by the pool, the position ledger and the access controller
//!
//! Events serialize as JSON objects tagged by `event` with camelCase field names, e.g.
//! `{"event":"Swap","caller":"0x…","amountIn":"100","amountOut":"99","zeroForOne":true}`.
//! Amounts are decimal strings so 256-bit values survive any JSON consumer.

use amm_math::U256;
use serde::{Deserialize, Serialize};

use crate::access::Role;
use crate::types::{AccountId, PositionId, TokenId};

/// Events emitted by a liquidity pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum PoolEvent {
    #[serde(rename_all = "camelCase")]
    AddLiquidity {
        owner: AccountId,
        token_id: PositionId,
        amount0: U256,
        amount1: U256,
    },

    #[serde(rename_all = "camelCase")]
    IncreaseLiquidity {
        token_id: PositionId,
        amount0: U256,
        amount1: U256,
    },

    #[serde(rename_all = "camelCase")]
    DecreaseLiquidity {
        token_id: PositionId,
        amount0: U256,
        amount1: U256,
    },

    #[serde(rename_all = "camelCase")]
    RemoveLiquidity {
        token_id: PositionId,
        amount0: U256,
        amount1: U256,
    },

    #[serde(rename_all = "camelCase")]
    Swap {
        caller: AccountId,
        amount_in: U256,
        amount_out: U256,
        zero_for_one: bool,
    },

    #[serde(rename_all = "camelCase")]
    FeesCollected {
        recipient: AccountId,
        amount0: U256,
        amount1: U256,
    },

    #[serde(rename_all = "camelCase")]
    SwapFeeUpdated { old_fee_bps: u16, new_fee_bps: u16 },

    #[serde(rename_all = "camelCase")]
    MaxPriceDeviationUpdated {
        old_permille: u16,
        new_permille: u16,
    },

    #[serde(rename_all = "camelCase")]
    AmplificationUpdated { old_value: u64, new_value: u64 },

    #[serde(rename_all = "camelCase")]
    PausedSet { paused: bool, by: AccountId },

    #[serde(rename_all = "camelCase")]
    AccessManagerUpdated { by: AccountId },

    #[serde(rename_all = "camelCase")]
    EmergencyWithdrawal {
        token: TokenId,
        recipient: AccountId,
        amount: U256,
    },
}

/// Events emitted by the access controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum AccessEvent {
    #[serde(rename_all = "camelCase")]
    RoleGranted {
        role: Role,
        account: AccountId,
        sender: AccountId,
    },

    #[serde(rename_all = "camelCase")]
    RoleRevoked {
        role: Role,
        account: AccountId,
        sender: AccountId,
    },
}

/// Events emitted by the position ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum LedgerEvent {
    #[serde(rename_all = "camelCase")]
    PositionMinted {
        token_id: PositionId,
        owner: AccountId,
        pool: AccountId,
    },

    #[serde(rename_all = "camelCase")]
    PositionUpdated {
        token_id: PositionId,
        amount0: U256,
        amount1: U256,
    },

    #[serde(rename_all = "camelCase")]
    PositionBurned { token_id: PositionId },

    #[serde(rename_all = "camelCase")]
    Transfer {
        from: AccountId,
        to: AccountId,
        token_id: PositionId,
    },

    #[serde(rename_all = "camelCase")]
    Approval {
        owner: AccountId,
        approved: AccountId,
        token_id: PositionId,
    },

    #[serde(rename_all = "camelCase")]
    ApprovalForAll {
        owner: AccountId,
        operator: AccountId,
        approved: bool,
    },

    #[serde(rename_all = "camelCase")]
    PoolAuthorizationSet { pool: AccountId, authorized: bool },

    #[serde(rename_all = "camelCase")]
    BaseUriSet { base_uri: String },
}
