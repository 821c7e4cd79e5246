//! Pool State
//!
//! Reserves, fee accumulators and tunable parameters of a single pool. A plain owned
//! value built from the deployment configuration; the pool clones it as a checkpoint
//! before every value-moving operation.

use amm_math::{StableSwapState, U256};
use pool_config::PoolConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolState {
    pub reserve0: U256,
    pub reserve1: U256,
    /// Swap fees charged on token0 input and not yet collected
    pub accumulated_fee0: U256,
    /// Swap fees charged on token1 input and not yet collected
    pub accumulated_fee1: U256,
    pub swap_fee_bps: u16,
    pub amplification_coefficient: u64,
    pub max_price_deviation_permille: u16,
    pub paused: bool,
}

impl PoolState {
    /// Empty, unpaused pool with the configured parameters
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            reserve0: U256::zero(),
            reserve1: U256::zero(),
            accumulated_fee0: U256::zero(),
            accumulated_fee1: U256::zero(),
            swap_fee_bps: config.swap_fee_bps,
            amplification_coefficient: config.amplification,
            max_price_deviation_permille: config.max_price_deviation_permille,
            paused: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.reserve0.is_zero() && self.reserve1.is_zero()
    }

    /// Curve snapshot used for quoting
    pub fn curve(&self) -> StableSwapState {
        StableSwapState {
            reserve0: self.reserve0,
            reserve1: self.reserve1,
            amplification: self.amplification_coefficient,
            fee_bps: self.swap_fee_bps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_takes_config_parameters() {
        let config = PoolConfig {
            swap_fee_bps: 4,
            amplification: 2_000,
            ..PoolConfig::default()
        };
        let state = PoolState::new(&config);
        assert!(state.is_empty());
        assert!(!state.paused);
        assert_eq!(state.curve().fee_bps, 4);
        assert_eq!(state.curve().amplification, 2_000);
        assert_eq!(state.max_price_deviation_permille, 50);
    }
}
