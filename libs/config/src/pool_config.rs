//! Pool configuration loader
//!
//! Loads pool parameters from a TOML file with per-environment overrides and
//! `POOL_`-prefixed environment variables, then validates them against the protocol
//! bounds before anything is deployed with them.

use anyhow::{Context, Result};
use config_crate::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::protocol::{
    defaults, DEFAULT_TOKEN_DECIMALS, MAX_PRICE_DEVIATION_PERMILLE, MAX_SWAP_FEE_BPS,
    MAX_TOKEN_DECIMALS, MIN_PRICE_DEVIATION_PERMILLE,
};

/// Default location of the base configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/pool.toml";

/// Prefix for environment-variable overrides (`POOL_SWAP_FEE_BPS=5`)
pub const ENV_PREFIX: &str = "POOL";

/// Parameter values rejected by [`PoolConfig::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("swap fee {value} bps exceeds maximum {max} bps")]
    SwapFeeOutOfRange { value: u16, max: u16 },

    #[error("price deviation {value} permille outside [{min}, {max}]")]
    PriceDeviationOutOfRange { value: u16, min: u16, max: u16 },

    #[error("amplification coefficient must be positive")]
    ZeroAmplification,

    #[error("token decimals {value} exceed maximum {max}")]
    DecimalsOutOfRange { value: u8, max: u8 },
}

/// Tunable parameters a pool is deployed with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Fee charged on swap input, in basis points
    pub swap_fee_bps: u16,
    /// Accepted deviation of a deposit ratio from the reserve ratio, in permille
    pub max_price_deviation_permille: u16,
    /// StableSwap amplification coefficient `A`
    pub amplification: u64,
    /// Decimals shared by both pool tokens
    pub token_decimals: u8,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            swap_fee_bps: defaults::SWAP_FEE_BPS,
            max_price_deviation_permille: defaults::MAX_PRICE_DEVIATION_PERMILLE,
            amplification: defaults::AMPLIFICATION,
            token_decimals: DEFAULT_TOKEN_DECIMALS,
        }
    }
}

impl PoolConfig {
    /// Load configuration from files with environment overrides
    ///
    /// With no `base_path` the default `config/pool.toml` is used if present, otherwise
    /// the built-in defaults. An `environment` name layers
    /// `<base dir>/environments/<environment>.toml` on top.
    pub fn load(base_path: Option<&Path>, environment: Option<&str>) -> Result<Self> {
        Self::load_with_prefix(base_path, environment, ENV_PREFIX)
    }

    pub(crate) fn load_with_prefix(
        base_path: Option<&Path>,
        environment: Option<&str>,
        prefix: &str,
    ) -> Result<Self> {
        let (base, required) = match base_path {
            Some(path) => (path.to_path_buf(), true),
            None => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        };

        let mut builder = Config::builder().add_source(File::from(base.as_path()).required(required));

        if let Some(env) = environment {
            let env_file = base
                .parent()
                .unwrap_or_else(|| Path::new("."))
                .join("environments")
                .join(format!("{}.toml", env));

            if env_file.exists() {
                info!("Loading environment config: {:?}", env_file);
                builder = builder.add_source(File::from(env_file));
            } else {
                warn!("Environment config not found: {:?}", env_file);
            }
        }

        // Field names contain underscores, so nesting uses a double separator
        builder = builder.add_source(
            Environment::with_prefix(prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: PoolConfig = builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        config.validate().context("Invalid pool configuration")?;
        Ok(config)
    }

    /// Check every parameter against the protocol bounds
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.swap_fee_bps > MAX_SWAP_FEE_BPS {
            return Err(ConfigError::SwapFeeOutOfRange {
                value: self.swap_fee_bps,
                max: MAX_SWAP_FEE_BPS,
            });
        }
        if !(MIN_PRICE_DEVIATION_PERMILLE..=MAX_PRICE_DEVIATION_PERMILLE)
            .contains(&self.max_price_deviation_permille)
        {
            return Err(ConfigError::PriceDeviationOutOfRange {
                value: self.max_price_deviation_permille,
                min: MIN_PRICE_DEVIATION_PERMILLE,
                max: MAX_PRICE_DEVIATION_PERMILLE,
            });
        }
        if self.amplification == 0 {
            return Err(ConfigError::ZeroAmplification);
        }
        if self.token_decimals > MAX_TOKEN_DECIMALS {
            return Err(ConfigError::DecimalsOutOfRange {
                value: self.token_decimals,
                max: MAX_TOKEN_DECIMALS,
            });
        }
        Ok(())
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    // Each test reads a prefix nobody sets so parallel tests never see each other's variables
    fn load_isolated(base: Option<&Path>, environment: Option<&str>, prefix: &str) -> Result<PoolConfig> {
        PoolConfig::load_with_prefix(base, environment, prefix)
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = PoolConfig::default();
        assert_eq!(config.swap_fee_bps, 30);
        assert_eq!(config.max_price_deviation_permille, 50);
        assert_eq!(config.amplification, 100);
        assert_eq!(config.token_decimals, 18);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_base_config() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("pool.toml");

        fs::write(
            &config_path,
            r#"
swap_fee_bps = 4
amplification = 2000
"#,
        )
        .unwrap();

        let config = load_isolated(Some(&config_path), None, "POOLTEST_BASE").unwrap();
        assert_eq!(config.swap_fee_bps, 4);
        assert_eq!(config.amplification, 2000);
        // Unset fields fall back to defaults
        assert_eq!(config.max_price_deviation_permille, 50);
    }

    #[test]
    fn test_environment_override() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("pool.toml");
        fs::write(&config_path, "swap_fee_bps = 10\nmax_price_deviation_permille = 20\n").unwrap();

        let env_dir = dir.path().join("environments");
        fs::create_dir(&env_dir).unwrap();
        fs::write(env_dir.join("staging.toml"), "swap_fee_bps = 25\n").unwrap();

        let config = load_isolated(Some(&config_path), Some("staging"), "POOLTEST_STAGE").unwrap();
        assert_eq!(config.swap_fee_bps, 25);
        assert_eq!(config.max_price_deviation_permille, 20);

        // Missing environment files only warn
        let config = load_isolated(Some(&config_path), Some("nowhere"), "POOLTEST_STAGE").unwrap();
        assert_eq!(config.swap_fee_bps, 10);
    }

    #[test]
    fn test_environment_variable_override() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("pool.toml");
        fs::write(&config_path, "amplification = 50\n").unwrap();

        std::env::set_var("POOLTEST_VARS_AMPLIFICATION", "750");
        let config = load_isolated(Some(&config_path), None, "POOLTEST_VARS").unwrap();
        std::env::remove_var("POOLTEST_VARS_AMPLIFICATION");

        assert_eq!(config.amplification, 750);
    }

    #[test]
    fn test_missing_required_file_fails() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(load_isolated(Some(&missing), None, "POOLTEST_MISSING").is_err());
    }

    #[test]
    fn test_out_of_range_file_is_rejected() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("pool.toml");
        fs::write(&config_path, "swap_fee_bps = 101\n").unwrap();

        let err = load_isolated(Some(&config_path), None, "POOLTEST_RANGE").unwrap_err();
        assert_eq!(
            err.downcast_ref::<ConfigError>(),
            Some(&ConfigError::SwapFeeOutOfRange { value: 101, max: 100 })
        );
    }

    #[test]
    fn test_validate_bounds() {
        let mut config = PoolConfig::default();

        config.max_price_deviation_permille = 0;
        assert!(matches!(config.validate(), Err(ConfigError::PriceDeviationOutOfRange { .. })));
        config.max_price_deviation_permille = 201;
        assert!(matches!(config.validate(), Err(ConfigError::PriceDeviationOutOfRange { .. })));
        config.max_price_deviation_permille = 200;
        assert!(config.validate().is_ok());

        config.amplification = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroAmplification));
        config.amplification = 1;

        config.token_decimals = 37;
        assert!(matches!(config.validate(), Err(ConfigError::DecimalsOutOfRange { .. })));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PoolConfig {
            swap_fee_bps: 5,
            ..PoolConfig::default()
        };
        let rendered = config.to_toml().unwrap();
        let parsed: PoolConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, config);
    }
}
