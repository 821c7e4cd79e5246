//! # Position Pool Configuration
//!
//! Configuration loading and protocol constants shared by the pool engine and the
//! tooling around it, so parameter bounds live in exactly one place.
//!
//! ## Features
//!
//! - **Protocol Constants**: fee and price-deviation bounds, deadline window, decimals
//! - **Pool Configuration**: TOML file, per-environment overrides, `POOL_` variables
//!
//! ## Usage
//!
//! ```rust
//! use pool_config::{protocol, PoolConfig};
//!
//! let config = PoolConfig::default();
//! assert!(config.swap_fee_bps <= protocol::MAX_SWAP_FEE_BPS);
//! assert!(config.validate().is_ok());
//! ```

pub mod pool_config;
pub mod protocol;

// Re-export commonly used types
pub use pool_config::{ConfigError, PoolConfig};
pub use protocol::*;
