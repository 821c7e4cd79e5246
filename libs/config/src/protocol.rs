//! Protocol constants and parameter bounds
//!
//! Admin setters and configuration validation both check against these values.

/// Highest accepted swap fee (1%)
pub const MAX_SWAP_FEE_BPS: u16 = 100;

/// Tightest accepted price-deviation tolerance (0.1%)
pub const MIN_PRICE_DEVIATION_PERMILLE: u16 = 1;

/// Loosest accepted price-deviation tolerance (20%)
pub const MAX_PRICE_DEVIATION_PERMILLE: u16 = 200;

/// Deadlines further than this past the current time are rejected (2 days)
pub const MAX_DEADLINE_WINDOW_SECS: u64 = 2 * 24 * 60 * 60;

/// Decimals assumed for both pool tokens unless configured otherwise
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Upper bound on token decimals the fixed-point math supports
pub const MAX_TOKEN_DECIMALS: u8 = 36;

/// Deployment defaults
pub mod defaults {
    /// Swap fee (0.3%)
    pub const SWAP_FEE_BPS: u16 = 30;

    /// Price-deviation tolerance (5%)
    pub const MAX_PRICE_DEVIATION_PERMILLE: u16 = 50;

    /// StableSwap amplification coefficient
    pub const AMPLIFICATION: u64 = 100;
}
