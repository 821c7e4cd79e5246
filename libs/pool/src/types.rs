//! Identifier types shared across the pool, ledger and access layers

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 20-byte account address, rendered as `0x`-prefixed lowercase hex
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountId(pub [u8; 20]);

/// Token contracts are addressed the same way as accounts
pub type TokenId = AccountId;

impl AccountId {
    /// The zero address, never a valid recipient
    pub const ZERO: AccountId = AccountId([0u8; 20]);

    /// Address whose low 8 bytes hold `value` big-endian
    ///
    /// Handy for deterministic fixtures: `AccountId::from_low_u64(1)` is `0x00…01`.
    pub fn from_low_u64(value: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&value.to_be_bytes());
        AccountId(bytes)
    }

    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }
}

impl FromStr for AccountId {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)?;
        Ok(AccountId(bytes))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Identifier of a liquidity position; the first minted position is 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PositionId(pub u64);

impl PositionId {
    pub const FIRST: PositionId = PositionId(1);

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for PositionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for PositionId {
    fn from(value: u64) -> Self {
        PositionId(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_hex_round_trip() {
        let account = AccountId::from_low_u64(0xBEEF);
        let rendered = account.to_string();
        assert_eq!(rendered, "0x000000000000000000000000000000000000beef");
        assert_eq!(rendered.parse::<AccountId>().unwrap(), account);
        // Prefix is optional on input
        assert_eq!(rendered[2..].parse::<AccountId>().unwrap(), account);
    }

    #[test]
    fn test_account_rejects_wrong_length() {
        assert!("0x1234".parse::<AccountId>().is_err());
        assert!("0xzz00000000000000000000000000000000000000".parse::<AccountId>().is_err());
    }

    #[test]
    fn test_account_serializes_as_string() {
        let json = serde_json::to_string(&AccountId::from_low_u64(1)).unwrap();
        assert_eq!(json, "\"0x0000000000000000000000000000000000000001\"");
        let back: AccountId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, AccountId::from_low_u64(1));
    }

    #[test]
    fn test_zero_address() {
        assert!(AccountId::ZERO.is_zero());
        assert!(!AccountId::from_low_u64(7).is_zero());
    }

    #[test]
    fn test_position_id_is_transparent() {
        assert_eq!(serde_json::to_string(&PositionId(42)).unwrap(), "42");
        assert_eq!(PositionId::FIRST.value(), 1);
    }
}
