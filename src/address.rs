//! Principal identities.
//!
//! The host ledger authenticates callers before they reach an account, so an
//! `Address` is a plain 32-byte identity. Textual identities (handles, keys in
//! config files) are mapped onto addresses with SHA-256.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// 32-byte principal identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address([u8; 32]);

impl Address {
    /// Create from a 32-byte array.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Derive an address from a textual identity.
    pub fn from_identity(identity: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(b"cohort-address-v1");
        hasher.update(identity.as_bytes());
        Self(hasher.finalize().into())
    }

    /// Short form for log lines: first and last 4 bytes.
    pub fn short(&self) -> String {
        let hex = hex::encode(self.0);
        format!("{}...{}", &hex[..8], &hex[hex.len() - 8..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Error parsing a hex address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid address '{0}': expected 64 hex characters")]
pub struct ParseAddressError(String);

impl FromStr for Address {
    type Err = ParseAddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|_| ParseAddressError(s.to_string()))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| ParseAddressError(s.to_string()))?;
        Ok(Self(bytes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_is_deterministic() {
        assert_eq!(Address::from_identity("alice"), Address::from_identity("alice"));
        assert_ne!(Address::from_identity("alice"), Address::from_identity("bob"));
    }

    #[test]
    fn test_display_parses_back() {
        let addr = Address::from_identity("alice");
        let parsed: Address = addr.to_string().parse().unwrap();
        assert_eq!(addr, parsed);
    }

    #[test]
    fn test_parse_rejects_short_input() {
        assert!("0xabcd".parse::<Address>().is_err());
        assert!("not hex at all".parse::<Address>().is_err());
    }

    #[test]
    fn test_short_form() {
        let addr = Address::new([0xab; 32]);
        assert_eq!(addr.short(), "abababab...abababab");
    }
}
