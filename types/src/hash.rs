//! Opaque identity digests.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::PmpError;

/// A 32-byte one-way digest of an identity signal (client IP, device
/// fingerprint or confession text).
///
/// Only ever compared for equality; the raw value it was computed from is
/// never stored.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdentityHash([u8; 32]);

impl IdentityHash {
    pub const ZERO: Self = Self([0u8; 32]);

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lower-case hex encoding of the full digest.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }

    /// First four bytes as hex, for log lines.
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse a 64-character hex digest.
    pub fn from_hex(s: &str) -> Result<Self, PmpError> {
        let bytes = hex::decode(s).map_err(|_| PmpError::InvalidHash(s.to_string()))?;
        let arr: [u8; 32] = bytes
            .try_into()
            .map_err(|_| PmpError::InvalidHash(s.to_string()))?;
        Ok(Self(arr))
    }
}

impl fmt::Debug for IdentityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdentityHash({})", self.short())
    }
}

impl fmt::Display for IdentityHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_roundtrip() {
        let h = IdentityHash::new([0xAB; 32]);
        let parsed = IdentityHash::from_hex(&h.to_hex()).unwrap();
        assert_eq!(parsed, h);
    }

    #[test]
    fn short_is_eight_chars() {
        let h = IdentityHash::new([0x01; 32]);
        assert_eq!(h.short(), "01010101");
        assert_eq!(format!("{h:?}"), "IdentityHash(01010101)");
    }

    #[test]
    fn from_hex_rejects_wrong_length() {
        assert!(IdentityHash::from_hex("abcd").is_err());
        assert!(IdentityHash::from_hex("zz").is_err());
    }
}
