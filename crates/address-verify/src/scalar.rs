//! Fixed-width 256-bit unsigned values.
//!
//! Secrets, candidates and known ladder values all live in this domain.
//! Storage is 32 big-endian bytes, so the derived ordering is numeric
//! ordering.

use std::fmt;
use std::str::FromStr;

use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Width of the value in bytes.
pub const U256_BYTES: usize = 32;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScalarError {
    #[error("empty hex string")]
    Empty,

    #[error("hex string has {digits} digits, at most 64 fit in 256 bits")]
    TooLong { digits: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),

    #[error("value needs {bits} bits, at most 256 allowed")]
    TooWide { bits: u64 },
}

/// 256-bit unsigned integer, big-endian.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct U256([u8; U256_BYTES]);

impl U256 {
    pub const ZERO: U256 = U256([0u8; U256_BYTES]);

    pub const fn from_be_bytes(bytes: [u8; U256_BYTES]) -> Self {
        Self(bytes)
    }

    pub fn to_be_bytes(&self) -> [u8; U256_BYTES] {
        self.0
    }

    pub fn as_be_bytes(&self) -> &[u8; U256_BYTES] {
        &self.0
    }

    pub fn from_u64(v: u64) -> Self {
        let mut bytes = [0u8; U256_BYTES];
        bytes[24..].copy_from_slice(&v.to_be_bytes());
        Self(bytes)
    }

    /// Parse hex with optional `0x` prefix. Short inputs are left-padded.
    pub fn from_hex(s: &str) -> Result<Self, ScalarError> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() {
            return Err(ScalarError::Empty);
        }
        if digits.len() > U256_BYTES * 2 {
            return Err(ScalarError::TooLong { digits: digits.len() });
        }

        let padded = format!("{:0>64}", digits);
        let mut bytes = [0u8; U256_BYTES];
        hex::decode_to_slice(padded, &mut bytes)?;
        Ok(Self(bytes))
    }

    /// 64 lowercase hex digits, no prefix.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    pub fn from_biguint(v: &BigUint) -> Result<Self, ScalarError> {
        if v.bits() > 256 {
            return Err(ScalarError::TooWide { bits: v.bits() });
        }
        let be = v.to_bytes_be();
        let mut bytes = [0u8; U256_BYTES];
        bytes[U256_BYTES - be.len()..].copy_from_slice(&be);
        Ok(Self(bytes))
    }

    pub fn to_biguint(&self) -> BigUint {
        BigUint::from_bytes_be(&self.0)
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    /// Number of significant bits.
    pub fn bits(&self) -> u32 {
        for (i, &b) in self.0.iter().enumerate() {
            if b != 0 {
                return (U256_BYTES - i) as u32 * 8 - b.leading_zeros();
            }
        }
        0
    }

    /// Copy with bit `bit` (0 = least significant) toggled.
    pub fn flip_bit(&self, bit: u32) -> Self {
        let mut bytes = self.0;
        let bit = (bit % 256) as usize;
        bytes[U256_BYTES - 1 - bit / 8] ^= 1 << (bit % 8);
        Self(bytes)
    }
}

impl fmt::Debug for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "U256(0x{})", self.to_hex())
    }
}

impl fmt::Display for U256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

impl FromStr for U256 {
    type Err = ScalarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl Serialize for U256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for U256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        U256::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
