//! Candidate verification: scalar → public point → address → compare.
//!
//! # Derivation
//!
//! | Step | Operation |
//! |------|-----------|
//! | 1 | `P = k * G` |
//! | 2 | `prefix = 0x02` if `P.y` even, else `0x03` |
//! | 3 | `pubkey = prefix ‖ be32(P.x)` |
//! | 4 | `h = RIPEMD-160(SHA-256(pubkey))` |
//! | 5 | `address = Base58Check(h, version)` |
//!
//! [`Verifier::verify`] is the only place that decides whether a candidate
//! is correct.

use num_bigint::BigUint;
use num_traits::Zero;
use serde::Serialize;
use thiserror::Error;

use crate::base58check;
use crate::curve::{CurveParams, ECPoint};
use crate::scalar::U256;

/// Compressed SEC1 public key length.
pub const COMPRESSED_PUBKEY_LEN: usize = 33;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("scalar {scalar} is outside the valid range 1..n-1")]
    ScalarOutOfRange { scalar: U256 },

    #[error("scalar {scalar} maps to the point at infinity")]
    PointAtInfinity { scalar: U256 },
}

// ============================================================================
// NETWORK PARAMETERS
// ============================================================================

/// Address-format constants of a network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkParams {
    /// Compressed-key prefix for even y.
    pub even_prefix: u8,
    /// Compressed-key prefix for odd y.
    pub odd_prefix: u8,
    /// Base58Check version of a pay-to-pubkey-hash address.
    pub address_version: u8,
    /// Base58Check version of a WIF private key.
    pub wif_version: u8,
}

impl NetworkParams {
    pub const BITCOIN_MAINNET: NetworkParams = NetworkParams {
        even_prefix: 0x02,
        odd_prefix: 0x03,
        address_version: 0x00,
        wif_version: 0x80,
    };
}

// ============================================================================
// CANDIDATE
// ============================================================================

/// A hypothesized scalar with its derived identifier. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandidateKey {
    pub scalar: U256,
    pub address: String,
    pub matches: bool,
}

// ============================================================================
// VERIFIER
// ============================================================================

#[derive(Debug, Clone)]
pub struct Verifier {
    curve: CurveParams,
    network: NetworkParams,
}

impl Verifier {
    pub fn new(curve: CurveParams, network: NetworkParams) -> Self {
        Self { curve, network }
    }

    /// secp256k1 with Bitcoin mainnet encodings.
    pub fn bitcoin_mainnet() -> Self {
        Self::new(CurveParams::secp256k1(), NetworkParams::BITCOIN_MAINNET)
    }

    pub fn curve(&self) -> &CurveParams {
        &self.curve
    }

    pub fn network(&self) -> &NetworkParams {
        &self.network
    }

    /// Reject zero and anything `>= n` before touching the curve.
    pub fn check_range(&self, scalar: &U256) -> Result<BigUint, VerifyError> {
        let k = scalar.to_biguint();
        if k.is_zero() || k >= self.curve.order {
            return Err(VerifyError::ScalarOutOfRange { scalar: *scalar });
        }
        Ok(k)
    }

    /// 33-byte compressed public key of `scalar`.
    pub fn compressed_public_key(&self, scalar: &U256) -> Result<[u8; COMPRESSED_PUBKEY_LEN], VerifyError> {
        let k = self.check_range(scalar)?;
        let (x, y) = match self.curve.public_point(&k) {
            ECPoint::Affine { x, y } => (x, y),
            ECPoint::Infinity => return Err(VerifyError::PointAtInfinity { scalar: *scalar }),
        };

        let mut out = [0u8; COMPRESSED_PUBKEY_LEN];
        out[0] = if y.bit(0) {
            self.network.odd_prefix
        } else {
            self.network.even_prefix
        };
        out[1..].copy_from_slice(&be32(&x));
        Ok(out)
    }

    /// Textual identifier (P2PKH address) of `scalar`.
    pub fn address(&self, scalar: &U256) -> Result<String, VerifyError> {
        let pubkey = self.compressed_public_key(scalar)?;
        Ok(address_from_public_key(&pubkey, self.network.address_version))
    }

    /// Exact string comparison of the derived address against `target_id`.
    pub fn verify(&self, scalar: &U256, target_id: &str) -> Result<bool, VerifyError> {
        Ok(self.address(scalar)? == target_id)
    }

    pub fn candidate(&self, scalar: &U256, target_id: &str) -> Result<CandidateKey, VerifyError> {
        let address = self.address(scalar)?;
        let matches = address == target_id;
        Ok(CandidateKey {
            scalar: *scalar,
            address,
            matches,
        })
    }

    /// Wallet import format of `scalar`.
    pub fn wif(&self, scalar: &U256, compressed: bool) -> Result<String, VerifyError> {
        self.check_range(scalar)?;
        let mut payload = scalar.to_be_bytes().to_vec();
        if compressed {
            payload.push(0x01);
        }
        Ok(base58check::encode(&payload, self.network.wif_version))
    }
}

/// Base58Check(hash160(pubkey)) under `version`.
pub fn address_from_public_key(pubkey: &[u8], version: u8) -> String {
    base58check::encode(&base58check::hash160(pubkey), version)
}

fn be32(v: &BigUint) -> [u8; 32] {
    let bytes = v.to_bytes_be();
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    out
}

// ============================================================================
// TESTS
// ============================================================================
