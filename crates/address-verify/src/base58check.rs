//! Base58Check: version byte, payload, 4-byte double-SHA-256 checksum.
//!
//! ```text
//! [ version (1) ][ payload (variable) ][ checksum (4) ]  --base58-->  text
//! ```
//!
//! Leading zero bytes become leading `'1'` characters; `bs58` handles that
//! convention, this module owns the versioning and the checksum.

use ripemd::Ripemd160;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Bytes of double-SHA-256 kept as checksum.
pub const CHECKSUM_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("invalid base58: {0}")]
    Base58(#[from] bs58::decode::Error),

    #[error("decoded {len} bytes, need at least a version byte and a checksum")]
    TooShort { len: usize },

    #[error("checksum mismatch: expected {}, found {}", hex::encode(.expected), hex::encode(.found))]
    ChecksumMismatch {
        expected: [u8; CHECKSUM_LEN],
        found: [u8; CHECKSUM_LEN],
    },
}

/// Result of a successful [`decode`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub version: u8,
    pub payload: Vec<u8>,
}

// ============================================================================
// HASHES
// ============================================================================

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(data));
    out
}

pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// RIPEMD-160(SHA-256(data)), the 20-byte public key hash.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let mut out = [0u8; 20];
    out.copy_from_slice(&Ripemd160::digest(sha256(data)));
    out
}

pub fn checksum(data: &[u8]) -> [u8; CHECKSUM_LEN] {
    let digest = double_sha256(data);
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&digest[..CHECKSUM_LEN]);
    out
}

// ============================================================================
// CODEC
// ============================================================================

/// Encode `payload` under `version`.
pub fn encode(payload: &[u8], version: u8) -> String {
    let mut data = Vec::with_capacity(1 + payload.len() + CHECKSUM_LEN);
    data.push(version);
    data.extend_from_slice(payload);
    let check = checksum(&data);
    data.extend_from_slice(&check);

    bs58::encode(data).into_string()
}

/// Decode and verify the checksum.
pub fn decode(s: &str) -> Result<Decoded, CodecError> {
    let data = bs58::decode(s).into_vec()?;
    if data.len() < 1 + CHECKSUM_LEN {
        return Err(CodecError::TooShort { len: data.len() });
    }

    let (body, tail) = data.split_at(data.len() - CHECKSUM_LEN);
    let expected = checksum(body);
    let mut found = [0u8; CHECKSUM_LEN];
    found.copy_from_slice(tail);

    if expected != found {
        return Err(CodecError::ChecksumMismatch { expected, found });
    }

    Ok(Decoded {
        version: body[0],
        payload: body[1..].to_vec(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALPHABET: &str = "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

    #[test]
    fn test_hash160_of_generator_pubkey() {
        let pubkey =
            hex::decode("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798").unwrap();
        assert_eq!(hex::encode(hash160(&pubkey)), "751e76e8199196d454941c45d1b3a323f1433bd6");
    }

    #[test]
    fn test_encode_known_address() {
        let h160 = hex::decode("751e76e8199196d454941c45d1b3a323f1433bd6").unwrap();
        assert_eq!(encode(&h160, 0x00), "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
    }

    #[test]
    fn test_leading_zeros_become_ones() {
        // version 0x00 + twenty zero bytes: 21 leading zeros
        let encoded = encode(&[0u8; 20], 0x00);
        assert_eq!(encoded, "1111111111111111111114oLvT2");
        assert!(encoded.starts_with(&"1".repeat(21)));
    }

    #[test]
    fn test_non_zero_version() {
        let payload: Vec<u8> = (0u8..20).collect();
        assert_eq!(encode(&payload, 0x05), "31h38a54tFMrR8kzBnP2241MFD2EUHtGha");
    }

    #[test]
    fn test_decode_roundtrip() {
        let payload = b"lane calibration".to_vec();
        let decoded = decode(&encode(&payload, 0x80)).unwrap();
        assert_eq!(decoded.version, 0x80);
        assert_eq!(decoded.payload, payload);
    }

    #[test]
    fn test_decode_rejects_every_single_character_substitution() {
        let encoded = encode(&hex::decode("52e763a7ddc1aa4fa811578c491c1bc7fd570137").unwrap(), 0x00);
        for (pos, original) in encoded.char_indices() {
            // next alphabet character, wrapping
            let idx = ALPHABET.find(original).unwrap();
            let replacement = ALPHABET.as_bytes()[(idx + 1) % ALPHABET.len()] as char;
            let mut tampered = encoded.clone();
            tampered.replace_range(pos..pos + 1, &replacement.to_string());
            assert!(decode(&tampered).is_err(), "substitution at {} accepted", pos);
        }
    }

    #[test]
    fn test_decode_rejects_bit_flips_in_raw_bytes() {
        let encoded = encode(&[0xAB; 20], 0x00);
        let raw = bs58::decode(&encoded).into_vec().unwrap();
        for bit in 0..raw.len() * 8 {
            let mut flipped = raw.clone();
            flipped[bit / 8] ^= 1 << (bit % 8);
            let text = bs58::encode(&flipped).into_string();
            assert!(
                matches!(decode(&text), Err(CodecError::ChecksumMismatch { .. })),
                "bit {} flip accepted",
                bit
            );
        }
    }

    proptest! {
        #[test]
        fn prop_decode_inverts_encode(
            payload in proptest::collection::vec(any::<u8>(), 0..64),
            version in any::<u8>(),
        ) {
            let decoded = decode(&encode(&payload, version)).unwrap();
            prop_assert_eq!(decoded.version, version);
            prop_assert_eq!(decoded.payload, payload);
        }
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(decode("0OIl"), Err(CodecError::Base58(_))));
        assert!(matches!(decode("1111"), Err(CodecError::TooShort { len: 4 })));
    }
}
