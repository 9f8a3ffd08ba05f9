//! # address-verify
//!
//! Cryptographic confirmation of candidate secrets: a 256-bit scalar is
//! turned into its public commitment and compared against a known target
//! identifier.
//!
//! ## Pipeline
//!
//! | Stage | Module | Operation |
//! |-------|--------|-----------|
//! | 1 | [`arith`] | extended Euclid, `pow_mod`, byte-ring helpers |
//! | 2 | [`curve`] | `k * G` on secp256k1 (affine, double-and-add) |
//! | 3 | [`base58check`] | `hash160`, double-SHA-256 checksum, base-58 text |
//! | 4 | [`verifier`] | compressed key → address → exact comparison |
//!
//! ```
//! use address_verify::{Verifier, U256};
//!
//! let verifier = Verifier::bitcoin_mainnet();
//! let one = U256::from_u64(1);
//! assert!(verifier.verify(&one, "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH").unwrap());
//! ```

pub mod arith;
pub mod scalar;
pub mod curve;
pub mod base58check;
pub mod verifier;

pub use arith::{
    byte_add, byte_gcd, byte_inverse, byte_mul, byte_pow, byte_sub, extended_gcd,
    mod_inverse, mod_inverse_biguint, pow_mod, small_mod_inverse, NoInverse, BYTE_MODULUS,
};
pub use scalar::{ScalarError, U256, U256_BYTES};
pub use curve::{CurveParams, ECPoint};
pub use base58check::{CodecError, Decoded, CHECKSUM_LEN};
pub use verifier::{
    address_from_public_key, CandidateKey, NetworkParams, Verifier, VerifyError,
    COMPRESSED_PUBKEY_LEN,
};
