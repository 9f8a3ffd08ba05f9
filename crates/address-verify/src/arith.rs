//! Modular arithmetic kernel.
//!
//! Two domains share this module:
//!
//! | Domain | Type | Used by |
//! |--------|------|---------|
//! | prime field / group order | `BigInt` / `BigUint` | curve arithmetic |
//! | byte ring Z/256 | `u8` with explicit `& 0xFF` | lane recurrences |
//!
//! Byte helpers widen to `u32`, operate, then mask. Nothing here relies on
//! implicit integer wraparound.

use num_bigint::{BigInt, BigUint, Sign};
use num_integer::Integer;
use num_traits::{One, Zero};
use thiserror::Error;

/// Size of the byte ring.
pub const BYTE_MODULUS: u32 = 256;

// ============================================================================
// ERRORS
// ============================================================================

/// `value` shares a factor with `modulus`, so no inverse exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{value} has no inverse modulo {modulus} (gcd = {gcd})")]
pub struct NoInverse {
    pub value: BigInt,
    pub modulus: BigInt,
    pub gcd: BigInt,
}

// ============================================================================
// BIG INTEGER DOMAIN
// ============================================================================

/// Extended Euclidean algorithm.
///
/// Returns `(g, s, t)` with `a*s + b*t = g = gcd(a, b)`. Iterative, so deep
/// 256-bit inputs never grow the stack.
pub fn extended_gcd(a: &BigInt, b: &BigInt) -> (BigInt, BigInt, BigInt) {
    let (mut old_r, mut r) = (a.clone(), b.clone());
    let (mut old_s, mut s) = (BigInt::one(), BigInt::zero());
    let (mut old_t, mut t) = (BigInt::zero(), BigInt::one());

    while !r.is_zero() {
        let q = old_r.div_floor(&r);

        let next_r = &old_r - &q * &r;
        old_r = std::mem::replace(&mut r, next_r);

        let next_s = &old_s - &q * &s;
        old_s = std::mem::replace(&mut s, next_s);

        let next_t = &old_t - &q * &t;
        old_t = std::mem::replace(&mut t, next_t);
    }

    if old_r.sign() == Sign::Minus {
        (-old_r, -old_s, -old_t)
    } else {
        (old_r, old_s, old_t)
    }
}

/// Inverse of `a` modulo `m`, in `[0, m)`.
///
/// Negative `a` is normalized first. Fails when `gcd(a, m) != 1` or when
/// `m` is not positive.
pub fn mod_inverse(a: &BigInt, m: &BigInt) -> Result<BigInt, NoInverse> {
    if m.sign() != Sign::Plus {
        return Err(NoInverse {
            value: a.clone(),
            modulus: m.clone(),
            gcd: BigInt::zero(),
        });
    }

    let reduced = a.mod_floor(m);
    let (g, s, _) = extended_gcd(&reduced, m);
    if !g.is_one() {
        return Err(NoInverse {
            value: a.clone(),
            modulus: m.clone(),
            gcd: g,
        });
    }

    Ok(s.mod_floor(m))
}

/// Unsigned convenience wrapper over [`mod_inverse`].
pub fn mod_inverse_biguint(a: &BigUint, m: &BigUint) -> Result<BigUint, NoInverse> {
    let signed_a = BigInt::from_biguint(Sign::Plus, a.clone());
    let signed_m = BigInt::from_biguint(Sign::Plus, m.clone());
    let inv = mod_inverse(&signed_a, &signed_m)?;
    // mod_floor by a positive modulus is never negative
    Ok(inv.magnitude().clone())
}

/// `base^exp mod m` by square-and-multiply.
///
/// `exp = 0` yields `1 mod m`. `None` when `m` is zero.
pub fn pow_mod(base: &BigUint, exp: &BigUint, m: &BigUint) -> Option<BigUint> {
    if m.is_zero() {
        return None;
    }

    let mut result = BigUint::one() % m;
    let mut square = base % m;
    let bits = exp.bits();

    for i in 0..bits {
        if exp.bit(i) {
            result = (&result * &square) % m;
        }
        if i + 1 < bits {
            square = (&square * &square) % m;
        }
    }

    Some(result)
}

// ============================================================================
// BYTE DOMAIN (mod 256)
// ============================================================================

/// `(a + b) mod 256`
pub fn byte_add(a: u8, b: u8) -> u8 {
    ((a as u32 + b as u32) & 0xFF) as u8
}

/// `(a - b) mod 256`
pub fn byte_sub(a: u8, b: u8) -> u8 {
    ((a as u32 + BYTE_MODULUS - b as u32) & 0xFF) as u8
}

/// `(a * b) mod 256`
pub fn byte_mul(a: u8, b: u8) -> u8 {
    ((a as u32 * b as u32) & 0xFF) as u8
}

/// `base^exp mod 256` by square-and-multiply.
pub fn byte_pow(base: u8, exp: u32) -> u8 {
    let mut result: u32 = 1;
    let mut square = base as u32;
    let mut e = exp;

    while e > 0 {
        if e & 1 == 1 {
            result = (result * square) & 0xFF;
        }
        square = (square * square) & 0xFF;
        e >>= 1;
    }

    result as u8
}

/// `gcd(a, 256)`. Zero maps to 256.
pub fn byte_gcd(a: u8) -> u32 {
    (a as u32).gcd(&BYTE_MODULUS)
}

/// Inverse of `a` modulo a small modulus `m` (used for 256 and its halvings).
pub fn small_mod_inverse(a: u32, m: u32) -> Result<u32, NoInverse> {
    let inv = mod_inverse(&BigInt::from(a), &BigInt::from(m))?;
    // inv < m <= u32::MAX
    Ok(inv.magnitude().iter_u32_digits().next().unwrap_or(0))
}

/// Inverse of `a` in the byte ring. Exists iff `a` is odd.
pub fn byte_inverse(a: u8) -> Result<u8, NoInverse> {
    small_mod_inverse(a as u32, BYTE_MODULUS).map(|v| (v & 0xFF) as u8)
}

// ============================================================================
// TESTS
// ============================================================================
