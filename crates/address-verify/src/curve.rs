//! Minimal short-Weierstrass curve arithmetic in affine coordinates.
//!
//! Only what candidate verification needs: point addition, doubling and
//! double-and-add scalar multiplication. Curve constants live in an
//! explicit [`CurveParams`] value that callers pass around; there is no
//! global curve.
//!
//! # secp256k1 (SEC 2)
//!
//! - p = 2^256 - 2^32 - 977
//! - a = 0, b = 7
//! - n = FFFFFFFF FFFFFFFF FFFFFFFF FFFFFFFE BAAEDCE6 AF48A03B BFD25E8C D0364141
//! - h = 1

use num_bigint::BigUint;
use num_traits::{Num, Zero};

use crate::arith::mod_inverse_biguint;

const SECP256K1_P: &str = "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEFFFFFC2F";
const SECP256K1_N: &str = "FFFFFFFFFFFFFFFFFFFFFFFFFFFFFFFEBAAEDCE6AF48A03BBFD25E8CD0364141";
const SECP256K1_GX: &str = "79BE667EF9DCBBAC55A06295CE870B07029BFCDB2DCE28D959F2815B16F81798";
const SECP256K1_GY: &str = "483ADA7726A3C4655DA4FBFC0E1108A8FD17B448A68554199C47D08FFB10D4B8";

/// A curve point, or the group identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ECPoint {
    Infinity,
    Affine { x: BigUint, y: BigUint },
}

impl ECPoint {
    pub fn affine(x: BigUint, y: BigUint) -> Self {
        ECPoint::Affine { x, y }
    }

    pub fn is_infinity(&self) -> bool {
        matches!(self, ECPoint::Infinity)
    }

    pub fn x(&self) -> Option<&BigUint> {
        match self {
            ECPoint::Affine { x, .. } => Some(x),
            ECPoint::Infinity => None,
        }
    }

    pub fn y(&self) -> Option<&BigUint> {
        match self {
            ECPoint::Affine { y, .. } => Some(y),
            ECPoint::Infinity => None,
        }
    }
}

/// Domain parameters of `y^2 = x^3 + a*x + b` over `F_p`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurveParams {
    pub p: BigUint,
    pub a: BigUint,
    pub b: BigUint,
    pub generator: ECPoint,
    /// Order of `generator`.
    pub order: BigUint,
}

fn constant(hex: &str) -> BigUint {
    BigUint::from_str_radix(hex, 16).expect("curve constants are valid hex")
}

impl CurveParams {
    /// The curve used by Bitcoin.
    pub fn secp256k1() -> Self {
        Self {
            p: constant(SECP256K1_P),
            a: BigUint::zero(),
            b: BigUint::from(7u32),
            generator: ECPoint::affine(constant(SECP256K1_GX), constant(SECP256K1_GY)),
            order: constant(SECP256K1_N),
        }
    }

    /// Whether `point` satisfies the curve equation. Infinity is on every curve.
    pub fn contains(&self, point: &ECPoint) -> bool {
        match point {
            ECPoint::Infinity => true,
            ECPoint::Affine { x, y } => {
                let p = &self.p;
                if x >= p || y >= p {
                    return false;
                }
                let lhs = (y * y) % p;
                let rhs = (x * x % p * x + &self.a * x + &self.b) % p;
                lhs == rhs
            }
        }
    }

    pub fn negate(&self, point: &ECPoint) -> ECPoint {
        match point {
            ECPoint::Infinity => ECPoint::Infinity,
            ECPoint::Affine { x, y } => ECPoint::affine(x.clone(), sub_mod(&BigUint::zero(), y, &self.p)),
        }
    }

    /// Group law.
    ///
    /// - either operand at infinity → the other operand
    /// - same x, different y (or y = 0 when doubling) → infinity
    /// - same point → tangent slope `(3x² + a) / 2y`
    /// - otherwise → chord slope `(y2 - y1) / (x2 - x1)`
    pub fn point_add(&self, p1: &ECPoint, p2: &ECPoint) -> ECPoint {
        let (x1, y1, x2, y2) = match (p1, p2) {
            (ECPoint::Infinity, _) => return p2.clone(),
            (_, ECPoint::Infinity) => return p1.clone(),
            (ECPoint::Affine { x: x1, y: y1 }, ECPoint::Affine { x: x2, y: y2 }) => (x1, y1, x2, y2),
        };
        let p = &self.p;

        let lambda = if x1 == x2 {
            if y1 != y2 || y1.is_zero() {
                return ECPoint::Infinity;
            }
            let x_sq = (x1 * x1) % p;
            let num = (&x_sq + &x_sq + &x_sq + &self.a) % p;
            let den = (y1 + y1) % p;
            (num * self.field_inverse(&den)) % p
        } else {
            let num = sub_mod(y2, y1, p);
            let den = sub_mod(x2, x1, p);
            (num * self.field_inverse(&den)) % p
        };

        let lambda_sq = (&lambda * &lambda) % p;
        let x3 = sub_mod(&sub_mod(&lambda_sq, x1, p), x2, p);
        let y3 = sub_mod(&((&lambda * sub_mod(x1, &x3, p)) % p), y1, p);

        ECPoint::affine(x3, y3)
    }

    pub fn point_double(&self, point: &ECPoint) -> ECPoint {
        self.point_add(point, point)
    }

    /// Double-and-add, scanning `k` from the least significant bit.
    ///
    /// `k = 0` yields infinity. `k` is not reduced modulo the group order;
    /// callers that need a canonical scalar must range-check first.
    pub fn scalar_mult(&self, k: &BigUint, point: &ECPoint) -> ECPoint {
        let mut result = ECPoint::Infinity;
        let mut addend = point.clone();
        let bits = k.bits();

        for i in 0..bits {
            if k.bit(i) {
                result = self.point_add(&result, &addend);
            }
            if i + 1 < bits {
                addend = self.point_double(&addend);
            }
        }

        result
    }

    /// `k * G`
    pub fn public_point(&self, k: &BigUint) -> ECPoint {
        self.scalar_mult(k, &self.generator)
    }

    fn field_inverse(&self, v: &BigUint) -> BigUint {
        mod_inverse_biguint(v, &self.p).expect("non-zero element of a prime field is invertible")
    }
}

/// `(a - b) mod p` for operands of any size.
fn sub_mod(a: &BigUint, b: &BigUint, p: &BigUint) -> BigUint {
    let a = a % p;
    let b = b % p;
    if a >= b {
        a - b
    } else {
        p - b + a
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn hex(s: &str) -> BigUint {
        BigUint::from_str_radix(s, 16).unwrap()
    }

    #[test]
    fn test_generator_on_curve() {
        let curve = CurveParams::secp256k1();
        assert!(curve.contains(&curve.generator));
        assert!(curve.contains(&ECPoint::Infinity));
    }

    #[test]
    fn test_off_curve_point_rejected() {
        let curve = CurveParams::secp256k1();
        let bogus = ECPoint::affine(BigUint::from(1u32), BigUint::from(1u32));
        assert!(!curve.contains(&bogus));
    }

    #[test]
    fn test_double_generator() {
        let curve = CurveParams::secp256k1();
        let two_g = curve.point_double(&curve.generator);
        assert_eq!(
            two_g,
            ECPoint::affine(
                hex("c6047f9441ed7d6d3045406e95c07cd85c778e4b8cef3ca7abac09b95c709ee5"),
                hex("1ae168fea63dc339a3c58419466ceaeef7f632653266d0e1236431a950cfe52a"),
            )
        );
        assert!(curve.contains(&two_g));
    }

    #[test]
    fn test_identity_cases() {
        let curve = CurveParams::secp256k1();
        let g = curve.generator.clone();
        assert_eq!(curve.point_add(&ECPoint::Infinity, &g), g);
        assert_eq!(curve.point_add(&g, &ECPoint::Infinity), g);
        assert_eq!(curve.point_add(&g, &curve.negate(&g)), ECPoint::Infinity);
    }

    #[test]
    fn test_chord_matches_scalar_mult() {
        let curve = CurveParams::secp256k1();
        let g = curve.generator.clone();
        let two_g = curve.point_double(&g);
        let three_g = curve.point_add(&two_g, &g);
        assert_eq!(three_g, curve.public_point(&BigUint::from(3u32)));
        assert_eq!(
            three_g.x().unwrap(),
            &hex("f9308a019258c31049344f85f89d5229b531c845836f99b08601f113bce036f9")
        );
    }

    #[test]
    fn test_scalar_mult_zero_and_one() {
        let curve = CurveParams::secp256k1();
        assert_eq!(curve.public_point(&BigUint::zero()), ECPoint::Infinity);
        assert_eq!(curve.public_point(&BigUint::from(1u32)), curve.generator);
    }

    #[test]
    fn test_order_minus_one_is_negated_generator() {
        let curve = CurveParams::secp256k1();
        let k = &curve.order - 1u32;
        let point = curve.public_point(&k);
        assert_eq!(point, curve.negate(&curve.generator));
        assert_eq!(
            point.y().unwrap(),
            &hex("b7c52588d95c3b9aa25b0403f1eef75702e84bb7597aabe663b82f6f04ef2777")
        );
    }

    #[test]
    fn test_scalar_mult_is_additive() {
        let curve = CurveParams::secp256k1();
        let a = BigUint::from(0x1234_5678u64);
        let b = BigUint::from(0x9abc_def0u64);
        let lhs = curve.public_point(&(&a + &b));
        let rhs = curve.point_add(&curve.public_point(&a), &curve.public_point(&b));
        assert_eq!(lhs, rhs);
    }
}
