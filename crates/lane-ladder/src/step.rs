//! Step polynomials.
//!
//! One step of a lane maps `x` to `x_coeff * x + drift_coeff * d (mod 256)`.
//! How the two coefficients derive from the lane multiplier is a property of
//! the regime being modeled, so it is a [`StepPolicy`] value passed to the
//! solvers instead of a fixed formula.

use address_verify::arith::{byte_add, byte_mul, byte_pow};
use serde::{Deserialize, Serialize};

/// Coefficients of one (possibly composed) step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StepCoefficients {
    pub x_coeff: u8,
    pub drift_coeff: u8,
}

impl StepCoefficients {
    /// Zero steps.
    pub const IDENTITY: StepCoefficients = StepCoefficients {
        x_coeff: 1,
        drift_coeff: 0,
    };

    pub fn new(x_coeff: u8, drift_coeff: u8) -> Self {
        Self { x_coeff, drift_coeff }
    }

    /// `x_coeff * x + drift_coeff * drift (mod 256)`
    pub fn apply(&self, x: u8, drift: u8) -> u8 {
        byte_add(byte_mul(self.x_coeff, x), byte_mul(self.drift_coeff, drift))
    }

    /// `n` applications with the same drift each time:
    /// `x_coeff^n` and `drift_coeff * (1 + x_coeff + ... + x_coeff^(n-1))`.
    pub fn compose(&self, n: u32) -> StepCoefficients {
        let mut geometric = 0u8;
        let mut power = 1u8;
        for _ in 0..n {
            geometric = byte_add(geometric, power);
            power = byte_mul(power, self.x_coeff);
        }
        StepCoefficients {
            x_coeff: power,
            drift_coeff: byte_mul(self.drift_coeff, geometric),
        }
    }
}

/// Maps a lane multiplier to the coefficients of one step.
pub trait StepPolicy {
    fn coefficients(&self, multiplier: u8) -> StepCoefficients;
}

impl<P: StepPolicy + ?Sized> StepPolicy for &P {
    fn coefficients(&self, multiplier: u8) -> StepCoefficients {
        (**self).coefficients(multiplier)
    }
}

/// `y = a*x + d`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AffineStep;

impl StepPolicy for AffineStep {
    fn coefficients(&self, multiplier: u8) -> StepCoefficients {
        StepCoefficients::new(multiplier, 1)
    }
}

/// Each coefficient is a sum of multiplier powers.
///
/// `x_exponents = [4]`, `drift_exponents = [3, 2, 1, 0]` is four affine
/// steps folded into one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolynomialStep {
    pub x_exponents: Vec<u32>,
    pub drift_exponents: Vec<u32>,
}

impl PolynomialStep {
    pub fn new(x_exponents: Vec<u32>, drift_exponents: Vec<u32>) -> Self {
        Self {
            x_exponents,
            drift_exponents,
        }
    }

    fn power_sum(multiplier: u8, exponents: &[u32]) -> u8 {
        exponents
            .iter()
            .fold(0u8, |acc, &e| byte_add(acc, byte_pow(multiplier, e)))
    }
}

impl StepPolicy for PolynomialStep {
    fn coefficients(&self, multiplier: u8) -> StepCoefficients {
        StepCoefficients {
            x_coeff: Self::power_sum(multiplier, &self.x_exponents),
            drift_coeff: Self::power_sum(multiplier, &self.drift_exponents),
        }
    }
}

/// Serializable choice of policy, as it appears in configuration and
/// proposal files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StepKind {
    Affine,
    Polynomial(PolynomialStep),
}

impl Default for StepKind {
    fn default() -> Self {
        StepKind::Affine
    }
}

impl StepPolicy for StepKind {
    fn coefficients(&self, multiplier: u8) -> StepCoefficients {
        match self {
            StepKind::Affine => AffineStep.coefficients(multiplier),
            StepKind::Polynomial(p) => p.coefficients(multiplier),
        }
    }
}

/// One step of `policy` from `x` with `drift`.
pub fn apply_step<P: StepPolicy + ?Sized>(policy: &P, x: u8, multiplier: u8, drift: u8) -> u8 {
    policy.coefficients(multiplier).apply(x, drift)
}
