//! Per-lane multiplier diagnostics.
//!
//! A lane whose multiplier shares a factor with 256 loses information on
//! every step. A factor of 2 is survivable (two preimages, reduced-ring
//! solves) when the lane is known to be even; any larger factor, or an
//! unexpected even multiplier, usually means the model is wrong.

use address_verify::arith::byte_gcd;
use serde::Serialize;

use crate::lanes::Lane;
use crate::model::CalibrationModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MultiplierClass {
    /// `gcd = 1`.
    Invertible,
    /// `gcd = 2` on a lane listed as even.
    ReducedRing,
    /// `gcd = 2` on a lane nobody listed.
    UnexpectedEven,
    /// `gcd >= 4`.
    Degenerate,
}

impl MultiplierClass {
    pub fn is_problem(self) -> bool {
        matches!(self, MultiplierClass::UnexpectedEven | MultiplierClass::Degenerate)
    }

    pub fn tag(self) -> &'static str {
        match self {
            MultiplierClass::Invertible => "invertible",
            MultiplierClass::ReducedRing => "reduced_ring",
            MultiplierClass::UnexpectedEven => "unexpected_even",
            MultiplierClass::Degenerate => "degenerate",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LaneDiagnostic {
    pub lane: Lane,
    pub multiplier: u8,
    pub gcd: u32,
    pub class: MultiplierClass,
}

/// Classify every lane's multiplier. `even_lanes` are the lanes expected
/// to carry a multiplier with `gcd = 2`.
pub fn diagnose_multipliers(model: &CalibrationModel, even_lanes: &[Lane]) -> Vec<LaneDiagnostic> {
    Lane::all()
        .map(|lane| {
            let multiplier = model.multiplier(lane);
            let gcd = byte_gcd(multiplier);
            let class = match gcd {
                1 => MultiplierClass::Invertible,
                2 if even_lanes.contains(&lane) => MultiplierClass::ReducedRing,
                2 => MultiplierClass::UnexpectedEven,
                _ => MultiplierClass::Degenerate,
            };
            LaneDiagnostic {
                lane,
                multiplier,
                gcd,
                class,
            }
        })
        .collect()
}
