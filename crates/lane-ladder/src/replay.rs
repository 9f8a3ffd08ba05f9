//! Model replay over consecutive known values.
//!
//! Forward: predict `value(i + 1)` from `value(i)` one step at a time, with
//! the drift of the regime index `i` falls in.
//! Reverse: recover `value(i)` from `value(i + 1)`. Invertible multipliers
//! use the inverse; multipliers sharing a factor of 2 with 256 have two
//! preimages and the one at or below `0x7F` is taken; anything with a
//! larger common factor is not recoverable and is skipped.

use address_verify::arith::{byte_gcd, byte_inverse, byte_mul, byte_sub, small_mod_inverse, BYTE_MODULUS};
use address_verify::U256;
use serde::Serialize;

use crate::known::{consecutive_pairs, KnownValues};
use crate::lanes::{decompose, recompose, LanePosition};
use crate::model::{CalibrationModel, Regime};
use crate::step::{StepCoefficients, StepPolicy};

/// Default number of indices sharing one occurrence.
pub const DEFAULT_OCCURRENCE_SPAN: u64 = 32;

/// One step of the whole value using the drift of `regime`.
pub fn advance<P: StepPolicy + ?Sized>(model: &CalibrationModel, policy: &P, value: &U256, regime: Regime) -> U256 {
    let bytes = decompose(value);
    let mut next = bytes;
    for (position, x) in bytes.iter() {
        let c = policy.coefficients(model.multiplier(position.lane));
        next.set(position, c.apply(x, model.drift_at(regime, position.lane).value));
    }
    recompose(&next)
}

/// `x` with `c.apply(x, drift) == y`, where one is recoverable.
pub fn recover_previous(c: StepCoefficients, y: u8, drift: u8) -> Option<u8> {
    let rhs = byte_sub(y, byte_mul(c.drift_coeff, drift));
    match byte_gcd(c.x_coeff) {
        1 => byte_inverse(c.x_coeff).ok().map(|inv| byte_mul(rhs, inv)),
        2 => {
            if rhs & 1 == 1 {
                return None;
            }
            let half = BYTE_MODULUS / 2;
            let inv = small_mod_inverse((c.x_coeff >> 1) as u32, half).ok()?;
            Some(((((rhs >> 1) as u32) * inv) % half) as u8)
        }
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Reverse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayMismatch {
    pub index: u64,
    pub position: LanePosition,
    pub direction: Direction,
    pub expected: u8,
    pub found: u8,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReplayReport {
    /// Consecutive known pairs inside the model range.
    pub transitions: usize,
    pub forward_matches: usize,
    pub reverse_matches: usize,
    /// Bytes whose preimage is not unique enough to recover.
    pub reverse_skipped: usize,
    pub mismatches: Vec<ReplayMismatch>,
}

impl ReplayReport {
    pub fn bytes_checked(&self) -> usize {
        self.transitions * crate::lanes::POSITION_COUNT
    }

    pub fn is_clean(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Check the model against every consecutive known pair in its range.
pub fn replay<P, K>(model: &CalibrationModel, policy: &P, known: &K, occurrence_span: u64) -> ReplayReport
where
    P: StepPolicy + ?Sized,
    K: KnownValues + ?Sized,
{
    let range = model.range();
    let mut report = ReplayReport::default();

    for (index, current, next) in consecutive_pairs(known, range.start, range.end) {
        let Some(regime) = model.regime_for_index(index, occurrence_span) else {
            continue;
        };
        report.transitions += 1;

        let x_bytes = decompose(&current);
        let y_bytes = decompose(&next);

        for position in LanePosition::all() {
            let c = policy.coefficients(model.multiplier(position.lane));
            let drift = model.drift_at(regime, position.lane).value;
            let (x, y) = (x_bytes.get(position), y_bytes.get(position));

            let predicted = c.apply(x, drift);
            if predicted == y {
                report.forward_matches += 1;
            } else {
                report.mismatches.push(ReplayMismatch {
                    index,
                    position,
                    direction: Direction::Forward,
                    expected: y,
                    found: predicted,
                });
            }

            match recover_previous(c, y, drift) {
                Some(recovered) if recovered == x => report.reverse_matches += 1,
                Some(recovered) => report.mismatches.push(ReplayMismatch {
                    index,
                    position,
                    direction: Direction::Reverse,
                    expected: x,
                    found: recovered,
                }),
                None => report.reverse_skipped += 1,
            }
        }
    }

    report
}
