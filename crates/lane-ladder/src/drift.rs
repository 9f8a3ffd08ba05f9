//! Drift solver.
//!
//! Solves `y = c1*x + c2*d (mod 256)` for `d`, where `(c1, c2)` are the
//! coefficients of the declared step policy composed over the transition's
//! step count. A lane contributes one sample per half; both share the drift,
//! so every candidate is checked against all of them.
//!
//! # Solve chain
//!
//! | `g = gcd(c2, 256)` | Path | Status |
//! |---|---|---|
//! | 1 | `d = c2⁻¹ (y - c1 x)` | `Solved(ClosedForm)` |
//! | 2 | halve, invert in Z/128, roots `d0`, `d0 + 128` | `Solved(ReducedRing)` |
//! | other, or a path above failed | scan `0..=255` for an exact drift | `Fallback(BruteForce)` |
//! | no exact drift | least worst-case `\|prediction - y\|` | `Fallback(BestEffort)` or `Inconsistent` when strict |
//!
//! The solver is pure. Every path it tried is returned in
//! [`DriftSolution::attempts`]; reporting is the caller's job.

use std::fmt;

use address_verify::arith::{byte_gcd, byte_sub, small_mod_inverse, BYTE_MODULUS};
use address_verify::U256;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lanes::{decompose, Lane};
use crate::model::CalibrationModel;
use crate::step::{StepCoefficients, StepPolicy};

// ============================================================================
// ERRORS
// ============================================================================

/// Why a solve path did not produce an exact drift.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum DriftError {
    #[error("{coefficient} has no inverse modulo {modulus}")]
    NoInverse { coefficient: u32, modulus: u32 },

    #[error("{coefficient}*d = {rhs} (mod 256) has no solution")]
    Inconsistent { coefficient: u8, rhs: u8 },

    #[error("no drift in 0..=255 reproduces {count} byte(s)")]
    NoSolution { count: usize },

    #[error("drift {drift} predicts {predicted}, observed {observed}")]
    ValidationFailed { drift: u8, predicted: u8, observed: u8 },
}

// ============================================================================
// RESULT TYPES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolvedBy {
    ClosedForm,
    ReducedRing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FallbackReason {
    /// Exact drift found by exhaustive scan.
    BruteForce,
    /// No exact drift; `error` is the absolute prediction error.
    BestEffort { error: u8 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "via", rename_all = "snake_case")]
pub enum SolveStatus {
    Solved(SolvedBy),
    Fallback(FallbackReason),
    Inconsistent,
}

impl SolveStatus {
    /// Stable lowercase name, used in logs and reports.
    pub fn tag(&self) -> &'static str {
        match self {
            SolveStatus::Solved(SolvedBy::ClosedForm) => "closed_form",
            SolveStatus::Solved(SolvedBy::ReducedRing) => "reduced_ring",
            SolveStatus::Fallback(FallbackReason::BruteForce) => "brute_force",
            SolveStatus::Fallback(FallbackReason::BestEffort { .. }) => "best_effort",
            SolveStatus::Inconsistent => "inconsistent",
        }
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolvePath {
    ClosedForm,
    ReducedRing,
    BruteForce,
    BestEffort,
}

/// One step of the solve chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attempt {
    pub path: SolvePath,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<DriftError>,
}

impl Attempt {
    fn ok(path: SolvePath) -> Self {
        Self { path, failure: None }
    }

    fn failed(path: SolvePath, failure: DriftError) -> Self {
        Self {
            path,
            failure: Some(failure),
        }
    }
}

/// One observed byte: `x` became `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteSample {
    pub x: u8,
    pub y: u8,
}

impl ByteSample {
    pub fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }
}

/// Solver output for one lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftSolution {
    pub samples: Vec<ByteSample>,
    pub coefficients: StepCoefficients,
    pub drift: u8,
    /// Other exact drifts (the second reduced-ring root).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alternates: Vec<u8>,
    pub status: SolveStatus,
    pub attempts: Vec<Attempt>,
}

impl DriftSolution {
    /// What `drift` predicts for each sample.
    pub fn predictions(&self) -> Vec<u8> {
        self.samples
            .iter()
            .map(|s| self.coefficients.apply(s.x, self.drift))
            .collect()
    }

    /// Largest absolute prediction error over the samples.
    pub fn error(&self) -> u8 {
        max_error(self.coefficients, &self.samples, self.drift)
    }

    /// Whether `drift` reproduces every sample.
    pub fn is_exact(&self) -> bool {
        self.error() == 0
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.status, SolveStatus::Fallback(_))
    }
}

// ============================================================================
// PURE SOLVER
// ============================================================================

/// Solve one byte for `coefficients`.
pub fn solve_coefficients(coefficients: StepCoefficients, x: u8, y: u8, strict: bool) -> DriftSolution {
    solve_samples(coefficients, &[ByteSample::new(x, y)], strict)
}

/// Solve one drift shared by every sample.
///
/// Candidates come from the first sample and must reproduce all of them.
/// With `strict`, samples no drift reproduces are `Inconsistent` instead of
/// a best-effort guess.
pub fn solve_samples(coefficients: StepCoefficients, samples: &[ByteSample], strict: bool) -> DriftSolution {
    let solution = |drift: u8, alternates: Vec<u8>, status: SolveStatus, attempts: Vec<Attempt>| DriftSolution {
        samples: samples.to_vec(),
        coefficients,
        drift,
        alternates,
        status,
        attempts,
    };

    let Some(&first) = samples.first() else {
        return solution(
            0,
            Vec::new(),
            SolveStatus::Fallback(FallbackReason::BruteForce),
            vec![Attempt::ok(SolvePath::BruteForce)],
        );
    };

    let drift_coeff = coefficients.drift_coeff;
    let rhs = byte_sub(first.y, coefficients.apply(first.x, 0));
    let mut attempts = Vec::new();

    match byte_gcd(drift_coeff) {
        1 => match closed_form(coefficients, samples, rhs) {
            Ok(d) => {
                attempts.push(Attempt::ok(SolvePath::ClosedForm));
                return solution(d, Vec::new(), SolveStatus::Solved(SolvedBy::ClosedForm), attempts);
            }
            Err(e) => attempts.push(Attempt::failed(SolvePath::ClosedForm, e)),
        },
        2 => match reduced_ring(coefficients, samples, rhs) {
            Ok((d, alt)) => {
                attempts.push(Attempt::ok(SolvePath::ReducedRing));
                return solution(d, vec![alt], SolveStatus::Solved(SolvedBy::ReducedRing), attempts);
            }
            Err(e) => attempts.push(Attempt::failed(SolvePath::ReducedRing, e)),
        },
        _ => attempts.push(Attempt::failed(
            SolvePath::ClosedForm,
            DriftError::NoInverse {
                coefficient: drift_coeff as u32,
                modulus: BYTE_MODULUS,
            },
        )),
    }

    match brute_force_exact(coefficients, samples) {
        Ok(d) => {
            attempts.push(Attempt::ok(SolvePath::BruteForce));
            solution(d, Vec::new(), SolveStatus::Fallback(FallbackReason::BruteForce), attempts)
        }
        Err(e) => {
            attempts.push(Attempt::failed(SolvePath::BruteForce, e));
            let (d, error) = best_effort(coefficients, samples);
            attempts.push(Attempt::ok(SolvePath::BestEffort));
            let status = if strict {
                SolveStatus::Inconsistent
            } else {
                SolveStatus::Fallback(FallbackReason::BestEffort { error })
            };
            solution(d, Vec::new(), status, attempts)
        }
    }
}

fn max_error(coefficients: StepCoefficients, samples: &[ByteSample], drift: u8) -> u8 {
    samples
        .iter()
        .map(|s| coefficients.apply(s.x, drift).abs_diff(s.y))
        .max()
        .unwrap_or(0)
}

fn validate(coefficients: StepCoefficients, samples: &[ByteSample], drift: u8) -> Result<u8, DriftError> {
    for s in samples {
        let predicted = coefficients.apply(s.x, drift);
        if predicted != s.y {
            return Err(DriftError::ValidationFailed {
                drift,
                predicted,
                observed: s.y,
            });
        }
    }
    Ok(drift)
}

fn closed_form(coefficients: StepCoefficients, samples: &[ByteSample], rhs: u8) -> Result<u8, DriftError> {
    let c2 = coefficients.drift_coeff as u32;
    let inv = small_mod_inverse(c2, BYTE_MODULUS).map_err(|_| DriftError::NoInverse {
        coefficient: c2,
        modulus: BYTE_MODULUS,
    })?;
    let d = ((rhs as u32 * inv) & 0xFF) as u8;
    validate(coefficients, samples, d)
}

/// `c2 = 2k` with `k` odd: `k*d = rhs/2 (mod 128)` has one root below 128,
/// and `d + 128` solves the original congruence too.
fn reduced_ring(coefficients: StepCoefficients, samples: &[ByteSample], rhs: u8) -> Result<(u8, u8), DriftError> {
    let c2 = coefficients.drift_coeff;
    if rhs & 1 == 1 {
        return Err(DriftError::Inconsistent { coefficient: c2, rhs });
    }

    let half_modulus = BYTE_MODULUS / 2;
    let k = (c2 >> 1) as u32;
    let inv = small_mod_inverse(k, half_modulus).map_err(|_| DriftError::NoInverse {
        coefficient: k,
        modulus: half_modulus,
    })?;
    let d = ((((rhs >> 1) as u32) * inv) % half_modulus) as u8;
    let d = validate(coefficients, samples, d)?;
    let alt = validate(coefficients, samples, d | 0x80)?;
    Ok((d, alt))
}

/// Smallest drift reproducing every sample.
pub fn brute_force_exact(coefficients: StepCoefficients, samples: &[ByteSample]) -> Result<u8, DriftError> {
    (0..=u8::MAX)
        .find(|&d| max_error(coefficients, samples, d) == 0)
        .ok_or(DriftError::NoSolution { count: samples.len() })
}

/// Drift minimizing the worst `|prediction - y|`, smallest drift on ties,
/// with that error. Always defined: the domain is all 256 drifts.
pub fn best_effort(coefficients: StepCoefficients, samples: &[ByteSample]) -> (u8, u8) {
    let mut best = (0u8, u8::MAX);
    for d in 0..=u8::MAX {
        let error = max_error(coefficients, samples, d);
        if error < best.1 {
            best = (d, error);
        }
    }
    if samples.is_empty() {
        best.1 = 0;
    }
    best
}

// ============================================================================
// SOLVER
// ============================================================================

/// Two known values `step_count` steps apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub from: U256,
    pub to: U256,
    pub step_count: u32,
}

/// A solution addressed to its lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaneSolution {
    pub lane: Lane,
    pub solution: DriftSolution,
}

/// All 16 lane solutions of a transition, in lane order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionSolution {
    pub transition: Transition,
    pub solutions: Vec<LaneSolution>,
}

impl TransitionSolution {
    pub fn fallbacks(&self) -> impl Iterator<Item = &LaneSolution> {
        self.solutions.iter().filter(|s| s.solution.is_fallback())
    }

    pub fn inconsistent(&self) -> impl Iterator<Item = &LaneSolution> {
        self.solutions
            .iter()
            .filter(|s| s.solution.status == SolveStatus::Inconsistent)
    }

    pub fn count_with_tag(&self, tag: &str) -> usize {
        self.solutions.iter().filter(|s| s.solution.status.tag() == tag).count()
    }
}

/// Solver bound to a step policy.
#[derive(Debug, Clone)]
pub struct DriftSolver<P> {
    policy: P,
    steps: u32,
    strict: bool,
}

impl<P: StepPolicy> DriftSolver<P> {
    /// Single-step solver, best effort allowed.
    pub fn new(policy: P) -> Self {
        Self {
            policy,
            steps: 1,
            strict: false,
        }
    }

    pub fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn policy(&self) -> &P {
        &self.policy
    }

    /// Coefficients of `steps` policy steps under `multiplier`.
    pub fn coefficients(&self, multiplier: u8, steps: u32) -> StepCoefficients {
        self.policy.coefficients(multiplier).compose(steps)
    }

    /// Drift taking `x` to `y` over the configured step count.
    pub fn solve_drift(&self, multiplier: u8, x: u8, y: u8) -> DriftSolution {
        solve_coefficients(self.coefficients(multiplier, self.steps), x, y, self.strict)
    }

    /// Drift shared by `samples` over the configured step count.
    pub fn solve_lane(&self, multiplier: u8, samples: &[ByteSample]) -> DriftSolution {
        solve_samples(self.coefficients(multiplier, self.steps), samples, self.strict)
    }

    /// Solve every lane of `transition` with the model's lane multipliers.
    /// Each lane's low and high byte must share one drift.
    pub fn solve_transition(&self, model: &CalibrationModel, transition: &Transition) -> TransitionSolution {
        let from = decompose(&transition.from);
        let to = decompose(&transition.to);

        let solutions = Lane::all()
            .map(|lane| {
                let coefficients = self.coefficients(model.multiplier(lane), transition.step_count);
                let [x_low, x_high] = from.lane_pair(lane);
                let [y_low, y_high] = to.lane_pair(lane);
                let samples = [ByteSample::new(x_low, y_low), ByteSample::new(x_high, y_high)];
                LaneSolution {
                    lane,
                    solution: solve_samples(coefficients, &samples, self.strict),
                }
            })
            .collect();

        TransitionSolution {
            transition: *transition,
            solutions,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod tests {
    use super::*;
    use crate::lanes::{recompose, LaneBytes};
    use crate::model::IndexRange;
    use crate::step::{AffineStep, PolynomialStep};
    use proptest::prelude::*;

    fn affine(multiplier: u8, steps: u32) -> StepCoefficients {
        AffineStep.coefficients(multiplier).compose(steps)
    }

    fn lane(n: u8) -> Lane {
        Lane::new(n).unwrap()
    }

    #[test]
    fn test_closed_form_fixture() {
        // 61 = (53 - 91*104) mod 256
        let s = DriftSolver::new(AffineStep).solve_drift(91, 104, 53);
        assert_eq!(s.drift, 61);
        assert_eq!(s.status, SolveStatus::Solved(SolvedBy::ClosedForm));
        assert!(s.is_exact());
        assert_eq!(s.attempts, vec![Attempt::ok(SolvePath::ClosedForm)]);
    }

    #[test]
    fn test_closed_form_composed_even_multiplier() {
        // 182^4 = 16, 1+182+182^2+182^3 = 51 (odd, invertible)
        let s = solve_coefficients(affine(182, 4), 119, 79, false);
        assert_eq!(s.coefficients, StepCoefficients::new(16, 51));
        assert_eq!(s.drift, 165);
        assert_eq!(s.status, SolveStatus::Solved(SolvedBy::ClosedForm));
    }

    #[test]
    fn test_reduced_ring_two_roots() {
        // 5 composed twice: c1 = 25, c2 = 6
        let s = solve_coefficients(affine(5, 2), 10, 36, false);
        assert_eq!(s.coefficients, StepCoefficients::new(25, 6));
        assert_eq!(s.status, SolveStatus::Solved(SolvedBy::ReducedRing));
        assert_eq!(s.drift, 7);
        assert_eq!(s.alternates, vec![135]);
        assert_eq!(s.coefficients.apply(10, 135), 36);
    }

    #[test]
    fn test_reduced_ring_checks_every_sample() {
        let samples = [ByteSample::new(10, 36), ByteSample::new(0, 42)];
        let s = solve_samples(affine(5, 2), &samples, false);
        assert_eq!(s.status, SolveStatus::Solved(SolvedBy::ReducedRing));
        assert_eq!((s.drift, s.alternates.clone()), (7, vec![135]));
        assert_eq!(s.predictions(), vec![36, 42]);
    }

    #[test]
    fn test_reduced_ring_odd_rhs_falls_back_to_best_effort() {
        let s = solve_coefficients(affine(5, 2), 10, 37, false);
        assert_eq!(s.status, SolveStatus::Fallback(FallbackReason::BestEffort { error: 1 }));
        assert_eq!(s.drift, 7);
        assert!(!s.is_exact());

        let paths: Vec<_> = s.attempts.iter().map(|a| a.path).collect();
        assert_eq!(
            paths,
            vec![SolvePath::ReducedRing, SolvePath::BruteForce, SolvePath::BestEffort]
        );
        assert_eq!(
            s.attempts[0].failure,
            Some(DriftError::Inconsistent { coefficient: 6, rhs: 43 })
        );
        assert_eq!(s.attempts[1].failure, Some(DriftError::NoSolution { count: 1 }));
    }

    #[test]
    fn test_halves_that_disagree_fall_back() {
        // the low byte alone gives drift 1; the high byte needs 2
        let samples = [ByteSample::new(0, 1), ByteSample::new(0, 2)];
        let s = solve_samples(affine(91, 1), &samples, false);
        assert_eq!(
            s.attempts[0].failure,
            Some(DriftError::ValidationFailed {
                drift: 1,
                predicted: 1,
                observed: 2
            })
        );
        assert_eq!(s.attempts[1].failure, Some(DriftError::NoSolution { count: 2 }));
        assert_eq!(s.status, SolveStatus::Fallback(FallbackReason::BestEffort { error: 1 }));
        assert_eq!(s.drift, 1);
        assert_eq!(s.error(), 1);

        let strict = solve_samples(affine(91, 1), &samples, true);
        assert_eq!(strict.status, SolveStatus::Inconsistent);
    }

    #[test]
    fn test_strict_reports_inconsistent() {
        let s = DriftSolver::new(AffineStep)
            .with_steps(2)
            .strict(true)
            .solve_drift(5, 10, 37);
        assert_eq!(s.status, SolveStatus::Inconsistent);
        assert_eq!(s.status.tag(), "inconsistent");
    }

    #[test]
    fn test_brute_force_when_gcd_is_large() {
        // 91 composed 4: c1 = 241, c2 = 88, gcd(88, 256) = 8
        let c = affine(91, 4);
        assert_eq!(c, StepCoefficients::new(241, 88));
        assert_eq!(c.apply(60, 41), 148);

        let s = solve_coefficients(c, 60, 148, false);
        assert_eq!(s.status, SolveStatus::Fallback(FallbackReason::BruteForce));
        // smallest of the eight exact drifts 9, 41, 73, ...
        assert_eq!(s.drift, 9);
        assert!(s.is_exact());
        assert_eq!(
            s.attempts[0].failure,
            Some(DriftError::NoInverse {
                coefficient: 88,
                modulus: 256
            })
        );

        let both = solve_samples(c, &[ByteSample::new(60, 148), ByteSample::new(0, 24)], false);
        assert_eq!(both.status, SolveStatus::Fallback(FallbackReason::BruteForce));
        assert_eq!(both.drift, 9);
    }

    #[test]
    fn test_best_effort_fixture() {
        // reachable outputs from x = 60 are 4 (mod 8); 5 is one away from 4
        let s = solve_coefficients(affine(91, 4), 60, 5, false);
        assert_eq!(s.status, SolveStatus::Fallback(FallbackReason::BestEffort { error: 1 }));
        assert_eq!(s.drift, 19);
        assert_eq!(s.predictions(), vec![4]);
    }

    #[test]
    fn test_brute_force_exact_reports_no_solution() {
        assert_eq!(
            brute_force_exact(affine(91, 4), &[ByteSample::new(60, 5)]),
            Err(DriftError::NoSolution { count: 1 })
        );
        assert_eq!(brute_force_exact(affine(91, 1), &[ByteSample::new(104, 53)]), Ok(61));
    }

    #[test]
    fn test_no_samples() {
        let s = solve_samples(affine(91, 1), &[], true);
        assert_eq!(s.drift, 0);
        assert!(s.is_exact());
        assert_eq!(s.status, SolveStatus::Fallback(FallbackReason::BruteForce));
        assert_eq!(best_effort(affine(91, 1), &[]), (0, 0));
    }

    #[test]
    fn test_zero_drift_coefficient() {
        let c = StepCoefficients::new(3, 0);
        let exact = solve_coefficients(c, 10, 30, false);
        assert_eq!(exact.status, SolveStatus::Fallback(FallbackReason::BruteForce));
        assert_eq!(exact.drift, 0);

        let guess = solve_coefficients(c, 10, 33, false);
        assert_eq!(guess.status, SolveStatus::Fallback(FallbackReason::BestEffort { error: 3 }));
    }

    #[test]
    fn test_polynomial_policy_from_config() {
        let folded = PolynomialStep::new(vec![4], vec![3, 2, 1, 0]);
        let s = DriftSolver::new(folded).solve_drift(182, 119, 79);
        assert_eq!(s.drift, 165);
    }

    #[test]
    fn test_solve_transition() {
        let mut model = CalibrationModel::initial(IndexRange::new(0, 10), 91);
        model.set_multiplier(lane(1), 182);

        let mut from = LaneBytes::default();
        let mut to = LaneBytes::default();
        from.set_lane_pair(lane(0), [104, 0]);
        to.set_lane_pair(lane(0), [53, 61]);
        from.set_lane_pair(lane(1), [119, 0]);
        to.set_lane_pair(lane(1), [79, 181]);
        // lane 2: no single drift fits both halves
        to.set_lane_pair(lane(2), [1, 2]);

        let transition = Transition {
            from: recompose(&from),
            to: recompose(&to),
            step_count: 1,
        };
        let solved = DriftSolver::new(AffineStep).solve_transition(&model, &transition);
        assert_eq!(solved.solutions.len(), 16);
        assert_eq!(solved.solutions[0].solution.drift, 61);
        assert_eq!(
            solved.solutions[0].solution.samples,
            vec![ByteSample::new(104, 53), ByteSample::new(0, 61)]
        );

        let lane1 = &solved.solutions[1];
        assert_eq!(lane1.lane, lane(1));
        // one affine step has drift coefficient 1 even for an even multiplier
        assert_eq!(lane1.solution.status, SolveStatus::Solved(SolvedBy::ClosedForm));
        assert_eq!(lane1.solution.drift, 181);

        assert_eq!(solved.count_with_tag("closed_form"), 15);
        let fallbacks: Vec<_> = solved.fallbacks().map(|s| s.lane).collect();
        assert_eq!(fallbacks, vec![lane(2)]);

        let strict = DriftSolver::new(AffineStep).strict(true).solve_transition(&model, &transition);
        assert_eq!(strict.inconsistent().count(), 1);
    }

    #[test]
    fn test_solution_serde_shape() {
        let s = solve_coefficients(affine(91, 4), 60, 148, false);
        let json = serde_json::to_value(&s).unwrap();
        assert_eq!(json["samples"][0]["x"], 60);
        assert_eq!(json["status"]["status"], "fallback");
        assert_eq!(json["status"]["via"]["reason"], "brute_force");
        assert_eq!(json["attempts"][0]["failure"]["error"], "no_inverse");
        let back: DriftSolution = serde_json::from_value(json).unwrap();
        assert_eq!(back, s);
    }

    proptest! {
        #[test]
        fn prop_solved_reproduces_both_halves(
            a in any::<u8>(),
            steps in 1u32..6,
            x_low in any::<u8>(),
            x_high in any::<u8>(),
            d in any::<u8>(),
        ) {
            let c = affine(a, steps);
            let samples = [ByteSample::new(x_low, c.apply(x_low, d)), ByteSample::new(x_high, c.apply(x_high, d))];
            let s = solve_samples(c, &samples, false);
            // a shared drift exists, so the chain always ends exact
            prop_assert!(s.is_exact());
            let is_best_effort = matches!(s.status, SolveStatus::Fallback(FallbackReason::BestEffort { .. }));
            prop_assert!(!is_best_effort);
            for alt in &s.alternates {
                prop_assert_eq!(max_error(c, &samples, *alt), 0);
            }
        }

        #[test]
        fn prop_fallback_is_total(c1 in any::<u8>(), c2 in any::<u8>(), raw in any::<[u8; 4]>()) {
            let c = StepCoefficients::new(c1, c2);
            let samples = [ByteSample::new(raw[0], raw[1]), ByteSample::new(raw[2], raw[3])];
            let s = solve_samples(c, &samples, false);
            prop_assert_ne!(s.status, SolveStatus::Inconsistent);
            if let SolveStatus::Fallback(FallbackReason::BestEffort { error }) = s.status {
                prop_assert_eq!(s.error(), error);
                prop_assert!((0..=u8::MAX).all(|d| max_error(c, &samples, d) >= error));
            } else {
                prop_assert!(s.is_exact());
            }
        }
    }
}
