//! Bridge validator.
//!
//! Two known values `n` steps apart constrain an unknown value `m` steps
//! after the earlier one. Per lane with one-step coefficients `(C1, C2)`,
//! for each of its two bytes:
//!
//! ```text
//! x_n = C1^n x_0 + Σ_{i<n} C1^(n-1-i) C2 d_i          (mod 256)
//! x_m = C1^m x_0 + Σ_{i<m} C1^(m-1-i) C2 d_i
//! ```
//!
//! Drifts of known regimes are fixed; the others are free inside finite
//! caller-supplied bounds. Both bytes of a lane share every drift, so an
//! assignment of the free drifts survives only when it lands both bytes on
//! `x_n`, and yields one candidate byte pair `x_m`. The cartesian product of
//! candidate pairs over all 16 lanes is handed to the [`Verifier`], which
//! alone decides which candidates are real.

use std::collections::BTreeSet;

use address_verify::{CandidateKey, Verifier, U256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::lanes::{decompose, recompose, Lane, LaneBytes, LANE_COUNT};
use crate::model::{CalibrationModel, Phase, Regime};
use crate::step::StepPolicy;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("target index {target} is not strictly between {earlier} and {later}")]
    TargetOutOfRange { earlier: u64, later: u64, target: u64 },

    #[error("schedule has {found} steps, the bridge spans {expected}")]
    ScheduleLength { expected: u64, found: usize },

    #[error("occurrence {occurrence} is not in the model")]
    MissingOccurrence { occurrence: u32 },

    #[error("lane {lane}: drift bounds {min}..={max} are empty")]
    EmptyBounds { lane: Lane, min: u8, max: u8 },

    #[error("lane {lane}: {assignments} drift assignments exceed the per-lane limit {limit}")]
    SearchSpaceTooLarge {
        lane: Lane,
        assignments: u128,
        limit: u64,
    },

    #[error("{candidates} candidates exceed the limit {limit}")]
    TooManyCandidates { candidates: u128, limit: u64 },
}

// ============================================================================
// REQUEST
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnownPoint {
    pub index: u64,
    pub value: U256,
}

/// Inclusive drift range of one lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftRange {
    pub min: u8,
    pub max: u8,
}

impl DriftRange {
    pub const FULL: DriftRange = DriftRange { min: 0, max: u8::MAX };

    pub fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn exact(value: u8) -> Self {
        Self::new(value, value)
    }

    pub fn len(&self) -> u32 {
        if self.min > self.max {
            0
        } else {
            (self.max - self.min) as u32 + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drift ranges for all 16 lanes of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftBounds {
    ranges: [DriftRange; LANE_COUNT],
}

impl DriftBounds {
    pub fn uniform(range: DriftRange) -> Self {
        Self {
            ranges: [range; LANE_COUNT],
        }
    }

    pub fn get(&self, lane: Lane) -> DriftRange {
        self.ranges[lane.index()]
    }

    pub fn set(&mut self, lane: Lane, range: DriftRange) {
        self.ranges[lane.index()] = range;
    }

    /// Bounds from the authoritative drift already seen in `occurrences`
    /// (in order, both phases each): the min/max per lane, widened on both
    /// sides by the largest change between consecutive values, clamped to
    /// `0..=255`. Unsolved and best-effort slots are skipped; a lane with
    /// no authoritative history gets the full range.
    pub fn from_history(model: &CalibrationModel, occurrences: &[u32]) -> Result<Self, BridgeError> {
        for &occurrence in occurrences {
            if model.drift_table(occurrence).is_none() {
                return Err(BridgeError::MissingOccurrence { occurrence });
            }
        }

        let mut bounds = Self::uniform(DriftRange::FULL);
        for lane in Lane::all() {
            let values: Vec<u8> = occurrences
                .iter()
                .flat_map(|&o| Phase::ALL.map(|phase| model.drift_at(Regime::new(o, phase), lane)))
                .filter(|entry| entry.tag.is_authoritative())
                .map(|entry| entry.value)
                .collect();
            let (Some(lo), Some(hi)) = (values.iter().copied().min(), values.iter().copied().max()) else {
                continue;
            };
            let growth = values
                .windows(2)
                .map(|w| w[0].abs_diff(w[1]))
                .max()
                .unwrap_or(0);
            bounds.set(lane, DriftRange::new(lo.saturating_sub(growth), hi.saturating_add(growth)));
        }
        Ok(bounds)
    }
}

/// Drift of one step of the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepDrift {
    /// Taken from the model.
    Known(Regime),
    /// Free inside the bounds.
    Unknown(DriftBounds),
}

/// Finite enumeration budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchLimits {
    /// Most free-drift assignments tried for one lane.
    pub per_lane: u64,
    /// Most full candidates handed to the verifier.
    pub total_candidates: u64,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            per_lane: 1 << 16,
            total_candidates: 1 << 12,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeRequest {
    pub earlier: KnownPoint,
    pub later: KnownPoint,
    pub target_index: u64,
    /// One entry per step from `earlier` to `later`.
    pub schedule: Vec<StepDrift>,
    pub limits: SearchLimits,
}

// ============================================================================
// OUTCOME
// ============================================================================

/// What the search found for one lane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LaneSummary {
    pub lane: Lane,
    pub assignments: u64,
    /// Candidate `[low, high]` byte pairs at the target, sorted.
    pub candidates: Vec<[u8; 2]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BridgeOutcome {
    pub target_index: u64,
    /// Candidates the verifier confirmed.
    pub confirmed: Vec<CandidateKey>,
    /// Candidates handed to the verifier.
    pub examined: u64,
    /// Candidates outside the scalar range, never derived.
    pub rejected: u64,
    pub summary: Vec<LaneSummary>,
}

impl BridgeOutcome {
    pub fn is_confirmed(&self) -> bool {
        !self.confirmed.is_empty()
    }

    /// Lanes that admit no byte pair at all.
    pub fn dead_lanes(&self) -> impl Iterator<Item = Lane> + '_ {
        self.summary
            .iter()
            .filter(|s| s.candidates.is_empty())
            .map(|s| s.lane)
    }
}

// ============================================================================
// VALIDATOR
// ============================================================================

pub struct BridgeValidator<'a, P> {
    model: &'a CalibrationModel,
    policy: P,
    verifier: &'a Verifier,
}

impl<'a, P: StepPolicy> BridgeValidator<'a, P> {
    pub fn new(model: &'a CalibrationModel, policy: P, verifier: &'a Verifier) -> Self {
        Self {
            model,
            policy,
            verifier,
        }
    }

    /// Candidate byte pairs for every lane, without touching the verifier.
    pub fn candidate_bytes(&self, request: &BridgeRequest) -> Result<Vec<LaneSummary>, BridgeError> {
        let offset = check_request(request)?;
        for step in &request.schedule {
            if let StepDrift::Known(regime) = step {
                if self.model.drift_table(regime.occurrence).is_none() {
                    return Err(BridgeError::MissingOccurrence {
                        occurrence: regime.occurrence,
                    });
                }
            }
        }

        let x0 = decompose(&request.earlier.value);
        let xn = decompose(&request.later.value);

        Lane::all()
            .map(|lane| self.lane_candidates(request, lane, x0.lane_pair(lane), xn.lane_pair(lane), offset))
            .collect()
    }

    fn lane_candidates(
        &self,
        request: &BridgeRequest,
        lane: Lane,
        x0: [u8; 2],
        xn: [u8; 2],
        offset: usize,
    ) -> Result<LaneSummary, BridgeError> {
        let c = self.policy.coefficients(self.model.multiplier(lane));

        let ranges: Vec<Option<DriftRange>> = request
            .schedule
            .iter()
            .map(|step| match step {
                StepDrift::Known(_) => None,
                StepDrift::Unknown(bounds) => Some(bounds.get(lane)),
            })
            .collect();

        let mut assignments: u128 = 1;
        for range in ranges.iter().flatten() {
            if range.is_empty() {
                return Err(BridgeError::EmptyBounds {
                    lane,
                    min: range.min,
                    max: range.max,
                });
            }
            assignments = assignments.saturating_mul(range.len() as u128);
        }
        if assignments > request.limits.per_lane as u128 {
            return Err(BridgeError::SearchSpaceTooLarge {
                lane,
                assignments,
                limit: request.limits.per_lane,
            });
        }

        // current value of each free drift, starting at its minimum
        let mut free: Vec<u8> = ranges.iter().flatten().map(|r| r.min).collect();
        let mut found = BTreeSet::new();

        for _ in 0..assignments {
            let mut x = x0;
            let mut at_target = x0;
            let mut free_iter = free.iter();
            for (i, step) in request.schedule.iter().enumerate() {
                if i == offset {
                    at_target = x;
                }
                let d = match step {
                    StepDrift::Known(regime) => self.model.drift_at(*regime, lane).value,
                    StepDrift::Unknown(_) => free_iter.next().copied().unwrap_or(0),
                };
                x = x.map(|byte| c.apply(byte, d));
            }
            if x == xn {
                found.insert(at_target);
            }
            advance_odometer(&mut free, ranges.iter().flatten());
        }

        Ok(LaneSummary {
            lane,
            assignments: assignments as u64,
            candidates: found.into_iter().collect(),
        })
    }

    /// Enumerate candidates and keep the ones the verifier confirms.
    pub fn validate(&self, request: &BridgeRequest, target_address: &str) -> Result<BridgeOutcome, BridgeError> {
        let summary = self.candidate_bytes(request)?;

        let total = summary
            .iter()
            .fold(1u128, |acc, s| acc.saturating_mul(s.candidates.len() as u128));
        if total > request.limits.total_candidates as u128 {
            return Err(BridgeError::TooManyCandidates {
                candidates: total,
                limit: request.limits.total_candidates,
            });
        }

        let mut confirmed = Vec::new();
        let mut examined = 0u64;
        let mut rejected = 0u64;

        if total > 0 {
            let mut digits = [0usize; LANE_COUNT];
            loop {
                let mut bytes = LaneBytes::default();
                for (s, &digit) in summary.iter().zip(digits.iter()) {
                    bytes.set_lane_pair(s.lane, s.candidates[digit]);
                }
                let scalar = recompose(&bytes);
                examined += 1;

                match self.verifier.candidate(&scalar, target_address) {
                    Ok(candidate) if candidate.matches => confirmed.push(candidate),
                    Ok(_) => {}
                    Err(_) => rejected += 1,
                }

                if !next_combination(&mut digits, &summary) {
                    break;
                }
            }
        }

        Ok(BridgeOutcome {
            target_index: request.target_index,
            confirmed,
            examined,
            rejected,
            summary,
        })
    }
}

/// Offset of the target from the earlier point.
fn check_request(request: &BridgeRequest) -> Result<usize, BridgeError> {
    let (earlier, later, target) = (request.earlier.index, request.later.index, request.target_index);
    if !(earlier < target && target < later) {
        return Err(BridgeError::TargetOutOfRange { earlier, later, target });
    }
    let expected = later - earlier;
    if request.schedule.len() as u64 != expected {
        return Err(BridgeError::ScheduleLength {
            expected,
            found: request.schedule.len(),
        });
    }
    Ok((target - earlier) as usize)
}

/// Step the free drifts to the next assignment, last drift fastest.
fn advance_odometer<'r>(free: &mut [u8], ranges: impl DoubleEndedIterator<Item = &'r DriftRange>) {
    for (value, range) in free.iter_mut().rev().zip(ranges.rev()) {
        if *value < range.max {
            *value += 1;
            return;
        }
        *value = range.min;
    }
}

/// Mixed-radix increment over the per-lane candidate lists.
fn next_combination(digits: &mut [usize; LANE_COUNT], summary: &[LaneSummary]) -> bool {
    for (digit, s) in digits.iter_mut().zip(summary.iter()).rev() {
        if *digit + 1 < s.candidates.len() {
            *digit += 1;
            return true;
        }
        *digit = 0;
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DriftEntry, DriftSlot, DriftTag, IndexRange};
    use crate::replay::advance;
    use crate::step::AffineStep;

    const EVEN_LANE: u8 = 3;

    fn lane(n: u8) -> Lane {
        Lane::new(n).unwrap()
    }

    fn first(occurrence: u32) -> Regime {
        Regime::new(occurrence, Phase::First)
    }

    /// Lane 3 uses 182 (two preimages per step), every other lane 91.
    fn model() -> CalibrationModel {
        let mut model = CalibrationModel::initial(IndexRange::new(100, 110), 91);
        model.set_multiplier(lane(EVEN_LANE), 182);
        let table = model.drift_table_mut(1);
        for slot in DriftSlot::all() {
            let value = 200 - slot.lane.get() * 2 - slot.phase.index() as u8;
            table.set(slot, DriftEntry::new(value, DriftTag::ClosedForm));
        }
        model
    }

    /// Model whose occurrence 0 holds the hidden drift of the first step.
    fn hidden_step(model: &CalibrationModel) -> CalibrationModel {
        let mut truth = model.clone();
        let table = truth.drift_table_mut(0);
        for slot in DriftSlot::all() {
            let value = slot.lane.get() * 2 + slot.phase.index() as u8 + 1;
            table.set(slot, DriftEntry::new(value, DriftTag::ClosedForm));
        }
        truth
    }

    struct Fixture {
        model: CalibrationModel,
        request: BridgeRequest,
        middle: U256,
    }

    fn fixture() -> Fixture {
        let model = model();
        let truth = hidden_step(&model);
        let x0 = U256::from_hex("1a838b13505b26867").unwrap();
        let x1 = advance(&truth, &AffineStep, &x0, first(0));
        let x2 = advance(&truth, &AffineStep, &x1, first(1));

        let request = BridgeRequest {
            earlier: KnownPoint { index: 100, value: x0 },
            later: KnownPoint { index: 102, value: x2 },
            target_index: 101,
            schedule: vec![
                StepDrift::Unknown(DriftBounds::uniform(DriftRange::FULL)),
                StepDrift::Known(first(1)),
            ],
            limits: SearchLimits {
                per_lane: 256,
                total_candidates: 16,
            },
        };
        Fixture {
            model,
            request,
            middle: x1,
        }
    }

    #[test]
    fn test_candidate_pairs_per_lane() {
        let f = fixture();
        let verifier = Verifier::bitcoin_mainnet();
        let summary = BridgeValidator::new(&f.model, AffineStep, &verifier)
            .candidate_bytes(&f.request)
            .unwrap();
        let middle = decompose(&f.middle);

        assert_eq!(summary.len(), LANE_COUNT);
        for s in &summary {
            assert_eq!(s.assignments, 256);
            assert!(s.candidates.contains(&middle.lane_pair(s.lane)), "lane {}", s.lane);
            let expected = if s.lane.get() == EVEN_LANE { 2 } else { 1 };
            assert_eq!(s.candidates.len(), expected, "lane {}", s.lane);
        }
        // drift d and d + 128 both land: the pairs differ by 128 in each byte
        let even = &summary[EVEN_LANE as usize].candidates;
        assert_eq!(even[1][0].wrapping_sub(even[0][0]), 128);
        assert_eq!(even[1][1].wrapping_sub(even[0][1]), 128);
    }

    #[test]
    fn test_verifier_picks_the_true_middle() {
        let f = fixture();
        let verifier = Verifier::bitcoin_mainnet();
        let target = verifier.address(&f.middle).unwrap();

        let outcome = BridgeValidator::new(&f.model, AffineStep, &verifier)
            .validate(&f.request, &target)
            .unwrap();
        // one even lane with two pairs
        assert_eq!(outcome.examined, 2);
        assert_eq!(outcome.confirmed.len(), 1);
        assert_eq!(outcome.confirmed[0].scalar, f.middle);
        assert!(outcome.is_confirmed());
    }

    #[test]
    fn test_wrong_target_gives_empty_set_with_summary() {
        let f = fixture();
        let verifier = Verifier::bitcoin_mainnet();
        let outcome = BridgeValidator::new(&f.model, AffineStep, &verifier)
            .validate(&f.request, "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH")
            .unwrap();
        assert!(outcome.confirmed.is_empty());
        assert_eq!(outcome.examined, 2);
        assert_eq!(outcome.summary.len(), LANE_COUNT);
        assert_eq!(outcome.dead_lanes().count(), 0);
    }

    #[test]
    fn test_unreachable_later_value_reports_dead_lanes() {
        let mut f = fixture();
        // a known-only schedule cannot absorb a changed later byte
        f.request.schedule = vec![StepDrift::Known(first(1)), StepDrift::Known(first(1))];
        let verifier = Verifier::bitcoin_mainnet();
        let outcome = BridgeValidator::new(&f.model, AffineStep, &verifier)
            .validate(&f.request, "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH")
            .unwrap();
        assert_eq!(outcome.examined, 0);
        assert!(outcome.dead_lanes().count() > 0);
    }

    #[test]
    fn test_limits_are_enforced() {
        let mut f = fixture();
        let verifier = Verifier::bitcoin_mainnet();
        let validator = BridgeValidator::new(&f.model, AffineStep, &verifier);

        f.request.limits.per_lane = 100;
        assert!(matches!(
            validator.validate(&f.request, "x"),
            Err(BridgeError::SearchSpaceTooLarge { assignments: 256, limit: 100, .. })
        ));

        f.request.limits = SearchLimits {
            per_lane: 256,
            total_candidates: 1,
        };
        assert!(matches!(
            validator.validate(&f.request, "x"),
            Err(BridgeError::TooManyCandidates { candidates: 2, limit: 1 })
        ));
    }

    #[test]
    fn test_request_shape_errors() {
        let mut f = fixture();
        let verifier = Verifier::bitcoin_mainnet();
        let validator = BridgeValidator::new(&f.model, AffineStep, &verifier);

        f.request.target_index = 102;
        assert!(matches!(
            validator.validate(&f.request, "x"),
            Err(BridgeError::TargetOutOfRange { .. })
        ));

        f.request.target_index = 101;
        f.request.schedule.pop();
        assert!(matches!(
            validator.validate(&f.request, "x"),
            Err(BridgeError::ScheduleLength { expected: 2, found: 1 })
        ));

        f.request.schedule.push(StepDrift::Known(first(9)));
        assert!(matches!(
            validator.validate(&f.request, "x"),
            Err(BridgeError::MissingOccurrence { occurrence: 9 })
        ));

        f.request.schedule[1] = StepDrift::Known(first(1));
        f.request.schedule[0] = StepDrift::Unknown(DriftBounds::uniform(DriftRange::new(9, 3)));
        assert!(matches!(
            validator.validate(&f.request, "x"),
            Err(BridgeError::EmptyBounds { min: 9, max: 3, .. })
        ));
    }

    fn set(model: &mut CalibrationModel, occurrence: u32, n: u8, phase: Phase, value: u8, tag: DriftTag) {
        model
            .drift_table_mut(occurrence)
            .set(DriftSlot::new(lane(n), phase), DriftEntry::new(value, tag));
    }

    #[test]
    fn test_bounds_from_history() {
        let mut model = CalibrationModel::initial(IndexRange::new(0, 100), 91);
        set(&mut model, 0, 0, Phase::First, 10, DriftTag::Recorded);
        set(&mut model, 1, 0, Phase::First, 20, DriftTag::Recorded);
        set(&mut model, 2, 0, Phase::First, 24, DriftTag::Recorded);

        let bounds = DriftBounds::from_history(&model, &[0, 1, 2]).unwrap();
        // min 10, max 24, largest step 10
        assert_eq!(bounds.get(lane(0)), DriftRange::new(0, 34));

        set(&mut model, 0, 15, Phase::First, 250, DriftTag::Recorded);
        set(&mut model, 1, 15, Phase::First, 240, DriftTag::Recorded);
        let bounds = DriftBounds::from_history(&model, &[0, 1]).unwrap();
        assert_eq!(bounds.get(lane(15)), DriftRange::new(230, 255));

        assert_eq!(DriftBounds::from_history(&model, &[]).unwrap().get(lane(0)), DriftRange::FULL);
        assert!(matches!(
            DriftBounds::from_history(&model, &[7]),
            Err(BridgeError::MissingOccurrence { occurrence: 7 })
        ));
    }

    #[test]
    fn test_bounds_from_history_skip_guesses() {
        let mut model = CalibrationModel::initial(IndexRange::new(0, 100), 91);
        // lane 5: occurrence 0 never solved, 1 and 2 agree
        set(&mut model, 1, 5, Phase::First, 61, DriftTag::ClosedForm);
        set(&mut model, 2, 5, Phase::First, 61, DriftTag::ClosedForm);
        // lane 6: a best-effort guess before the exact value
        set(&mut model, 1, 6, Phase::First, 3, DriftTag::BestEffort);
        set(&mut model, 2, 6, Phase::First, 61, DriftTag::ClosedForm);
        // lane 8: both phases of one occurrence
        set(&mut model, 1, 8, Phase::First, 40, DriftTag::ClosedForm);
        set(&mut model, 1, 8, Phase::Second, 44, DriftTag::BruteForce);

        let bounds = DriftBounds::from_history(&model, &[0, 1, 2]).unwrap();
        assert_eq!(bounds.get(lane(5)), DriftRange::exact(61));
        assert_eq!(bounds.get(lane(6)), DriftRange::exact(61));
        assert_eq!(bounds.get(lane(8)), DriftRange::new(36, 48));
        // lane 7 has no solved history at all
        assert_eq!(bounds.get(lane(7)), DriftRange::FULL);
    }

    #[test]
    fn test_narrow_bounds_shrink_assignments() {
        let mut f = fixture();
        let mut bounds = DriftBounds::uniform(DriftRange::FULL);
        bounds.set(lane(0), DriftRange::exact(1));
        f.request.schedule[0] = StepDrift::Unknown(bounds);

        let verifier = Verifier::bitcoin_mainnet();
        let summary = BridgeValidator::new(&f.model, AffineStep, &verifier)
            .candidate_bytes(&f.request)
            .unwrap();
        assert_eq!(summary[0].assignments, 1);
        // the hidden first-phase drift of lane 0 is 1, so the single assignment survives
        assert_eq!(summary[0].candidates.len(), 1);
    }
}
