//! Calibration model: index range, per-lane multipliers and drift tables.
//!
//! # File format
//!
//! ```json
//! {
//!   "range": [70, 75],
//!   "lanes": [0, 1, ..., 15],
//!   "A": { "0": 91, "1": 182, ... },
//!   "Cstar": { "0": { "0": [61, 12], ... } },
//!   "Cstar_tags": { "0": { "0": ["closed_form", "brute_force"], ... } }
//! }
//! ```
//!
//! `Cstar[occurrence][lane]` holds the drift of the two [`Phase`]s of that
//! occurrence. The step starting at index `i` sits `offset = i - start`
//! into the range; it reads occurrence `offset / span` and the first phase
//! while `offset % span` is in the lower half of the span, the second phase
//! after that. Both bytes of a lane use that one drift.
//!
//! The file is first read into the loosely shaped [`CalibrationFile`], then
//! converted with [`TryFrom`] into the fixed-size [`CalibrationModel`].
//! Parse failures are [`ModelError::Corrupt`]; shape violations are
//! [`ModelError::InvalidStructure`]. Lanes absent from a drift table are
//! zero and `unsolved`, never null.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::drift::{FallbackReason, SolveStatus, SolvedBy};
use crate::lanes::{Lane, LANE_COUNT};

/// Drift slots per lane (one per phase).
pub const SLOTS_PER_LANE: usize = 2;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("calibration file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("calibration file already exists: {}", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin} is corrupt: {source}")]
    Corrupt {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid calibration structure: {reason}")]
    InvalidStructure { reason: String },
}

impl ModelError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        ModelError::InvalidStructure {
            reason: reason.into(),
        }
    }
}

// ============================================================================
// DRIFT PROVENANCE
// ============================================================================

/// Where a drift slot's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DriftTag {
    /// Placeholder zero, never solved.
    #[default]
    Unsolved,
    /// Present in a file that carried no tags.
    Recorded,
    ClosedForm,
    ReducedRing,
    BruteForce,
    BestEffort,
}

impl DriftTag {
    /// `false` for placeholders and least-error guesses.
    pub fn is_authoritative(self) -> bool {
        !matches!(self, DriftTag::Unsolved | DriftTag::BestEffort)
    }

    /// Tag for a solver outcome. `None` for inconsistent solutions, which
    /// never enter a model.
    pub fn from_status(status: &SolveStatus) -> Option<DriftTag> {
        match status {
            SolveStatus::Solved(SolvedBy::ClosedForm) => Some(DriftTag::ClosedForm),
            SolveStatus::Solved(SolvedBy::ReducedRing) => Some(DriftTag::ReducedRing),
            SolveStatus::Fallback(FallbackReason::BruteForce) => Some(DriftTag::BruteForce),
            SolveStatus::Fallback(FallbackReason::BestEffort { .. }) => Some(DriftTag::BestEffort),
            SolveStatus::Inconsistent => None,
        }
    }
}

/// One drift slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DriftEntry {
    pub value: u8,
    pub tag: DriftTag,
}

impl DriftEntry {
    pub const UNSOLVED: DriftEntry = DriftEntry {
        value: 0,
        tag: DriftTag::Unsolved,
    };

    pub fn new(value: u8, tag: DriftTag) -> Self {
        Self { value, tag }
    }
}

// ============================================================================
// SLOTS AND REGIMES
// ============================================================================

/// Which half of an occurrence's index span a step falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    First,
    Second,
}

impl Phase {
    pub const ALL: [Phase; SLOTS_PER_LANE] = [Phase::First, Phase::Second];

    /// Slot index in a lane's drift array.
    pub fn index(self) -> usize {
        match self {
            Phase::First => 0,
            Phase::Second => 1,
        }
    }

    /// Phase of the step `offset` indices past the range start.
    pub fn of_offset(offset: u64, span: u64) -> Phase {
        if span == 0 || (offset % span) * 2 < span {
            Phase::First
        } else {
            Phase::Second
        }
    }

    fn name(self) -> &'static str {
        match self {
            Phase::First => "first",
            Phase::Second => "second",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown phase {0:?}, expected \"first\" or \"second\"")]
pub struct InvalidPhase(pub String);

impl FromStr for Phase {
    type Err = InvalidPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first" => Ok(Phase::First),
            "second" => Ok(Phase::Second),
            other => Err(InvalidPhase(other.to_string())),
        }
    }
}

/// One drift slot of a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DriftSlot {
    pub lane: Lane,
    pub phase: Phase,
}

impl DriftSlot {
    pub fn new(lane: Lane, phase: Phase) -> Self {
        Self { lane, phase }
    }

    /// All 32 slots, lane by lane.
    pub fn all() -> impl Iterator<Item = DriftSlot> {
        Lane::all().flat_map(|lane| Phase::ALL.map(|phase| DriftSlot::new(lane, phase)))
    }
}

impl fmt::Display for DriftSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "lane {}/{}", self.lane, self.phase)
    }
}

/// The occurrence and phase whose drift a step uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Regime {
    pub occurrence: u32,
    #[serde(default)]
    pub phase: Phase,
}

impl Regime {
    pub fn new(occurrence: u32, phase: Phase) -> Self {
        Self { occurrence, phase }
    }

    pub fn slot(self, lane: Lane) -> DriftSlot {
        DriftSlot::new(lane, self.phase)
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "occurrence {}/{}", self.occurrence, self.phase)
    }
}

/// Drift of one occurrence: both phases of each of the 16 lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftTable {
    slots: [[DriftEntry; SLOTS_PER_LANE]; LANE_COUNT],
}

impl Default for DriftTable {
    fn default() -> Self {
        Self {
            slots: [[DriftEntry::UNSOLVED; SLOTS_PER_LANE]; LANE_COUNT],
        }
    }
}

impl DriftTable {
    pub fn get(&self, slot: DriftSlot) -> DriftEntry {
        self.slots[slot.lane.index()][slot.phase.index()]
    }

    pub fn set(&mut self, slot: DriftSlot, entry: DriftEntry) {
        self.slots[slot.lane.index()][slot.phase.index()] = entry;
    }

    pub fn lane(&self, lane: Lane) -> [DriftEntry; SLOTS_PER_LANE] {
        self.slots[lane.index()]
    }

    /// Slots whose value is still a guess.
    pub fn non_authoritative(&self) -> impl Iterator<Item = (DriftSlot, DriftEntry)> + '_ {
        DriftSlot::all()
            .map(|slot| (slot, self.get(slot)))
            .filter(|(_, entry)| !entry.tag.is_authoritative())
    }
}

// ============================================================================
// MODEL
// ============================================================================

/// Inclusive index bounds the model is valid for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "[u64; 2]", into = "[u64; 2]")]
pub struct IndexRange {
    pub start: u64,
    pub end: u64,
}

impl IndexRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, index: u64) -> bool {
        self.start <= index && index <= self.end
    }
}

impl From<[u64; 2]> for IndexRange {
    fn from(v: [u64; 2]) -> Self {
        Self::new(v[0], v[1])
    }
}

impl From<IndexRange> for [u64; 2] {
    fn from(r: IndexRange) -> Self {
        [r.start, r.end]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalibrationModel {
    range: IndexRange,
    multipliers: [u8; LANE_COUNT],
    drift: BTreeMap<u32, DriftTable>,
}

impl CalibrationModel {
    /// Model with the given multipliers and no drift tables.
    pub fn new(range: IndexRange, multipliers: [u8; LANE_COUNT]) -> Self {
        Self {
            range,
            multipliers,
            drift: BTreeMap::new(),
        }
    }

    /// Fresh model: one multiplier for every lane, occurrence 0 zeroed.
    pub fn initial(range: IndexRange, multiplier: u8) -> Self {
        let mut model = Self::new(range, [multiplier; LANE_COUNT]);
        model.drift.insert(0, DriftTable::default());
        model
    }

    pub fn range(&self) -> IndexRange {
        self.range
    }

    pub fn lane_count(&self) -> usize {
        LANE_COUNT
    }

    pub fn multiplier(&self, lane: Lane) -> u8 {
        self.multipliers[lane.index()]
    }

    pub fn multipliers(&self) -> &[u8; LANE_COUNT] {
        &self.multipliers
    }

    pub fn set_multiplier(&mut self, lane: Lane, multiplier: u8) {
        self.multipliers[lane.index()] = multiplier;
    }

    pub fn occurrences(&self) -> impl Iterator<Item = u32> + '_ {
        self.drift.keys().copied()
    }

    pub fn drift_table(&self, occurrence: u32) -> Option<&DriftTable> {
        self.drift.get(&occurrence)
    }

    /// Drift slot, zero and `unsolved` when the occurrence is absent.
    pub fn drift(&self, occurrence: u32, slot: DriftSlot) -> DriftEntry {
        self.drift
            .get(&occurrence)
            .map(|t| t.get(slot))
            .unwrap_or(DriftEntry::UNSOLVED)
    }

    /// Drift `lane` uses under `regime`.
    pub fn drift_at(&self, regime: Regime, lane: Lane) -> DriftEntry {
        self.drift(regime.occurrence, regime.slot(lane))
    }

    /// Table for `occurrence`, created zeroed if missing.
    pub fn drift_table_mut(&mut self, occurrence: u32) -> &mut DriftTable {
        self.drift.entry(occurrence).or_default()
    }

    /// Regime of the step that starts at `index`.
    pub fn regime_for_index(&self, index: u64, span: u64) -> Option<Regime> {
        if !self.range.contains(index) || span == 0 {
            return None;
        }
        let offset = index - self.range.start;
        let occurrence = u32::try_from(offset / span).ok()?;
        Some(Regime::new(occurrence, Phase::of_offset(offset, span)))
    }

    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let file: CalibrationFile = serde_json::from_str(json).map_err(|source| ModelError::Corrupt {
            origin: "calibration JSON".to_string(),
            source,
        })?;
        Self::try_from(file)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&CalibrationFile::from(self))
    }
}

// ============================================================================
// FILE REPRESENTATION
// ============================================================================

/// On-disk shape, before structural validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationFile {
    pub range: [u64; 2],
    pub lanes: Vec<u8>,
    #[serde(rename = "A")]
    pub multipliers: BTreeMap<u8, u8>,
    #[serde(rename = "Cstar", default)]
    pub drift: BTreeMap<u32, BTreeMap<u8, Vec<u8>>>,
    #[serde(rename = "Cstar_tags", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tags: BTreeMap<u32, BTreeMap<u8, Vec<DriftTag>>>,
}

impl TryFrom<CalibrationFile> for CalibrationModel {
    type Error = ModelError;

    fn try_from(file: CalibrationFile) -> Result<Self, Self::Error> {
        let [start, end] = file.range;
        if start > end {
            return Err(ModelError::invalid(format!("range [{}, {}] is reversed", start, end)));
        }

        if file.lanes.len() != LANE_COUNT {
            return Err(ModelError::invalid(format!(
                "expected {} lanes, found {}",
                LANE_COUNT,
                file.lanes.len()
            )));
        }
        for (i, &lane) in file.lanes.iter().enumerate() {
            if lane as usize != i {
                return Err(ModelError::invalid(format!("lanes[{}] is {}, expected {}", i, lane, i)));
            }
        }

        if file.multipliers.len() != LANE_COUNT {
            return Err(ModelError::invalid(format!(
                "expected {} multipliers, found {}",
                LANE_COUNT,
                file.multipliers.len()
            )));
        }
        let mut multipliers = [0u8; LANE_COUNT];
        for (&lane, &a) in &file.multipliers {
            multipliers[check_lane(lane, "A")?.index()] = a;
        }

        for (&occurrence, lanes) in &file.tags {
            let values = file.drift.get(&occurrence).ok_or_else(|| {
                ModelError::invalid(format!("Cstar_tags[{}] has no matching Cstar entry", occurrence))
            })?;
            for &lane in lanes.keys() {
                check_lane(lane, "Cstar_tags")?;
                if !values.contains_key(&lane) {
                    return Err(ModelError::invalid(format!(
                        "Cstar_tags[{}][{}] has no matching Cstar entry",
                        occurrence, lane
                    )));
                }
            }
        }

        let mut drift = BTreeMap::new();
        for (&occurrence, lanes) in &file.drift {
            let tags = file.tags.get(&occurrence);
            let mut table = DriftTable::default();

            for (&raw_lane, values) in lanes {
                let lane = check_lane(raw_lane, "Cstar")?;
                if values.len() != SLOTS_PER_LANE {
                    return Err(ModelError::invalid(format!(
                        "Cstar[{}][{}] has {} slots, expected {}",
                        occurrence,
                        lane,
                        values.len(),
                        SLOTS_PER_LANE
                    )));
                }

                let lane_tags = tags.and_then(|t| t.get(&raw_lane));
                if let Some(lt) = lane_tags {
                    if lt.len() != SLOTS_PER_LANE {
                        return Err(ModelError::invalid(format!(
                            "Cstar_tags[{}][{}] has {} slots, expected {}",
                            occurrence,
                            lane,
                            lt.len(),
                            SLOTS_PER_LANE
                        )));
                    }
                }

                for phase in Phase::ALL {
                    let tag = lane_tags.map(|lt| lt[phase.index()]).unwrap_or(DriftTag::Recorded);
                    table.set(
                        DriftSlot::new(lane, phase),
                        DriftEntry::new(values[phase.index()], tag),
                    );
                }
            }

            drift.insert(occurrence, table);
        }

        Ok(CalibrationModel {
            range: IndexRange::new(start, end),
            multipliers,
            drift,
        })
    }
}

fn check_lane(lane: u8, field: &str) -> Result<Lane, ModelError> {
    Lane::new(lane).map_err(|e| ModelError::invalid(format!("{} references {}", field, e)))
}

impl From<&CalibrationModel> for CalibrationFile {
    fn from(model: &CalibrationModel) -> Self {
        let lanes: Vec<u8> = Lane::all().map(u8::from).collect();
        let multipliers = Lane::all().map(|l| (l.get(), model.multiplier(l))).collect();

        let mut drift = BTreeMap::new();
        let mut tags = BTreeMap::new();
        for (&occurrence, table) in &model.drift {
            let mut values = BTreeMap::new();
            let mut lane_tags = BTreeMap::new();
            for lane in Lane::all() {
                let slots = table.lane(lane);
                values.insert(lane.get(), slots.iter().map(|e| e.value).collect());
                lane_tags.insert(lane.get(), slots.iter().map(|e| e.tag).collect());
            }
            drift.insert(occurrence, values);
            tags.insert(occurrence, lane_tags);
        }

        CalibrationFile {
            range: model.range.into(),
            lanes,
            multipliers,
            drift,
            tags,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(lane: u8, phase: Phase) -> DriftSlot {
        DriftSlot::new(Lane::new(lane).unwrap(), phase)
    }

    fn sample_json() -> String {
        let a: Vec<String> = (0..16).map(|l| format!("\"{}\": 91", l)).collect();
        format!(
            r#"{{
                "range": [70, 75],
                "lanes": [0,1,2,3,4,5,6,7,8,9,10,11,12,13,14,15],
                "A": {{ {} }},
                "Cstar": {{ "0": {{ "0": [61, 12], "3": [7, 200] }} }}
            }}"#,
            a.join(", ")
        )
    }

    fn with_tags(tags: &str) -> String {
        sample_json().replacen("\"Cstar\"", &format!("\"Cstar_tags\": {},\n\"Cstar\"", tags), 1)
    }

    #[test]
    fn test_load_sample() {
        let model = CalibrationModel::from_json(&sample_json()).unwrap();
        assert_eq!(model.range(), IndexRange::new(70, 75));
        assert_eq!(model.lane_count(), 16);
        assert_eq!(model.multiplier(Lane::new(15).unwrap()), 91);

        let first = model.drift(0, slot(0, Phase::First));
        assert_eq!(first, DriftEntry::new(61, DriftTag::Recorded));
        assert_eq!(model.drift(0, slot(0, Phase::Second)).value, 12);
        assert_eq!(model.drift(0, slot(3, Phase::Second)).value, 200);
    }

    #[test]
    fn test_missing_lanes_are_zero_unsolved() {
        let model = CalibrationModel::from_json(&sample_json()).unwrap();
        assert_eq!(model.drift(0, slot(9, Phase::Second)), DriftEntry::UNSOLVED);
        assert_eq!(model.drift(4, slot(0, Phase::First)), DriftEntry::UNSOLVED);
        let guesses = model.drift_table(0).unwrap().non_authoritative().count();
        assert_eq!(guesses, 32 - 4);
    }

    #[test]
    fn test_rejects_wrong_lane_count() {
        let json = sample_json().replace("[0,1,2,3,4,5,6,7,8,9,10,11,12,13,14,15]", "[0,1,2]");
        assert!(matches!(
            CalibrationModel::from_json(&json),
            Err(ModelError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn test_rejects_wrong_slot_count() {
        let json = sample_json().replace("[61, 12]", "[61]");
        let err = CalibrationModel::from_json(&json).unwrap_err();
        assert!(err.to_string().contains("Cstar[0][0] has 1 slots"), "{}", err);
    }

    #[test]
    fn test_rejects_out_of_range_lane_key() {
        let json = sample_json().replace("\"3\": [7, 200]", "\"16\": [7, 200]");
        let err = CalibrationModel::from_json(&json).unwrap_err();
        assert!(matches!(err, ModelError::InvalidStructure { .. }));
        assert!(err.to_string().contains("lane 16"), "{}", err);
    }

    #[test]
    fn test_tags_are_applied_per_phase() {
        let json = with_tags(r#"{ "0": { "0": ["closed_form", "best_effort"] } }"#);
        let model = CalibrationModel::from_json(&json).unwrap();
        assert_eq!(model.drift(0, slot(0, Phase::First)).tag, DriftTag::ClosedForm);
        assert_eq!(model.drift(0, slot(0, Phase::Second)).tag, DriftTag::BestEffort);
        // lane 3 carries no tags
        assert_eq!(model.drift(0, slot(3, Phase::First)).tag, DriftTag::Recorded);
    }

    #[test]
    fn test_rejects_orphan_tags() {
        let occurrence = with_tags(r#"{ "5": { "0": ["closed_form", "closed_form"] } }"#);
        let err = CalibrationModel::from_json(&occurrence).unwrap_err();
        assert!(matches!(err, ModelError::InvalidStructure { .. }));
        assert!(err.to_string().contains("Cstar_tags[5]"), "{}", err);

        let lane = with_tags(r#"{ "0": { "7": ["closed_form", "closed_form"] } }"#);
        let err = CalibrationModel::from_json(&lane).unwrap_err();
        assert!(err.to_string().contains("Cstar_tags[0][7]"), "{}", err);

        let out_of_range = with_tags(r#"{ "0": { "20": ["closed_form", "closed_form"] } }"#);
        assert!(matches!(
            CalibrationModel::from_json(&out_of_range),
            Err(ModelError::InvalidStructure { .. })
        ));
    }

    #[test]
    fn test_corrupt_json() {
        assert!(matches!(
            CalibrationModel::from_json("{ not json"),
            Err(ModelError::Corrupt { .. })
        ));
        // a drift byte outside 0..=255 fails while parsing
        let json = sample_json().replace("[61, 12]", "[61, 300]");
        assert!(matches!(CalibrationModel::from_json(&json), Err(ModelError::Corrupt { .. })));
    }

    #[test]
    fn test_json_roundtrip_keeps_tags() {
        let mut model = CalibrationModel::initial(IndexRange::new(1, 10), 91);
        model.set_multiplier(Lane::new(3).unwrap(), 182);
        model
            .drift_table_mut(2)
            .set(slot(3, Phase::Second), DriftEntry::new(165, DriftTag::BruteForce));

        let json = model.to_json_pretty().unwrap();
        assert!(json.contains("\"Cstar_tags\""));
        let back = CalibrationModel::from_json(&json).unwrap();
        assert_eq!(back, model);
        assert_eq!(back.occurrences().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_phase_of_offset() {
        assert_eq!(Phase::of_offset(0, 32), Phase::First);
        assert_eq!(Phase::of_offset(15, 32), Phase::First);
        assert_eq!(Phase::of_offset(16, 32), Phase::Second);
        assert_eq!(Phase::of_offset(31, 32), Phase::Second);
        assert_eq!(Phase::of_offset(32, 32), Phase::First);
        // a one-index span never reaches its second phase
        assert_eq!(Phase::of_offset(7, 1), Phase::First);
        assert_eq!(Phase::of_offset(1, 3), Phase::First);
        assert_eq!(Phase::of_offset(2, 3), Phase::Second);
    }

    #[test]
    fn test_regime_for_index() {
        let model = CalibrationModel::initial(IndexRange::new(70, 200), 91);
        assert_eq!(model.regime_for_index(70, 32), Some(Regime::new(0, Phase::First)));
        assert_eq!(model.regime_for_index(85, 32), Some(Regime::new(0, Phase::First)));
        assert_eq!(model.regime_for_index(86, 32), Some(Regime::new(0, Phase::Second)));
        assert_eq!(model.regime_for_index(101, 32), Some(Regime::new(0, Phase::Second)));
        assert_eq!(model.regime_for_index(102, 32), Some(Regime::new(1, Phase::First)));
        assert_eq!(model.regime_for_index(69, 32), None);
        assert_eq!(model.regime_for_index(80, 0), None);
    }

    #[test]
    fn test_drift_at_reads_the_regime_phase() {
        let mut model = CalibrationModel::initial(IndexRange::new(0, 63), 91);
        let lane = Lane::new(4).unwrap();
        model.drift_table_mut(1).set(slot(4, Phase::First), DriftEntry::new(10, DriftTag::ClosedForm));
        model.drift_table_mut(1).set(slot(4, Phase::Second), DriftEntry::new(20, DriftTag::ClosedForm));
        assert_eq!(model.drift_at(Regime::new(1, Phase::First), lane).value, 10);
        assert_eq!(model.drift_at(Regime::new(1, Phase::Second), lane).value, 20);
        assert_eq!(Regime::new(1, Phase::Second).to_string(), "occurrence 1/second");
        assert_eq!(slot(4, Phase::First).to_string(), "lane 4/first");
    }

    #[test]
    fn test_phase_parsing() {
        assert_eq!("second".parse::<Phase>(), Ok(Phase::Second));
        assert!("middle".parse::<Phase>().is_err());
        let regime: Regime = serde_json::from_str(r#"{"occurrence": 2}"#).unwrap();
        assert_eq!(regime, Regime::new(2, Phase::First));
    }

    #[test]
    fn test_tag_authority() {
        assert!(DriftTag::ClosedForm.is_authoritative());
        assert!(DriftTag::Recorded.is_authoritative());
        assert!(!DriftTag::BestEffort.is_authoritative());
        assert!(!DriftTag::Unsolved.is_authoritative());
    }
}
