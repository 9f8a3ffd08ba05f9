//! Calibration patcher and drift proposals.
//!
//! The patcher never mutates its input: it returns a new model with each
//! lane's solution written into the slot its [`Regime`] selects, together
//! with the tag of the path that produced it. Persisting the result is the
//! store's job.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::drift::{DriftSolution, LaneSolution, TransitionSolution};
use crate::lanes::Lane;
use crate::model::{CalibrationModel, DriftEntry, DriftSlot, DriftTag, ModelError, Regime};
use crate::step::StepKind;
use crate::store::write_atomic;

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error)]
pub enum PatchError {
    #[error("backup to {} failed, model left untouched: {source}", .path.display())]
    BackupFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("writing {} failed: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "{regime} lane {lane} already holds {existing} ({tag:?}), refusing to replace it with {proposed}"
    )]
    AlreadyPatched {
        regime: Regime,
        lane: Lane,
        existing: u8,
        tag: DriftTag,
        proposed: u8,
    },

    #[error("{regime} lane {lane}: inconsistent solution rejected")]
    RejectedInconsistentSolution { regime: Regime, lane: Lane },

    #[error(transparent)]
    Model(#[from] ModelError),
}

// ============================================================================
// PATCHER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotOutcome {
    Applied,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotChange {
    pub slot: DriftSlot,
    pub previous: DriftEntry,
    pub current: DriftEntry,
    pub outcome: SlotOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchReport {
    pub regime: Regime,
    pub changes: Vec<SlotChange>,
}

impl PatchReport {
    pub fn applied(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| c.outcome == SlotOutcome::Applied)
            .count()
    }

    pub fn best_effort(&self) -> usize {
        self.changes
            .iter()
            .filter(|c| c.current.tag == DriftTag::BestEffort)
            .count()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Patcher {
    overwrite: bool,
}

impl Patcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow replacing authoritative slots with different values.
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Model with `solution` written to `lane`'s slot under `regime`.
    pub fn patch(
        &self,
        model: &CalibrationModel,
        regime: Regime,
        lane: Lane,
        solution: &DriftSolution,
    ) -> Result<CalibrationModel, PatchError> {
        let mut next = model.clone();
        self.apply(&mut next, regime, lane, solution)?;
        Ok(next)
    }

    /// Apply every lane solution of a transition. All or nothing.
    pub fn patch_transition(
        &self,
        model: &CalibrationModel,
        regime: Regime,
        solution: &TransitionSolution,
    ) -> Result<(CalibrationModel, PatchReport), PatchError> {
        self.patch_all(model, regime, &solution.solutions)
    }

    pub fn patch_all(
        &self,
        model: &CalibrationModel,
        regime: Regime,
        solutions: &[LaneSolution],
    ) -> Result<(CalibrationModel, PatchReport), PatchError> {
        let mut next = model.clone();
        let mut changes = Vec::with_capacity(solutions.len());
        for s in solutions {
            changes.push(self.apply(&mut next, regime, s.lane, &s.solution)?);
        }
        Ok((next, PatchReport { regime, changes }))
    }

    fn apply(
        &self,
        model: &mut CalibrationModel,
        regime: Regime,
        lane: Lane,
        solution: &DriftSolution,
    ) -> Result<SlotChange, PatchError> {
        let tag = DriftTag::from_status(&solution.status)
            .ok_or(PatchError::RejectedInconsistentSolution { regime, lane })?;

        let slot = regime.slot(lane);
        let previous = model.drift(regime.occurrence, slot);
        let proposed = DriftEntry::new(solution.drift, tag);

        let outcome = if previous.tag.is_authoritative() && previous.value == proposed.value {
            SlotOutcome::Unchanged
        } else if previous.tag.is_authoritative() && !self.overwrite {
            return Err(PatchError::AlreadyPatched {
                regime,
                lane,
                existing: previous.value,
                tag: previous.tag,
                proposed: proposed.value,
            });
        } else {
            model.drift_table_mut(regime.occurrence).set(slot, proposed);
            SlotOutcome::Applied
        };

        Ok(SlotChange {
            slot,
            previous,
            current: model.drift(regime.occurrence, slot),
            outcome,
        })
    }
}

// ============================================================================
// PROPOSAL FILE
// ============================================================================

/// Solved drift waiting to be patched in, as written by `compute`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriftProposal {
    pub regime: Regime,
    pub earlier_index: u64,
    pub later_index: u64,
    pub policy: StepKind,
    pub solution: TransitionSolution,
}

impl DriftProposal {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let json = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                ModelError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ModelError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let proposal: DriftProposal = serde_json::from_str(&json).map_err(|source| {
            if source.classify() == serde_json::error::Category::Data {
                ModelError::invalid(format!("{}: {}", path.display(), source))
            } else {
                ModelError::Corrupt {
                    origin: path.display().to_string(),
                    source,
                }
            }
        })?;
        proposal.validate()?;
        Ok(proposal)
    }

    /// Each lane may appear at most once.
    pub fn validate(&self) -> Result<(), ModelError> {
        let mut seen = BTreeSet::new();
        for s in &self.solution.solutions {
            if !seen.insert(s.lane) {
                return Err(ModelError::invalid(format!("proposal lists lane {} twice", s.lane)));
            }
        }
        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ModelError::Corrupt {
            origin: "drift proposal".to_string(),
            source,
        })?;
        write_atomic(path, json.as_bytes()).map_err(|source| ModelError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
