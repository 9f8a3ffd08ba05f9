//! # lane-ladder
//!
//! Affine byte-lane model of a sequence of 256-bit values.
//!
//! Each value splits into 32 bytes; byte `p` belongs to lane `p % 16`.
//! One step advances every byte as `y = c1*x + c2*d (mod 256)` where
//! `(c1, c2)` come from the lane's multiplier through a [`StepPolicy`] and
//! `d` is the drift the model stores for the lane under the step's
//! [`Regime`] (occurrence and phase). Both bytes of a lane share `d`.
//!
//! | Module | Role |
//! |--------|------|
//! | [`lanes`] | decompose / recompose, checked lane numbers, byte positions |
//! | [`step`] | step policies and coefficient composition |
//! | [`model`] | typed calibration model, drift slots and regimes, file shape, provenance |
//! | [`store`] | load / init / save with backup and atomic replace |
//! | [`drift`] | per-lane drift solver with fallback diagnostics |
//! | [`diagnose`] | multiplier classification per lane |
//! | [`patch`] | writes solutions into a model, proposal files |
//! | [`bridge`] | candidate search between two known values |
//! | [`known`] | known-value sources |
//! | [`replay`] | forward / reverse check of a model against known values |
//!
//! ```
//! use lane_ladder::{AffineStep, DriftSolver, SolveStatus, SolvedBy};
//!
//! let solution = DriftSolver::new(AffineStep).solve_drift(91, 104, 53);
//! assert_eq!(solution.drift, 61);
//! assert_eq!(solution.status, SolveStatus::Solved(SolvedBy::ClosedForm));
//! ```

pub mod bridge;
pub mod diagnose;
pub mod drift;
pub mod known;
pub mod lanes;
pub mod model;
pub mod patch;
pub mod replay;
pub mod step;
pub mod store;

pub use bridge::{
    BridgeError, BridgeOutcome, BridgeRequest, BridgeValidator, DriftBounds, DriftRange, KnownPoint, LaneSummary,
    SearchLimits, StepDrift,
};
pub use diagnose::{diagnose_multipliers, LaneDiagnostic, MultiplierClass};
pub use drift::{
    best_effort, brute_force_exact, solve_coefficients, solve_samples, Attempt, ByteSample, DriftError, DriftSolution,
    DriftSolver, FallbackReason, LaneSolution, SolvePath, SolveStatus, SolvedBy, Transition, TransitionSolution,
};
pub use known::{EnvValues, KnownValueError, KnownValues, MemoryValues, DEFAULT_ENV_PREFIX};
pub use lanes::{decompose, recompose, Half, InvalidLane, Lane, LaneBytes, LanePosition, LANE_COUNT, POSITION_COUNT};
pub use model::{
    CalibrationFile, CalibrationModel, DriftEntry, DriftSlot, DriftTable, DriftTag, IndexRange, InvalidPhase,
    ModelError, Phase, Regime, SLOTS_PER_LANE,
};
pub use patch::{DriftProposal, PatchError, PatchReport, Patcher, SlotChange, SlotOutcome};
pub use replay::{advance, replay, ReplayReport, DEFAULT_OCCURRENCE_SPAN};
pub use step::{apply_step, AffineStep, PolynomialStep, StepCoefficients, StepPolicy, StepKind};
pub use store::{write_atomic, CalibrationStore};
