use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{bail, ensure, Context};
use clap::Args;
use lane_ladder::{
    diagnose_multipliers, CalibrationStore, DriftProposal, DriftSolver, KnownValues, Phase, Regime, SolveStatus,
    Transition,
};

use crate::config::Config;
use crate::output::{self, ComputeReport, FallbackLine, LaneLine};

#[derive(Args, Debug, Default)]
pub struct ComputeArgs {
    /// Index of the earlier known value
    #[arg(long)]
    pub earlier: Option<u64>,

    /// Index of the later known value
    #[arg(long)]
    pub later: Option<u64>,

    /// Occurrence the drift belongs to
    #[arg(long)]
    pub occurrence: Option<u32>,

    /// Phase of the occurrence: first or second
    #[arg(long)]
    pub phase: Option<Phase>,

    /// Step count between the two values
    #[arg(long)]
    pub steps: Option<u32>,

    /// Mark unsolvable lanes inconsistent instead of guessing
    #[arg(long)]
    pub strict: bool,

    /// Where to write the proposal
    #[arg(long)]
    pub proposal: Option<PathBuf>,
}

pub fn run(args: &ComputeArgs, config: &Config) -> anyhow::Result<()> {
    let store = super::open_store(config);
    let known = super::known_source(&config.known_values)?;
    let (_, report) = execute(args, config, &store, known.as_ref())?;
    output::print_report(&report)
}

pub fn execute(
    args: &ComputeArgs,
    config: &Config,
    store: &CalibrationStore,
    known: &dyn KnownValues,
) -> anyhow::Result<(DriftProposal, ComputeReport)> {
    let settings = &config.compute;
    let model = store
        .load()
        .with_context(|| format!("loading {}", store.path().display()))?;

    let earlier = args.earlier.unwrap_or(settings.earlier);
    let later = args.later.unwrap_or(settings.later);
    ensure!(earlier < later, "earlier index {earlier} must precede later index {later}");

    let step_count = match args.steps.or(settings.steps) {
        Some(steps) => steps,
        None => u32::try_from(later - earlier).context("step count does not fit in u32")?,
    };
    ensure!(step_count > 0, "step count must be positive");

    let span = config.calibration.occurrence_span;
    let derived = model.regime_for_index(earlier, span);
    let regime = match (args.occurrence.or(settings.occurrence), args.phase.or(settings.phase), derived) {
        (None, None, Some(derived)) => {
            ensure!(
                model.regime_for_index(later - 1, span) == Some(derived),
                "steps {earlier}..{later} cross a drift regime boundary after {derived}; set --occurrence and --phase"
            );
            derived
        }
        (Some(occurrence), phase, _) => {
            Regime::new(occurrence, phase.or(derived.map(|r| r.phase)).unwrap_or_default())
        }
        (None, Some(phase), Some(derived)) => Regime::new(derived.occurrence, phase),
        (None, _, None) => {
            let range = model.range();
            bail!("index {earlier} is outside the model range {}..={}", range.start, range.end)
        }
    };

    let diagnostics = diagnose_multipliers(&model, &config.calibration.even_multiplier_lanes);
    for d in diagnostics.iter().filter(|d| d.class.is_problem()) {
        tracing::warn!(
            lane = %d.lane,
            multiplier = d.multiplier,
            gcd = d.gcd,
            class = d.class.tag(),
            "lane multiplier is not invertible modulo 256"
        );
    }

    let transition = Transition {
        from: super::known_value(known, earlier)?,
        to: super::known_value(known, later)?,
        step_count,
    };
    let solver = DriftSolver::new(settings.policy.clone()).strict(args.strict || settings.strict);
    let solution = solver.solve_transition(&model, &transition);

    let mut by_status = BTreeMap::new();
    let mut lanes = Vec::with_capacity(solution.solutions.len());
    let mut fallbacks = Vec::new();
    for (s, d) in solution.solutions.iter().zip(&diagnostics) {
        *by_status.entry(s.solution.status.tag()).or_insert(0) += 1;
        let verified = s.solution.is_exact();
        if s.solution.is_fallback() || s.solution.status == SolveStatus::Inconsistent {
            tracing::warn!(
                lane = %s.lane,
                drift = s.solution.drift,
                tag = s.solution.status.tag(),
                error = s.solution.error(),
                "drift not solved exactly"
            );
            fallbacks.push(FallbackLine {
                lane: s.lane,
                drift: s.solution.drift,
                status: s.solution.status.to_string(),
            });
        }
        lanes.push(LaneLine {
            lane: s.lane,
            multiplier: d.multiplier,
            class: d.class.tag(),
            drift: s.solution.drift,
            alternates: s.solution.alternates.clone(),
            status: s.solution.status.tag(),
            verified,
        });
    }
    tracing::info!(
        earlier,
        later,
        regime = %regime,
        step_count,
        fallbacks = fallbacks.len(),
        "solved transition"
    );

    let proposal = DriftProposal {
        regime,
        earlier_index: earlier,
        later_index: later,
        policy: settings.policy.clone(),
        solution,
    };
    let proposal_path = args
        .proposal
        .clone()
        .unwrap_or_else(|| config.calibration.proposal_path.clone());
    proposal
        .save(&proposal_path)
        .with_context(|| format!("writing proposal {}", proposal_path.display()))?;

    let report = ComputeReport {
        proposal_path,
        regime,
        earlier_index: earlier,
        later_index: later,
        step_count,
        policy: proposal.policy.clone(),
        by_status,
        lanes,
        fallbacks,
    };
    Ok((proposal, report))
}
