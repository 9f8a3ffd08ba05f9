use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use lane_ladder::{CalibrationStore, DriftProposal, DriftTag, Patcher, SlotOutcome};

use crate::config::Config;
use crate::output::{self, PatchSummary};

#[derive(Args, Debug, Default)]
pub struct PatchArgs {
    /// Proposal written by `compute`
    #[arg(long)]
    pub proposal: Option<PathBuf>,

    /// Replace drift that is already solved
    #[arg(long)]
    pub overwrite: bool,
}

pub fn run(args: &PatchArgs, config: &Config) -> anyhow::Result<()> {
    let path = args
        .proposal
        .clone()
        .unwrap_or_else(|| config.calibration.proposal_path.clone());
    let proposal = DriftProposal::load(&path).with_context(|| format!("reading proposal {}", path.display()))?;

    let mut store = super::open_store(config);
    let summary = execute(&proposal, args.overwrite || config.compute.overwrite, &mut store)?;
    output::print_report(&summary)
}

/// Patch `proposal` into the stored model and save it if anything changed.
pub fn execute(proposal: &DriftProposal, overwrite: bool, store: &mut CalibrationStore) -> anyhow::Result<PatchSummary> {
    let model = store
        .load()
        .with_context(|| format!("loading {}", store.path().display()))?;

    let (patched, report) = Patcher::new()
        .overwrite(overwrite)
        .patch_transition(&model, proposal.regime, &proposal.solution)
        .with_context(|| format!("patching {}", proposal.regime))?;

    for change in &report.changes {
        if change.outcome == SlotOutcome::Applied && change.current.tag == DriftTag::BestEffort {
            tracing::warn!(
                regime = %proposal.regime,
                slot = %change.slot,
                drift = change.current.value,
                tag = "best_effort",
                "patched provisional drift"
            );
        }
    }

    let applied = report.applied();
    let saved = applied > 0;
    if saved {
        store
            .save(&patched)
            .with_context(|| format!("saving {}", store.path().display()))?;
    } else {
        tracing::info!(regime = %proposal.regime, "model already holds this drift");
    }

    Ok(PatchSummary {
        model_path: store.path().to_path_buf(),
        regime: proposal.regime,
        applied,
        unchanged: report.changes.len() - applied,
        best_effort: report.best_effort(),
        saved,
        backup_path: store.backup_exists().then(|| store.backup_path()),
    })
}
