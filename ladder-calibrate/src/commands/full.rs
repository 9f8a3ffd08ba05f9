use address_verify::Verifier;
use clap::Args;
use lane_ladder::{CalibrationStore, KnownValues};

use super::compute::ComputeArgs;
use super::init::InitArgs;
use crate::config::Config;
use crate::output::{self, FullReport};

#[derive(Args, Debug, Default)]
pub struct FullArgs {
    #[command(flatten)]
    pub compute: ComputeArgs,

    /// Replace drift that is already solved
    #[arg(long)]
    pub overwrite: bool,

    /// Skip the configured bridge search
    #[arg(long)]
    pub skip_bridge: bool,
}

pub fn run(args: &FullArgs, config: &Config) -> anyhow::Result<()> {
    let mut store = super::open_store(config);
    let known = super::known_source(&config.known_values)?;
    let report = execute(args, config, &mut store, known.as_ref())?;
    output::print_report(&report)
}

/// One session: the backup is taken at most once across all steps.
pub fn execute(
    args: &FullArgs,
    config: &Config,
    store: &mut CalibrationStore,
    known: &dyn KnownValues,
) -> anyhow::Result<FullReport> {
    let init = if store.exists() {
        None
    } else {
        Some(super::init::execute(&InitArgs::default(), config, store)?)
    };

    let (proposal, compute) = super::compute::execute(&args.compute, config, store, known)?;
    let patch = super::patch::execute(&proposal, args.overwrite || config.compute.overwrite, store)?;
    let verify = super::verify::execute(config, store, known, &Verifier::bitcoin_mainnet(), args.skip_bridge)?;

    tracing::info!(
        applied = patch.applied,
        mismatches = verify.replay.mismatches.len(),
        "full calibration finished"
    );
    Ok(FullReport {
        init,
        compute,
        patch,
        verify,
    })
}
