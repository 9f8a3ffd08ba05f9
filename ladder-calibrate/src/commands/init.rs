use anyhow::{ensure, Context};
use clap::Args;
use lane_ladder::{CalibrationModel, CalibrationStore, IndexRange};

use crate::config::Config;
use crate::output::{self, InitReport};

#[derive(Args, Debug, Default)]
pub struct InitArgs {
    /// First index covered by the model
    #[arg(long)]
    pub start: Option<u64>,

    /// Last index covered by the model
    #[arg(long)]
    pub end: Option<u64>,

    /// Multiplier for every lane
    #[arg(long)]
    pub multiplier: Option<u8>,
}

pub fn run(args: &InitArgs, config: &Config) -> anyhow::Result<()> {
    let mut store = super::open_store(config);
    let report = execute(args, config, &mut store)?;
    output::print_report(&report)
}

pub fn execute(args: &InitArgs, config: &Config, store: &mut CalibrationStore) -> anyhow::Result<InitReport> {
    let settings = &config.calibration;
    let range = IndexRange::new(
        args.start.unwrap_or(settings.range[0]),
        args.end.unwrap_or(settings.range[1]),
    );
    ensure!(
        range.start <= range.end,
        "range start {} is after range end {}",
        range.start,
        range.end
    );
    let multiplier = args.multiplier.unwrap_or(settings.multiplier);

    let model = CalibrationModel::initial(range, multiplier);
    store
        .init(&model)
        .with_context(|| format!("initializing {}", store.path().display()))?;

    Ok(InitReport {
        model_path: store.path().to_path_buf(),
        range: range.into(),
        lane_count: model.lane_count(),
        multiplier,
    })
}
