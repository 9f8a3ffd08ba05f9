use address_verify::{Verifier, U256};
use anyhow::Context;
use clap::Args;
use lane_ladder::{
    replay, BridgeRequest, BridgeValidator, CalibrationModel, CalibrationStore, DriftBounds, DriftRange, KnownPoint,
    KnownValues, Regime, StepDrift, StepKind,
};

use crate::config::{BridgeSettings, Config, ScheduleEntry};
use crate::output::{self, BridgeReport, ConfirmedKey, KeyReport, VerifyReport};

#[derive(Args, Debug, Default)]
pub struct VerifyArgs {
    /// Private key (hex) to check instead of the model
    #[arg(long, requires = "address")]
    pub key: Option<String>,

    /// Address the key must produce
    #[arg(long)]
    pub address: Option<String>,

    /// Skip the configured bridge search
    #[arg(long)]
    pub skip_bridge: bool,
}

pub fn run(args: &VerifyArgs, config: &Config) -> anyhow::Result<()> {
    let verifier = Verifier::bitcoin_mainnet();

    if let (Some(key), Some(address)) = (&args.key, &args.address) {
        let report = verify_key(&verifier, key, address)?;
        return output::print_report(&report);
    }

    let store = super::open_store(config);
    let known = super::known_source(&config.known_values)?;
    let report = execute(config, &store, known.as_ref(), &verifier, args.skip_bridge)?;
    output::print_report(&report)
}

/// Derive everything about one key and compare its address.
pub fn verify_key(verifier: &Verifier, key: &str, target: &str) -> anyhow::Result<KeyReport> {
    let scalar = U256::from_hex(key).with_context(|| format!("parsing key {key:?}"))?;
    let public_key = verifier.compressed_public_key(&scalar)?;
    let address = verifier.address(&scalar)?;
    let wif = verifier.wif(&scalar, true)?;
    let matches = address == target;

    if matches {
        tracing::info!(%address, "key matches target");
    } else {
        tracing::warn!(%address, expected = %target, "key does not match target");
    }

    Ok(KeyReport {
        scalar,
        public_key: hex::encode(public_key),
        address,
        wif,
        target: target.to_string(),
        matches,
    })
}

/// Replay the model over known values, then run the bridge if one is configured.
pub fn execute(
    config: &Config,
    store: &CalibrationStore,
    known: &dyn KnownValues,
    verifier: &Verifier,
    skip_bridge: bool,
) -> anyhow::Result<VerifyReport> {
    let model = store
        .load()
        .with_context(|| format!("loading {}", store.path().display()))?;

    let replayed = replay(
        &model,
        &config.compute.policy,
        known,
        config.calibration.occurrence_span,
    );
    for m in &replayed.mismatches {
        tracing::warn!(
            index = m.index,
            position = %m.position,
            direction = ?m.direction,
            expected = m.expected,
            found = m.found,
            "replay mismatch"
        );
    }
    tracing::info!(
        transitions = replayed.transitions,
        forward = replayed.forward_matches,
        reverse = replayed.reverse_matches,
        skipped = replayed.reverse_skipped,
        mismatches = replayed.mismatches.len(),
        "replayed model"
    );

    let bridge = match (&config.bridge, skip_bridge) {
        (Some(settings), false) => Some(run_bridge(settings, &model, known, verifier)?),
        _ => None,
    };

    Ok(VerifyReport {
        replay: replayed,
        bridge,
    })
}

pub fn bridge_request(
    settings: &BridgeSettings,
    model: &CalibrationModel,
    known: &dyn KnownValues,
) -> anyhow::Result<BridgeRequest> {
    let schedule = settings
        .schedule
        .iter()
        .map(|entry| step_drift(entry, model))
        .collect::<anyhow::Result<Vec<_>>>()?;

    Ok(BridgeRequest {
        earlier: KnownPoint {
            index: settings.earlier,
            value: super::known_value(known, settings.earlier)?,
        },
        later: KnownPoint {
            index: settings.later,
            value: super::known_value(known, settings.later)?,
        },
        target_index: settings.target,
        schedule,
        limits: settings.limits,
    })
}

fn step_drift(entry: &ScheduleEntry, model: &CalibrationModel) -> anyhow::Result<StepDrift> {
    Ok(match entry {
        ScheduleEntry::Known { occurrence, phase } => StepDrift::Known(Regime::new(*occurrence, *phase)),
        ScheduleEntry::Unknown { min, max } => StepDrift::Unknown(DriftBounds::uniform(DriftRange::new(*min, *max))),
        ScheduleEntry::FromHistory { occurrences } => StepDrift::Unknown(DriftBounds::from_history(model, occurrences)?),
    })
}

fn run_bridge(
    settings: &BridgeSettings,
    model: &CalibrationModel,
    known: &dyn KnownValues,
    verifier: &Verifier,
) -> anyhow::Result<BridgeReport> {
    let request = bridge_request(settings, model, known)?;
    let policy: &StepKind = &settings.policy;
    let outcome = BridgeValidator::new(model, policy, verifier)
        .validate(&request, &settings.target_address)
        .with_context(|| format!("bridging {} to {}", settings.earlier, settings.later))?;

    let dead_lanes: Vec<_> = outcome.dead_lanes().collect();
    for lane in &dead_lanes {
        tracing::warn!(lane = %lane, "no drift assignment reaches the later value");
    }

    let mut confirmed = Vec::with_capacity(outcome.confirmed.len());
    for candidate in &outcome.confirmed {
        tracing::info!(index = outcome.target_index, address = %candidate.address, "candidate confirmed");
        confirmed.push(ConfirmedKey {
            scalar: candidate.scalar,
            address: candidate.address.clone(),
            wif: verifier.wif(&candidate.scalar, true)?,
        });
    }
    if confirmed.is_empty() {
        tracing::warn!(
            index = outcome.target_index,
            examined = outcome.examined,
            "no candidate matched the target address"
        );
    }

    Ok(BridgeReport {
        target_index: outcome.target_index,
        target_address: settings.target_address.clone(),
        examined: outcome.examined,
        rejected: outcome.rejected,
        confirmed,
        dead_lanes,
    })
}
