use anyhow::Context;
use clap::Args;
use lane_ladder::{diagnose_multipliers, CalibrationStore};

use crate::config::{CalibrationSettings, Config};
use crate::output::{self, StatusReport};

#[derive(Args, Debug, Default)]
pub struct StatusArgs {}

pub fn run(_args: &StatusArgs, config: &Config) -> anyhow::Result<()> {
    let store = super::open_store(config);
    let report = execute(&store, &config.calibration)?;
    output::print_report(&report)
}

/// Read-only summary of the stored model and any pending proposal.
pub fn execute(store: &CalibrationStore, settings: &CalibrationSettings) -> anyhow::Result<StatusReport> {
    let mut report = StatusReport {
        model_path: store.path().to_path_buf(),
        present: store.exists(),
        backup_present: store.backup_exists(),
        proposal_path: settings.proposal_path.clone(),
        proposal_present: settings.proposal_path.exists(),
        range: None,
        lane_count: None,
        multipliers: Vec::new(),
        occurrences: Vec::new(),
        provisional_slots: 0,
        lanes: Vec::new(),
        problem_lanes: 0,
    };
    if !report.present {
        tracing::info!(path = %store.path().display(), "no calibration model yet");
        return Ok(report);
    }

    let model = store
        .load()
        .with_context(|| format!("loading {}", store.path().display()))?;
    report.range = Some(model.range().into());
    report.lane_count = Some(model.lane_count());
    report.multipliers = model.multipliers().to_vec();
    report.occurrences = model.occurrences().collect();
    report.provisional_slots = report
        .occurrences
        .iter()
        .filter_map(|&o| model.drift_table(o))
        .map(|table| table.non_authoritative().count())
        .sum();

    report.lanes = diagnose_multipliers(&model, &settings.even_multiplier_lanes);
    for d in report.lanes.iter().filter(|d| d.class.is_problem()) {
        tracing::warn!(lane = %d.lane, multiplier = d.multiplier, class = d.class.tag(), "suspect lane multiplier");
    }
    report.problem_lanes = report.lanes.iter().filter(|d| d.class.is_problem()).count();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lane_ladder::{CalibrationModel, IndexRange, Lane, MultiplierClass};

    fn settings(dir: &std::path::Path) -> CalibrationSettings {
        CalibrationSettings {
            model_path: dir.join("model.json"),
            proposal_path: dir.join("proposal.json"),
            ..CalibrationSettings::default()
        }
    }

    #[test]
    fn test_status_without_model() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let store = CalibrationStore::open(&settings.model_path);
        let report = execute(&store, &settings).unwrap();
        assert!(!report.present);
        assert!(!report.proposal_present);
        assert!(report.range.is_none());
        assert!(report.lanes.is_empty());
        assert!(!store.exists());
    }

    #[test]
    fn test_status_reports_model_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let mut store = CalibrationStore::open(&settings.model_path);
        store.init(&CalibrationModel::initial(IndexRange::new(70, 160), 91)).unwrap();
        let before = std::fs::read(store.path()).unwrap();

        let report = execute(&store, &settings).unwrap();
        assert!(report.present);
        assert!(!report.backup_present);
        assert_eq!(report.range, Some([70, 160]));
        assert_eq!(report.lane_count, Some(16));
        assert_eq!(report.multipliers, vec![91; 16]);
        assert_eq!(report.occurrences, vec![0]);
        assert_eq!(report.provisional_slots, 32);
        assert_eq!(report.lanes.len(), 16);
        assert_eq!(report.problem_lanes, 0);
        assert_eq!(std::fs::read(store.path()).unwrap(), before);
    }

    #[test]
    fn test_status_reports_proposal_and_suspect_lanes() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = settings(dir.path());
        settings.even_multiplier_lanes = vec![Lane::new(2).unwrap()];

        let mut model = CalibrationModel::initial(IndexRange::new(70, 160), 91);
        model.set_multiplier(Lane::new(2).unwrap(), 182);
        model.set_multiplier(Lane::new(6).unwrap(), 182);
        model.set_multiplier(Lane::new(7).unwrap(), 8);
        let mut store = CalibrationStore::open(&settings.model_path);
        store.init(&model).unwrap();
        std::fs::write(&settings.proposal_path, "{}").unwrap();

        let report = execute(&store, &settings).unwrap();
        assert!(report.proposal_present);
        assert_eq!(report.lanes[2].class, MultiplierClass::ReducedRing);
        assert_eq!(report.lanes[6].class, MultiplierClass::UnexpectedEven);
        assert_eq!(report.lanes[7].class, MultiplierClass::Degenerate);
        assert_eq!(report.problem_lanes, 2);
    }

    #[test]
    fn test_status_surfaces_corrupt_model() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        std::fs::write(&settings.model_path, "{ not json").unwrap();
        assert!(execute(&CalibrationStore::open(&settings.model_path), &settings).is_err());
    }
}
