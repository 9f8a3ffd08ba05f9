//! Command reports.
//!
//! Every command builds one of these and prints it as pretty JSON on
//! stdout. Diagnostics go through `tracing`, never through a report.

use std::collections::BTreeMap;
use std::path::PathBuf;

use address_verify::U256;
use lane_ladder::{Lane, LaneDiagnostic, Regime, ReplayReport, StepKind};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct InitReport {
    pub model_path: PathBuf,
    pub range: [u64; 2],
    pub lane_count: usize,
    pub multiplier: u8,
}

/// One lane that did not solve exactly.
#[derive(Debug, Clone, Serialize)]
pub struct FallbackLine {
    pub lane: Lane,
    pub drift: u8,
    pub status: String,
}

/// Solve result of one lane.
#[derive(Debug, Clone, Serialize)]
pub struct LaneLine {
    pub lane: Lane,
    pub multiplier: u8,
    pub class: &'static str,
    pub drift: u8,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alternates: Vec<u8>,
    pub status: &'static str,
    /// The drift re-predicts both bytes of the lane.
    pub verified: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComputeReport {
    pub proposal_path: PathBuf,
    pub regime: Regime,
    pub earlier_index: u64,
    pub later_index: u64,
    pub step_count: u32,
    pub policy: StepKind,
    /// Solved lanes per solver tag.
    pub by_status: BTreeMap<&'static str, usize>,
    pub lanes: Vec<LaneLine>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<FallbackLine>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatchSummary {
    pub model_path: PathBuf,
    pub regime: Regime,
    pub applied: usize,
    pub unchanged: usize,
    pub best_effort: usize,
    pub saved: bool,
    pub backup_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
pub struct KeyReport {
    pub scalar: U256,
    pub public_key: String,
    pub address: String,
    pub wif: String,
    pub target: String,
    pub matches: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmedKey {
    pub scalar: U256,
    pub address: String,
    pub wif: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BridgeReport {
    pub target_index: u64,
    pub target_address: String,
    pub examined: u64,
    pub rejected: u64,
    pub confirmed: Vec<ConfirmedKey>,
    /// Lanes no drift assignment could reach.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub dead_lanes: Vec<Lane>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub replay: ReplayReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge: Option<BridgeReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub model_path: PathBuf,
    pub present: bool,
    pub backup_present: bool,
    pub proposal_path: PathBuf,
    pub proposal_present: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[u64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lane_count: Option<usize>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub multipliers: Vec<u8>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub occurrences: Vec<u32>,
    /// Slots still unsolved or only best-effort, across all occurrences.
    pub provisional_slots: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lanes: Vec<LaneDiagnostic>,
    /// Lanes whose multiplier is degenerate or unexpectedly even.
    pub problem_lanes: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct FullReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init: Option<InitReport>,
    pub compute: ComputeReport,
    pub patch: PatchSummary,
    pub verify: VerifyReport,
}

pub fn render<T: Serialize>(report: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

pub fn print_report<T: Serialize>(report: &T) -> anyhow::Result<()> {
    println!("{}", render(report)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_report_omits_absent_model_fields() {
        let report = StatusReport {
            model_path: PathBuf::from("calibration/model.json"),
            present: false,
            backup_present: false,
            proposal_path: PathBuf::from("calibration/proposal.json"),
            proposal_present: false,
            range: None,
            lane_count: None,
            multipliers: Vec::new(),
            occurrences: Vec::new(),
            provisional_slots: 0,
            lanes: Vec::new(),
            problem_lanes: 0,
        };
        let json = render(&report).unwrap();
        assert!(json.contains("\"present\": false"));
        assert!(json.contains("\"proposal_present\": false"));
        assert!(!json.contains("range"));
        assert!(!json.contains("multipliers"));
        assert!(!json.contains("\"lanes\""));
    }

    #[test]
    fn test_key_report_shape() {
        let report = KeyReport {
            scalar: U256::from_u64(1),
            public_key: "02ab".to_string(),
            address: "1abc".to_string(),
            wif: "Kw".to_string(),
            target: "1abc".to_string(),
            matches: true,
        };
        let value: serde_json::Value = serde_json::from_str(&render(&report).unwrap()).unwrap();
        assert_eq!(value["matches"], true);
        assert_eq!(
            value["scalar"],
            "0x0000000000000000000000000000000000000000000000000000000000000001"
        );
    }
}
