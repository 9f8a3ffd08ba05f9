//! TOML configuration.
//!
//! Every section and field has a default, so a missing file or a partial
//! file still yields a usable [`Config`].
//!
//! ```toml
//! [calibration]
//! model_path = "calibration/model.json"
//! range = [70, 160]
//! multiplier = 91
//! even_multiplier_lanes = [2, 6]
//!
//! [known_values]
//! path = "calibration/known.json"
//! env_prefix = "HEX"
//!
//! [compute]
//! earlier = 70
//! later = 74
//! strict = false
//! policy = { kind = "polynomial", x_exponents = [4], drift_exponents = [3, 2, 1, 0] }
//!
//! [bridge]
//! earlier = 70
//! later = 72
//! target = 71
//! target_address = "1..."
//! schedule = [
//!     { kind = "from_history", occurrences = [0] },
//!     { kind = "known", occurrence = 0, phase = "second" },
//! ]
//!
//! [logging]
//! level = "info"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use lane_ladder::{IndexRange, Lane, Phase, SearchLimits, StepKind, DEFAULT_ENV_PREFIX, DEFAULT_OCCURRENCE_SPAN};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub calibration: CalibrationSettings,
    pub known_values: KnownValueSettings,
    pub compute: ComputeSettings,
    pub bridge: Option<BridgeSettings>,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    pub model_path: PathBuf,
    pub proposal_path: PathBuf,
    pub range: [u64; 2],
    /// Indices sharing one drift occurrence.
    pub occurrence_span: u64,
    /// Multiplier given to every lane by `init`.
    pub multiplier: u8,
    /// Lanes expected to carry a multiplier with `gcd(a, 256) = 2`,
    /// numbered least-significant-first (historic tables list 9 and 13
    /// counting from the most significant end, which is 6 and 2 here).
    pub even_multiplier_lanes: Vec<Lane>,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("calibration/model.json"),
            proposal_path: PathBuf::from("calibration/proposal.json"),
            range: [70, 160],
            occurrence_span: DEFAULT_OCCURRENCE_SPAN,
            multiplier: 91,
            even_multiplier_lanes: Vec::new(),
        }
    }
}

impl CalibrationSettings {
    pub fn index_range(&self) -> IndexRange {
        IndexRange::from(self.range)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KnownValueSettings {
    /// JSON file of `{"<index>": "<hex>"}`.
    pub path: Option<PathBuf>,
    pub env_prefix: String,
}

impl Default for KnownValueSettings {
    fn default() -> Self {
        Self {
            path: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeSettings {
    pub earlier: u64,
    pub later: u64,
    /// Occurrence to patch; derived from `earlier` when absent.
    pub occurrence: Option<u32>,
    /// Phase to patch; derived from `earlier` when absent.
    pub phase: Option<Phase>,
    pub policy: StepKind,
    /// Step count override; `later - earlier` when absent.
    pub steps: Option<u32>,
    /// Report unsolvable bytes as inconsistent instead of guessing.
    pub strict: bool,
    /// Let `patch` replace authoritative drift.
    pub overwrite: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeSettings {
    pub earlier: u64,
    pub later: u64,
    pub target: u64,
    pub target_address: String,
    #[serde(default)]
    pub policy: StepKind,
    pub schedule: Vec<ScheduleEntry>,
    #[serde(default)]
    pub limits: SearchLimits,
}

/// Drift of one bridge step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleEntry {
    Known {
        occurrence: u32,
        #[serde(default)]
        phase: Phase,
    },
    Unknown {
        #[serde(default)]
        min: u8,
        #[serde(default = "max_drift")]
        max: u8,
    },
    FromHistory {
        occurrences: Vec<u32>,
    },
}

fn max_drift() -> u8 {
    u8::MAX
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Read `path`, or fall back to defaults when it does not exist.
pub fn load_config(path: &Path) -> anyhow::Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content =
        std::fs::read_to_string(path).with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("parsing config {}", path.display()))
}
