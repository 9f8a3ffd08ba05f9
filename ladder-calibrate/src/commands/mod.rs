pub mod compute;
pub mod full;
pub mod init;
pub mod patch;
pub mod status;
pub mod verify;

use address_verify::U256;
use anyhow::Context;
use lane_ladder::{CalibrationStore, EnvValues, KnownValues, MemoryValues};

use crate::config::{Config, KnownValueSettings};

/// Model store for this run.
pub fn open_store(config: &Config) -> CalibrationStore {
    CalibrationStore::open(&config.calibration.model_path)
}

/// The configured JSON file first, then `<prefix><index>` variables.
pub fn known_source(settings: &KnownValueSettings) -> anyhow::Result<Box<dyn KnownValues>> {
    let env = EnvValues::new(settings.env_prefix.clone());
    match &settings.path {
        Some(path) => {
            let file = MemoryValues::from_json_file(path)?;
            Ok(Box::new(file.or(env)))
        }
        None => Ok(Box::new(env)),
    }
}

pub fn known_value(source: &dyn KnownValues, index: u64) -> anyhow::Result<U256> {
    source
        .get_known_value(index)
        .with_context(|| format!("no known value at index {index}"))
}
