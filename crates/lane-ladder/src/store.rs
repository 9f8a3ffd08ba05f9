//! Calibration store: one session's handle on a model file.
//!
//! Writes go through a temp file in the target directory that is renamed
//! over the target, so a failed write never leaves a half-written model.
//! Before the first write of a session the existing file is copied to
//! `<path>.backup`, unless a backup already exists. A backup is never
//! overwritten.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::model::{CalibrationFile, CalibrationModel, ModelError};
use crate::patch::PatchError;

/// Suffix appended to the model file name for the backup copy.
pub const BACKUP_SUFFIX: &str = ".backup";

#[derive(Debug)]
pub struct CalibrationStore {
    path: PathBuf,
    backup_checked: bool,
}

impl CalibrationStore {
    pub fn open(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            backup_checked: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn backup_path(&self) -> PathBuf {
        backup_path_for(&self.path)
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    pub fn backup_exists(&self) -> bool {
        self.backup_path().is_file()
    }

    pub fn load(&self) -> Result<CalibrationModel, ModelError> {
        let json = fs::read_to_string(&self.path).map_err(|source| {
            if source.kind() == io::ErrorKind::NotFound {
                ModelError::NotFound {
                    path: self.path.clone(),
                }
            } else {
                ModelError::Io {
                    path: self.path.clone(),
                    source,
                }
            }
        })?;

        let file: CalibrationFile = serde_json::from_str(&json).map_err(|source| ModelError::Corrupt {
            origin: self.path.display().to_string(),
            source,
        })?;
        let model = CalibrationModel::try_from(file)?;

        tracing::debug!(
            path = %self.path.display(),
            occurrences = model.occurrences().count(),
            "loaded calibration model"
        );
        Ok(model)
    }

    /// Write `model` if no model exists yet.
    pub fn init(&mut self, model: &CalibrationModel) -> Result<(), ModelError> {
        if self.exists() {
            return Err(ModelError::AlreadyExists {
                path: self.path.clone(),
            });
        }

        let json = model.to_json_pretty().map_err(|source| ModelError::Corrupt {
            origin: "initial model".to_string(),
            source,
        })?;
        write_atomic(&self.path, json.as_bytes()).map_err(|source| ModelError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!(path = %self.path.display(), "initialized calibration model");
        Ok(())
    }

    /// Back up once per session, then replace the model atomically.
    pub fn save(&mut self, model: &CalibrationModel) -> Result<(), PatchError> {
        self.ensure_backup()?;

        let json = model.to_json_pretty().map_err(|source| ModelError::Corrupt {
            origin: "calibration model".to_string(),
            source,
        })?;
        write_atomic(&self.path, json.as_bytes()).map_err(|source| PatchError::Write {
            path: self.path.clone(),
            source,
        })?;

        tracing::info!(path = %self.path.display(), "saved calibration model");
        Ok(())
    }

    fn ensure_backup(&mut self) -> Result<(), PatchError> {
        if self.backup_checked {
            return Ok(());
        }

        let backup = self.backup_path();
        if backup.is_file() {
            tracing::debug!(backup = %backup.display(), "backup already present, leaving it untouched");
        } else if self.exists() {
            fs::copy(&self.path, &backup).map_err(|source| PatchError::BackupFailed {
                path: backup.clone(),
                source,
            })?;
            tracing::info!(backup = %backup.display(), "backed up calibration model");
        }

        self.backup_checked = true;
        Ok(())
    }
}

/// `<path>.backup`
pub fn backup_path_for(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(BACKUP_SUFFIX);
    path.with_file_name(name)
}

/// Write through a sibling temp file, then rename over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
