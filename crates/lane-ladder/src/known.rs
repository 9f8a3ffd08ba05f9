//! Known-value sources.
//!
//! The solvers only ever ask "what is the value at index `i`, if known?".
//! Sources implement [`KnownValues`] and chain with [`KnownValues::or`]:
//!
//! ```
//! use address_verify::U256;
//! use lane_ladder::known::{EnvValues, KnownValues, MemoryValues};
//!
//! let mut seeded = MemoryValues::new();
//! seeded.insert(70, U256::from_u64(0xe0b8));
//! let source = seeded.or(EnvValues::new("LADDER_DOC_HEX"));
//! assert_eq!(source.get_known_value(70), Some(U256::from_u64(0xe0b8)));
//! assert_eq!(source.get_known_value(71), None);
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use address_verify::U256;
use thiserror::Error;

/// Default environment prefix: `HEX75` holds the value at index 75.
pub const DEFAULT_ENV_PREFIX: &str = "HEX";

#[derive(Debug, Error)]
pub enum KnownValueError {
    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Read-only lookup of disclosed values by index.
pub trait KnownValues {
    fn get_known_value(&self, index: u64) -> Option<U256>;

    /// Ask `self` first, then `fallback`.
    fn or<B: KnownValues>(self, fallback: B) -> Chain<Self, B>
    where
        Self: Sized,
    {
        Chain {
            first: self,
            second: fallback,
        }
    }
}

impl<T: KnownValues + ?Sized> KnownValues for &T {
    fn get_known_value(&self, index: u64) -> Option<U256> {
        (**self).get_known_value(index)
    }
}

impl<T: KnownValues + ?Sized> KnownValues for Box<T> {
    fn get_known_value(&self, index: u64) -> Option<U256> {
        (**self).get_known_value(index)
    }
}

// ============================================================================
// SOURCES
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryValues {
    values: BTreeMap<u64, U256>,
}

impl MemoryValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, index: u64, value: U256) -> Option<U256> {
        self.values.insert(index, value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = u64> + '_ {
        self.values.keys().copied()
    }

    /// Parse `{"75": "0x..."}`.
    pub fn from_json_file(path: &Path) -> Result<Self, KnownValueError> {
        let json = fs::read_to_string(path).map_err(|source| KnownValueError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let values: BTreeMap<u64, U256> = serde_json::from_str(&json).map_err(|source| KnownValueError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), count = values.len(), "loaded known values");
        Ok(Self { values })
    }
}

impl FromIterator<(u64, U256)> for MemoryValues {
    fn from_iter<I: IntoIterator<Item = (u64, U256)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

impl KnownValues for MemoryValues {
    fn get_known_value(&self, index: u64) -> Option<U256> {
        self.values.get(&index).copied()
    }
}

/// Values from `<prefix><index>` environment variables.
///
/// Absent variables are simply unknown; malformed hex is skipped with a
/// warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvValues {
    prefix: String,
}

impl EnvValues {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self { prefix: prefix.into() }
    }

    pub fn variable(&self, index: u64) -> String {
        format!("{}{}", self.prefix, index)
    }
}

impl Default for EnvValues {
    fn default() -> Self {
        Self::new(DEFAULT_ENV_PREFIX)
    }
}

impl KnownValues for EnvValues {
    fn get_known_value(&self, index: u64) -> Option<U256> {
        let var = self.variable(index);
        let raw = std::env::var(&var).ok()?;
        match U256::from_hex(&raw) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(variable = %var, error = %e, "ignoring malformed known value");
                None
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A: KnownValues, B: KnownValues> KnownValues for Chain<A, B> {
    fn get_known_value(&self, index: u64) -> Option<U256> {
        self.first
            .get_known_value(index)
            .or_else(|| self.second.get_known_value(index))
    }
}

/// `(i, value(i), value(i + 1))` for every `i` with both `i` and `i + 1` in
/// `start..=end` and both values known.
pub fn consecutive_pairs<K: KnownValues + ?Sized>(source: &K, start: u64, end: u64) -> Vec<(u64, U256, U256)> {
    (start..end)
        .filter_map(|i| Some((i, source.get_known_value(i)?, source.get_known_value(i + 1)?)))
        .collect()
}
