//! LMDB environment configuration.
//!
//! Can be loaded from a TOML file via [`LmdbConfig::from_toml_file`]; any
//! field left out takes its default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use btcb_store::StoreError;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LmdbConfig {
    /// Maximum size of the memory map, in bytes.
    #[serde(default = "default_map_size")]
    pub map_size: usize,

    /// Maximum number of named tables.
    #[serde(default = "default_max_dbs")]
    pub max_dbs: u32,

    #[serde(default = "default_max_readers")]
    pub max_readers: u32,

    /// Flush to disk on every commit. Turning this off trades durability of
    /// the last commits on power loss for throughput.
    #[serde(default = "default_true")]
    pub sync: bool,
}

// ── Defaults ───────────────────────────────────────────────────────────

fn default_map_size() -> usize {
    128 * 1024 * 1024 * 1024
}

fn default_max_dbs() -> u32 {
    128
}

fn default_max_readers() -> u32 {
    126
}

fn default_true() -> bool {
    true
}

// ── Impl ───────────────────────────────────────────────────────────────

impl LmdbConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self, StoreError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Initialization(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, StoreError> {
        toml::from_str(s).map_err(|e| StoreError::Initialization(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, StoreError> {
        toml::to_string_pretty(self).map_err(|e| StoreError::Serialization(e.to_string()))
    }
}

impl Default for LmdbConfig {
    fn default() -> Self {
        Self {
            map_size: default_map_size(),
            max_dbs: default_max_dbs(),
            max_readers: default_max_readers(),
            sync: default_true(),
        }
    }
}
