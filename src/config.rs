//! Engine configuration.
//!
//! Loaded from TOML, e.g.
//!
//! ```toml
//! case_sensitive = true
//! max_pattern_len = 500
//! infer_columns = false
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{TableError, TableResult};

/// Default cap on regex pattern length.
pub const DEFAULT_MAX_PATTERN_LEN: usize = 1000;

/// Settings applied to tables created through a config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Whether column names and string matching are case-sensitive.
    pub case_sensitive: bool,
    /// Maximum accepted regex pattern length.
    pub max_pattern_len: usize,
    /// Infer columns from the first record when bulk-loading into a table
    /// that has none.
    pub infer_columns: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            max_pattern_len: DEFAULT_MAX_PATTERN_LEN,
            infer_columns: true,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> TableResult<Self> {
        toml::from_str(s).map_err(|e| TableError::Config(e.to_string()))
    }

    pub fn from_file(path: impl AsRef<Path>) -> TableResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TableError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }
}
