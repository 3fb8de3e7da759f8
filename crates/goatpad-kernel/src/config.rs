//! Merge settings.
//!
//! Defaults for merge runs are loaded from `~/.config/goatpad/goatpad.toml`
//! (or the platform equivalent). Command-line flags override file values.
//! The template, database and output directory are per-run inputs and are
//! never read from this file.
//!
//! ```toml
//! table = "contacts"
//! concurrency = 50
//! name_column = "Name"
//! file_prefix = "resume_"
//! extension = "txt"
//! collision = "overwrite"
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use goatpad_types::CollisionPolicy;

use crate::namer::{DEFAULT_EXTENSION, DEFAULT_NAME_COLUMN, DEFAULT_PREFIX, OutputNamer};
use crate::scheduler::DEFAULT_CONCURRENCY;

/// Config file name inside the goatpad config directory.
pub const CONFIG_FILE: &str = "goatpad.toml";

/// Table merged when none is given.
pub const DEFAULT_TABLE: &str = "contacts";

/// Tunable defaults for merge runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSettings {
    /// Table whose rows are merged.
    #[serde(default = "default_table")]
    pub table: String,

    /// Maximum number of records rendered and written at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Column whose value names each output file.
    #[serde(default = "default_name_column")]
    pub name_column: String,

    /// Output file name prefix.
    #[serde(default = "default_prefix")]
    pub file_prefix: String,

    /// Output file extension, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// What to do when two records map to the same file.
    #[serde(default)]
    pub collision: CollisionPolicy,
}

fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_name_column() -> String {
    DEFAULT_NAME_COLUMN.to_string()
}

fn default_prefix() -> String {
    DEFAULT_PREFIX.to_string()
}

fn default_extension() -> String {
    DEFAULT_EXTENSION.to_string()
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self {
            table: default_table(),
            concurrency: default_concurrency(),
            name_column: default_name_column(),
            file_prefix: default_prefix(),
            extension: default_extension(),
            collision: CollisionPolicy::default(),
        }
    }
}

impl MergeSettings {
    /// Load settings from the default path.
    ///
    /// If the config file doesn't exist, returns default settings.
    pub fn load() -> Result<Self> {
        let Some(path) = Self::config_path() else {
            tracing::debug!("No config directory available, using defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        Self::load_from(&path)
    }

    /// Load settings from a specific path. The file must exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))
    }

    /// Default config file path, if the platform has a config directory.
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "goatpad").map(|dirs| dirs.config_dir().join(CONFIG_FILE))
    }

    /// The output namer these settings describe.
    pub fn namer(&self) -> OutputNamer {
        OutputNamer::default()
            .with_name_column(&self.name_column)
            .with_prefix(&self.file_prefix)
            .with_extension(&self.extension)
    }
}
