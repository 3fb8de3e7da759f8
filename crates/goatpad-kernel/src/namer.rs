//! Output file naming.
//!
//! Each record is written to `<prefix><normalized>.<extension>` inside the
//! output directory, where `<normalized>` is the value of the display-name
//! column lowercased with spaces turned into underscores. Names are a pure
//! function of record content; [`NameClaims`] applies the run's
//! [`CollisionPolicy`] when two records land on the same name.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use goatpad_types::{CollisionPolicy, Record};

/// Default column whose value names each output file.
pub const DEFAULT_NAME_COLUMN: &str = "Name";
/// Default file name prefix.
pub const DEFAULT_PREFIX: &str = "resume_";
/// Default file extension (without the dot).
pub const DEFAULT_EXTENSION: &str = "txt";

/// Derives output file names from records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputNamer {
    pub name_column: String,
    pub prefix: String,
    pub extension: String,
}

impl Default for OutputNamer {
    fn default() -> Self {
        Self {
            name_column: DEFAULT_NAME_COLUMN.to_string(),
            prefix: DEFAULT_PREFIX.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl OutputNamer {
    /// Namer keyed off a different display-name column.
    pub fn with_name_column(mut self, column: impl Into<String>) -> Self {
        self.name_column = column.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// File name without extension, e.g. `resume_bob_lee`.
    pub fn stem(&self, record: &Record) -> String {
        let raw = record.get(&self.name_column).unwrap_or_default();
        format!("{}{}", self.prefix, normalize(raw))
    }

    /// Full file name, e.g. `resume_bob_lee.txt`.
    pub fn file_name(&self, record: &Record) -> String {
        self.join_ext(&self.stem(record))
    }

    /// Output path for a record inside `dir`.
    pub fn path_for(&self, record: &Record, dir: &Path) -> PathBuf {
        dir.join(self.file_name(record))
    }

    fn join_ext(&self, stem: &str) -> String {
        if self.extension.is_empty() {
            stem.to_string()
        } else {
            format!("{}.{}", stem, self.extension)
        }
    }
}

/// Lowercase and replace spaces with underscores.
pub fn normalize(raw: &str) -> String {
    raw.to_lowercase().replace(' ', "_")
}

/// Result of claiming a file name for one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Claim {
    /// Write to this file name.
    Granted(String),
    /// The name was already claimed and the policy forbids sharing it.
    Rejected(String),
}

/// Tracks the file names claimed so far in one merge run.
///
/// Claims must be made in source order by a single producer; that is what
/// makes `Error` and `Disambiguate` deterministic.
#[derive(Debug)]
pub struct NameClaims {
    policy: CollisionPolicy,
    namer: OutputNamer,
    claimed: HashSet<String>,
}

impl NameClaims {
    pub fn new(namer: OutputNamer, policy: CollisionPolicy) -> Self {
        Self {
            policy,
            namer,
            claimed: HashSet::new(),
        }
    }

    /// Claim the output file name for the next record.
    pub fn claim(&mut self, record: &Record) -> Claim {
        let stem = self.namer.stem(record);
        let name = self.namer.join_ext(&stem);

        if self.claimed.insert(name.clone()) {
            return Claim::Granted(name);
        }

        match self.policy {
            CollisionPolicy::Overwrite => {
                tracing::warn!(file = %name, "output name shared by several records; last write wins");
                Claim::Granted(name)
            }
            CollisionPolicy::Error => Claim::Rejected(name),
            CollisionPolicy::Disambiguate => {
                let mut n = 2usize;
                loop {
                    let candidate = self.namer.join_ext(&format!("{stem}_{n}"));
                    if self.claimed.insert(candidate.clone()) {
                        return Claim::Granted(candidate);
                    }
                    n += 1;
                }
            }
        }
    }

    /// Number of distinct names claimed.
    pub fn len(&self) -> usize {
        self.claimed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claimed.is_empty()
    }
}
