//! What to do when two records map to the same output file.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Policy applied when two records in one merge derive the same file name.
///
/// Names are claimed in source order, so `Error` and `Disambiguate` are
/// deterministic: the first record always keeps the plain name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollisionPolicy {
    /// Every record writes to its derived name; last write wins.
    #[default]
    Overwrite,
    /// Later records with an already-claimed name fail without writing.
    Error,
    /// Later records get a numeric suffix: `name_2.txt`, `name_3.txt`, ...
    Disambiguate,
}

impl fmt::Display for CollisionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollisionPolicy::Overwrite => write!(f, "overwrite"),
            CollisionPolicy::Error => write!(f, "error"),
            CollisionPolicy::Disambiguate => write!(f, "disambiguate"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown collision policy '{0}' (expected overwrite, error or disambiguate)")]
pub struct ParseCollisionPolicyError(pub String);

impl FromStr for CollisionPolicy {
    type Err = ParseCollisionPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(CollisionPolicy::Overwrite),
            "error" => Ok(CollisionPolicy::Error),
            "disambiguate" => Ok(CollisionPolicy::Disambiguate),
            other => Err(ParseCollisionPolicyError(other.to_string())),
        }
    }
}
