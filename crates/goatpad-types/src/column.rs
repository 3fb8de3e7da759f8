//! Table column definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declared type of a contacts-table column.
///
/// The data editor only offers `VARCHAR` and `DATE`; anything else found in
/// an existing database is kept verbatim as `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Varchar,
    /// ISO `YYYY-MM-DD` dates stored as text.
    Date,
    Other(String),
}

impl ColumnType {
    /// The SQL type name used in `CREATE TABLE`.
    pub fn sql_name(&self) -> &str {
        match self {
            ColumnType::Varchar => "VARCHAR",
            ColumnType::Date => "DATE",
            ColumnType::Other(s) => s,
        }
    }

    /// Map a declared SQL type back to a column type.
    pub fn from_sql(decl: &str) -> Self {
        match decl.trim().to_ascii_uppercase().as_str() {
            "VARCHAR" => ColumnType::Varchar,
            "DATE" => ColumnType::Date,
            _ => ColumnType::Other(decl.trim().to_string()),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_name())
    }
}

/// Error parsing a `name:TYPE` column declaration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseColumnError {
    #[error("column name cannot be empty")]
    EmptyName,
    #[error("unsupported column type '{0}' (expected VARCHAR or DATE)")]
    UnsupportedType(String),
}

impl FromStr for ColumnType {
    type Err = ParseColumnError;

    /// Only the types the editor can create are accepted here.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match ColumnType::from_sql(s) {
            ColumnType::Other(other) => Err(ParseColumnError::UnsupportedType(other)),
            known => Ok(known),
        }
    }
}

/// A named, typed column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }

    pub fn varchar(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Varchar)
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Date)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.column_type)
    }
}

impl FromStr for Column {
    type Err = ParseColumnError;

    /// Parse `Name` or `Name:TYPE`. The type defaults to `VARCHAR`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, ty) = match s.split_once(':') {
            Some((name, ty)) => (name.trim(), ty.parse()?),
            None => (s.trim(), ColumnType::Varchar),
        };
        if name.is_empty() {
            return Err(ParseColumnError::EmptyName);
        }
        Ok(Column::new(name, ty))
    }
}
