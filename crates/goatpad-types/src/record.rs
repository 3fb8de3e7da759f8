//! Record: one row of a contacts table, as text.

use serde::{Deserialize, Serialize};

/// One data row as ordered `(column, value)` pairs.
///
/// Values are always text. A NULL in the backing store is represented as an
/// empty string, so "column present with empty value" and "column absent" are
/// only distinguishable through [`Record::get`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Create an empty record.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a record from column names and values of equal length.
    ///
    /// Extra names or values beyond the shorter side are ignored.
    pub fn from_columns<N, V>(names: &[N], values: Vec<V>) -> Self
    where
        N: AsRef<str>,
        V: Into<String>,
    {
        let fields = names
            .iter()
            .zip(values)
            .map(|(n, v)| (n.as_ref().to_string(), v.into()))
            .collect();
        Self { fields }
    }

    /// Append a field, builder-style.
    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.push(column, value);
        self
    }

    /// Append a field. If the column already exists its value is replaced
    /// in place, keeping the original position.
    pub fn push(&mut self, column: impl Into<String>, value: impl Into<String>) {
        let column = column.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((column, value)),
        }
    }

    /// Value of a column, or `None` if the record has no such column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v.as_str())
    }

    /// True if the record has a column with this name.
    pub fn contains(&self, column: &str) -> bool {
        self.fields.iter().any(|(c, _)| c == column)
    }

    /// Column names in order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(c, _)| c.as_str())
    }

    /// `(column, value)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(c, v)| (c.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<C, V> FromIterator<(C, V)> for Record
where
    C: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (C, V)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (c, v) in iter {
            record.push(c, v);
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_present_and_absent() {
        let record = Record::new().with("Name", "Ada").with("ID", "7");
        assert_eq!(record.get("Name"), Some("Ada"));
        assert_eq!(record.get("ID"), Some("7"));
        assert_eq!(record.get("Email"), None);
    }

    #[test]
    fn test_empty_value_is_present() {
        let record = Record::new().with("Name", "");
        assert!(record.contains("Name"));
        assert_eq!(record.get("Name"), Some(""));
    }

    #[test]
    fn test_push_replaces_in_place() {
        let mut record = Record::new().with("A", "1").with("B", "2");
        record.push("A", "3");
        let pairs: Vec<_> = record.iter().collect();
        assert_eq!(pairs, vec![("A", "3"), ("B", "2")]);
    }

    #[test]
    fn test_from_columns_keeps_order() {
        let record = Record::from_columns(&["Name", "ID", "City"], vec!["Bob", "3", "Oslo"]);
        let cols: Vec<_> = record.columns().collect();
        assert_eq!(cols, vec!["Name", "ID", "City"]);
        assert_eq!(record.len(), 3);
    }

    #[test]
    fn test_collect_from_pairs() {
        let record: Record = vec![("x", "1"), ("y", "2")].into_iter().collect();
        assert_eq!(record.get("y"), Some("2"));
    }
}
