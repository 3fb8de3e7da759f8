//! Contacts storage for goatpad.
//!
//! Tables are created by the data editor with up to fifteen user-defined
//! columns, each either `VARCHAR` or `DATE`. Every value is stored and read
//! back as text; NULL reads as the empty string.
//!
//! All identifiers are quoted. Identifiers for new tables and columns must
//! additionally match `[A-Za-z_][A-Za-z0-9_]*`.

mod error;

pub use error::{StoreError, StoreResult};

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags, params_from_iter};

use goatpad_types::{Column, ColumnType, Record};

/// Maximum number of columns the data editor allows per table.
pub const MAX_COLUMNS: usize = 15;

/// Format accepted for `DATE` columns.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed contacts store.
pub struct ContactStore {
    conn: Connection,
}

impl ContactStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Open an existing database without write access.
    ///
    /// Fails if the file does not exist rather than creating it.
    pub fn open_read_only(path: impl AsRef<Path>) -> StoreResult<Self> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { conn })
    }

    /// Create an in-memory store (for testing or scratch data).
    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    // ================================================================
    // Schema
    // ================================================================

    /// Names of all user tables, sorted.
    pub fn list_tables(&self) -> StoreResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(names)
    }

    /// Columns of a table in declaration order.
    pub fn table_columns(&self, table: &str) -> StoreResult<Vec<Column>> {
        let mut stmt = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        let columns = stmt
            .query_map([table], |row| {
                let name: String = row.get(0)?;
                let decl: String = row.get(1)?;
                Ok(Column::new(name, ColumnType::from_sql(&decl)))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        if columns.is_empty() {
            return Err(StoreError::UnknownTable(table.to_string()));
        }
        Ok(columns)
    }

    /// Column names of a table in declaration order.
    pub fn column_names(&self, table: &str) -> StoreResult<Vec<String>> {
        Ok(self
            .table_columns(table)?
            .into_iter()
            .map(|c| c.name)
            .collect())
    }

    /// Replace `table` with a fresh, empty table of the given columns.
    ///
    /// Any existing table with that name is dropped first, together with its
    /// rows.
    pub fn create_table(&self, table: &str, columns: &[Column]) -> StoreResult<()> {
        validate_identifier(table)?;
        if columns.is_empty() {
            return Err(StoreError::NoColumns(table.to_string()));
        }
        if columns.len() > MAX_COLUMNS {
            return Err(StoreError::TooManyColumns {
                count: columns.len(),
                max: MAX_COLUMNS,
            });
        }

        let mut defs = Vec::with_capacity(columns.len());
        for column in columns {
            validate_identifier(&column.name)?;
            defs.push(format!(
                "{} {}",
                quote_ident(&column.name),
                column.column_type.sql_name()
            ));
        }

        let sql = format!(
            "DROP TABLE IF EXISTS {table};
             CREATE TABLE {table} ({defs});",
            table = quote_ident(table),
            defs = defs.join(", "),
        );
        self.conn.execute_batch(&sql)?;
        tracing::info!(table, columns = columns.len(), "created table");
        Ok(())
    }

    // ================================================================
    // Rows
    // ================================================================

    /// Append a row. `values` holds one entry per column, in column order.
    pub fn insert_row(&self, table: &str, values: &[String]) -> StoreResult<()> {
        let columns = self.checked_columns(table, values)?;

        let names: Vec<String> = columns.iter().map(|c| quote_ident(&c.name)).collect();
        let slots: Vec<String> = (1..=columns.len()).map(|i| format!("?{i}")).collect();
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quote_ident(table),
            names.join(", "),
            slots.join(", "),
        );
        self.conn.execute(&sql, params_from_iter(values.iter()))?;
        Ok(())
    }

    /// Overwrite every column of the rows whose first column equals `key`.
    ///
    /// The first column acts as the row key. Returns the number of rows
    /// updated.
    pub fn update_row(&self, table: &str, key: &str, values: &[String]) -> StoreResult<usize> {
        let columns = self.checked_columns(table, values)?;

        let sets: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, c)| format!("{} = ?{}", quote_ident(&c.name), i + 1))
            .collect();
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = ?{}",
            quote_ident(table),
            sets.join(", "),
            quote_ident(&columns[0].name),
            columns.len() + 1,
        );
        let params = values.iter().map(String::as_str).chain(std::iter::once(key));
        let changed = self.conn.execute(&sql, params_from_iter(params))?;
        Ok(changed)
    }

    /// Every row of a table, each value rendered as text.
    pub fn rows(&self, table: &str) -> StoreResult<Vec<Record>> {
        let names = self.column_names(table)?;
        let select: Vec<String> = names.iter().map(|n| quote_ident(n)).collect();
        let sql = format!("SELECT {} FROM {}", select.join(", "), quote_ident(table));

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query([])?;
        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(names.len());
            for i in 0..names.len() {
                values.push(value_to_text(row.get_ref(i)?));
            }
            records.push(Record::from_columns(names.as_slice(), values));
        }
        Ok(records)
    }

    /// Number of rows in a table.
    pub fn row_count(&self, table: &str) -> StoreResult<usize> {
        // Surface a missing table as UnknownTable, not a raw SQL error.
        self.table_columns(table)?;
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", quote_ident(table)),
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    /// Look up the table's columns and check `values` against them.
    fn checked_columns(&self, table: &str, values: &[String]) -> StoreResult<Vec<Column>> {
        let columns = self.table_columns(table)?;
        if columns.len() != values.len() {
            return Err(StoreError::ArityMismatch {
                table: table.to_string(),
                expected: columns.len(),
                actual: values.len(),
            });
        }
        for (column, value) in columns.iter().zip(values) {
            if column.column_type == ColumnType::Date && !value.is_empty() && !is_valid_date(value) {
                return Err(StoreError::InvalidDate {
                    column: column.name.clone(),
                    value: value.clone(),
                });
            }
        }
        Ok(columns)
    }
}

/// True if `value` is a calendar date in exactly `YYYY-MM-DD` form.
///
/// chrono alone accepts unpadded fields, signed years and leading
/// whitespace, so the parsed date must also format back to `value`.
pub fn is_valid_date(value: &str) -> bool {
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .is_ok_and(|date| date.format(DATE_FORMAT).to_string() == value)
}

/// Reject names that are not plain SQL identifiers.
fn validate_identifier(name: &str) -> StoreResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        _ => false,
    };
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidIdentifier(name.to_string()))
    }
}

/// Quote an identifier for interpolation into SQL.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

fn value_to_text(value: ValueRef<'_>) -> String {
    match value {
        ValueRef::Null => String::new(),
        ValueRef::Integer(i) => i.to_string(),
        ValueRef::Real(f) => f.to_string(),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
    }
}
