//! `goatpad table`: contact table management over the SQLite store.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use serde_json::{Map, Value};

use goatpad_kernel::{Column, ContactStore, Record};

use crate::OutputFormat;

#[derive(Debug, Args)]
pub struct TableArgs {
    /// SQLite database file; created if missing.
    #[arg(long, env = "GOATPAD_DB")]
    pub db: PathBuf,

    #[command(subcommand)]
    pub action: TableAction,
}

#[derive(Debug, Subcommand)]
pub enum TableAction {
    /// Create (or replace) a table. Columns are `Name` or `Name:DATE`.
    Create {
        table: String,
        #[arg(required = true)]
        columns: Vec<Column>,
    },
    /// Append a row, one value per column.
    Insert { table: String, values: Vec<String> },
    /// Replace every column of the rows whose first column equals KEY.
    Update {
        table: String,
        key: String,
        values: Vec<String>,
    },
    /// Print a table's columns and rows.
    Show {
        table: String,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// List tables.
    List,
}

/// Execute a table command.
pub fn execute(args: TableArgs) -> Result<()> {
    let store = ContactStore::open(&args.db)
        .with_context(|| format!("Failed to open database {}", args.db.display()))?;

    match args.action {
        TableAction::Create { table, columns } => {
            store.create_table(&table, &columns)?;
            println!("Created table {table} with {} columns", columns.len());
        }
        TableAction::Insert { table, values } => {
            store.insert_row(&table, &values)?;
            println!("Inserted 1 row into {table}");
        }
        TableAction::Update { table, key, values } => {
            let changed = store.update_row(&table, &key, &values)?;
            if changed == 0 {
                bail!("No row in {table} has key {key:?}");
            }
            println!("Updated {changed} row(s) in {table}");
        }
        TableAction::Show { table, format } => {
            let columns = store.table_columns(&table)?;
            let rows = store.rows(&table)?;
            match format {
                OutputFormat::Text => print!("{}", render_text(&columns, &rows)),
                OutputFormat::Json => {
                    let rows: Vec<Value> = rows.iter().map(row_json).collect();
                    println!("{}", serde_json::to_string_pretty(&rows)?);
                }
            }
        }
        TableAction::List => {
            for table in store.list_tables()? {
                println!("{table}");
            }
        }
    }
    Ok(())
}

/// Tab-separated header and rows.
fn render_text(columns: &[Column], rows: &[Record]) -> String {
    let mut out = String::new();
    let header: Vec<String> = columns.iter().map(ToString::to_string).collect();
    out.push_str(&header.join("\t"));
    out.push('\n');
    for row in rows {
        let cells: Vec<&str> = row.iter().map(|(_, value)| value).collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }
    out
}

fn row_json(row: &Record) -> Value {
    let object: Map<String, Value> = row
        .iter()
        .map(|(column, value)| (column.to_string(), Value::String(value.to_string())))
        .collect();
    Value::Object(object)
}
