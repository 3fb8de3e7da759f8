//! `goatpad merge`: one batch mail-merge run.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Args;

use goatpad_kernel::{
    CollisionPolicy, ContactStore, MergeConfig, MergeEvent, MergeSettings, MergeSummary, Merger,
    SqliteSource, TaskOutcome,
};

use crate::OutputFormat;

/// Exit code for a merge that finished with per-record failures.
pub const EXIT_PARTIAL: u8 = 2;

#[derive(Debug, Args)]
pub struct MergeArgs {
    /// Template file with `{{Column}}` placeholders.
    #[arg(long, env = "GOATPAD_TEMPLATE")]
    pub template: Option<PathBuf>,

    /// SQLite database holding the contacts table.
    #[arg(long, env = "GOATPAD_DB")]
    pub db: Option<PathBuf>,

    /// Existing directory to write one file per record into.
    #[arg(long, env = "GOATPAD_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Table to merge [default: contacts].
    #[arg(long)]
    pub table: Option<String>,

    /// Maximum records rendered at once [default: 50].
    #[arg(long, short = 'j')]
    pub concurrency: Option<usize>,

    /// Column that names each output file [default: Name].
    #[arg(long)]
    pub name_column: Option<String>,

    /// What to do when two records map to the same file name.
    #[arg(long, value_name = "overwrite|error|disambiguate")]
    pub collision: Option<CollisionPolicy>,

    /// Summary format.
    #[arg(long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Print a line to stderr as each record finishes.
    #[arg(long)]
    pub progress: bool,

    /// Settings file to use instead of the user config.
    #[arg(long)]
    pub config: Option<PathBuf>,
}

/// The three inputs every merge needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeInputs {
    pub template: PathBuf,
    pub db: PathBuf,
    pub output: PathBuf,
}

impl MergeArgs {
    /// All required inputs, or one error naming every missing one.
    pub fn require_inputs(&self) -> Result<MergeInputs> {
        let mut missing = Vec::new();
        if self.template.is_none() {
            missing.push("--template (GOATPAD_TEMPLATE)");
        }
        if self.db.is_none() {
            missing.push("--db (GOATPAD_DB)");
        }
        if self.output.is_none() {
            missing.push("--output (GOATPAD_OUTPUT)");
        }

        match (&self.template, &self.db, &self.output) {
            (Some(template), Some(db), Some(output)) => Ok(MergeInputs {
                template: template.clone(),
                db: db.clone(),
                output: output.clone(),
            }),
            _ => bail!("missing required input: {}", missing.join(", ")),
        }
    }

    /// Settings from the config file with command-line overrides applied.
    pub fn settings(&self) -> Result<MergeSettings> {
        let mut settings = match &self.config {
            Some(path) => MergeSettings::load_from(path)?,
            None => MergeSettings::load()?,
        };

        if let Some(table) = &self.table {
            settings.table = table.clone();
        }
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        if let Some(column) = &self.name_column {
            settings.name_column = column.clone();
        }
        if let Some(policy) = self.collision {
            settings.collision = policy;
        }
        Ok(settings)
    }
}

/// Execute the merge command.
///
/// Returns exit code 0 when every record was written and [`EXIT_PARTIAL`]
/// when some were not. Fatal errors come back as `Err`.
pub async fn execute(args: MergeArgs) -> Result<ExitCode> {
    let inputs = args.require_inputs()?;
    let settings = args.settings()?;
    tracing::debug!(?settings, "effective merge settings");
    let config = MergeConfig::from_settings(&settings, &inputs.template, &inputs.output);

    let store = ContactStore::open_read_only(&inputs.db)
        .with_context(|| format!("Failed to open database {}", inputs.db.display()))?;
    let merger = Merger::new(config, Arc::new(SqliteSource::new(store)));

    let summary = if args.progress {
        run_with_progress(merger).await?
    } else {
        merger.run().await?
    };

    print_summary(&summary, &inputs.output, args.format)?;

    Ok(if summary.all_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_PARTIAL)
    })
}

async fn run_with_progress(merger: Merger) -> Result<MergeSummary> {
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let handle = merger.spawn(tx);

    let mut total = 0;
    let mut done = 0;
    while let Some(event) = rx.recv().await {
        match event {
            MergeEvent::Started { total: n } => total = n,
            MergeEvent::TaskFinished(outcome) => {
                done += 1;
                eprintln!("{}", progress_line(done, total, &outcome));
            }
            MergeEvent::Finished(_) | MergeEvent::Aborted { .. } => break,
        }
    }

    let summary = handle.await.context("Merge task panicked")??;
    Ok(summary)
}

fn progress_line(done: usize, total: usize, outcome: &TaskOutcome) -> String {
    match outcome {
        TaskOutcome::Written { path, .. } => {
            format!("[{done}/{total}] wrote {}", path.display())
        }
        TaskOutcome::Failed(failure) => {
            format!("[{done}/{total}] record #{} failed: {}", failure.index, failure.cause)
        }
    }
}

fn print_summary(summary: &MergeSummary, output: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Text => {
            println!(
                "Merged {} of {} records into {} ({} ms)",
                summary.succeeded,
                summary.total,
                output.display(),
                summary.elapsed_ms
            );
            for failure in &summary.failures {
                match &failure.path {
                    Some(path) => println!(
                        "  record #{} ({}): {}",
                        failure.index,
                        path.display(),
                        failure.cause
                    ),
                    None => println!("  record #{}: {}", failure.index, failure.cause),
                }
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_line_written() {
        let line = progress_line(3, 10, &TaskOutcome::written(2, "out/resume_ada.txt"));
        assert_eq!(line, "[3/10] wrote out/resume_ada.txt");
    }

    #[test]
    fn test_progress_line_failed() {
        let line = progress_line(1, 2, &TaskOutcome::failed(0, None, "disk full"));
        assert_eq!(line, "[1/2] record #0 failed: disk full");
    }
}
