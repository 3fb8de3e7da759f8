//! The mail-merge orchestrator.
//!
//! A merge run:
//!
//! 1. reads the template file (fatal if unreadable),
//! 2. loads every row of the configured table (fatal on any storage error),
//! 3. claims an output file name per record in source order,
//! 4. renders and writes each record through a bounded [`FanOut`],
//! 5. waits for every task, then folds the outcomes into a [`MergeSummary`].
//!
//! Nothing is written unless steps 1 and 2 succeed. After that, a failing
//! record only fails itself.

use std::error::Error as _;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;

use goatpad_types::{CollisionPolicy, MergeEvent, MergeSummary, Record, TaskOutcome};

use crate::config::{DEFAULT_TABLE, MergeSettings};
use crate::namer::{Claim, NameClaims, OutputNamer};
use crate::scheduler::{DEFAULT_CONCURRENCY, FanOut, FanOutStats};
use crate::source::RowSource;
use crate::store::StoreError;
use crate::template::Template;

/// Errors that abort a merge before any record is dispatched.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("invalid merge configuration: {0}")]
    Config(String),

    #[error("failed to read template {}", .path.display())]
    TemplateRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to load rows from table '{table}'")]
    Storage {
        table: String,
        #[source]
        source: StoreError,
    },
}

impl MergeError {
    /// The error and all of its causes on one line.
    pub fn report(&self) -> String {
        let mut out = self.to_string();
        let mut cause = self.source();
        while let Some(e) = cause {
            out.push_str(": ");
            out.push_str(&e.to_string());
            cause = e.source();
        }
        out
    }
}

/// Inputs and knobs for one merge run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConfig {
    /// Template file, read fully before any work starts.
    pub template_path: PathBuf,
    /// Table whose rows are merged.
    pub table: String,
    /// Existing directory the outputs are written into.
    pub output_dir: PathBuf,
    /// Maximum tasks executing at once. Must be at least 1.
    pub concurrency: usize,
    pub namer: OutputNamer,
    pub collision: CollisionPolicy,
}

impl MergeConfig {
    /// Config with default table, concurrency, naming and collision policy.
    pub fn new(template_path: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            template_path: template_path.into(),
            table: DEFAULT_TABLE.to_string(),
            output_dir: output_dir.into(),
            concurrency: DEFAULT_CONCURRENCY,
            namer: OutputNamer::default(),
            collision: CollisionPolicy::default(),
        }
    }

    /// Config taking every default from `settings`.
    pub fn from_settings(
        settings: &MergeSettings,
        template_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            template_path: template_path.into(),
            table: settings.table.clone(),
            output_dir: output_dir.into(),
            concurrency: settings.concurrency,
            namer: settings.namer(),
            collision: settings.collision,
        }
    }

    pub fn with_table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_namer(mut self, namer: OutputNamer) -> Self {
        self.namer = namer;
        self
    }

    pub fn with_collision(mut self, collision: CollisionPolicy) -> Self {
        self.collision = collision;
        self
    }

    fn validate(&self) -> Result<NonZeroUsize, MergeError> {
        if self.table.trim().is_empty() {
            return Err(MergeError::Config("table name is required".to_string()));
        }
        NonZeroUsize::new(self.concurrency)
            .ok_or_else(|| MergeError::Config("concurrency must be at least 1".to_string()))
    }
}

/// Where one task writes.
#[derive(Debug)]
enum Target {
    Write(PathBuf),
    /// Name already claimed under `CollisionPolicy::Error`.
    Collision(PathBuf),
}

impl Target {
    fn path(&self) -> &Path {
        match self {
            Target::Write(p) | Target::Collision(p) => p,
        }
    }
}

/// One record's unit of work.
#[derive(Debug)]
struct MergeTask {
    record: Record,
    target: Target,
}

/// Runs merges from a row source.
pub struct Merger {
    config: MergeConfig,
    source: Arc<dyn RowSource>,
    stats: Option<Arc<FanOutStats>>,
}

impl Merger {
    pub fn new(config: MergeConfig, source: Arc<dyn RowSource>) -> Self {
        Self {
            config,
            source,
            stats: None,
        }
    }

    /// Observe task concurrency through `stats`.
    pub fn with_stats(mut self, stats: Arc<FanOutStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Run the merge to completion.
    ///
    /// Returns once every dispatched task has finished. Per-record failures
    /// are reported in the summary; only errors that prevent dispatch are
    /// returned as `Err`.
    #[tracing::instrument(
        level = "info",
        skip(self),
        fields(table = %self.config.table, concurrency = self.config.concurrency),
        err
    )]
    pub async fn run(&self) -> Result<MergeSummary, MergeError> {
        self.execute(None).await
    }

    /// Run the merge on a background task, posting progress to `events`.
    ///
    /// The last event sent is always `Finished` or `Aborted`. The caller never
    /// blocks; it applies events on its own loop as they arrive.
    pub fn spawn(self, events: UnboundedSender<MergeEvent>) -> JoinHandle<Result<MergeSummary, MergeError>> {
        tokio::spawn(async move {
            let result = self.execute(Some(&events)).await;
            if let Err(e) = &result {
                // Receiver may be gone; the result is still returned through the handle.
                let _ = events.send(MergeEvent::Aborted { reason: e.report() });
            }
            result
        })
    }

    async fn execute(
        &self,
        events: Option<&UnboundedSender<MergeEvent>>,
    ) -> Result<MergeSummary, MergeError> {
        let started = Instant::now();
        let config = &self.config;
        let limit = config.validate()?;

        let text = tokio::fs::read_to_string(&config.template_path)
            .await
            .map_err(|source| MergeError::TemplateRead {
                path: config.template_path.clone(),
                source,
            })?;
        let template = Arc::new(Template::parse(text));

        let storage_err = |source| MergeError::Storage {
            table: config.table.clone(),
            source,
        };
        let columns = self.source.columns(&config.table).await.map_err(storage_err)?;
        for name in template.placeholders() {
            if !columns.iter().any(|c| c == name) {
                tracing::warn!(placeholder = name, "template placeholder matches no column; left as-is");
            }
        }
        let records = self.source.fetch_all(&config.table).await.map_err(storage_err)?;

        tracing::info!(
            records = records.len(),
            output = %config.output_dir.display(),
            collision = %config.collision,
            "starting merge"
        );
        if let Some(tx) = events {
            let _ = tx.send(MergeEvent::Started {
                total: records.len(),
            });
        }

        let mut claims = NameClaims::new(config.namer.clone(), config.collision);
        let tasks: Vec<MergeTask> = records
            .into_iter()
            .map(|record| {
                let target = match claims.claim(&record) {
                    Claim::Granted(name) => Target::Write(config.output_dir.join(name)),
                    Claim::Rejected(name) => Target::Collision(config.output_dir.join(name)),
                };
                MergeTask { record, target }
            })
            .collect();
        let paths: Vec<PathBuf> = tasks.iter().map(|t| t.target.path().to_path_buf()).collect();

        let mut fanout = FanOut::new(limit);
        if let Some(stats) = &self.stats {
            fanout = fanout.with_stats(stats.clone());
        }

        let progress = events.cloned();
        let results = fanout
            .run(tasks, |index, task| {
                let template = template.clone();
                let progress = progress.clone();
                async move {
                    let outcome = run_task(index, task, &template).await;
                    if let Some(tx) = progress {
                        let _ = tx.send(MergeEvent::TaskFinished(outcome.clone()));
                    }
                    outcome
                }
            })
            .await;

        let outcomes = results.into_iter().map(|result| match result {
            Ok(outcome) => outcome,
            Err(panicked) => TaskOutcome::failed(
                panicked.index,
                paths.get(panicked.index).cloned(),
                format!("task panicked: {}", panicked.message),
            ),
        });
        let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        let summary = MergeSummary::from_outcomes(outcomes, elapsed_ms);

        tracing::info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed(),
            elapsed_ms = summary.elapsed_ms,
            "merge complete"
        );
        if let Some(tx) = events {
            let _ = tx.send(MergeEvent::Finished(summary.clone()));
        }
        Ok(summary)
    }
}

/// Merge `table` from `source` into `output_dir` with default settings.
pub async fn run_merge(
    template_path: impl Into<PathBuf>,
    table: impl Into<String>,
    output_dir: impl Into<PathBuf>,
    source: Arc<dyn RowSource>,
) -> Result<MergeSummary, MergeError> {
    let config = MergeConfig::new(template_path, output_dir).with_table(table);
    Merger::new(config, source).run().await
}

/// Render one record and write it out.
async fn run_task(index: usize, task: MergeTask, template: &Template) -> TaskOutcome {
    let path = match task.target {
        Target::Write(path) => path,
        Target::Collision(path) => {
            tracing::warn!(index, path = %path.display(), "output name already claimed by an earlier record");
            return TaskOutcome::failed(
                index,
                Some(path),
                "output name already claimed by an earlier record",
            );
        }
    };

    let content = template.render(&task.record);
    match write_atomic(&path, &content, index).await {
        Ok(()) => {
            tracing::debug!(index, path = %path.display(), "wrote merge output");
            TaskOutcome::written(index, path)
        }
        Err(e) => {
            tracing::warn!(index, path = %path.display(), error = %e, "merge task failed");
            TaskOutcome::failed(index, Some(path), e.to_string())
        }
    }
}

/// Write `contents` to a sibling temp file, then rename it over `path`.
///
/// Readers, and racing writers of the same name, only ever see a complete
/// rendering.
async fn write_atomic(path: &Path, contents: &str, index: usize) -> io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "output path has no file name"))?;
    let tmp = path.with_file_name(format!(".{file_name}.{index}.tmp"));

    let result = match tokio::fs::write(&tmp, contents).await {
        Ok(()) => tokio::fs::rename(&tmp, path).await,
        Err(e) => Err(e),
    };
    if result.is_err() {
        // Best effort; the temp file may never have been created.
        let _ = tokio::fs::remove_file(&tmp).await;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemorySource;

    fn source() -> Arc<dyn RowSource> {
        Arc::new(MemorySource::new().with_table(
            "contacts",
            ["Name", "ID"],
            [
                Record::new().with("Name", "Ada").with("ID", "7"),
                Record::new().with("Name", "Bob Lee").with("ID", "3"),
            ],
        ))
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = MergeConfig::new(dir.path().join("t.txt"), dir.path()).with_concurrency(0);
        let err = Merger::new(config, source()).run().await.expect_err("should fail");
        assert!(matches!(err, MergeError::Config(_)));
    }

    #[tokio::test]
    async fn test_empty_table_name_is_config_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = MergeConfig::new(dir.path().join("t.txt"), dir.path()).with_table(" ");
        let err = Merger::new(config, source()).run().await.expect_err("should fail");
        assert!(matches!(err, MergeError::Config(_)));
    }

    #[tokio::test]
    async fn test_report_includes_cause() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = MergeConfig::new(dir.path().join("missing.txt"), dir.path());
        let err = Merger::new(config, source()).run().await.expect_err("should fail");
        let report = err.report();
        assert!(report.starts_with("failed to read template"));
        assert!(report.len() > err.to_string().len());
    }

    #[tokio::test]
    async fn test_run_merge_writes_each_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let template = dir.path().join("letter.txt");
        std::fs::write(&template, "Hello {{Name}} #{{ID}}").expect("template");
        let out = dir.path().join("out");
        std::fs::create_dir(&out).expect("out dir");

        let summary = run_merge(&template, "contacts", &out, source()).await.expect("merge");
        assert_eq!(summary.total, 2);
        assert!(summary.all_ok());

        let bob = std::fs::read_to_string(out.join("resume_bob_lee.txt")).expect("read");
        assert_eq!(bob, "Hello Bob Lee #3");
    }

    #[tokio::test]
    async fn test_custom_namer_and_settings() {
        let dir = tempfile::tempdir().expect("tempdir");
        let template = dir.path().join("letter.txt");
        std::fs::write(&template, "{{ID}}").expect("template");

        let namer = OutputNamer::default()
            .with_name_column("ID")
            .with_prefix("letter_")
            .with_extension("md");
        let config = MergeConfig::new(&template, dir.path())
            .with_namer(namer.clone())
            .with_concurrency(2);
        let merger = Merger::new(config, source());
        assert_eq!(merger.config().namer, namer);
        assert_eq!(merger.config().concurrency, 2);

        let summary = merger.run().await.expect("merge");
        assert!(summary.all_ok());
        assert_eq!(std::fs::read_to_string(dir.path().join("letter_7.md")).expect("read"), "7");
        assert_eq!(std::fs::read_to_string(dir.path().join("letter_3.md")).expect("read"), "3");
    }

    #[test]
    fn test_config_from_settings() {
        let settings = MergeSettings {
            table: "people".to_string(),
            concurrency: 5,
            collision: CollisionPolicy::Disambiguate,
            ..MergeSettings::default()
        };
        let config = MergeConfig::from_settings(&settings, "t.txt", "out");
        assert_eq!(config.table, "people");
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.collision, CollisionPolicy::Disambiguate);
        assert_eq!(config.namer, settings.namer());
    }

    #[tokio::test]
    async fn test_write_atomic_leaves_no_temp_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("resume_ada.txt");
        write_atomic(&path, "one", 0).await.expect("write");
        write_atomic(&path, "two", 1).await.expect("write");

        assert_eq!(std::fs::read_to_string(&path).expect("read"), "two");
        let entries = std::fs::read_dir(dir.path()).expect("list").count();
        assert_eq!(entries, 1);
    }

    #[tokio::test]
    async fn test_write_atomic_missing_dir_fails_cleanly() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nope").join("resume_ada.txt");
        assert!(write_atomic(&path, "x", 0).await.is_err());
        assert!(!dir.path().join("nope").exists());
    }
}
