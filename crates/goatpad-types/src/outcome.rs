//! TaskOutcome and MergeSummary: what a merge run reports back.
//!
//! Every record admitted into a merge yields exactly one `TaskOutcome`.
//! The orchestrator folds them into a `MergeSummary` once the join barrier
//! has released.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Why a single record could not be merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    /// Position of the record in source order (0-based).
    pub index: usize,
    /// Target file, if one had been derived before the failure.
    pub path: Option<PathBuf>,
    /// Human-readable cause.
    pub cause: String,
}

/// Result of one merge task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    /// The rendering was written to `path`.
    Written { index: usize, path: PathBuf },
    Failed(TaskFailure),
}

impl TaskOutcome {
    /// Create a successful outcome.
    pub fn written(index: usize, path: impl Into<PathBuf>) -> Self {
        TaskOutcome::Written {
            index,
            path: path.into(),
        }
    }

    /// Create a failed outcome.
    pub fn failed(index: usize, path: Option<PathBuf>, cause: impl Into<String>) -> Self {
        TaskOutcome::Failed(TaskFailure {
            index,
            path,
            cause: cause.into(),
        })
    }

    /// True if the task wrote its file.
    pub fn ok(&self) -> bool {
        matches!(self, TaskOutcome::Written { .. })
    }

    /// Source-order index of the record this outcome belongs to.
    pub fn index(&self) -> usize {
        match self {
            TaskOutcome::Written { index, .. } => *index,
            TaskOutcome::Failed(f) => f.index,
        }
    }

    /// Target file, if known.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            TaskOutcome::Written { path, .. } => Some(path),
            TaskOutcome::Failed(f) => f.path.as_ref(),
        }
    }
}

/// Aggregated result of a completed merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeSummary {
    /// Number of records admitted.
    pub total: usize,
    /// Number of files written.
    pub succeeded: usize,
    /// Per-record failures, in source order.
    pub failures: Vec<TaskFailure>,
    /// Distinct files written, sorted.
    pub outputs: Vec<PathBuf>,
    /// Wall-clock duration of the whole run.
    pub elapsed_ms: u64,
}

impl MergeSummary {
    /// Fold task outcomes into a summary.
    pub fn from_outcomes(outcomes: impl IntoIterator<Item = TaskOutcome>, elapsed_ms: u64) -> Self {
        let mut summary = MergeSummary {
            elapsed_ms,
            ..Default::default()
        };
        for outcome in outcomes {
            summary.total += 1;
            match outcome {
                TaskOutcome::Written { path, .. } => {
                    summary.succeeded += 1;
                    summary.outputs.push(path);
                }
                TaskOutcome::Failed(failure) => summary.failures.push(failure),
            }
        }
        summary.failures.sort_by_key(|f| f.index);
        summary.outputs.sort();
        summary.outputs.dedup();
        summary
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// True if every admitted record was written.
    pub fn all_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_accessors() {
        let ok = TaskOutcome::written(3, "/out/resume_ada.txt");
        assert!(ok.ok());
        assert_eq!(ok.index(), 3);
        assert_eq!(ok.path(), Some(&PathBuf::from("/out/resume_ada.txt")));

        let err = TaskOutcome::failed(4, None, "disk full");
        assert!(!err.ok());
        assert_eq!(err.index(), 4);
        assert_eq!(err.path(), None);
    }

    #[test]
    fn test_summary_counts_and_sorting() {
        let outcomes = vec![
            TaskOutcome::written(1, "/o/b.txt"),
            TaskOutcome::failed(2, Some("/o/c.txt".into()), "denied"),
            TaskOutcome::written(0, "/o/a.txt"),
            TaskOutcome::failed(0, None, "render"),
        ];
        let summary = MergeSummary::from_outcomes(outcomes, 12);

        assert_eq!(summary.total, 4);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.failed(), 2);
        assert!(!summary.all_ok());
        assert_eq!(summary.failures[0].index, 0);
        assert_eq!(summary.outputs, vec![PathBuf::from("/o/a.txt"), PathBuf::from("/o/b.txt")]);
        assert_eq!(summary.elapsed_ms, 12);
    }

    #[test]
    fn test_summary_dedups_colliding_outputs() {
        let outcomes = vec![
            TaskOutcome::written(0, "/o/resume_bob_lee.txt"),
            TaskOutcome::written(1, "/o/resume_bob_lee.txt"),
        ];
        let summary = MergeSummary::from_outcomes(outcomes, 0);
        assert_eq!(summary.succeeded, 2);
        assert_eq!(summary.outputs.len(), 1);
    }

    #[test]
    fn test_outcome_json_shape() {
        let json = serde_json::to_value(TaskOutcome::written(0, "/o/a.txt")).expect("serialize");
        assert_eq!(json["status"], "written");
        assert_eq!(json["index"], 0);
    }
}
