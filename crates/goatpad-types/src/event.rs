//! Progress events posted by a background merge.
//!
//! A front-end that must not block its own event loop runs the merge in the
//! background and receives these over a channel, applying them to its state
//! on its own thread.

use serde::{Deserialize, Serialize};

use crate::outcome::{MergeSummary, TaskOutcome};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MergeEvent {
    /// Template and rows loaded; `total` tasks are about to be admitted.
    Started { total: usize },
    /// One task finished (in completion order).
    TaskFinished(TaskOutcome),
    /// All tasks finished.
    Finished(MergeSummary),
    /// The merge failed before any task was dispatched.
    Aborted { reason: String },
}

impl MergeEvent {
    /// True for the last event a merge will ever post.
    pub fn is_terminal(&self) -> bool {
        matches!(self, MergeEvent::Finished(_) | MergeEvent::Aborted { .. })
    }
}
