//! Bounded fan-out with a join barrier.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Default cap on concurrently running tasks.
pub const DEFAULT_CONCURRENCY: usize = 50;

/// A task that panicked instead of returning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPanicked {
    /// Admission index of the task.
    pub index: usize,
    pub message: String,
}

/// Counters for observing a fan-out while it runs.
///
/// Attach with [`FanOut::with_stats`]. `peak` is the highest number of
/// tasks that were ever executing at the same instant.
#[derive(Debug, Default)]
pub struct FanOutStats {
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    started: AtomicUsize,
    completed: AtomicUsize,
}

impl FanOutStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    fn enter(self: &Arc<Self>) -> InFlight {
        self.started.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        InFlight(self.clone())
    }
}

/// Marks one task as executing; dropped on every exit path, unwinding
/// included.
struct InFlight(Arc<FanOutStats>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.0.completed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Runs one task per item with at most `limit` executing at once.
#[derive(Debug, Clone)]
pub struct FanOut {
    limit: NonZeroUsize,
    stats: Option<Arc<FanOutStats>>,
}

impl Default for FanOut {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CONCURRENCY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl FanOut {
    pub fn new(limit: NonZeroUsize) -> Self {
        Self { limit, stats: None }
    }

    /// Record in-flight/peak counters into `stats`.
    pub fn with_stats(mut self, stats: Arc<FanOutStats>) -> Self {
        self.stats = Some(stats);
        self
    }

    pub fn limit(&self) -> usize {
        self.limit.get()
    }

    /// Run `work(index, item)` for every item and wait for all of them.
    ///
    /// Items are admitted in iteration order. Before each spawn the caller
    /// suspends until a permit is free; the spawned task releases its permit
    /// when it returns or unwinds. Results come back in admission order
    /// regardless of completion order. A panicking task is reported as
    /// `Err(TaskPanicked)` and does not affect its siblings.
    pub async fn run<I, T, F, Fut, R>(&self, items: I, mut work: F) -> Vec<Result<R, TaskPanicked>>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send,
        T: Send,
        F: FnMut(usize, T) -> Fut + Send,
        Fut: Future<Output = R> + Send + 'static,
        R: Send + 'static,
    {
        let semaphore = Arc::new(Semaphore::new(self.limit.get()));
        let mut handles: Vec<(usize, JoinHandle<R>)> = Vec::new();

        for (index, item) in items.into_iter().enumerate() {
            // The pool is owned here and never closed, so acquire cannot fail.
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                tracing::error!(index, "admission pool closed; stopping dispatch");
                break;
            };
            let stats = self.stats.clone();
            let task = work(index, item);

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let _in_flight = stats.as_ref().map(|s| s.enter());
                task.await
            });
            handles.push((index, handle));
        }

        tracing::debug!(dispatched = handles.len(), limit = self.limit.get(), "waiting on join barrier");

        let mut results = Vec::with_capacity(handles.len());
        for (index, handle) in handles {
            match handle.await {
                Ok(result) => results.push(Ok(result)),
                Err(e) => {
                    let message = if e.is_panic() {
                        panic_message(e.into_panic())
                    } else {
                        e.to_string()
                    };
                    tracing::warn!(index, %message, "task panicked");
                    results.push(Err(TaskPanicked { index, message }));
                }
            }
        }
        results
    }
}

fn panic_message(payload: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "task panicked".to_string()
    }
}
