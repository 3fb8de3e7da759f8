//! Scheduler module for goatpad: bounded fan-out of merge tasks.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          FanOut                              │
//! │                                                              │
//! │  producer ──acquire──▶ Semaphore(limit) ──permit──▶ spawn    │
//! │     │   (suspends when                      task holds       │
//! │     │    all permits are out)               permit until     │
//! │     │                                       it returns       │
//! │     ▼                                                        │
//! │  join barrier: await every handle, in admission order        │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The producer is the only party that waits for a permit, so memory stays
//! bounded by `limit` in-flight tasks no matter how many items are fed in.

mod fanout;

pub use fanout::{DEFAULT_CONCURRENCY, FanOut, FanOutStats, TaskPanicked};
