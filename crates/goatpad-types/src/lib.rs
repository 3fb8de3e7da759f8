//! Pure data types for goatpad: records, table columns, merge outcomes.
//!
//! This crate is a leaf dependency with no async runtime, no SQL engine, no I/O.
//! It exists so that front-ends (the CLI, a GUI shell) can consume merge
//! results and progress events without pulling in goatpad-kernel's deps.

pub mod collision;
pub mod column;
pub mod event;
pub mod outcome;
pub mod record;

// Flat re-exports for convenience
pub use collision::*;
pub use column::*;
pub use event::*;
pub use outcome::*;
pub use record::*;
