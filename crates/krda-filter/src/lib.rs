#![forbid(unsafe_code)]
//! krda-filter: rule compilation and the parallel filter executor.
//!
//! A [`FilterJob`] compiles a rule tree once, allocates a shared result
//! region, and fans the scan out to worker threads. Workers claim row
//! batches and result slots through the shared [`ScanCursors`]; every row is
//! evaluated exactly once and every match lands in a unique packed slot.
//! Result order is whatever the scheduler produced; content is not.

pub mod cursors;
pub mod executor;
pub mod predicate;
pub mod projection;
pub mod worker;

pub use cursors::{CancelToken, ScanCursors};
pub use executor::{FilterJob, FilterOutput, ResultRow};
pub use predicate::Predicate;
pub use projection::Projection;
pub use worker::{FilterProcessor, WorkerPhase, WorkerSpec, WorkerStats};
