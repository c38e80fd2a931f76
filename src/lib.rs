#![forbid(unsafe_code)]
//! krda: an in-memory columnar filter engine.
//!
//! A KRDA table is loaded into a shared byte heap and scanned by a pool of
//! worker threads that claim row batches through shared atomic cursors and
//! write packed, projected result rows into a shared output region.
//!
//! This facade re-exports the public surface of the member crates:
//! - [`krda_mem`] — shared heap, free-list allocator, memory blocks
//! - [`krda_table`] — the KRDA binary table format, row cursors, byte strings
//! - [`krda_filter`] — rule compilation and the parallel filter executor

pub use krda_core::config::EngineConfig;
pub use krda_core::error::{Error, Result};
pub use krda_core::projection::{ResultDescription, ResultField};
pub use krda_core::rules::{RuleLeaf, RuleOp, RuleSet, RuleValue};
pub use krda_core::schema::ColumnType;
pub use krda_core::types::Scalar;

pub use krda_mem::{Heap, HeapBuf, MemoryBlock};

pub use krda_table::{ByteStr, Row, Table, TableBuilder};

pub use krda_filter::{CancelToken, FilterJob, FilterOutput};
