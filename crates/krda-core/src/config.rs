//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

/// Default heap capacity when the caller gives no sizing hint.
pub const DEFAULT_HEAP_BYTES: usize = 2 * 1024 * 1024 * 1024;

/// Default number of rows a worker claims per batch.
pub const DEFAULT_ROW_BATCH: u32 = 1024;

/// Default worker-thread count for a filter run.
pub const DEFAULT_WORKERS: usize = 4;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Heap capacity in bytes. Every table, result region and scratch block
    /// must fit inside this budget.
    pub heap_bytes: usize,

    /// Rows claimed per atomic batch grab. Larger batches amortize counter
    /// traffic; smaller batches balance skewed predicates better.
    pub row_batch_size: u32,

    /// Worker threads per filter run (minimum 1).
    pub worker_count: usize,

    /// Upper bound on the result region in bytes. `None` means sized for a
    /// full match: row count times packed result stride.
    pub max_result_bytes: Option<usize>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            heap_bytes: DEFAULT_HEAP_BYTES,
            row_batch_size: DEFAULT_ROW_BATCH,
            worker_count: DEFAULT_WORKERS,
            max_result_bytes: None,
        }
    }
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `KRDA_HEAP_BYTES`: heap capacity in bytes
    /// - `KRDA_ROW_BATCH`: rows per batch claim
    /// - `KRDA_WORKERS`: worker-thread count
    /// - `KRDA_MAX_RESULT_BYTES`: result-region cap in bytes
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("KRDA_HEAP_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.heap_bytes = v;
            }
        }

        if let Ok(s) = std::env::var("KRDA_ROW_BATCH") {
            if let Ok(v) = s.parse::<u32>() {
                cfg.row_batch_size = v;
            }
        }

        if let Ok(s) = std::env::var("KRDA_WORKERS") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.worker_count = v;
            }
        }

        if let Ok(s) = std::env::var("KRDA_MAX_RESULT_BYTES") {
            if let Ok(v) = s.parse::<usize>() {
                cfg.max_result_bytes = Some(v);
            }
        }

        cfg
    }
}
