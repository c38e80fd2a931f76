//! The filter coordinator.
//!
//! Compiles the rule tree once, sizes and allocates the shared result
//! region, dispatches coordinate-only specs to N worker threads, joins
//! them, and assembles the result handle. The join is the only blocking
//! point and doubles as the barrier that publishes worker writes.

use std::thread;

use krda_core::config::EngineConfig;
use krda_core::error::{Error, Result};
use krda_core::hash::{hash_bytes, Hash256};
use krda_core::projection::ResultDescription;
use krda_core::rules::RuleSet;
use krda_mem::{Heap, MemoryBlock};
use krda_table::codec::{read_value, Value};
use krda_table::Table;

use crate::cursors::{CancelToken, ScanCursors};
use crate::predicate::Predicate;
use crate::projection::Projection;
use crate::worker::{FilterProcessor, WorkerSpec};

pub struct FilterJob<'a> {
    heap: &'a Heap,
    table: &'a Table,
    cfg: EngineConfig,
    description: Option<ResultDescription>,
}

impl<'a> FilterJob<'a> {
    pub fn new(heap: &'a Heap, table: &'a Table) -> Self {
        Self {
            heap,
            table,
            cfg: EngineConfig::default(),
            description: None,
        }
    }

    pub fn with_config(mut self, cfg: EngineConfig) -> Self {
        self.cfg = cfg;
        self
    }

    pub fn workers(mut self, n: usize) -> Self {
        self.cfg.worker_count = n;
        self
    }

    pub fn row_batch_size(mut self, rows: u32) -> Self {
        self.cfg.row_batch_size = rows;
        self
    }

    pub fn max_result_bytes(mut self, bytes: usize) -> Self {
        self.cfg.max_result_bytes = Some(bytes);
        self
    }

    /// Select what lands in each result row. Defaults to every table column
    /// in ordinal order.
    pub fn project(mut self, description: ResultDescription) -> Self {
        self.description = Some(description);
        self
    }

    pub fn run(self, rules: &RuleSet) -> Result<FilterOutput> {
        self.run_with(rules, &CancelToken::new())
    }

    /// Run with a caller-held cancellation handle. Cancellation is terminal:
    /// the result region is released and no partial rows are returned.
    pub fn run_with(self, rules: &RuleSet, cancel: &CancelToken) -> Result<FilterOutput> {
        // Fail fast: every rule and projection problem surfaces before any
        // allocation or thread spawn.
        let predicate = Predicate::compile(rules, self.table)?;
        let description = self
            .description
            .unwrap_or_else(|| Projection::all_columns(self.table));
        let projection = Projection::plan(&description, self.table)?;

        let row_size = projection.row_size();
        let row_count = self.table.row_count() as u64;

        let full = row_count.saturating_mul(row_size as u64);
        let cap_bytes = match self.cfg.max_result_bytes {
            Some(max) => (max as u64).min(full),
            None => full,
        };
        let capacity_rows = cap_bytes / row_size as u64;
        if capacity_rows == 0 && row_count > 0 {
            return Err(Error::Rule(format!(
                "result cap of {cap_bytes} bytes holds no {row_size}-byte row"
            )));
        }

        // Rows may be empty; keep one slot so the region always exists.
        let result_len = (capacity_rows.max(1) as usize) * row_size;
        let result = self.heap.allocate(result_len).map_err(Error::from)?;
        result.fill_zero();

        let cursors = ScanCursors::new();
        let spec = WorkerSpec {
            table_offset: self.table.block().offset(),
            table_len: self.table.block().len(),
            result_offset: result.offset(),
            result_len,
            row_batch: self.cfg.row_batch_size,
            capacity_rows,
        };
        let workers = self.cfg.worker_count.max(1);

        #[cfg(feature = "tracing")]
        tracing::debug!(workers, row_count, row_size, "filter scan start");

        let buf = self.heap.buf();
        let mut outcomes = Vec::with_capacity(workers);
        thread::scope(|scope| {
            let handles: Vec<_> = (0..workers)
                .map(|_| {
                    let predicate = predicate.clone();
                    let projection = projection.clone();
                    let spec = spec.clone();
                    let cursors = &cursors;
                    scope.spawn(move || {
                        let mut processor = match FilterProcessor::configure(
                            buf.clone(),
                            &spec,
                            predicate,
                            projection,
                        ) {
                            Ok(p) => p,
                            Err(e) => {
                                cursors.request_cancel();
                                return Err(e);
                            }
                        };
                        let outcome = processor.run(cursors, Some(cancel));
                        match outcome {
                            Ok(stats) => {
                                processor.mark_reported();
                                Ok(stats)
                            }
                            Err(e) => {
                                processor.mark_failed();
                                cursors.request_cancel();
                                Err(e)
                            }
                        }
                    })
                })
                .collect();
            for handle in handles {
                outcomes.push(
                    handle
                        .join()
                        .unwrap_or_else(|_| Err(Error::Worker("worker panicked".into()))),
                );
            }
        });

        if let Some(pos) = outcomes.iter().position(|o| o.is_err()) {
            self.heap.free(result).map_err(Error::from)?;
            return match outcomes.swap_remove(pos) {
                Err(e) => Err(e),
                Ok(_) => unreachable!("position() found an error"),
            };
        }

        if cancel.is_cancelled() {
            self.heap.free(result).map_err(Error::from)?;
            return Err(Error::Cancelled);
        }

        let count = cursors.slots_claimed().min(capacity_rows);

        #[cfg(feature = "tracing")]
        tracing::debug!(count, truncated = cursors.overflowed(), "filter scan done");

        Ok(FilterOutput {
            count,
            row_size,
            truncated: cursors.overflowed(),
            field_offsets: description.field_offsets(),
            description,
            memory: result,
        })
    }
}

/// Handle to the packed result region of a finished run.
///
/// `count` rows of `row_size` bytes, tightly packed in commit order, which
/// depends on worker scheduling. Content, not order, is deterministic.
pub struct FilterOutput {
    pub count: u64,
    pub row_size: usize,
    pub truncated: bool,
    description: ResultDescription,
    field_offsets: Vec<usize>,
    memory: MemoryBlock,
}

impl FilterOutput {
    pub fn memory(&self) -> &MemoryBlock {
        &self.memory
    }

    pub fn description(&self) -> &ResultDescription {
        &self.description
    }

    /// Raw bytes of one packed result row.
    pub fn row_bytes(&self, slot: u64) -> Vec<u8> {
        debug_assert!(slot < self.count);
        self.memory.copy_out(slot as usize * self.row_size, self.row_size)
    }

    pub fn rows(&self) -> impl Iterator<Item = ResultRow<'_>> {
        (0..self.count).map(move |slot| ResultRow { out: self, slot })
    }

    /// Order-independent digest of the result content: the sorted multiset
    /// of packed rows. Identical across worker counts and schedules.
    pub fn content_digest(&self) -> Hash256 {
        let mut rows: Vec<Vec<u8>> = (0..self.count).map(|s| self.row_bytes(s)).collect();
        rows.sort_unstable();
        let mut flat =
            Vec::with_capacity(16 + rows.len() * self.row_size);
        flat.extend_from_slice(&self.count.to_le_bytes());
        flat.extend_from_slice(&(self.row_size as u64).to_le_bytes());
        for r in &rows {
            flat.extend_from_slice(r);
        }
        hash_bytes(&flat)
    }

    /// Release the result region back to `heap`.
    pub fn free(self, heap: &Heap) -> Result<()> {
        heap.free(self.memory).map_err(Error::from)
    }
}

/// One decoded result row.
pub struct ResultRow<'a> {
    out: &'a FilterOutput,
    slot: u64,
}

impl<'a> ResultRow<'a> {
    pub fn slot(&self) -> u64 {
        self.slot
    }

    /// Decode one projected field of this row.
    pub fn value(&self, field: usize) -> Value<'a> {
        let f = &self.out.description.fields[field];
        let at = self.slot as usize * self.out.row_size + self.out.field_offsets[field];
        read_value(&self.out.memory, at, f.ty, f.size)
    }

    pub fn bytes(&self) -> Vec<u8> {
        self.out.row_bytes(self.slot)
    }
}
