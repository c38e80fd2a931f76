//! The per-worker scan loop.
//!
//! A worker receives only coordinates — table and result windows as
//! (offset, len), a batch size, a slot capacity — plus the shared buffer
//! handle, a predicate clone and the scan cursors. It rebinds its own table
//! view and drains batches until the row cursor runs past the end. The loop
//! takes no locks, performs no I/O and allocates nothing.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use krda_core::error::{Error, Result};
use krda_mem::{HeapBuf, MemoryBlock};
use krda_table::Table;

use crate::cursors::{CancelToken, ScanCursors};
use crate::predicate::Predicate;
use crate::projection::Projection;

/// Dispatch message for one worker: offsets and sizes only, no references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSpec {
    pub table_offset: usize,
    pub table_len: usize,
    pub result_offset: usize,
    pub result_len: usize,
    /// Rows claimed per batch grab.
    pub row_batch: u32,
    /// Result slots that fit the result window.
    pub capacity_rows: u64,
}

/// Worker lifecycle. `Failed` carries no payload here; the error itself
/// travels back through the thread's return value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerPhase {
    Idle,
    Configured,
    Running,
    Drained,
    Reported,
    Failed,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WorkerStats {
    pub rows_scanned: u64,
    pub matches_claimed: u64,
    pub matches_written: u64,
}

pub struct FilterProcessor {
    table: Table,
    result: MemoryBlock,
    predicate: Predicate,
    projection: Projection,
    row_batch: u64,
    capacity_rows: u64,
    phase: WorkerPhase,
}

impl FilterProcessor {
    /// Rebind table and result views from the spec's coordinates.
    pub fn configure(
        buf: Arc<HeapBuf>,
        spec: &WorkerSpec,
        predicate: Predicate,
        projection: Projection,
    ) -> Result<Self> {
        let table_block =
            MemoryBlock::reconstruct(Arc::clone(&buf), spec.table_offset, spec.table_len)
                .map_err(Error::from)?;
        let result = MemoryBlock::reconstruct(buf, spec.result_offset, spec.result_len)
            .map_err(Error::from)?;
        let table = Table::bind(table_block)?;
        Ok(Self {
            table,
            result,
            predicate,
            projection,
            row_batch: spec.row_batch.max(1) as u64,
            capacity_rows: spec.capacity_rows,
            phase: WorkerPhase::Configured,
        })
    }

    pub fn phase(&self) -> WorkerPhase {
        self.phase
    }

    /// Drain batches until the row cursor passes the end of the table, the
    /// cancel flag is raised, or a failure occurs.
    pub fn run(&mut self, cursors: &ScanCursors, cancel: Option<&CancelToken>) -> Result<WorkerStats> {
        self.phase = WorkerPhase::Running;

        let row_count = self.table.row_count() as u64;
        let row_size = self.projection.row_size() as u64;
        let mut stats = WorkerStats::default();
        let mut row = self.table.row();

        loop {
            if cursors.cancelled() || cancel.is_some_and(|c| c.is_cancelled()) {
                break;
            }
            let start = cursors.claim_rows(self.row_batch);
            if start >= row_count {
                break;
            }
            let end = (start + self.row_batch).min(row_count);
            for r in start..end {
                row.set_index(r as u32);
                if self.predicate.matches(&row) {
                    stats.matches_claimed += 1;
                    let slot = cursors.claim_slot();
                    if slot >= self.capacity_rows {
                        // The region is full; keep scanning so the flag is
                        // definitive, but commit nothing further.
                        cursors.set_overflow();
                        continue;
                    }
                    self.projection
                        .write_row(&row, &self.result, (slot * row_size) as usize);
                    stats.matches_written += 1;
                }
            }
            stats.rows_scanned += end - start;
        }

        self.phase = WorkerPhase::Drained;

        #[cfg(feature = "tracing")]
        tracing::trace!(
            rows = stats.rows_scanned,
            matches = stats.matches_written,
            "worker drained"
        );

        Ok(stats)
    }

    /// Coordinator acknowledgement after collecting the stats.
    pub fn mark_reported(&mut self) {
        debug_assert_eq!(self.phase, WorkerPhase::Drained);
        self.phase = WorkerPhase::Reported;
    }

    pub(crate) fn mark_failed(&mut self) {
        self.phase = WorkerPhase::Failed;
    }
}
