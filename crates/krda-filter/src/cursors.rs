//! Shared claim state for one filter run.
//!
//! Two monotone counters partition the work: the row cursor hands each
//! worker a disjoint batch of row indices, the slot cursor hands each match
//! a unique result slot. Both move only through `fetch_add`, so no two
//! workers ever hold the same row or the same slot. SeqCst keeps the
//! protocol simple; the coordinator's join is the barrier that publishes
//! result bytes to readers.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct ScanCursors {
    next_row: AtomicU64,
    next_slot: AtomicU64,
    overflow: AtomicBool,
    cancel: AtomicBool,
}

impl ScanCursors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a batch: returns the first row index of the claimed range.
    #[inline]
    pub fn claim_rows(&self, batch: u64) -> u64 {
        self.next_row.fetch_add(batch, Ordering::SeqCst)
    }

    /// Claim the next result slot.
    #[inline]
    pub fn claim_slot(&self) -> u64 {
        self.next_slot.fetch_add(1, Ordering::SeqCst)
    }

    /// Total slots claimed so far. After join this is the number of matches
    /// found, which may exceed the slots actually written when truncated.
    pub fn slots_claimed(&self) -> u64 {
        self.next_slot.load(Ordering::SeqCst)
    }

    pub fn set_overflow(&self) {
        self.overflow.store(true, Ordering::SeqCst);
    }

    pub fn overflowed(&self) -> bool {
        self.overflow.load(Ordering::SeqCst)
    }

    /// Ask every worker to stop at its next batch boundary. Used both for
    /// caller cancellation and for draining peers after a worker failure.
    pub fn request_cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    pub fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

/// Caller-side cancellation handle for a running filter.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
