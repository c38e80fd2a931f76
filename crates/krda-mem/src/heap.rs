//! Shared byte region and free-list allocator.
//!
//! All allocations are aligned to [`ALIGN`] and tracked in a live map so a
//! stale or foreign handle is caught instead of corrupting a neighbor.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex};

use crate::block::MemoryBlock;
use crate::error::{Error, Result};

/// Maximum primitive alignment of the engine's encodings.
pub const ALIGN: usize = 8;

/// The contiguous shared byte region.
///
/// Bytes are `AtomicU8` cells accessed with relaxed ordering: plain loads
/// and stores on mainstream ISAs, but race-free by construction when
/// concurrent writers stay on disjoint offsets. Cross-worker visibility of
/// a finished scan is established by joining the workers, not by these
/// per-byte orderings.
pub struct HeapBuf {
    cells: Box<[AtomicU8]>,
}

impl HeapBuf {
    fn with_len(len: usize) -> Self {
        let cells: Box<[AtomicU8]> = (0..len).map(|_| AtomicU8::new(0)).collect();
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn load(&self, at: usize) -> u8 {
        self.cells[at].load(Ordering::Relaxed)
    }

    #[inline]
    pub fn store(&self, at: usize, v: u8) {
        self.cells[at].store(v, Ordering::Relaxed)
    }

    /// A raw cell window. Callers slice only inside a validated block.
    #[inline]
    pub fn window(&self, at: usize, len: usize) -> &[AtomicU8] {
        &self.cells[at..at + len]
    }

    pub fn copy_in(&self, at: usize, src: &[u8]) {
        for (i, b) in src.iter().enumerate() {
            self.store(at + i, *b);
        }
    }

    pub fn copy_out(&self, at: usize, len: usize) -> Vec<u8> {
        (at..at + len).map(|i| self.load(i)).collect()
    }

    pub fn fill_zero(&self, at: usize, len: usize) {
        for i in at..at + len {
            self.store(i, 0);
        }
    }
}

/// A free extent, ordered by offset. Offsets and lengths stay
/// [`ALIGN`]-multiples at all times.
#[derive(Debug, Clone, Copy)]
struct Extent {
    offset: usize,
    len: usize,
}

struct HeapState {
    /// Free extents ordered by offset; adjacent extents are always merged.
    free: Vec<Extent>,
    /// Live allocations: offset to rounded length.
    live: BTreeMap<usize, usize>,
    used: usize,
}

/// The shared heap: a [`HeapBuf`] plus a first-fit free-list allocator.
pub struct Heap {
    buf: Arc<HeapBuf>,
    state: Mutex<HeapState>,
}

impl Heap {
    pub fn with_capacity(bytes: usize) -> Self {
        let capacity = bytes - bytes % ALIGN;
        let free = if capacity == 0 {
            Vec::new()
        } else {
            vec![Extent {
                offset: 0,
                len: capacity,
            }]
        };
        Self {
            buf: Arc::new(HeapBuf::with_len(capacity)),
            state: Mutex::new(HeapState {
                free,
                live: BTreeMap::new(),
                used: 0,
            }),
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes currently handed out (rounded to allocation granularity).
    pub fn used(&self) -> usize {
        self.state.lock().expect("heap state poisoned").used
    }

    /// The shared byte region. Clone the `Arc` to hand workers their view.
    pub fn buf(&self) -> &Arc<HeapBuf> {
        &self.buf
    }

    /// Allocate `size` bytes, aligned to [`ALIGN`] and disjoint from every
    /// other live block. First fit with splitting.
    pub fn allocate(&self, size: usize) -> Result<MemoryBlock> {
        if size == 0 {
            return Err(Error::InvalidHandle("zero-size allocation".into()));
        }
        let rounded = match size.checked_add(ALIGN - 1) {
            Some(v) => v / ALIGN * ALIGN,
            None => {
                return Err(Error::Exhausted {
                    requested: size,
                    capacity: self.capacity(),
                    used: self.used(),
                })
            }
        };

        let mut state = self.state.lock().expect("heap state poisoned");
        let slot = state.free.iter().position(|e| e.len >= rounded);
        let Some(slot) = slot else {
            return Err(Error::Exhausted {
                requested: size,
                capacity: self.buf.len(),
                used: state.used,
            });
        };

        let offset = state.free[slot].offset;
        if state.free[slot].len == rounded {
            state.free.remove(slot);
        } else {
            state.free[slot].offset += rounded;
            state.free[slot].len -= rounded;
        }
        state.live.insert(offset, rounded);
        state.used += rounded;

        #[cfg(feature = "tracing")]
        tracing::trace!(offset, size, rounded, used = state.used, "heap alloc");

        Ok(MemoryBlock::new(Arc::clone(&self.buf), offset, size))
    }

    /// Release a block. The block is consumed; a reconstructed alias of a
    /// region this heap never handed out (or already reclaimed) is rejected.
    pub fn free(&self, block: MemoryBlock) -> Result<()> {
        if !Arc::ptr_eq(block.buf(), &self.buf) {
            return Err(Error::InvalidHandle(
                "block does not belong to this heap".into(),
            ));
        }

        let mut state = self.state.lock().expect("heap state poisoned");
        let Some(rounded) = state.live.remove(&block.offset()) else {
            return Err(Error::InvalidHandle(format!(
                "no live allocation at offset {}",
                block.offset()
            )));
        };
        state.used -= rounded;

        // Insert sorted by offset, then merge with both neighbors.
        let offset = block.offset();
        let at = state
            .free
            .partition_point(|e| e.offset < offset);
        state.free.insert(at, Extent {
            offset,
            len: rounded,
        });
        if at + 1 < state.free.len()
            && state.free[at].offset + state.free[at].len == state.free[at + 1].offset
        {
            state.free[at].len += state.free[at + 1].len;
            state.free.remove(at + 1);
        }
        if at > 0 && state.free[at - 1].offset + state.free[at - 1].len == state.free[at].offset {
            state.free[at - 1].len += state.free[at].len;
            state.free.remove(at);
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(offset, rounded, used = state.used, "heap free");

        Ok(())
    }

    /// Reconstruct a block window from bare coordinates, as workers do when
    /// a dispatch message arrives. Bounds are checked; liveness is not —
    /// aliasing reconstructions of the same region are expected.
    pub fn block_at(&self, offset: usize, len: usize) -> Result<MemoryBlock> {
        MemoryBlock::reconstruct(Arc::clone(&self.buf), offset, len)
    }

    /// Allocate a block and copy `bytes` into it.
    pub fn load(&self, bytes: &[u8]) -> Result<MemoryBlock> {
        let block = self.allocate(bytes.len())?;
        block.copy_in(0, bytes);
        Ok(block)
    }

    /// Count of free extents. Exposed for allocator tests.
    pub fn free_extents(&self) -> usize {
        self.state.lock().expect("heap state poisoned").free.len()
    }
}
