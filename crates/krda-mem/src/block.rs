//! Block windows into the shared heap.
//!
//! A [`MemoryBlock`] is `(buffer, offset, len)`. Blocks created by the heap
//! are released by value through [`crate::Heap::free`], so a freed block
//! cannot be touched again. Workers rebuild aliasing windows from bare
//! coordinates with [`MemoryBlock::reconstruct`]; mutual exclusion on
//! overlapping writes is the caller's responsibility.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::heap::HeapBuf;

pub struct MemoryBlock {
    buf: Arc<HeapBuf>,
    offset: usize,
    len: usize,
}

impl std::fmt::Debug for MemoryBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBlock")
            .field("offset", &self.offset)
            .field("len", &self.len)
            .finish()
    }
}

impl MemoryBlock {
    pub(crate) fn new(buf: Arc<HeapBuf>, offset: usize, len: usize) -> Self {
        Self { buf, offset, len }
    }

    /// Rebuild a window from `(buffer, offset, len)`. Fails when the window
    /// does not lie inside the buffer.
    pub fn reconstruct(buf: Arc<HeapBuf>, offset: usize, len: usize) -> Result<Self> {
        let end = offset
            .checked_add(len)
            .ok_or_else(|| Error::InvalidHandle("window overflows address space".into()))?;
        if end > buf.len() {
            return Err(Error::InvalidHandle(format!(
                "window {}..{} outside heap of {} bytes",
                offset,
                end,
                buf.len()
            )));
        }
        Ok(Self { buf, offset, len })
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn buf(&self) -> &Arc<HeapBuf> {
        &self.buf
    }

    /// Cell window at a block-relative offset.
    #[inline]
    pub fn window(&self, at: usize, len: usize) -> &[AtomicU8] {
        debug_assert!(at + len <= self.len, "window outside block");
        self.buf.window(self.offset + at, len)
    }

    // ----- little-endian typed access, offsets relative to block start -----

    #[inline]
    pub fn read_u8(&self, at: usize) -> u8 {
        debug_assert!(at < self.len);
        self.buf.load(self.offset + at)
    }

    #[inline]
    pub fn read_i8(&self, at: usize) -> i8 {
        self.read_u8(at) as i8
    }

    #[inline]
    pub fn read_u16(&self, at: usize) -> u16 {
        debug_assert!(at + 2 <= self.len);
        let base = self.offset + at;
        u16::from_le_bytes([self.buf.load(base), self.buf.load(base + 1)])
    }

    #[inline]
    pub fn read_i16(&self, at: usize) -> i16 {
        self.read_u16(at) as i16
    }

    #[inline]
    pub fn read_u32(&self, at: usize) -> u32 {
        debug_assert!(at + 4 <= self.len);
        let base = self.offset + at;
        u32::from_le_bytes([
            self.buf.load(base),
            self.buf.load(base + 1),
            self.buf.load(base + 2),
            self.buf.load(base + 3),
        ])
    }

    #[inline]
    pub fn read_i32(&self, at: usize) -> i32 {
        self.read_u32(at) as i32
    }

    #[inline]
    pub fn read_f32(&self, at: usize) -> f32 {
        f32::from_bits(self.read_u32(at))
    }

    #[inline]
    pub fn write_u8(&self, at: usize, v: u8) {
        debug_assert!(at < self.len);
        self.buf.store(self.offset + at, v);
    }

    #[inline]
    pub fn write_i8(&self, at: usize, v: i8) {
        self.write_u8(at, v as u8);
    }

    #[inline]
    pub fn write_u16(&self, at: usize, v: u16) {
        debug_assert!(at + 2 <= self.len);
        let base = self.offset + at;
        for (i, b) in v.to_le_bytes().iter().enumerate() {
            self.buf.store(base + i, *b);
        }
    }

    #[inline]
    pub fn write_i16(&self, at: usize, v: i16) {
        self.write_u16(at, v as u16);
    }

    #[inline]
    pub fn write_u32(&self, at: usize, v: u32) {
        debug_assert!(at + 4 <= self.len);
        let base = self.offset + at;
        for (i, b) in v.to_le_bytes().iter().enumerate() {
            self.buf.store(base + i, *b);
        }
    }

    #[inline]
    pub fn write_i32(&self, at: usize, v: i32) {
        self.write_u32(at, v as u32);
    }

    #[inline]
    pub fn write_f32(&self, at: usize, v: f32) {
        self.write_u32(at, v.to_bits());
    }

    pub fn copy_in(&self, at: usize, src: &[u8]) {
        debug_assert!(at + src.len() <= self.len);
        self.buf.copy_in(self.offset + at, src);
    }

    pub fn copy_out(&self, at: usize, len: usize) -> Vec<u8> {
        debug_assert!(at + len <= self.len);
        self.buf.copy_out(self.offset + at, len)
    }

    /// Copy cells from another window into this block. Used by projection
    /// writers moving column slots into result slots.
    pub fn copy_from_window(&self, at: usize, src: &[AtomicU8]) {
        debug_assert!(at + src.len() <= self.len);
        let base = self.offset + at;
        for (i, cell) in src.iter().enumerate() {
            self.buf.store(base + i, cell.load(Ordering::Relaxed));
        }
    }

    pub fn fill_zero(&self) {
        self.buf.fill_zero(self.offset, self.len);
    }
}
