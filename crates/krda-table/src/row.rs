//! The row cursor.
//!
//! A [`Row`] carries a mutable index; every accessor rereads the bytes at
//! `data_offset + index * stride + column.offset`, so moving the index moves
//! what every accessor sees. Text accessors borrow from the table block and
//! must not outlive the current position.

use std::sync::atomic::AtomicU8;

use crate::bytestr::ByteStr;
use crate::codec::{self, Value};
use crate::table::Table;

pub struct Row<'t> {
    table: &'t Table,
    base: usize,
    stride: usize,
    index: u32,
}

impl<'t> Row<'t> {
    pub(crate) fn new(table: &'t Table) -> Self {
        Self {
            table,
            base: table.data_offset(),
            stride: table.row_stride() as usize,
            index: 0,
        }
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    #[inline]
    pub fn set_index(&mut self, index: u32) {
        debug_assert!(index < self.table.row_count());
        self.index = index;
    }

    #[inline]
    fn slot(&self, ordinal: usize) -> usize {
        self.base
            + self.index as usize * self.stride
            + self.table.columns()[ordinal].offset as usize
    }

    /// Integer column of any width at the cursor, lifted to i64.
    #[inline]
    pub fn int(&self, ordinal: usize) -> i64 {
        let at = self.slot(ordinal);
        codec::read_int(self.table.block(), at, self.table.columns()[ordinal].ty)
    }

    #[inline]
    pub fn float(&self, ordinal: usize) -> f32 {
        codec::read_float(self.table.block(), self.slot(ordinal))
    }

    /// String or date column at the cursor; a borrowed view, no copy.
    #[inline]
    pub fn text(&self, ordinal: usize) -> ByteStr<'_> {
        let col = &self.table.columns()[ordinal];
        codec::read_text(self.table.block(), self.slot(ordinal), col.size)
    }

    /// The column's whole slot window, for raw projection copies.
    #[inline]
    pub fn raw(&self, ordinal: usize) -> &[AtomicU8] {
        let col = &self.table.columns()[ordinal];
        self.table.block().window(self.slot(ordinal), col.size as usize)
    }

    /// Typed read for generic consumers (debug printing, tests).
    pub fn value(&self, ordinal: usize) -> Value<'_> {
        let col = &self.table.columns()[ordinal];
        codec::read_value(self.table.block(), self.slot(ordinal), col.ty, col.size)
    }
}
