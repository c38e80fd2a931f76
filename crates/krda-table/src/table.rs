//! A bound, validated table over a heap block.

use std::collections::HashMap;

use krda_core::error::Result;
use krda_mem::{Heap, MemoryBlock};

use crate::format::{ColumnMeta, TableHeader};
use crate::row::Row;

pub struct Table {
    block: MemoryBlock,
    header: TableHeader,
    by_name: HashMap<String, usize>,
}

impl Table {
    /// Parse the header in `block` and bind it. The block is read-only for
    /// the lifetime of the table.
    pub fn bind(block: MemoryBlock) -> Result<Self> {
        let header = TableHeader::parse(&block)?;
        let by_name = header
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.name.clone(), i))
            .collect();
        Ok(Self {
            block,
            header,
            by_name,
        })
    }

    /// Allocate a heap block for `bytes` and bind it. The common loader path
    /// for files and builder output.
    pub fn load(heap: &Heap, bytes: &[u8]) -> Result<Self> {
        let block = heap.load(bytes).map_err(krda_core::Error::from)?;
        Self::bind(block)
    }

    pub fn row_count(&self) -> u32 {
        self.header.row_count
    }

    pub fn row_stride(&self) -> u32 {
        self.header.row_stride
    }

    pub fn data_offset(&self) -> usize {
        self.header.data_offset
    }

    /// Columns in ordinal order.
    pub fn columns(&self) -> &[ColumnMeta] {
        &self.header.columns
    }

    pub fn column(&self, name: &str) -> Option<(usize, &ColumnMeta)> {
        let ordinal = *self.by_name.get(name)?;
        Some((ordinal, &self.header.columns[ordinal]))
    }

    pub fn block(&self) -> &MemoryBlock {
        &self.block
    }

    /// A fresh cursor at row 0. Cursors are independent; any number may
    /// coexist over the same table.
    pub fn row(&self) -> Row<'_> {
        Row::new(self)
    }

    /// Release the underlying block back to `heap`.
    pub fn free(self, heap: &Heap) -> Result<()> {
        heap.free(self.block).map_err(krda_core::Error::from)
    }
}
