//! Shared helpers for the integration tests.
#![allow(dead_code)]

use krda_core::schema::ColumnType;
use krda_core::types::Scalar;
use krda_mem::Heap;
use krda_table::{Table, TableBuilder};

/// One uint32 column named `name` with the given values.
pub fn uint_table(heap: &Heap, name: &str, values: &[u32]) -> Table {
    let mut builder = TableBuilder::new().column(name, ColumnType::UInt32);
    for v in values {
        builder
            .push_row(&[Scalar::Int(*v as i64)])
            .expect("row encode");
    }
    Table::load(heap, &builder.finish()).expect("table load")
}

/// Columns `a: uint32`, `b: string(slot)` from (int, str) pairs.
pub fn pair_table(heap: &Heap, slot: u32, rows: &[(u32, &str)]) -> Table {
    let mut builder = TableBuilder::new()
        .column("a", ColumnType::UInt32)
        .column_with_size("b", ColumnType::String, slot);
    for (a, b) in rows {
        builder
            .push_row(&[Scalar::Int(*a as i64), Scalar::Str(b.to_string())])
            .expect("row encode");
    }
    Table::load(heap, &builder.finish()).expect("table load")
}

pub fn heap_mb(mb: usize) -> Heap {
    Heap::with_capacity(mb * 1024 * 1024)
}
