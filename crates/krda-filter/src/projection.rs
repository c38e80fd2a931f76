//! Projection planning and result-row writers.
//!
//! A result description is resolved against the table into a flat writer
//! plan: per item, a source (column ordinal or the row index) and a target
//! offset within the packed result row. Column items copy their slot bytes
//! verbatim — the projection carries the source column's type and size, so
//! a bitwise copy preserves the encoding, length prefix included.

use krda_core::error::{Error, Result};
use krda_core::projection::{ResultDescription, ResultField};
use krda_mem::MemoryBlock;
use krda_table::{Row, Table};

#[derive(Debug, Clone, Copy)]
enum Source {
    Column(usize),
    RowIndex,
}

#[derive(Debug, Clone)]
struct Writer {
    src: Source,
    dst: usize,
    size: usize,
}

#[derive(Debug, Clone)]
pub struct Projection {
    writers: Vec<Writer>,
    row_size: usize,
}

impl Projection {
    /// Resolve `desc` against `table`. Each column item must name an
    /// existing column and carry its exact type and size.
    pub fn plan(desc: &ResultDescription, table: &Table) -> Result<Self> {
        desc.validate()?;

        let mut writers = Vec::with_capacity(desc.fields.len());
        let mut dst = 0usize;
        for field in &desc.fields {
            let src = match &field.column {
                None => Source::RowIndex,
                Some(name) => {
                    let (ordinal, col) = table.column(name).ok_or_else(|| {
                        Error::Rule(format!("projection references unknown column '{name}'"))
                    })?;
                    if col.ty != field.ty || col.size != field.size {
                        return Err(Error::Rule(format!(
                            "projection item '{name}' ({} x{}) does not match column ({} x{})",
                            field.ty, field.size, col.ty, col.size
                        )));
                    }
                    Source::Column(ordinal)
                }
            };
            writers.push(Writer {
                src,
                dst,
                size: field.size as usize,
            });
            dst += field.size as usize;
        }

        Ok(Self {
            writers,
            row_size: dst,
        })
    }

    /// A description selecting every table column in ordinal order.
    pub fn all_columns(table: &Table) -> ResultDescription {
        ResultDescription::new(
            table
                .columns()
                .iter()
                .map(|c| ResultField::column(c.name.clone(), c.ty, c.size))
                .collect(),
        )
    }

    /// Packed result-row stride.
    pub fn row_size(&self) -> usize {
        self.row_size
    }

    /// Project the cursor's current row into the result region at `at`.
    /// All writers run before the caller may move the cursor, so borrowed
    /// string views are copied out while they are still valid.
    #[inline]
    pub fn write_row(&self, row: &Row<'_>, result: &MemoryBlock, at: usize) {
        for w in &self.writers {
            match w.src {
                Source::Column(ordinal) => result.copy_from_window(at + w.dst, row.raw(ordinal)),
                Source::RowIndex => result.write_u32(at + w.dst, row.index()),
            }
        }
    }
}
