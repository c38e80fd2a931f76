//! KRDA header layout and validation.
//!
//! Little-endian throughout:
//! magic `KRDA`, version u16, flags u16 (zero), rowCount u32, rowStride u32,
//! columnCount u16, reserved u16, then per column: nameLen u8, name,
//! typeLen u8, typeName, offset u32, size u32; padded to 8 bytes; then
//! rowCount x rowStride row bytes.

use krda_core::error::{Error, Result};
use krda_core::schema::{ColumnClass, ColumnType};
use krda_mem::MemoryBlock;

pub const MAGIC: [u8; 4] = *b"KRDA";
pub const VERSION: u16 = 1;

/// Fixed part of the header before the column descriptors.
pub(crate) const FIXED_HEADER: usize = 20;

#[derive(Debug, Clone)]
pub struct ColumnMeta {
    pub name: String,
    pub ty: ColumnType,
    /// Byte offset within a row.
    pub offset: u32,
    /// Slot size in bytes.
    pub size: u32,
}

#[derive(Debug, Clone)]
pub struct TableHeader {
    pub row_count: u32,
    pub row_stride: u32,
    pub columns: Vec<ColumnMeta>,
    /// Offset of the first row within the table block.
    pub data_offset: usize,
}

pub(crate) fn pad8(len: usize) -> usize {
    (len + 7) & !7
}

fn read_short_str(block: &MemoryBlock, at: &mut usize, what: &str) -> Result<String> {
    if *at >= block.len() {
        return Err(Error::Format(format!("truncated header reading {what}")));
    }
    let len = block.read_u8(*at) as usize;
    *at += 1;
    if *at + len > block.len() {
        return Err(Error::Format(format!("truncated header reading {what}")));
    }
    let bytes = block.copy_out(*at, len);
    *at += len;
    String::from_utf8(bytes).map_err(|_| Error::Format(format!("non-UTF8 {what}")))
}

impl TableHeader {
    /// Parse and validate a header at the start of `block`.
    pub fn parse(block: &MemoryBlock) -> Result<Self> {
        if block.len() < FIXED_HEADER {
            return Err(Error::Format(format!(
                "block of {} bytes is smaller than the fixed header",
                block.len()
            )));
        }

        let magic = block.copy_out(0, 4);
        if magic != MAGIC {
            return Err(Error::Format(format!("bad magic {magic:02x?}")));
        }
        let version = block.read_u16(4);
        if version != VERSION {
            return Err(Error::Format(format!("unsupported version {version}")));
        }
        let flags = block.read_u16(6);
        if flags != 0 {
            return Err(Error::Format(format!("reserved flags set: {flags:#06x}")));
        }
        let row_count = block.read_u32(8);
        let row_stride = block.read_u32(12);
        let column_count = block.read_u16(16) as usize;
        // reserved u16 at 18 is ignored

        let mut at = FIXED_HEADER;
        let mut columns = Vec::with_capacity(column_count);
        for _ in 0..column_count {
            let name = read_short_str(block, &mut at, "column name")?;
            let type_name = read_short_str(block, &mut at, "type name")?;
            let ty = ColumnType::parse_name(&type_name)
                .ok_or_else(|| Error::Format(format!("unknown column type '{type_name}'")))?;
            if at + 8 > block.len() {
                return Err(Error::Format("truncated column descriptor".into()));
            }
            let offset = block.read_u32(at);
            let size = block.read_u32(at + 4);
            at += 8;
            columns.push(ColumnMeta {
                name,
                ty,
                offset,
                size,
            });
        }

        let header = TableHeader {
            row_count,
            row_stride,
            columns,
            data_offset: pad8(at),
        };
        header.validate(block.len())?;
        Ok(header)
    }

    fn validate(&self, block_len: usize) -> Result<()> {
        if self.row_stride == 0 && !self.columns.is_empty() {
            return Err(Error::Format("zero row stride with columns present".into()));
        }

        for col in &self.columns {
            if col.size == 0 {
                return Err(Error::Format(format!("column '{}' has size 0", col.name)));
            }
            match col.ty.fixed_width() {
                Some(w) if col.size as usize != w => {
                    return Err(Error::Format(format!(
                        "column '{}' of type {} must be {} bytes, header says {}",
                        col.name, col.ty, w, col.size
                    )));
                }
                None if col.ty.class() == ColumnClass::Text && col.size < 2 => {
                    return Err(Error::Format(format!(
                        "column '{}' too small for a length prefix",
                        col.name
                    )));
                }
                _ => {}
            }
            let end = col.offset as u64 + col.size as u64;
            if end > self.row_stride as u64 {
                return Err(Error::Format(format!(
                    "column '{}' extends past the row stride",
                    col.name
                )));
            }
        }

        // Non-overlap: sort slots by offset and compare neighbors.
        let mut slots: Vec<(u32, u32, &str)> = self
            .columns
            .iter()
            .map(|c| (c.offset, c.size, c.name.as_str()))
            .collect();
        slots.sort_unstable_by_key(|s| s.0);
        for pair in slots.windows(2) {
            if pair[0].0 + pair[0].1 > pair[1].0 {
                return Err(Error::Format(format!(
                    "columns '{}' and '{}' overlap",
                    pair[0].2, pair[1].2
                )));
            }
        }

        let mut names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        for pair in names.windows(2) {
            if pair[0] == pair[1] {
                return Err(Error::Format(format!("duplicate column '{}'", pair[0])));
            }
        }

        let data_bytes = self.row_count as u64 * self.row_stride as u64;
        if self.data_offset as u64 + data_bytes > block_len as u64 {
            return Err(Error::Format(format!(
                "{} rows of {} bytes do not fit in a block of {} bytes",
                self.row_count, self.row_stride, block_len
            )));
        }

        Ok(())
    }
}
