//! Producer side of the KRDA format.
//!
//! Serializes columns and rows into the binary layout that
//! [`TableHeader::parse`](crate::format::TableHeader::parse) accepts.
//! Column slots are packed in declaration order; the row stride is their
//! total size.

use krda_core::error::{Error, Result};
use krda_core::schema::{ColumnClass, ColumnType};
use krda_core::types::Scalar;

use crate::format::{pad8, FIXED_HEADER, MAGIC, VERSION};

struct BuilderColumn {
    name: String,
    ty: ColumnType,
    offset: u32,
    size: u32,
}

pub struct TableBuilder {
    columns: Vec<BuilderColumn>,
    stride: u32,
    rows: Vec<u8>,
    row_count: u32,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            stride: 0,
            rows: Vec::new(),
            row_count: 0,
        }
    }

    /// Add a fixed-width column (`int*`, `uint*`, `float32`).
    pub fn column(mut self, name: impl Into<String>, ty: ColumnType) -> Self {
        let size = ty
            .fixed_width()
            .expect("slot-sized columns need an explicit size") as u32;
        self.push_column(name.into(), ty, size);
        self
    }

    /// Add a slot-sized column (`string`, `date`, `bytes`) with an explicit
    /// slot size. Text slots include their 2-byte length prefix.
    pub fn column_with_size(mut self, name: impl Into<String>, ty: ColumnType, size: u32) -> Self {
        assert!(ty.fixed_width().is_none(), "fixed-width columns size themselves");
        self.push_column(name.into(), ty, size);
        self
    }

    fn push_column(&mut self, name: String, ty: ColumnType, size: u32) {
        self.columns.push(BuilderColumn {
            name,
            ty,
            offset: self.stride,
            size,
        });
        self.stride += size;
    }

    /// Append one row. Values must match the declared columns in order.
    pub fn push_row(&mut self, values: &[Scalar]) -> Result<()> {
        if values.len() != self.columns.len() {
            return Err(Error::Format(format!(
                "row has {} values, table has {} columns",
                values.len(),
                self.columns.len()
            )));
        }
        let start = self.rows.len();
        self.rows.resize(start + self.stride as usize, 0);
        for (col, v) in self.columns.iter().zip(values) {
            let at = start + col.offset as usize;
            encode(&mut self.rows[at..at + col.size as usize], col.ty, col.size, v)?;
        }
        self.row_count += 1;
        Ok(())
    }

    /// Serialize the header and rows into the final byte image.
    pub fn finish(self) -> Vec<u8> {
        let mut descr_len = 0usize;
        for c in &self.columns {
            descr_len += 1 + c.name.len() + 1 + c.ty.name().len() + 8;
        }
        let data_offset = pad8(FIXED_HEADER + descr_len);

        let mut out = Vec::with_capacity(data_offset + self.rows.len());
        out.extend_from_slice(&MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // flags
        out.extend_from_slice(&self.row_count.to_le_bytes());
        out.extend_from_slice(&self.stride.to_le_bytes());
        out.extend_from_slice(&(self.columns.len() as u16).to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes()); // reserved

        for c in &self.columns {
            out.push(c.name.len() as u8);
            out.extend_from_slice(c.name.as_bytes());
            out.push(c.ty.name().len() as u8);
            out.extend_from_slice(c.ty.name().as_bytes());
            out.extend_from_slice(&c.offset.to_le_bytes());
            out.extend_from_slice(&c.size.to_le_bytes());
        }

        out.resize(data_offset, 0);
        out.extend_from_slice(&self.rows);
        out
    }
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn encode(slot: &mut [u8], ty: ColumnType, size: u32, v: &Scalar) -> Result<()> {
    if !v.fits(ty) {
        return Err(Error::Format(format!(
            "value {v:?} cannot be stored in a {ty} column"
        )));
    }
    match (ty.class(), v) {
        (ColumnClass::Int, Scalar::Int(i)) => {
            let width = ty.fixed_width().expect("int widths are fixed");
            check_int_range(ty, *i)?;
            let bytes = i.to_le_bytes();
            slot[..width].copy_from_slice(&bytes[..width]);
        }
        (ColumnClass::Float, Scalar::Float(f)) => {
            slot.copy_from_slice(&f.to_bits().to_le_bytes());
        }
        (ColumnClass::Text, Scalar::Str(s)) => {
            let payload = s.as_bytes();
            if payload.len() + 2 > size as usize || payload.len() > u16::MAX as usize {
                return Err(Error::Format(format!(
                    "{}-byte string does not fit a {}-byte slot",
                    payload.len(),
                    size
                )));
            }
            slot[..2].copy_from_slice(&(payload.len() as u16).to_le_bytes());
            slot[2..2 + payload.len()].copy_from_slice(payload);
        }
        (ColumnClass::Opaque, Scalar::Bytes(b)) => {
            if b.len() > size as usize {
                return Err(Error::Format(format!(
                    "{} bytes do not fit a {}-byte slot",
                    b.len(),
                    size
                )));
            }
            slot[..b.len()].copy_from_slice(b);
        }
        _ => unreachable!("fits() already matched class"),
    }
    Ok(())
}

fn check_int_range(ty: ColumnType, v: i64) -> Result<()> {
    let ok = match ty {
        ColumnType::Int8 => i8::try_from(v).is_ok(),
        ColumnType::Int16 => i16::try_from(v).is_ok(),
        ColumnType::Int32 => i32::try_from(v).is_ok(),
        ColumnType::UInt8 => u8::try_from(v).is_ok(),
        ColumnType::UInt16 => u16::try_from(v).is_ok(),
        ColumnType::UInt32 => u32::try_from(v).is_ok(),
        _ => true,
    };
    if ok {
        Ok(())
    } else {
        Err(Error::Format(format!("value {v} out of range for {ty}")))
    }
}
