//! Typed reads and writes over block windows.
//!
//! Numeric values are little-endian. Text slots hold a u16 length prefix
//! followed by payload bytes; trailing slot bytes are ignored on read and
//! zeroed on write. Reads of text and bytes columns borrow from the block.

use std::sync::atomic::AtomicU8;

use krda_core::error::{Error, Result};
use krda_core::schema::{ColumnClass, ColumnType};
use krda_core::types::Scalar;
use krda_mem::MemoryBlock;

use crate::bytestr::ByteStr;

/// A value read in place from a table or result block.
pub enum Value<'a> {
    Int(i64),
    Float(f32),
    Str(ByteStr<'a>),
    Bytes(&'a [AtomicU8]),
}

/// Read an integer column of any width, lifted to i64.
#[inline]
pub fn read_int(block: &MemoryBlock, at: usize, ty: ColumnType) -> i64 {
    match ty {
        ColumnType::Int8 => block.read_i8(at) as i64,
        ColumnType::Int16 => block.read_i16(at) as i64,
        ColumnType::Int32 => block.read_i32(at) as i64,
        ColumnType::UInt8 => block.read_u8(at) as i64,
        ColumnType::UInt16 => block.read_u16(at) as i64,
        ColumnType::UInt32 => block.read_u32(at) as i64,
        other => unreachable!("read_int on {other}"),
    }
}

#[inline]
pub fn read_float(block: &MemoryBlock, at: usize) -> f32 {
    block.read_f32(at)
}

/// Read a length-prefixed text slot. The prefix is clamped to the slot so a
/// corrupt length cannot escape the column.
#[inline]
pub fn read_text(block: &MemoryBlock, at: usize, slot_size: u32) -> ByteStr<'_> {
    let declared = block.read_u16(at) as usize;
    let len = declared.min((slot_size as usize).saturating_sub(2));
    ByteStr::new(block.window(at + 2, len))
}

/// Generic read used by result decoding and debugging surfaces.
pub fn read_value(block: &MemoryBlock, at: usize, ty: ColumnType, slot_size: u32) -> Value<'_> {
    match ty.class() {
        ColumnClass::Int => Value::Int(read_int(block, at, ty)),
        ColumnClass::Float => Value::Float(read_float(block, at)),
        ColumnClass::Text => Value::Str(read_text(block, at, slot_size)),
        ColumnClass::Opaque => Value::Bytes(block.window(at, slot_size as usize)),
    }
}

/// Write a scalar into a column slot. Narrow integers are range-checked;
/// text payloads must fit the slot after the length prefix.
pub fn write_scalar(
    block: &MemoryBlock,
    at: usize,
    ty: ColumnType,
    slot_size: u32,
    v: &Scalar,
) -> Result<()> {
    match (ty, v) {
        (ColumnType::Int8, Scalar::Int(i)) => {
            let i = i8::try_from(*i).map_err(|_| range_err(ty, *i))?;
            block.write_i8(at, i);
        }
        (ColumnType::Int16, Scalar::Int(i)) => {
            let i = i16::try_from(*i).map_err(|_| range_err(ty, *i))?;
            block.write_i16(at, i);
        }
        (ColumnType::Int32, Scalar::Int(i)) => {
            let i = i32::try_from(*i).map_err(|_| range_err(ty, *i))?;
            block.write_i32(at, i);
        }
        (ColumnType::UInt8, Scalar::Int(i)) => {
            let i = u8::try_from(*i).map_err(|_| range_err(ty, *i))?;
            block.write_u8(at, i);
        }
        (ColumnType::UInt16, Scalar::Int(i)) => {
            let i = u16::try_from(*i).map_err(|_| range_err(ty, *i))?;
            block.write_u16(at, i);
        }
        (ColumnType::UInt32, Scalar::Int(i)) => {
            let i = u32::try_from(*i).map_err(|_| range_err(ty, *i))?;
            block.write_u32(at, i);
        }
        (ColumnType::Float32, Scalar::Float(f)) => block.write_f32(at, *f),
        (ColumnType::String | ColumnType::Date, Scalar::Str(s)) => {
            write_text(block, at, slot_size, s.as_bytes())?;
        }
        (ColumnType::Bytes, Scalar::Bytes(b)) => {
            if b.len() > slot_size as usize {
                return Err(Error::Format(format!(
                    "{} bytes do not fit a {}-byte slot",
                    b.len(),
                    slot_size
                )));
            }
            block.copy_in(at, b);
            for i in b.len()..slot_size as usize {
                block.write_u8(at + i, 0);
            }
        }
        (ty, v) => {
            return Err(Error::Format(format!(
                "value {v:?} cannot be stored in a {ty} column"
            )));
        }
    }
    Ok(())
}

pub fn write_text(block: &MemoryBlock, at: usize, slot_size: u32, payload: &[u8]) -> Result<()> {
    if slot_size < 2 {
        return Err(Error::Format(format!(
            "{slot_size}-byte slot cannot hold a length prefix"
        )));
    }
    let room = slot_size as usize - 2;
    if payload.len() > room || payload.len() > u16::MAX as usize {
        return Err(Error::Format(format!(
            "{}-byte string does not fit a {}-byte slot",
            payload.len(),
            slot_size
        )));
    }
    block.write_u16(at, payload.len() as u16);
    block.copy_in(at + 2, payload);
    for i in 2 + payload.len()..slot_size as usize {
        block.write_u8(at + i, 0);
    }
    Ok(())
}

fn range_err(ty: ColumnType, v: i64) -> Error {
    Error::Format(format!("value {v} out of range for {ty}"))
}

impl std::fmt::Debug for Value<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Bytes(b) => write!(f, "bytes[{}]", b.len()),
        }
    }
}

impl std::fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "{}", String::from_utf8_lossy(&s.to_vec())),
            Value::Bytes(b) => {
                for i in 0..b.len() {
                    write!(
                        f,
                        "{:02x}",
                        b[i].load(std::sync::atomic::Ordering::Relaxed)
                    )?;
                }
                Ok(())
            }
        }
    }
}
