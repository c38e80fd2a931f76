//! Column types of the KRDA table format.
//!
//! The fixed registry of primitive encodings. Numeric encodings are
//! little-endian; `string` and `date` are a u16 length prefix followed by
//! payload bytes inside the column's fixed slot; `bytes` is an opaque slot.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Int8,
    Int16,
    Int32,
    UInt8,
    UInt16,
    UInt32,
    Float32,
    String,
    Date,
    Bytes,
}

/// Access class a column type belongs to. The predicate compiler lowers
/// leaves per class, not per concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnClass {
    Int,
    Float,
    /// Length-prefixed byte strings compared case-insensitively.
    Text,
    /// Opaque bytes; projectable but not filterable.
    Opaque,
}

impl ColumnType {
    /// Parse a type name as it appears in a table header.
    pub fn parse_name(name: &str) -> Option<Self> {
        Some(match name {
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "uint8" => Self::UInt8,
            "uint16" => Self::UInt16,
            "uint32" => Self::UInt32,
            "float32" => Self::Float32,
            "string" => Self::String,
            "date" => Self::Date,
            "bytes" => Self::Bytes,
            _ => return None,
        })
    }

    /// Stable header name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Int8 => "int8",
            Self::Int16 => "int16",
            Self::Int32 => "int32",
            Self::UInt8 => "uint8",
            Self::UInt16 => "uint16",
            Self::UInt32 => "uint32",
            Self::Float32 => "float32",
            Self::String => "string",
            Self::Date => "date",
            Self::Bytes => "bytes",
        }
    }

    /// Encoded width for fixed-width types; `None` for slot-sized types
    /// (`string`, `date`, `bytes`), whose width is the column's `size` field.
    pub fn fixed_width(self) -> Option<usize> {
        match self {
            Self::Int8 | Self::UInt8 => Some(1),
            Self::Int16 | Self::UInt16 => Some(2),
            Self::Int32 | Self::UInt32 | Self::Float32 => Some(4),
            Self::String | Self::Date | Self::Bytes => None,
        }
    }

    pub fn class(self) -> ColumnClass {
        match self {
            Self::Int8 | Self::Int16 | Self::Int32 | Self::UInt8 | Self::UInt16 | Self::UInt32 => {
                ColumnClass::Int
            }
            Self::Float32 => ColumnClass::Float,
            Self::String | Self::Date => ColumnClass::Text,
            Self::Bytes => ColumnClass::Opaque,
        }
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
