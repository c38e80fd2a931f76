//! Owned scalar values.
//!
//! Used on the producer side (table builders, CLI, tests). The zero-copy
//! borrowed counterpart lives in `krda-table`, next to the byte codec.

use serde::{Deserialize, Serialize};

use crate::schema::{ColumnClass, ColumnType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Scalar {
    Int(i64),
    Float(f32),
    Str(String),
    Bytes(Vec<u8>),
}

impl Scalar {
    /// Whether this value can be stored in a column of the given type.
    /// Range checks for narrow integer types happen at encode time.
    pub fn fits(&self, ty: ColumnType) -> bool {
        match (self, ty.class()) {
            (Scalar::Int(_), ColumnClass::Int) => true,
            (Scalar::Float(_), ColumnClass::Float) => true,
            (Scalar::Str(_), ColumnClass::Text) => true,
            (Scalar::Bytes(_), ColumnClass::Opaque) => true,
            _ => false,
        }
    }
}

impl From<i64> for Scalar {
    fn from(v: i64) -> Self {
        Scalar::Int(v)
    }
}

impl From<u32> for Scalar {
    fn from(v: u32) -> Self {
        Scalar::Int(v as i64)
    }
}

impl From<f32> for Scalar {
    fn from(v: f32) -> Self {
        Scalar::Float(v)
    }
}

impl From<&str> for Scalar {
    fn from(v: &str) -> Self {
        Scalar::Str(v.to_string())
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(v: Vec<u8>) -> Self {
        Scalar::Bytes(v)
    }
}
