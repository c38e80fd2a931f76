//! Result descriptions: what a filter run projects into the result region.
//!
//! An ordered list of items, each either a column reference (type and size
//! copied from the source column) or the row-index sentinel. The packed
//! result stride is the sum of item sizes, with no padding.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::schema::ColumnType;

/// Size of the row-index projection item (a little-endian u32).
pub const ROW_INDEX_SIZE: u32 = 4;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultField {
    /// `None` denotes the row-index projection.
    pub column: Option<String>,
    #[serde(rename = "type")]
    pub ty: ColumnType,
    pub size: u32,
}

impl ResultField {
    pub fn column(name: impl Into<String>, ty: ColumnType, size: u32) -> Self {
        Self {
            column: Some(name.into()),
            ty,
            size,
        }
    }

    pub fn row_index() -> Self {
        Self {
            column: None,
            ty: ColumnType::UInt32,
            size: ROW_INDEX_SIZE,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultDescription {
    pub fields: Vec<ResultField>,
}

impl ResultDescription {
    pub fn new(fields: Vec<ResultField>) -> Self {
        Self { fields }
    }

    /// Packed result-row stride in bytes.
    pub fn row_size(&self) -> usize {
        self.fields.iter().map(|f| f.size as usize).sum()
    }

    /// Byte offset of each field within a packed result row.
    pub fn field_offsets(&self) -> Vec<usize> {
        let mut offsets = Vec::with_capacity(self.fields.len());
        let mut at = 0usize;
        for f in &self.fields {
            offsets.push(at);
            at += f.size as usize;
        }
        offsets
    }

    /// Structural checks that do not need a table: a non-empty projection
    /// with sane per-field sizes and a well-formed row-index sentinel.
    pub fn validate(&self) -> Result<()> {
        if self.fields.is_empty() {
            return Err(Error::Rule("empty result description".into()));
        }
        for f in &self.fields {
            if f.size == 0 {
                return Err(Error::Rule(format!(
                    "zero-size projection item for {:?}",
                    f.column
                )));
            }
            if f.column.is_none() && (f.ty != ColumnType::UInt32 || f.size != ROW_INDEX_SIZE) {
                return Err(Error::Rule(
                    "row-index projection must be uint32 of size 4".into(),
                ));
            }
        }
        Ok(())
    }
}

impl From<Vec<ResultField>> for ResultDescription {
    fn from(fields: Vec<ResultField>) -> Self {
        Self { fields }
    }
}
