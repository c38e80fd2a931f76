//! Convenient re-exports for downstream crates.

pub use crate::config::EngineConfig;
pub use crate::error::{Error, Result};
pub use crate::hash::{hash_bytes, Hash256};
pub use crate::projection::{ResultDescription, ResultField};
pub use crate::rules::{RuleGroup, RuleLeaf, RuleOp, RuleSet, RuleValue};
pub use crate::schema::{ColumnClass, ColumnType};
pub use crate::types::Scalar;
