#![forbid(unsafe_code)]
//! krda-core: errors, configuration, schema and message types.
//!
//! Pure data; no buffers or threads here. The memory and execution crates
//! build on these definitions, which keeps this crate stable and minimal.

pub mod config;
pub mod error;
pub mod hash;
pub mod prelude;
pub mod projection;
pub mod rules;
pub mod schema;
pub mod types;

pub use error::{Error, Result};
