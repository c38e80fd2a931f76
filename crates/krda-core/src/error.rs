use thiserror::Error;

/// Canonical result for the engine.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("bad table format: {0}")]
    Format(String),

    #[error("heap exhausted: requested {requested} bytes, capacity {capacity}, used {used}")]
    Exhausted {
        requested: usize,
        capacity: usize,
        used: usize,
    },

    #[error("rule error: {0}")]
    Rule(String),

    // Use of a freed or foreign block, or an out-of-range window. These are
    // programming errors on the caller's side and abort the run.
    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    #[error("filter run cancelled")]
    Cancelled,

    #[error("worker failed: {0}")]
    Worker(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Rule(e.to_string())
    }
}
