use thiserror::Error;

/// Result type local to krda-mem.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("heap exhausted: requested {requested} bytes, capacity {capacity}, used {used}")]
    Exhausted {
        requested: usize,
        capacity: usize,
        used: usize,
    },

    #[error("invalid handle: {0}")]
    InvalidHandle(String),
}

impl From<Error> for krda_core::Error {
    fn from(e: Error) -> Self {
        match e {
            Error::Exhausted {
                requested,
                capacity,
                used,
            } => krda_core::Error::Exhausted {
                requested,
                capacity,
                used,
            },
            Error::InvalidHandle(msg) => krda_core::Error::InvalidHandle(msg),
        }
    }
}
