//! Error types for session storage operations.

use std::fmt;

use crate::backend::BackendError;

/// The mutating store operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOp {
    Set,
    Destroy,
}

impl fmt::Display for WriteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOp::Set => write!(f, "set"),
            WriteOp::Destroy => write!(f, "destroy"),
        }
    }
}

/// Error type for session storage operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backend failed to read a key.
    #[error("Backend read failed for '{key}': {source}")]
    Read { key: String, source: BackendError },

    /// The backend failed to write or destroy a key.
    #[error("Backend {op} failed for '{key}': {source}")]
    Write {
        op: WriteOp,
        key: String,
        source: BackendError,
    },

    /// An expiry timer was requested outside of a tokio runtime.
    #[error("No tokio runtime available to schedule expiry for '{0}'")]
    NoRuntime(String),
}

impl Error {
    /// The storage key the failed operation targeted.
    pub fn key(&self) -> &str {
        match self {
            Error::Read { key, .. } | Error::Write { key, .. } => key,
            Error::NoRuntime(key) => key,
        }
    }
}

/// Result type for session storage operations.
pub type Result<T> = std::result::Result<T, Error>;
