//! Error types for the session lifecycle.

/// Error type for session lifecycle operations.
///
/// Both variants wrap a backend failure. A record that loads but is not a
/// JSON object is not an error; it is replaced by an empty record.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The store could not load the session; no handler has run.
    #[error("Failed to load session: {0}")]
    BackendRead(#[source] sesh_store::Error),

    /// The store could not persist or delete the session after the handler ran.
    #[error("Failed to reconcile session: {0}")]
    BackendWrite(#[source] sesh_store::Error),
}

impl Error {
    /// The backend error behind this failure.
    pub fn store_error(&self) -> &sesh_store::Error {
        match self {
            Error::BackendRead(e) | Error::BackendWrite(e) => e,
        }
    }
}

/// Result type for session lifecycle operations.
pub type Result<T> = std::result::Result<T, Error>;
