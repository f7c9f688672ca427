//! Backend contracts for session storage.
//!
//! A backend holds session records under opaque string keys. Two calling
//! conventions are supported: [`Backend`] for natively asynchronous storage
//! (network stores, async database drivers) and [`SyncBackend`] for storage
//! that answers synchronously (in-process maps, blocking client libraries).
//! The [`Store`](crate::Store) adapter turns either into the same async surface.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

/// Error produced by a backend implementation.
///
/// Backends report failures with whatever error type they own; the adapter
/// attaches the operation and key before handing it to callers.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type returned by backend operations.
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Asynchronous session backend.
///
/// `get` returns `Ok(None)` for keys that do not exist or have expired.
/// That is distinct from `Err`, which means the backend could not answer.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Load the value stored under `key`.
    async fn get(&self, key: &str) -> BackendResult<Option<Value>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// `ttl` is how long the backend should retain the value without a
    /// further write.
    async fn set(&self, key: &str, value: Value, ttl: Duration) -> BackendResult<()>;

    /// Remove `key`. Removing a key that does not exist is not an error.
    async fn destroy(&self, key: &str) -> BackendResult<()>;
}

/// Synchronous session backend.
///
/// Same contract as [`Backend`], for storage that answers without suspending.
pub trait SyncBackend: Send + Sync {
    /// Load the value stored under `key`.
    fn get(&self, key: &str) -> BackendResult<Option<Value>>;

    /// Store `value` under `key` for at most `ttl`.
    fn set(&self, key: &str, value: Value, ttl: Duration) -> BackendResult<()>;

    /// Remove `key`.
    fn destroy(&self, key: &str) -> BackendResult<()>;
}
