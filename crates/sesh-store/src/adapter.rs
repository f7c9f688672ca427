//! Uniform async adapter over session backends.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{trace, warn};

use crate::backend::{Backend, BackendError, BackendResult, SyncBackend};
use crate::error::{Error, Result, WriteOp};
use crate::memory::MemoryStore;

/// Async `get/set/destroy` surface over any session backend.
///
/// The calling convention of the wrapped backend is settled once, at
/// construction: [`Store::new`] takes an async [`Backend`],
/// [`Store::from_sync`] runs a [`SyncBackend`] inline, and
/// [`Store::from_blocking`] moves each call of a [`SyncBackend`] onto tokio's
/// blocking pool. Callers only ever see async methods returning
/// [`Result`], with backend failures tagged by operation and key.
///
/// Every call runs to completion before returning, so operations issued in
/// sequence by one caller reach the backend in that order.
///
/// Clones share the same backend. The default store wraps a fresh
/// [`MemoryStore`].
#[derive(Clone)]
pub struct Store {
    backend: Arc<dyn Backend>,
}

impl Store {
    /// Wrap an asynchronous backend.
    pub fn new<B: Backend + 'static>(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Wrap an already shared asynchronous backend.
    pub fn from_arc(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Wrap a synchronous backend whose calls return without blocking.
    pub fn from_sync<B: SyncBackend + 'static>(backend: B) -> Self {
        Self::new(Inline(backend))
    }

    /// Wrap a synchronous backend whose calls may block the thread.
    ///
    /// Each call runs on tokio's blocking pool; the calling task suspends
    /// until it finishes.
    pub fn from_blocking<B: SyncBackend + 'static>(backend: B) -> Self {
        Self::new(Blocking(Arc::new(backend)))
    }

    /// Load the value stored under `key`.
    pub async fn get(&self, key: &str) -> Result<Option<Value>> {
        trace!(key = %key, "store get");
        self.backend.get(key).await.map_err(|source| {
            warn!(key = %key, error = %source, "Backend read failed");
            Error::Read {
                key: key.to_string(),
                source,
            }
        })
    }

    /// Store `value` under `key` for at most `ttl`.
    pub async fn set(&self, key: &str, value: Value, ttl: Duration) -> Result<()> {
        trace!(key = %key, ttl_ms = ttl.as_millis() as u64, "store set");
        self.backend
            .set(key, value, ttl)
            .await
            .map_err(|source| write_error(WriteOp::Set, key, source))
    }

    /// Remove `key`.
    pub async fn destroy(&self, key: &str) -> Result<()> {
        trace!(key = %key, "store destroy");
        self.backend
            .destroy(key)
            .await
            .map_err(|source| write_error(WriteOp::Destroy, key, source))
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::from_sync(MemoryStore::new())
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store").finish_non_exhaustive()
    }
}

fn write_error(op: WriteOp, key: &str, source: BackendError) -> Error {
    warn!(key = %key, op = %op, error = %source, "Backend write failed");
    Error::Write {
        op,
        key: key.to_string(),
        source,
    }
}

/// Runs a synchronous backend on the calling task.
struct Inline<B>(B);

#[async_trait]
impl<B: SyncBackend> Backend for Inline<B> {
    async fn get(&self, key: &str) -> BackendResult<Option<Value>> {
        self.0.get(key)
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> BackendResult<()> {
        self.0.set(key, value, ttl)
    }

    async fn destroy(&self, key: &str) -> BackendResult<()> {
        self.0.destroy(key)
    }
}

/// Runs a synchronous backend on the blocking pool.
struct Blocking<B>(Arc<B>);

impl<B: SyncBackend + 'static> Blocking<B> {
    async fn run<T, F>(&self, f: F) -> BackendResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&B) -> BackendResult<T> + Send + 'static,
    {
        let backend = Arc::clone(&self.0);
        tokio::task::spawn_blocking(move || f(&backend)).await?
    }
}

#[async_trait]
impl<B: SyncBackend + 'static> Backend for Blocking<B> {
    async fn get(&self, key: &str) -> BackendResult<Option<Value>> {
        let key = key.to_string();
        self.run(move |backend| backend.get(&key)).await
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> BackendResult<()> {
        let key = key.to_string();
        self.run(move |backend| backend.set(&key, value, ttl)).await
    }

    async fn destroy(&self, key: &str) -> BackendResult<()> {
        let key = key.to_string();
        self.run(move |backend| backend.destroy(&key)).await
    }
}
