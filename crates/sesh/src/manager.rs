//! Session lifecycle orchestration.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use sesh_config::{CookieOverrides, DEFAULT_KEY, SessionConfig};
use sesh_store::{Backend, Store, SyncBackend};
use tracing::{debug, trace};

use crate::cookie::{CookieOptions, resolve_cookie_options};
use crate::error::{Error, Result};
use crate::jar::CookieJar;
use crate::session::{Session, SessionParts};

/// Default server-side retention for session-lifetime cookies.
pub const DEFAULT_TTL: Duration = Duration::from_secs(sesh_config::DEFAULT_TTL_SECS);

/// What reconciliation did with a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Nothing was written: the record was unchanged, or a new session was
    /// left empty.
    Noop,
    /// A new session was stored and its cookie issued.
    Create,
    /// The record was stored again under the same identifier.
    Save,
    /// The record was emptied; the stored copy and the cookie were removed.
    Delete,
    /// The old identifier was destroyed and the record stored under the new one.
    RotateSave,
    /// The old identifier was destroyed; the empty record was not stored.
    RotateDelete,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Outcome::Noop => "noop",
            Outcome::Create => "create",
            Outcome::Save => "save",
            Outcome::Delete => "delete",
            Outcome::RotateSave => "rotate_save",
            Outcome::RotateDelete => "rotate_delete",
        };
        f.pad(name)
    }
}

/// Where a request's cookie attributes come from.
pub enum CookieSource<J: ?Sized> {
    /// The same overrides for every request.
    Static(CookieOverrides),
    /// Overrides computed from the request's cookie jar.
    Resolver(Arc<dyn Fn(&J) -> CookieOverrides + Send + Sync>),
}

impl<J: ?Sized> CookieSource<J> {
    fn resolve(&self, jar: &J) -> CookieOptions {
        match self {
            CookieSource::Static(overrides) => resolve_cookie_options(overrides),
            CookieSource::Resolver(resolver) => resolve_cookie_options(&resolver(jar)),
        }
    }
}

impl<J: ?Sized> Clone for CookieSource<J> {
    fn clone(&self) -> Self {
        match self {
            CookieSource::Static(overrides) => CookieSource::Static(overrides.clone()),
            CookieSource::Resolver(resolver) => CookieSource::Resolver(Arc::clone(resolver)),
        }
    }
}

impl<J: ?Sized> Default for CookieSource<J> {
    fn default() -> Self {
        CookieSource::Static(CookieOverrides::default())
    }
}

impl<J: ?Sized> fmt::Debug for CookieSource<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CookieSource::Static(overrides) => f.debug_tuple("Static").field(overrides).finish(),
            CookieSource::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// Drives the session lifecycle for requests whose cookies live in `J`.
///
/// One manager serves every request; each request gets its own [`Session`].
/// Records are stored under `"{key}:{sid}"`, and `key` is also the cookie name.
pub struct SessionManager<J: CookieJar + ?Sized> {
    key: String,
    cookie: CookieSource<J>,
    store: Store,
    default_ttl: Duration,
}

impl<J: CookieJar + ?Sized> SessionManager<J> {
    /// Start building a manager with default settings.
    pub fn builder() -> SessionManagerBuilder<J> {
        SessionManagerBuilder::new()
    }

    /// Start building a manager from a `[session]` config section.
    pub fn from_config(config: &SessionConfig) -> SessionManagerBuilder<J> {
        SessionManagerBuilder::new()
            .with_key(config.key())
            .with_cookie(config.cookie.clone())
            .with_default_ttl(config.default_ttl())
    }

    /// Cookie name and storage namespace.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The store records are persisted in.
    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Retention used when the cookie has no positive max age.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Storage key for a session identifier.
    pub fn storage_key(&self, sid: &str) -> String {
        format!("{}:{}", self.key, sid)
    }

    /// Resolve or start the request's session.
    ///
    /// Without a session cookie a new identifier is minted and the record
    /// starts empty; the store is not consulted. Otherwise the record is
    /// loaded from the store, and a missing or non-object value yields an
    /// empty record. A store failure is returned as [`Error::BackendRead`]
    /// and no session is produced.
    pub async fn load(&self, jar: &J) -> Result<Session> {
        let Some(sid) = jar.read_cookie(&self.key).filter(|sid| !sid.is_empty()) else {
            trace!(key = %self.key, "No session cookie, starting new session");
            return Ok(Session::fresh());
        };

        let stored = self
            .store
            .get(&self.storage_key(&sid))
            .await
            .map_err(Error::BackendRead)?;

        trace!(key = %self.key, found = stored.is_some(), "Session loaded");
        Ok(Session::resumed(sid, stored))
    }

    /// Reconcile the session with the store and the cookie jar.
    ///
    /// Compares the record against its load-time snapshot and performs the
    /// writes the [`Outcome`] names. Each store write happens before the
    /// matching cookie write, so a failed write leaves its cookie unwritten.
    ///
    /// This runs after the handler, so a [`Error::BackendWrite`] can arrive
    /// once the response is already under way.
    pub async fn commit(&self, session: Session, jar: &mut J) -> Result<Outcome> {
        let SessionParts {
            id,
            original_id,
            data,
            snapshot,
        } = session.into_parts();
        let has_data = !data.is_empty();

        let outcome = if original_id.as_deref() == Some(id.as_str()) {
            if data == snapshot {
                Outcome::Noop
            } else {
                let cookie = self.cookie.resolve(jar);
                if has_data {
                    self.save(jar, &cookie, &id, data).await?;
                    Outcome::Save
                } else {
                    self.delete(jar, &cookie, &id).await?;
                    Outcome::Delete
                }
            }
        } else if let Some(old_id) = original_id {
            let cookie = self.cookie.resolve(jar);
            self.delete(jar, &cookie, &old_id).await?;
            if has_data {
                self.save(jar, &cookie, &id, data).await?;
                Outcome::RotateSave
            } else {
                Outcome::RotateDelete
            }
        } else if has_data {
            let cookie = self.cookie.resolve(jar);
            self.save(jar, &cookie, &id, data).await?;
            Outcome::Create
        } else {
            Outcome::Noop
        };

        debug!(key = %self.key, outcome = %outcome, "Session reconciled");
        Ok(outcome)
    }

    /// Load the session, hand it to `handler`, then commit it.
    ///
    /// The handler returns the session together with its own output, and the
    /// session is committed whatever that output is. A handler whose output
    /// is an error therefore still has its session changes reconciled.
    ///
    /// A load failure skips the handler. A commit failure is returned after
    /// the handler has run and its output is dropped.
    pub async fn run<F, Fut, R>(&self, jar: &mut J, handler: F) -> Result<R>
    where
        F: FnOnce(Session) -> Fut,
        Fut: Future<Output = (Session, R)>,
    {
        let session = self.load(jar).await?;
        let (session, output) = handler(session).await;
        self.commit(session, jar).await?;
        Ok(output)
    }

    async fn save(
        &self,
        jar: &mut J,
        cookie: &CookieOptions,
        sid: &str,
        data: Map<String, Value>,
    ) -> Result<()> {
        let ttl = cookie.store_ttl(self.default_ttl);
        self.store
            .set(&self.storage_key(sid), Value::Object(data), ttl)
            .await
            .map_err(Error::BackendWrite)?;
        jar.write_cookie(&self.key, Some(sid), cookie);
        Ok(())
    }

    async fn delete(&self, jar: &mut J, cookie: &CookieOptions, sid: &str) -> Result<()> {
        self.store
            .destroy(&self.storage_key(sid))
            .await
            .map_err(Error::BackendWrite)?;
        jar.write_cookie(&self.key, None, &cookie.without_max_age());
        Ok(())
    }
}

impl<J: CookieJar + ?Sized> Clone for SessionManager<J> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            cookie: self.cookie.clone(),
            store: self.store.clone(),
            default_ttl: self.default_ttl,
        }
    }
}

impl<J: CookieJar + ?Sized> fmt::Debug for SessionManager<J> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("key", &self.key)
            .field("cookie", &self.cookie)
            .field("default_ttl", &self.default_ttl)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SessionManager`].
pub struct SessionManagerBuilder<J: CookieJar + ?Sized> {
    key: String,
    cookie: CookieSource<J>,
    store: Option<Store>,
    default_ttl: Duration,
}

impl<J: CookieJar + ?Sized> SessionManagerBuilder<J> {
    /// Create a builder with the default key, cookie and retention.
    pub fn new() -> Self {
        Self {
            key: DEFAULT_KEY.to_string(),
            cookie: CookieSource::default(),
            store: None,
            default_ttl: DEFAULT_TTL,
        }
    }

    /// Set the cookie name and storage namespace. An empty key keeps the default.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        self.key = if key.is_empty() {
            DEFAULT_KEY.to_string()
        } else {
            key
        };
        self
    }

    /// Use the same cookie overrides for every request.
    pub fn with_cookie(mut self, overrides: CookieOverrides) -> Self {
        self.cookie = CookieSource::Static(overrides);
        self
    }

    /// Compute cookie overrides per request.
    pub fn with_cookie_resolver<F>(mut self, resolver: F) -> Self
    where
        F: Fn(&J) -> CookieOverrides + Send + Sync + 'static,
    {
        self.cookie = CookieSource::Resolver(Arc::new(resolver));
        self
    }

    /// Use an existing store adapter.
    pub fn with_store(mut self, store: Store) -> Self {
        self.store = Some(store);
        self
    }

    /// Store records in an asynchronous backend.
    pub fn with_backend<B: Backend + 'static>(self, backend: B) -> Self {
        self.with_store(Store::new(backend))
    }

    /// Store records in a synchronous backend.
    pub fn with_sync_backend<B: SyncBackend + 'static>(self, backend: B) -> Self {
        self.with_store(Store::from_sync(backend))
    }

    /// Set retention for sessions whose cookie has no positive max age.
    pub fn with_default_ttl(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Build the manager. Without a store, records live in a new
    /// in-process [`MemoryStore`](sesh_store::MemoryStore).
    pub fn build(self) -> SessionManager<J> {
        SessionManager {
            key: self.key,
            cookie: self.cookie,
            store: self.store.unwrap_or_default(),
            default_ttl: self.default_ttl,
        }
    }
}

impl<J: CookieJar + ?Sized> Default for SessionManagerBuilder<J> {
    fn default() -> Self {
        Self::new()
    }
}
