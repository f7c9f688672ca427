//! Cookie-addressed server-side sessions.
//!
//! `sesh` decides, for every request, whether a session record must be
//! created, persisted, rotated or deleted:
//!
//! 1. [`SessionManager::load`] reads the session cookie, then loads the record
//!    from the store or starts an empty one under a fresh identifier.
//! 2. The handler mutates the [`Session`] and may call
//!    [`Session::regenerate_id`].
//! 3. [`SessionManager::commit`] compares the record against the snapshot
//!    taken at load time and issues the store and cookie writes, if any.
//!
//! Reading and writing the actual cookie header is left to a [`CookieJar`]
//! implementation supplied by the HTTP layer.
//!
//! # Example
//!
//! ```rust,ignore
//! use sesh::{SessionManager, MemoryCookieJar};
//!
//! let manager = SessionManager::<MemoryCookieJar>::builder().build();
//! let mut jar = MemoryCookieJar::new();
//!
//! let views = manager
//!     .run(&mut jar, |mut session| async move {
//!         let views = session.get_as::<u64>("views").unwrap_or(0) + 1;
//!         session.insert("views", views);
//!         (session, views)
//!     })
//!     .await?;
//! ```

mod cookie;
mod error;
mod jar;
mod manager;
mod session;
mod sid;

pub use cookie::{CookieOptions, resolve_cookie_options};
pub use error::{Error, Result};
pub use jar::{CookieJar, CookieWrite, MemoryCookieJar};
pub use manager::{CookieSource, DEFAULT_TTL, Outcome, SessionManager, SessionManagerBuilder};
pub use session::Session;
pub use sid::{SID_BYTES, generate_sid};

pub use sesh_config::{CookieOverrides, DEFAULT_KEY, SameSite};
pub use sesh_store::{Backend, BackendError, BackendResult, MemoryStore, Store, SyncBackend};
