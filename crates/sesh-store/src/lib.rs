//! Session storage for sesh.
//!
//! This crate provides the storage side of the session lifecycle:
//! - [`MemoryStore`], an in-process keyed store where every key carries its own expiry timer
//! - [`Backend`] and [`SyncBackend`], the contracts a pluggable backend implements
//! - [`Store`], the adapter that presents any backend as one async `get/set/destroy` surface
//!
//! # Example
//!
//! ```rust,ignore
//! use std::time::Duration;
//! use sesh_store::{MemoryStore, Store};
//!
//! let store = Store::from_sync(MemoryStore::new());
//! store.set("app:sess:abc", serde_json::json!({"count": 1}), Duration::from_secs(60)).await?;
//! ```

mod adapter;
mod backend;
mod error;
mod memory;

pub use adapter::Store;
pub use backend::{Backend, BackendError, BackendResult, SyncBackend};
pub use error::{Error, Result, WriteOp};
pub use memory::MemoryStore;
