//! In-process keyed store with per-key expiry.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::backend::{BackendResult, SyncBackend};
use crate::error::{Error, Result};

/// A stored value together with the timer that will evict it.
#[derive(Debug)]
struct Slot {
    value: Value,
    timer: JoinHandle<()>,
    /// Identifies the write that installed this slot. A timer only evicts
    /// the slot carrying its own generation.
    generation: u64,
}

#[derive(Debug, Default)]
struct Inner {
    slots: HashMap<String, Slot>,
    next_generation: u64,
}

impl Drop for Inner {
    fn drop(&mut self) {
        for slot in self.slots.values() {
            slot.timer.abort();
        }
    }
}

/// In-memory session store where every key expires independently.
///
/// Each `set` replaces the value and restarts the key's expiry window.
/// Expiry runs as a tokio task per key, so `set` must be called from within
/// a tokio runtime. The store has no capacity bound and no persistence; it is
/// the default backend, not a production cache.
///
/// Clones share the same underlying map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a copy of the value stored under `key`, if it has not expired.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.lock().slots.get(key).map(|slot| slot.value.clone())
    }

    /// Store `value` under `key`, evicting it after `ttl`.
    ///
    /// Any pending expiry for `key` is cancelled first; the window restarts
    /// from this call.
    pub fn set(&self, key: impl Into<String>, value: Value, ttl: Duration) -> Result<()> {
        let key = key.into();
        let handle = Handle::try_current().map_err(|_| Error::NoRuntime(key.clone()))?;

        let mut inner = self.inner.lock();
        inner.next_generation += 1;
        let generation = inner.next_generation;

        let timer = handle.spawn(expire(
            Arc::downgrade(&self.inner),
            key.clone(),
            generation,
            ttl,
        ));

        let slot = Slot {
            value,
            timer,
            generation,
        };
        if let Some(previous) = inner.slots.insert(key.clone(), slot) {
            previous.timer.abort();
            trace!(key = %key, "Replaced value, expiry window restarted");
        } else {
            trace!(key = %key, ttl_ms = ttl.as_millis() as u64, "Stored value");
        }

        Ok(())
    }

    /// Remove `key` and cancel its expiry. A key with no entry is left alone.
    pub fn destroy(&self, key: &str) {
        let mut inner = self.inner.lock();
        if let Some(slot) = inner.slots.remove(key) {
            slot.timer.abort();
            trace!(key = %key, "Destroyed value");
        }
    }

    /// Check whether `key` currently holds a value.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().slots.contains_key(key)
    }

    /// Get the number of live keys.
    pub fn len(&self) -> usize {
        self.inner.lock().slots.len()
    }

    /// Check if the store holds no keys.
    pub fn is_empty(&self) -> bool {
        self.inner.lock().slots.is_empty()
    }

    /// Remove every key and cancel every pending expiry.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        for (_, slot) in inner.slots.drain() {
            slot.timer.abort();
        }
    }
}

/// Expiry task for a single write.
///
/// Holds only a weak reference so pending timers do not keep a dropped store
/// alive. The generation check covers a timer that woke up but lost the lock
/// race to a newer `set` or `destroy`.
async fn expire(inner: Weak<Mutex<Inner>>, key: String, generation: u64, ttl: Duration) {
    tokio::time::sleep(ttl).await;

    let Some(inner) = inner.upgrade() else {
        return;
    };
    let mut inner = inner.lock();
    if inner
        .slots
        .get(&key)
        .is_some_and(|slot| slot.generation == generation)
    {
        inner.slots.remove(&key);
        trace!(key = %key, "Value expired");
    }
}

impl SyncBackend for MemoryStore {
    fn get(&self, key: &str) -> BackendResult<Option<Value>> {
        Ok(MemoryStore::get(self, key))
    }

    fn set(&self, key: &str, value: Value, ttl: Duration) -> BackendResult<()> {
        MemoryStore::set(self, key, value, ttl)?;
        Ok(())
    }

    fn destroy(&self, key: &str) -> BackendResult<()> {
        MemoryStore::destroy(self, key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::new();
        let value = json!({"user": {"id": 7, "roles": ["admin", "dev"]}});

        store
            .set("app:sess:abc", value.clone(), Duration::from_secs(60))
            .unwrap();

        assert_eq!(store.get("app:sess:abc"), Some(value));
        assert_eq!(store.get("app:sess:other"), None);
    }

    #[tokio::test]
    async fn test_last_write_wins_with_single_timer() {
        let store = MemoryStore::new();
        store
            .set("k", json!({"v": 1}), Duration::from_millis(50))
            .unwrap();
        store
            .set("k", json!({"v": 2}), Duration::from_millis(50))
            .unwrap();

        assert_eq!(store.get("k"), Some(json!({"v": 2})));
        assert_eq!(store.len(), 1);

        sleep(Duration::from_millis(100)).await;

        assert_eq!(store.get("k"), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_set_restarts_window() {
        let store = MemoryStore::new();
        store
            .set("k", json!({"v": 1}), Duration::from_millis(100))
            .unwrap();

        sleep(Duration::from_millis(60)).await;

        // Rewrite to restart the window
        store
            .set("k", json!({"v": 1}), Duration::from_millis(100))
            .unwrap();

        // Total > 100ms since the first write
        sleep(Duration::from_millis(60)).await;

        assert!(store.contains("k"));
    }

    #[tokio::test]
    async fn test_expiration() {
        let store = MemoryStore::new();
        store
            .set("k", json!({"v": 1}), Duration::from_millis(10))
            .unwrap();

        sleep(Duration::from_millis(50)).await;

        assert_eq!(store.get("k"), None);
        assert!(!store.contains("k"));
    }

    #[tokio::test]
    async fn test_destroy_missing_key_is_noop() {
        let store = MemoryStore::new();
        store.destroy("never-existed");

        store
            .set("k", json!({"v": 1}), Duration::from_millis(10))
            .unwrap();
        sleep(Duration::from_millis(50)).await;

        // Already expired
        store.destroy("k");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_destroy_cancels_pending_expiry() {
        let store = MemoryStore::new();
        store
            .set("k", json!({"v": 1}), Duration::from_millis(30))
            .unwrap();
        store.destroy("k");
        assert_eq!(store.get("k"), None);

        // A later write must not be evicted by the cancelled timer
        store
            .set("k", json!({"v": 2}), Duration::from_secs(60))
            .unwrap();
        sleep(Duration::from_millis(80)).await;

        assert_eq!(store.get("k"), Some(json!({"v": 2})));
    }

    #[tokio::test]
    async fn test_keys_expire_independently() {
        let store = MemoryStore::new();
        store
            .set("short", json!(1), Duration::from_millis(20))
            .unwrap();
        store
            .set("long", json!(2), Duration::from_secs(60))
            .unwrap();

        sleep(Duration::from_millis(60)).await;

        assert!(!store.contains("short"));
        assert!(store.contains("long"));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_clear() {
        let store = MemoryStore::new();
        for i in 1..=3 {
            store
                .set(format!("k{}", i), json!(i), Duration::from_secs(60))
                .unwrap();
        }
        assert_eq!(store.len(), 3);

        store.clear();

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let store = MemoryStore::new();
        let other = store.clone();

        store
            .set("k", json!({"v": 1}), Duration::from_secs(60))
            .unwrap();

        assert_eq!(other.get("k"), Some(json!({"v": 1})));
    }

    #[test]
    fn test_set_outside_runtime() {
        let store = MemoryStore::new();
        let result = store.set("k", json!({"v": 1}), Duration::from_secs(1));

        assert!(matches!(result, Err(Error::NoRuntime(ref key)) if key == "k"));
        assert!(store.is_empty());
    }
}
