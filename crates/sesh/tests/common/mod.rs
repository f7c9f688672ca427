//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use sesh::{Backend, BackendResult};

/// A store call as observed by [`RecordingBackend`].
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get(String),
    Set(String, Value, Duration),
    Destroy(String),
}

#[derive(Debug, thiserror::Error)]
#[error("backend unavailable")]
pub struct Unavailable;

/// In-memory async backend that records every call and can fail on demand.
#[derive(Default)]
pub struct RecordingBackend {
    values: Mutex<HashMap<String, Value>>,
    calls: Mutex<Vec<Call>>,
    fail_reads: Mutex<bool>,
    fail_writes: Mutex<bool>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, key: &str, value: Value) {
        self.values.lock().insert(key.to_string(), value);
    }

    pub fn value(&self, key: &str) -> Option<Value> {
        self.values.lock().get(key).cloned()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    /// Calls other than reads.
    pub fn writes(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, Call::Get(_)))
            .collect()
    }

    pub fn fail_reads(&self, fail: bool) {
        *self.fail_reads.lock() = fail;
    }

    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock() = fail;
    }
}

#[async_trait]
impl Backend for RecordingBackend {
    async fn get(&self, key: &str) -> BackendResult<Option<Value>> {
        tokio::task::yield_now().await;
        self.calls.lock().push(Call::Get(key.to_string()));
        if *self.fail_reads.lock() {
            return Err(Box::new(Unavailable));
        }
        Ok(self.values.lock().get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value, ttl: Duration) -> BackendResult<()> {
        tokio::task::yield_now().await;
        self.calls
            .lock()
            .push(Call::Set(key.to_string(), value.clone(), ttl));
        if *self.fail_writes.lock() {
            return Err(Box::new(Unavailable));
        }
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }

    async fn destroy(&self, key: &str) -> BackendResult<()> {
        tokio::task::yield_now().await;
        self.calls.lock().push(Call::Destroy(key.to_string()));
        if *self.fail_writes.lock() {
            return Err(Box::new(Unavailable));
        }
        self.values.lock().remove(key);
        Ok(())
    }
}
