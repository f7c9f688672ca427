//! The request-scoped session handed to handlers.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::sid::generate_sid;

/// A session record owned by one request.
///
/// Created by [`SessionManager::load`](crate::SessionManager::load) and
/// consumed by [`SessionManager::commit`](crate::SessionManager::commit).
/// Holds the working record, a snapshot of the record as loaded, and the
/// identifier the request arrived with.
#[derive(Debug)]
pub struct Session {
    id: String,
    original_id: Option<String>,
    data: Map<String, Value>,
    snapshot: Map<String, Value>,
}

impl Session {
    /// A session under a freshly minted identifier.
    pub(crate) fn fresh() -> Self {
        Self {
            id: generate_sid(),
            original_id: None,
            data: Map::new(),
            snapshot: Map::new(),
        }
    }

    /// A session resumed under the identifier the client sent.
    pub(crate) fn resumed(id: String, stored: Option<Value>) -> Self {
        let data = normalize(stored);
        Self {
            id: id.clone(),
            original_id: Some(id),
            snapshot: data.clone(),
            data,
        }
    }

    /// The identifier the session will be committed under.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The identifier the request arrived with, if any.
    pub fn original_id(&self) -> Option<&str> {
        self.original_id.as_deref()
    }

    /// Whether the request arrived without a session cookie.
    pub fn is_new(&self) -> bool {
        self.original_id.is_none()
    }

    /// Whether the committed identifier differs from the inbound one.
    pub fn is_rotated(&self) -> bool {
        self.original_id.as_deref() != Some(self.id.as_str())
    }

    /// Replace the identifier with a freshly minted one.
    ///
    /// The store is untouched until commit, where the record stored under
    /// the inbound identifier is destroyed. Calling this more than once only
    /// changes which new identifier is used.
    pub fn regenerate_id(&mut self) {
        self.id = generate_sid();
    }

    /// Get a value from the record.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Get a value from the record, deserialized into `T`.
    ///
    /// Returns `None` if the key is missing or holds a value of another shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Insert a value into the record, returning the previous one.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Remove a value from the record.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Remove every value. An emptied record is deleted at commit.
    pub fn clear(&mut self) {
        self.data.clear();
    }

    /// Replace the whole record. Anything but a JSON object empties it.
    pub fn replace(&mut self, value: Value) {
        self.data = normalize(Some(value));
    }

    /// Whether the record holds no values.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of top-level values in the record.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the record differs from the snapshot taken at load.
    pub fn is_modified(&self) -> bool {
        self.data != self.snapshot
    }

    /// The record.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Mutable access to the record.
    pub fn data_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.data
    }

    pub(crate) fn into_parts(self) -> SessionParts {
        SessionParts {
            id: self.id,
            original_id: self.original_id,
            data: self.data,
            snapshot: self.snapshot,
        }
    }
}

/// A session taken apart for reconciliation.
pub(crate) struct SessionParts {
    pub id: String,
    pub original_id: Option<String>,
    pub data: Map<String, Value>,
    pub snapshot: Map<String, Value>,
}

/// Coerce a stored value into a record.
fn normalize(value: Option<Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map,
        Some(other) => {
            debug!(kind = value_kind(&other), "Discarding non-object session record");
            Map::new()
        }
        None => Map::new(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
