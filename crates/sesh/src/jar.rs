//! Cookie I/O seam between the session lifecycle and the HTTP layer.

use std::collections::HashMap;

use crate::cookie::CookieOptions;

/// Request/response cookie access supplied by the HTTP layer.
///
/// Serialization, signing and header parsing are the implementor's concern.
pub trait CookieJar {
    /// The value of the inbound cookie `name`, if the client sent one.
    fn read_cookie(&self, name: &str) -> Option<String>;

    /// Queue an outbound cookie. `None` asks the client to delete it.
    fn write_cookie(&mut self, name: &str, value: Option<&str>, options: &CookieOptions);
}

/// One outbound cookie directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieWrite {
    pub name: String,
    pub value: Option<String>,
    pub options: CookieOptions,
}

impl CookieWrite {
    /// Whether this directive deletes the cookie.
    pub fn is_removal(&self) -> bool {
        self.value.is_none()
    }
}

/// In-memory cookie jar.
///
/// Holds the cookies a client sent and records every write. Calling
/// [`MemoryCookieJar::next_request`] plays the part of a browser: recorded
/// writes are applied to the inbound cookies and the write log is reset.
#[derive(Debug, Clone, Default)]
pub struct MemoryCookieJar {
    inbound: HashMap<String, String>,
    writes: Vec<CookieWrite>,
}

impl MemoryCookieJar {
    /// Create a jar with no inbound cookies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an inbound cookie.
    pub fn with_cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.inbound.insert(name.into(), value.into());
        self
    }

    /// Writes recorded since the jar was created or last advanced.
    pub fn writes(&self) -> &[CookieWrite] {
        &self.writes
    }

    /// The most recent write for `name`.
    pub fn last_write(&self, name: &str) -> Option<&CookieWrite> {
        self.writes.iter().rev().find(|w| w.name == name)
    }

    /// Apply recorded writes to the inbound cookies and clear the write log.
    pub fn next_request(&mut self) {
        for write in self.writes.drain(..) {
            match write.value {
                Some(value) => {
                    self.inbound.insert(write.name, value);
                }
                None => {
                    self.inbound.remove(&write.name);
                }
            }
        }
    }
}

impl CookieJar for MemoryCookieJar {
    fn read_cookie(&self, name: &str) -> Option<String> {
        self.inbound.get(name).cloned()
    }

    fn write_cookie(&mut self, name: &str, value: Option<&str>, options: &CookieOptions) {
        self.writes.push(CookieWrite {
            name: name.to_string(),
            value: value.map(str::to_string),
            options: options.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_inbound() {
        let jar = MemoryCookieJar::new().with_cookie("app:sess", "abc");
        assert_eq!(jar.read_cookie("app:sess").as_deref(), Some("abc"));
        assert_eq!(jar.read_cookie("other"), None);
    }

    #[test]
    fn test_next_request_applies_writes() {
        let mut jar = MemoryCookieJar::new().with_cookie("gone", "x");
        let options = CookieOptions::default();

        jar.write_cookie("app:sess", Some("new-sid"), &options);
        jar.write_cookie("gone", None, &options.without_max_age());

        assert_eq!(jar.writes().len(), 2);
        assert!(jar.last_write("gone").unwrap().is_removal());

        jar.next_request();

        assert!(jar.writes().is_empty());
        assert_eq!(jar.read_cookie("app:sess").as_deref(), Some("new-sid"));
        assert_eq!(jar.read_cookie("gone"), None);
    }
}
