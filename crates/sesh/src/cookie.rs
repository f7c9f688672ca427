//! Resolved cookie attributes.

use std::time::Duration;

use sesh_config::{CookieOverrides, SameSite};

/// Cookie attributes passed to [`CookieJar::write_cookie`](crate::CookieJar::write_cookie).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieOptions {
    /// Cookie lifetime. `Some(ZERO)` is a session-lifetime cookie; `None`
    /// leaves the attribute off entirely, as on a clearing directive.
    pub max_age: Option<Duration>,
    pub path: String,
    pub http_only: bool,
    pub domain: Option<String>,
    pub secure: Option<bool>,
    pub same_site: Option<SameSite>,
    /// Replace any cookie of the same name already set on this response.
    pub overwrite: bool,
    pub signed: bool,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            max_age: Some(Duration::ZERO),
            path: "/".to_string(),
            http_only: true,
            domain: None,
            secure: None,
            same_site: None,
            overwrite: true,
            signed: false,
        }
    }
}

impl CookieOptions {
    /// The same attributes without a max age, for a clearing directive.
    pub fn without_max_age(&self) -> Self {
        Self {
            max_age: None,
            ..self.clone()
        }
    }

    /// Server-side retention for a record saved with these options.
    ///
    /// A positive max age is used as is; session-lifetime cookies fall back
    /// to `default_ttl`.
    pub fn store_ttl(&self, default_ttl: Duration) -> Duration {
        match self.max_age {
            Some(max_age) if !max_age.is_zero() => max_age,
            _ => default_ttl,
        }
    }
}

/// Merge caller overrides over the defaults.
///
/// Defaults are `max_age = 0`, `path = "/"`, `http_only = true`. `overwrite`
/// and `signed` are forced to `true` and `false` whatever the caller asked
/// for, and a negative max age is clamped to zero.
pub fn resolve_cookie_options(overrides: &CookieOverrides) -> CookieOptions {
    let defaults = CookieOptions::default();
    let max_age_ms = overrides.max_age_ms.unwrap_or(0).max(0);

    CookieOptions {
        max_age: Some(Duration::from_millis(max_age_ms as u64)),
        path: overrides.path.clone().unwrap_or(defaults.path),
        http_only: overrides.http_only.unwrap_or(defaults.http_only),
        domain: overrides.domain.clone(),
        secure: overrides.secure,
        same_site: overrides.same_site,
        overwrite: true,
        signed: false,
    }
}
