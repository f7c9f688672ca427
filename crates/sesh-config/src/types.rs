//! Configuration types mapping to the TOML schema.
//!
//! Top-level config:
//! ```toml
//! [session]                # namespace and server-side retention
//! [session.cookie]         # cookie attribute overrides
//! ```

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// Root configuration structure.
///
/// All sections are optional so that partial configs (e.g., project-local
/// overrides) can be loaded and merged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeshConfig {
    /// Session management configuration.
    pub session: Option<SessionConfig>,
}

impl SeshConfig {
    /// Create an empty config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Merge another config on top of this one (other takes priority).
    ///
    /// Merging is field-wise: a layer only overrides the settings it names.
    pub fn merge(&mut self, other: SeshConfig) {
        if let Some(overlay) = other.session {
            match self.session.as_mut() {
                Some(base) => base.merge(overlay),
                None => self.session = Some(overlay),
            }
        }
    }

    /// The session section, or its defaults when absent.
    pub fn session_or_default(&self) -> SessionConfig {
        self.session.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default namespace label prefixed to every storage key.
pub const DEFAULT_KEY: &str = "app:sess";

/// Default server-side retention for session-lifetime cookies (24 hours).
pub const DEFAULT_TTL_SECS: u64 = 24 * 60 * 60;

/// Session management configuration.
///
/// ```toml
/// [session]
/// key = "app:sess"
/// default_ttl_secs = 86400
///
/// [session.cookie]
/// max_age_ms = 3600000
/// path = "/"
/// http_only = true
/// same_site = "lax"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Cookie name and storage namespace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    /// Retention for sessions whose cookie has no positive max age.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_ttl_secs: Option<u64>,
    /// Cookie attribute overrides.
    pub cookie: CookieOverrides,
}

impl SessionConfig {
    /// Cookie name and storage namespace, `"app:sess"` when unset or empty.
    pub fn key(&self) -> &str {
        match self.key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => DEFAULT_KEY,
        }
    }

    /// Retention window as a duration.
    pub fn default_ttl(&self) -> Duration {
        Duration::from_secs(self.default_ttl_secs.unwrap_or(DEFAULT_TTL_SECS))
    }

    /// Overlay the fields `other` sets.
    pub fn merge(&mut self, other: SessionConfig) {
        if other.key.is_some() {
            self.key = other.key;
        }
        if other.default_ttl_secs.is_some() {
            self.default_ttl_secs = other.default_ttl_secs;
        }
        self.cookie.merge(other.cookie);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Cookie Overrides
// ─────────────────────────────────────────────────────────────────────────────

/// `SameSite` cookie attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SameSite {
    Strict,
    Lax,
    None,
}

/// Caller-supplied cookie attributes.
///
/// Every field is optional; unset fields fall back to the defaults applied
/// when options are resolved for a request. `overwrite` and `signed` are
/// accepted for completeness but resolution always forces them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CookieOverrides {
    /// Cookie lifetime in milliseconds. `0` means a session-lifetime cookie.
    /// Negative or non-numeric values are accepted and resolve to `0`.
    #[serde(
        deserialize_with = "lenient_millis",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_age_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub same_site: Option<SameSite>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signed: Option<bool>,
}

impl CookieOverrides {
    /// Create an empty set of overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Overlay the attributes `other` sets.
    pub fn merge(&mut self, other: CookieOverrides) {
        let CookieOverrides {
            max_age_ms,
            path,
            http_only,
            domain,
            secure,
            same_site,
            overwrite,
            signed,
        } = other;
        self.max_age_ms = max_age_ms.or(self.max_age_ms);
        self.path = path.or(self.path.take());
        self.http_only = http_only.or(self.http_only);
        self.domain = domain.or(self.domain.take());
        self.secure = secure.or(self.secure);
        self.same_site = same_site.or(self.same_site);
        self.overwrite = overwrite.or(self.overwrite);
        self.signed = signed.or(self.signed);
    }

    /// Set the cookie lifetime.
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age_ms = Some(i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX));
        self
    }

    /// Set the raw cookie lifetime in milliseconds.
    pub fn with_max_age_ms(mut self, max_age_ms: i64) -> Self {
        self.max_age_ms = Some(max_age_ms);
        self
    }

    /// Set the cookie path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Set the `HttpOnly` attribute.
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.http_only = Some(http_only);
        self
    }

    /// Set the cookie domain.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Set the `Secure` attribute.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = Some(secure);
        self
    }

    /// Set the `SameSite` attribute.
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.same_site = Some(same_site);
        self
    }
}

/// Accept any TOML value for a millisecond count.
///
/// Integers pass through, finite floats truncate, anything else becomes `0`.
fn lenient_millis<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(i64),
        Float(f64),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Int(ms) => Some(ms),
        Raw::Float(ms) if ms.is_finite() => Some(ms as i64),
        Raw::Float(_) | Raw::Other(_) => Some(0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config() {
        let config = SeshConfig::new();
        assert!(config.session.is_none());

        let session = config.session_or_default();
        assert_eq!(session.key(), "app:sess");
        assert_eq!(session.default_ttl(), Duration::from_secs(86_400));
        assert_eq!(session.cookie, CookieOverrides::default());
    }

    #[test]
    fn test_parse_minimal() {
        let toml = r#"
[session]
key = "shop:sess"
"#;
        let config = SeshConfig::from_toml(toml).unwrap();
        let session = config.session.unwrap();
        assert_eq!(session.key(), "shop:sess");
        assert_eq!(session.default_ttl_secs, None);
        assert_eq!(session.default_ttl(), Duration::from_secs(DEFAULT_TTL_SECS));
        assert!(session.cookie.max_age_ms.is_none());
    }

    #[test]
    fn test_parse_cookie_section() {
        let toml = r#"
[session]
default_ttl_secs = 600

[session.cookie]
max_age_ms = 3600000
path = "/app"
http_only = false
domain = "example.com"
secure = true
same_site = "strict"
"#;
        let config = SeshConfig::from_toml(toml).unwrap();
        let session = config.session.unwrap();
        assert_eq!(session.key(), DEFAULT_KEY);
        assert_eq!(session.default_ttl(), Duration::from_secs(600));

        let cookie = session.cookie;
        assert_eq!(cookie.max_age_ms, Some(3_600_000));
        assert_eq!(cookie.path.as_deref(), Some("/app"));
        assert_eq!(cookie.http_only, Some(false));
        assert_eq!(cookie.domain.as_deref(), Some("example.com"));
        assert_eq!(cookie.secure, Some(true));
        assert_eq!(cookie.same_site, Some(SameSite::Strict));
    }

    #[test]
    fn test_lenient_max_age() {
        let negative = SeshConfig::from_toml("[session.cookie]\nmax_age_ms = -5\n").unwrap();
        assert_eq!(negative.session.unwrap().cookie.max_age_ms, Some(-5));

        let float = SeshConfig::from_toml("[session.cookie]\nmax_age_ms = 1500.9\n").unwrap();
        assert_eq!(float.session.unwrap().cookie.max_age_ms, Some(1500));

        let text = SeshConfig::from_toml("[session.cookie]\nmax_age_ms = \"soon\"\n").unwrap();
        assert_eq!(text.session.unwrap().cookie.max_age_ms, Some(0));

        let nan = SeshConfig::from_toml("[session.cookie]\nmax_age_ms = nan\n").unwrap();
        assert_eq!(nan.session.unwrap().cookie.max_age_ms, Some(0));
    }

    #[test]
    fn test_invalid_same_site_rejected() {
        let result = SeshConfig::from_toml("[session.cookie]\nsame_site = \"sometimes\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_key_uses_default() {
        let config = SeshConfig::from_toml("[session]\nkey = \"\"\n").unwrap();
        assert_eq!(config.session_or_default().key(), DEFAULT_KEY);
    }

    #[test]
    fn test_merge_with_empty_overlay_keeps_base() {
        let mut base = SeshConfig::from_toml("[session]\nkey = \"base:sess\"\n").unwrap();
        base.merge(SeshConfig::new());
        assert_eq!(base.session_or_default().key(), "base:sess");
    }

    #[test]
    fn test_merge_is_field_wise() {
        let mut base = SeshConfig::from_toml(
            "[session]\ndefault_ttl_secs = 600\n\n[session.cookie]\npath = \"/app\"\nsecure = true\n",
        )
        .unwrap();
        let overlay = SeshConfig::from_toml(
            "[session]\nkey = \"p:sess\"\n\n[session.cookie]\nsecure = false\n",
        )
        .unwrap();
        base.merge(overlay);

        let session = base.session_or_default();
        assert_eq!(session.key(), "p:sess");
        assert_eq!(session.default_ttl(), Duration::from_secs(600));
        assert_eq!(session.cookie.path.as_deref(), Some("/app"));
        assert_eq!(session.cookie.secure, Some(false));
    }

    #[test]
    fn test_merge_into_missing_section() {
        let mut base = SeshConfig::new();
        base.merge(SeshConfig::from_toml("[session]\ndefault_ttl_secs = 5\n").unwrap());
        assert_eq!(base.session_or_default().default_ttl(), Duration::from_secs(5));
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = SeshConfig {
            session: Some(SessionConfig {
                key: Some("rt:sess".to_string()),
                default_ttl_secs: Some(120),
                cookie: CookieOverrides::new()
                    .with_max_age(Duration::from_secs(30))
                    .with_same_site(SameSite::Lax),
            }),
        };

        let parsed = SeshConfig::from_toml(&config.to_toml().unwrap()).unwrap();
        assert_eq!(parsed.session, config.session);
    }

    #[test]
    fn test_overrides_builder() {
        let cookie = CookieOverrides::new()
            .with_max_age_ms(-1)
            .with_path("/api")
            .with_http_only(false)
            .with_domain("example.org")
            .with_secure(true);

        assert_eq!(cookie.max_age_ms, Some(-1));
        assert_eq!(cookie.path.as_deref(), Some("/api"));
        assert_eq!(cookie.http_only, Some(false));
        assert_eq!(cookie.domain.as_deref(), Some("example.org"));
        assert_eq!(cookie.secure, Some(true));
        assert!(cookie.same_site.is_none());
    }
}
