//! Locating and layering session config files.
//!
//! Two layers are merged field by field, the later one winning:
//! the user file (`$SESH_CONFIG_DIR/config.toml`, else
//! `<platform config dir>/sesh/config.toml`) and then the project's
//! `sesh.toml`. Builder calls made in code apply on top of the result.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{ConfigError, Result, SeshConfig};

const PROJECT_FILE: &str = "sesh.toml";
const USER_FILE: &str = "config.toml";
const USER_DIR_ENV: &str = "SESH_CONFIG_DIR";

/// Something in the config that was skipped or will not take effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigWarning {
    /// A layer existed but could not be read or parsed; it was skipped.
    SkippedLayer { path: PathBuf, reason: String },
    /// A cookie attribute that option resolution always overrides.
    ForcedAttribute {
        attribute: &'static str,
        requested: bool,
        applied: bool,
    },
    /// A negative `max_age_ms`, which resolves to a session-lifetime cookie.
    NegativeMaxAge(i64),
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::SkippedLayer { path, reason } => {
                write!(f, "skipped {}: {}", path.display(), reason)
            }
            ConfigWarning::ForcedAttribute {
                attribute,
                requested,
                applied,
            } => write!(
                f,
                "[session.cookie] {} = {} has no effect; session cookies always use {}",
                attribute, requested, applied
            ),
            ConfigWarning::NegativeMaxAge(ms) => write!(
                f,
                "[session.cookie] max_age_ms = {} is treated as 0 (session-lifetime cookie)",
                ms
            ),
        }
    }
}

/// A merged config together with what went wrong assembling it.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub config: SeshConfig,
    pub warnings: Vec<ConfigWarning>,
}

/// Merge the user layer and the project layer found in `project_dir`
/// (the working directory when `None`).
pub fn load_config(project_dir: Option<&Path>) -> Result<LoadedConfig> {
    load_config_with_options(project_dir, None)
}

/// Like [`load_config`], reading the user layer from `user_dir` instead of
/// `SESH_CONFIG_DIR` or the platform default.
///
/// Missing layers are skipped silently, broken ones with a
/// [`ConfigWarning::SkippedLayer`].
pub fn load_config_with_options(
    project_dir: Option<&Path>,
    user_dir: Option<&Path>,
) -> Result<LoadedConfig> {
    let user_layer = match user_dir {
        Some(dir) => Some(dir.join(USER_FILE)),
        None => user_config_path(),
    };
    let project_layer = project_dir.unwrap_or(Path::new(".")).join(PROJECT_FILE);

    let mut loaded = LoadedConfig::default();
    for path in user_layer.iter().chain(std::iter::once(&project_layer)) {
        if !path.is_file() {
            continue;
        }
        match load_config_file(path) {
            Ok(layer) => loaded.config.merge(layer),
            Err(e) => loaded.warnings.push(ConfigWarning::SkippedLayer {
                path: path.clone(),
                reason: e.to_string(),
            }),
        }
    }
    loaded.warnings.extend(check_session(&loaded.config));
    Ok(loaded)
}

/// Load exactly one file, without discovery.
///
/// Unlike discovered layers, a missing or broken file is an error. The
/// result is checked for ineffective settings the same way.
pub fn load_config_explicit(path: &Path) -> Result<LoadedConfig> {
    let config = load_config_file(path)?;
    let warnings = check_session(&config);
    Ok(LoadedConfig { config, warnings })
}

/// Parse one config file.
pub fn load_config_file(path: &Path) -> Result<SeshConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    SeshConfig::from_toml(&contents)
}

/// Where the user layer is read from, if a config directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    let dir = match std::env::var(USER_DIR_ENV) {
        Ok(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::config_dir()?.join("sesh"),
    };
    Some(dir.join(USER_FILE))
}

fn check_session(config: &SeshConfig) -> Vec<ConfigWarning> {
    let Some(cookie) = config.session.as_ref().map(|s| &s.cookie) else {
        return Vec::new();
    };

    let mut warnings = Vec::new();
    if let Some(ms) = cookie.max_age_ms
        && ms < 0
    {
        warnings.push(ConfigWarning::NegativeMaxAge(ms));
    }
    if cookie.signed == Some(true) {
        warnings.push(ConfigWarning::ForcedAttribute {
            attribute: "signed",
            requested: true,
            applied: false,
        });
    }
    if cookie.overwrite == Some(false) {
        warnings.push(ConfigWarning::ForcedAttribute {
            attribute: "overwrite",
            requested: false,
            applied: true,
        });
    }
    warnings
}
