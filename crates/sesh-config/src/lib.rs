//! Configuration system for sesh.
//!
//! Provides TOML-based configuration with:
//! - A `[session]` section naming the storage namespace and server-side retention
//! - A `[session.cookie]` section with cookie attribute overrides
//! - Config file layering (XDG user config + project-local overrides)

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigWarning, LoadedConfig, load_config, load_config_explicit, load_config_file,
    load_config_with_options, user_config_path,
};
pub use error::{ConfigError, Result};
pub use types::*;
