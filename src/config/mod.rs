//! Configuration merge system
//!
//! Implements the 4-layer configuration merge:
//! 1. Built-in defaults
//! 2. Host/user config (~/.config/propagation-verifier/config.toml)
//! 3. Repo config (.propagation/verify.toml)
//! 4. CLI flags

mod defaults;
mod effective;
mod merge;
mod settings;

pub use defaults::BuiltinDefaults;
pub use effective::{ConfigError, ConfigOrigin, ConfigSource, EffectiveConfig};
pub use merge::{deep_merge, merge_layers};
pub use settings::{AuthSettings, BackoffMode, Settings};

use std::path::PathBuf;

/// Repo config path, relative to the working directory
pub const REPO_CONFIG_PATH: &str = ".propagation/verify.toml";

/// Host config path under `$HOME`, if `$HOME` is set
pub fn default_host_config_path() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| {
        PathBuf::from(home)
            .join(".config")
            .join("propagation-verifier")
            .join("config.toml")
    })
}
