//! Effective configuration with provenance
//!
//! Captures the merged configuration plus where each contributing layer
//! came from. The serialized form has secrets redacted; the unredacted
//! merge is kept in memory only, for building credentials.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs;
use std::io;
use std::path::Path;

use super::defaults::BuiltinDefaults;
use super::merge::merge_layers;
use super::settings::Settings;

/// Schema version for effective_config
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "propagation-verifier/effective_config@1";

/// Origin of a configuration source
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigOrigin {
    Builtin,
    Host,
    Repo,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigSource {
    /// Origin of this source
    pub origin: ConfigOrigin,

    /// File path (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None for builtin/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// Effective configuration with full provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectiveConfig {
    /// Schema version
    pub schema_version: u32,

    /// Schema identifier
    pub schema_id: String,

    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// Run ID (set later)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,

    /// The merged configuration, secrets redacted
    pub config: Value,

    /// Contributing sources in precedence order
    pub sources: Vec<ConfigSource>,

    /// Redacted key paths
    pub redactions: Vec<String>,

    /// The merged configuration before redaction
    #[serde(skip)]
    raw: Value,
}

/// Keys that contain secrets and should be redacted
const SECRET_KEYS: &[&str] = &["password", "token", "secret", "api_key", "credential"];

impl EffectiveConfig {
    /// Build effective config from layers. Missing files are skipped.
    pub fn build(
        host_config_path: Option<&Path>,
        repo_config_path: Option<&Path>,
        cli_overrides: Option<Value>,
    ) -> Result<Self, ConfigError> {
        let mut layers = vec![BuiltinDefaults::default().to_value()];
        let mut sources = vec![ConfigSource {
            origin: ConfigOrigin::Builtin,
            path: None,
            digest: None,
        }];

        for (origin, path) in [
            (ConfigOrigin::Host, host_config_path),
            (ConfigOrigin::Repo, repo_config_path),
        ] {
            let Some(path) = path.filter(|p| p.exists()) else {
                continue;
            };
            let (value, digest) = Self::load_toml_file(path)?;
            tracing::debug!(origin = ?origin, path = %path.display(), "loaded config layer");
            layers.push(value);
            sources.push(ConfigSource {
                origin,
                path: Some(path.to_string_lossy().to_string()),
                digest: Some(digest),
            });
        }

        if let Some(cli) = cli_overrides {
            layers.push(cli);
            sources.push(ConfigSource {
                origin: ConfigOrigin::Cli,
                path: None,
                digest: None,
            });
        }

        let raw = merge_layers(layers);
        Settings::from_value(&raw)?.validate()?;

        let mut config = raw.clone();
        let redactions = Self::redact_secrets(&mut config);

        Ok(Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            run_id: None,
            config,
            sources,
            redactions,
            raw,
        })
    }

    /// Typed settings from the unredacted merge
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        Settings::from_value(&self.raw)
    }

    /// Load and parse a TOML file, returning the value and digest
    fn load_toml_file(path: &Path) -> Result<(Value, String), ConfigError> {
        let bytes = fs::read(path).map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes)
            .map_err(|e| ConfigError::ParseError(format!("{}: invalid UTF-8: {}", path.display(), e)))?;

        let toml_value: toml::Value = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Ok((Self::toml_to_json(toml_value), digest))
    }

    /// Convert TOML Value to JSON Value
    fn toml_to_json(toml: toml::Value) -> Value {
        match toml {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Number(i.into()),
            toml::Value::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::String(dt.to_string()),
            toml::Value::Array(arr) => Value::Array(arr.into_iter().map(Self::toml_to_json).collect()),
            toml::Value::Table(table) => Value::Object(
                table
                    .into_iter()
                    .map(|(k, v)| (k, Self::toml_to_json(v)))
                    .collect(),
            ),
        }
    }

    /// Redact secrets in the config, returning list of redacted paths
    fn redact_secrets(value: &mut Value) -> Vec<String> {
        let mut redactions = Vec::new();
        Self::redact_recursive(value, String::new(), &mut redactions);
        redactions
    }

    fn redact_recursive(value: &mut Value, path: String, redactions: &mut Vec<String>) {
        match value {
            Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let current_path = if path.is_empty() {
                        key.clone()
                    } else {
                        format!("{}.{}", path, key)
                    };

                    let is_secret = SECRET_KEYS.iter().any(|s| key_lower.contains(s));
                    if is_secret && !val.is_object() && !val.is_array() && !val.is_null() {
                        *val = Value::String("[REDACTED]".to_string());
                        redactions.push(current_path);
                    } else {
                        Self::redact_recursive(val, current_path, redactions);
                    }
                }
            }
            Value::Array(arr) => {
                for (i, val) in arr.iter_mut().enumerate() {
                    Self::redact_recursive(val, format!("{}[{}]", path, i), redactions);
                }
            }
            _ => {}
        }
    }

    /// Set run context
    pub fn with_run_id(mut self, run_id: String) -> Self {
        self.run_id = Some(run_id);
        self
    }

    /// Serialize to JSON (redacted)
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("JSON serialization failed: {}", e),
            )
        })?;
        fs::write(path, json)
    }

    /// Get a redacted config value by path (dot-separated)
    pub fn get(&self, path: &str) -> Option<&Value> {
        path.split('.').try_fold(&self.config, |current, part| current.get(part))
    }

    pub fn get_u64(&self, path: &str) -> Option<u64> {
        self.get(path).and_then(Value::as_u64)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path).and_then(Value::as_bool)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}
