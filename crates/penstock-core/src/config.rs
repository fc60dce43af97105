//! Configuration system for Penstock.
//!
//! Resolution order: environment variables → config file → defaults.
//!
//! Config file location:
//!   1. $PENSTOCK_CONFIG (explicit override)
//!   2. $XDG_CONFIG_HOME/penstock/config.toml
//!   3. ~/.config/penstock/config.toml

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PenstockConfig {
    pub shaping: ShapingConfig,
    /// One rule per protected resource. Resources without a rule are
    /// admitted unthrottled.
    pub rules: Vec<ShapingRule>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapingConfig {
    /// Master switch. When false, every request is admitted untouched.
    pub enabled: bool,
}

/// A uniform-rate shaping rule for one resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapingRule {
    /// Resource the rule binds to.
    pub resource: String,
    /// Permits granted per second. Non-positive = reject everything.
    pub rate_per_second: f64,
    /// Max time a request may be queued before rejection, in milliseconds.
    #[serde(default = "default_max_queueing_ms")]
    pub max_queueing_ms: u64,
}

fn default_max_queueing_ms() -> u64 {
    500
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for PenstockConfig {
    fn default() -> Self {
        Self {
            shaping: ShapingConfig::default(),
            rules: Vec::new(),
        }
    }
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

// ── Path helpers ──────────────────────────────────────────────────────────────

fn config_dir() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| dirs_or_home().join(".config"))
        .join("penstock")
}

fn dirs_or_home() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
    #[error("failed to write {0}: {1}")]
    WriteFailed(PathBuf, std::io::Error),
    #[error("failed to serialize: {0}")]
    SerializeFailed(toml::ser::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl PenstockConfig {
    /// Load config: env vars → file → defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::file_path();
        let mut config = if path.exists() {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadFailed(path.clone(), e))?;
            toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.clone(), e))?
        } else {
            PenstockConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("PENSTOCK_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| config_dir().join("config.toml"))
    }

    /// Write default config if none exists. Returns the path.
    pub fn write_default_if_missing() -> Result<PathBuf, ConfigError> {
        let path = Self::file_path();
        if !path.exists() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
            }
            let text = toml::to_string_pretty(&PenstockConfig::default())
                .map_err(ConfigError::SerializeFailed)?;
            std::fs::write(&path, text)
                .map_err(|e| ConfigError::WriteFailed(path.clone(), e))?;
        }
        Ok(path)
    }

    /// Apply PENSTOCK_* env var overrides.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("PENSTOCK_SHAPING__ENABLED") {
            self.shaping.enabled = v == "true" || v == "1";
        }
    }

    /// Look up the rule for a resource, if any.
    pub fn rule_for(&self, resource: &str) -> Option<&ShapingRule> {
        self.rules.iter().find(|r| r.resource == resource)
    }
}
