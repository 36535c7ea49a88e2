//! Store configuration loaded from `.scopekv/config.toml`.
//!
//! ```toml
//! root = "/scopekv"
//!
//! [backend]
//! url = "${REDIS_URL}"
//!
//! [retry]
//! initial_delay_ms = 100
//! max_delay_ms = 10000
//! max_attempts = 5
//! multiplier = 2.0
//! ```

use std::path::Path;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::{errors::ConfigError, keys::DEFAULT_ROOT, retry::Backoff};

pub const DEFAULT_CONFIG_PATH: &str = ".scopekv/config.toml";

static ENV_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env reference regex compiles"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_root")]
    pub root: String,
    #[serde(default)]
    pub backend: BackendSettings,
    #[serde(default)]
    pub retry: BackoffConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            backend: BackendSettings::default(),
            retry: BackoffConfig::default(),
        }
    }
}

fn default_root() -> String {
    DEFAULT_ROOT.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendSettings {
    #[serde(default = "default_backend_url")]
    pub url: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
        }
    }
}

fn default_backend_url() -> String {
    "${REDIS_URL}".to_string()
}

/// Serialized form of [`Backoff`], in milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub max_attempts: u32,
    pub multiplier: f64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Backoff::default().into()
    }
}

impl From<Backoff> for BackoffConfig {
    fn from(backoff: Backoff) -> Self {
        Self {
            initial_delay_ms: backoff.initial_delay.as_millis() as u64,
            max_delay_ms: backoff.max_delay.as_millis() as u64,
            max_attempts: backoff.max_attempts,
            multiplier: backoff.multiplier,
        }
    }
}

impl From<&BackoffConfig> for Backoff {
    fn from(config: &BackoffConfig) -> Self {
        Backoff::new(
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.max_attempts,
            config.multiplier,
        )
    }
}

impl StoreConfig {
    /// Parses the file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Loads `path` when it exists, otherwise falls back to defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() { Self::load(path) } else { Ok(Self::default()) }
    }

    /// Backend URL with `${VAR}` references expanded from the environment.
    pub fn backend_url(&self) -> Result<String, ConfigError> {
        expand_env(&self.backend.url)
    }

    pub fn backoff(&self) -> Backoff {
        Backoff::from(&self.retry)
    }
}

/// Replaces every `${VAR}` in `value` with the variable's value.
pub fn expand_env(value: &str) -> Result<String, ConfigError> {
    let mut missing = None;
    let expanded = ENV_REF.replace_all(value, |caps: &Captures<'_>| match std::env::var(&caps[1]) {
        Ok(resolved) => resolved,
        Err(_) => {
            missing.get_or_insert_with(|| caps[1].to_string());
            String::new()
        }
    });

    match missing {
        Some(var) => Err(ConfigError::MissingEnv { var }),
        None => Ok(expanded.into_owned()),
    }
}
