//! Console settings.
//!
//! Layered with the `config` crate: built-in defaults, then an optional TOML
//! file, then `MENTIONWATCH_*` environment variables. Command-line flags are
//! applied on top by the binary.
//!
//! ```toml
//! api_url = "https://api.example.com"
//! token = "admin-token"
//! reconnect_interval = "5s"
//! max_reconnect_attempts = 5
//! queue_warning_ratio = 0.10
//! queue_critical_ratio = 0.30
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use thiserror::Error;

use crate::client::ReconnectPolicy;
use crate::data::duration::{parse_duration, DurationParseError};
use crate::data::Thresholds;

pub const ENV_PREFIX: &str = "MENTIONWATCH";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error("{key}: {source}")]
    Duration {
        key: &'static str,
        source: DurationParseError,
    },

    #[error("invalid settings: {0}")]
    Invalid(String),
}

/// Resolved console settings.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// REST base URL; the SSE endpoint hangs off it.
    pub api_url: String,
    /// WebSocket URL. Derived from `api_url` when unset.
    pub ws_url: Option<String>,
    pub token: Option<String>,
    pub reconnect_interval: Duration,
    pub max_reconnect_attempts: u32,
    pub queue_warning_ratio: f64,
    pub queue_critical_ratio: f64,
    pub prefs_path: PathBuf,
    pub log_file: PathBuf,
    pub request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct RawSettings {
    api_url: String,
    #[serde(default)]
    ws_url: Option<String>,
    #[serde(default)]
    token: Option<String>,
    reconnect_interval: String,
    max_reconnect_attempts: u32,
    queue_warning_ratio: f64,
    queue_critical_ratio: f64,
    prefs_path: PathBuf,
    log_file: PathBuf,
    request_timeout: String,
}

impl Default for Settings {
    fn default() -> Self {
        let policy = ReconnectPolicy::default();
        let thresholds = Thresholds::default();
        Self {
            api_url: "http://localhost:3000".to_string(),
            ws_url: None,
            token: None,
            reconnect_interval: policy.interval,
            max_reconnect_attempts: policy.max_attempts,
            queue_warning_ratio: thresholds.failure_warning,
            queue_critical_ratio: thresholds.failure_critical,
            prefs_path: PathBuf::from("mentionwatch-prefs.json"),
            log_file: PathBuf::from("mentionwatch.log"),
            request_timeout: Duration::from_secs(10),
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        Self::load_with_env(path, None)
    }

    /// Like [`Settings::load`], reading variables from `env` instead of the
    /// process environment when given.
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<HashMap<String, String>>,
    ) -> Result<Self, SettingsError> {
        let defaults = Settings::default();
        let mut builder = Config::builder()
            .set_default("api_url", defaults.api_url)?
            .set_default("reconnect_interval", "5s")?
            .set_default("max_reconnect_attempts", i64::from(defaults.max_reconnect_attempts))?
            .set_default("queue_warning_ratio", defaults.queue_warning_ratio)?
            .set_default("queue_critical_ratio", defaults.queue_critical_ratio)?
            .set_default("prefs_path", defaults.prefs_path.to_string_lossy().as_ref())?
            .set_default("log_file", defaults.log_file.to_string_lossy().as_ref())?
            .set_default("request_timeout", "10s")?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }

        let raw: RawSettings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .source(env),
            )
            .build()?
            .try_deserialize()?;

        Self::try_from(raw)
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            failure_warning: self.queue_warning_ratio,
            failure_critical: self.queue_critical_ratio,
        }
    }

    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            interval: self.reconnect_interval,
            max_attempts: self.max_reconnect_attempts,
        }
    }
}

impl TryFrom<RawSettings> for Settings {
    type Error = SettingsError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let duration = |key: &'static str, value: &str| {
            parse_duration(value).map_err(|source| SettingsError::Duration { key, source })
        };

        if !(0.0..=1.0).contains(&raw.queue_warning_ratio)
            || !(0.0..=1.0).contains(&raw.queue_critical_ratio)
        {
            return Err(SettingsError::Invalid(
                "queue ratios must be between 0 and 1".to_string(),
            ));
        }
        if raw.queue_warning_ratio > raw.queue_critical_ratio {
            return Err(SettingsError::Invalid(
                "queue_warning_ratio exceeds queue_critical_ratio".to_string(),
            ));
        }
        if raw.max_reconnect_attempts == 0 {
            return Err(SettingsError::Invalid(
                "max_reconnect_attempts must be at least 1".to_string(),
            ));
        }

        Ok(Settings {
            reconnect_interval: duration("reconnect_interval", &raw.reconnect_interval)?,
            request_timeout: duration("request_timeout", &raw.request_timeout)?,
            api_url: raw.api_url.trim_end_matches('/').to_string(),
            ws_url: raw.ws_url.filter(|u| !u.is_empty()),
            token: raw.token.filter(|t| !t.is_empty()),
            max_reconnect_attempts: raw.max_reconnect_attempts,
            queue_warning_ratio: raw.queue_warning_ratio,
            queue_critical_ratio: raw.queue_critical_ratio,
            prefs_path: raw.prefs_path,
            log_file: raw.log_file,
        })
    }
}
