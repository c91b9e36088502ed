//! Game configuration.
//!
//! Supports reading overrides from `~/.config/alibi/config.toml` and a small
//! set of `ALIBI_*` environment variables.

use crate::error::{AlibiError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_MIDDLEWARE_URL: &str = "https://alibi-myn4.onrender.com/interrogate";
pub const DEFAULT_TOTAL_SECONDS: u32 = 15 * 60;
pub const DEFAULT_RESPONSE_SECONDS: u32 = 60;
pub const DEFAULT_NO_ANSWER_SENTINEL: &str = "[No Answer Submitted]";

/// Tunables for one game, shared by every session the process runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Endpoint that accepts the converse payload
    pub middleware_url: String,
    /// Total interrogation budget in seconds
    pub total_seconds: u32,
    /// Budget for each question in seconds
    pub response_seconds: u32,
    /// HTTP request timeout in seconds
    pub request_timeout_secs: u64,
    /// Submit the sentinel answer when the response clock runs out.
    /// When disabled, running out ends the session instead.
    pub auto_submit_on_timeout: bool,
    /// Player text recorded for an auto-submitted answer
    pub no_answer_sentinel: String,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            middleware_url: DEFAULT_MIDDLEWARE_URL.to_string(),
            total_seconds: DEFAULT_TOTAL_SECONDS,
            response_seconds: DEFAULT_RESPONSE_SECONDS,
            request_timeout_secs: 30,
            auto_submit_on_timeout: true,
            no_answer_sentinel: DEFAULT_NO_ANSWER_SENTINEL.to_string(),
            log_level: "warn".to_string(),
        }
    }
}

impl GameConfig {
    /// Loads the configuration from the default location, then applies
    /// environment overrides. A missing file yields the defaults.
    pub fn load() -> Result<Self> {
        let mut config = match default_config_path() {
            Some(path) => Self::load_from(&path)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("No config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|e| {
            AlibiError::config(format!(
                "Failed to read configuration file at {}: {}",
                path.display(),
                e
            ))
        })?;

        let config = toml::from_str(&content).inspect_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "invalid configuration file");
        })?;
        Ok(config)
    }

    /// Applies `ALIBI_*` overrides using the given variable lookup.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("ALIBI_MIDDLEWARE_URL") {
            self.middleware_url = url;
        }
        if let Some(raw) = lookup("ALIBI_TOTAL_SECONDS") {
            self.total_seconds = parse_seconds("ALIBI_TOTAL_SECONDS", &raw)?;
        }
        if let Some(raw) = lookup("ALIBI_RESPONSE_SECONDS") {
            self.response_seconds = parse_seconds("ALIBI_RESPONSE_SECONDS", &raw)?;
        }
        Ok(())
    }

    /// Rejects budgets the clocks cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.total_seconds == 0 || self.response_seconds == 0 {
            return Err(AlibiError::config("clock budgets must be at least one second"));
        }
        if self.middleware_url.trim().is_empty() {
            return Err(AlibiError::config("middleware_url must not be empty"));
        }
        Ok(())
    }

    /// URL of the service health probe, a sibling of the converse endpoint.
    pub fn health_url(&self) -> String {
        let base = self.middleware_url.trim_end_matches('/');
        match base.rfind('/') {
            Some(idx) if idx > base.find("://").map(|i| i + 2).unwrap_or(0) => {
                format!("{}/health", &base[..idx])
            }
            _ => format!("{}/health", base),
        }
    }
}

fn parse_seconds(key: &str, raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|e| AlibiError::config(format!("{key}={raw:?} is not a number of seconds: {e}")))
}

/// Returns the path to the configuration file: ~/.config/alibi/config.toml
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".config").join("alibi").join("config.toml"))
}
