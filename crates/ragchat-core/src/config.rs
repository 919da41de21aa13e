//! Session tuning configuration.
//!
//! Read from `~/.config/ragchat/config.toml`. Every field has a default, so a
//! missing file or a partial file is valid.

use crate::error::{RagError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Generation model used for answers and suggestions.
    pub model: String,
    /// Interval between upload operation polls.
    pub poll_interval_ms: u64,
    /// Total query attempts, including the first.
    pub max_query_attempts: u32,
    /// Attempt `n` waits `n * retry_base_delay_ms` before the next one.
    pub retry_base_delay_ms: u64,
    /// Number of example questions requested.
    pub suggestion_count: usize,
    /// Prefix of generated store display names.
    pub store_name_prefix: String,
    /// Pause after the final progress step before chatting starts.
    pub ready_pause_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            poll_interval_ms: 3000,
            max_query_attempts: 3,
            retry_base_delay_ms: 1000,
            suggestion_count: 6,
            store_name_prefix: "chat-session".to_string(),
            ready_pause_ms: 500,
        }
    }
}

impl SessionConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    pub fn ready_pause(&self) -> Duration {
        Duration::from_millis(self.ready_pause_ms)
    }

    /// Returns the default config path: ~/.config/ragchat/config.toml
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| RagError::config("Could not determine home directory"))?;
        Ok(home.join(".config").join("ragchat").join("config.toml"))
    }

    /// Loads the config from `path`, falling back to defaults when the file is absent.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the config from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::default_path()?)
    }

    fn validate(&self) -> Result<()> {
        if self.max_query_attempts == 0 {
            return Err(RagError::config("max_query_attempts must be at least 1"));
        }
        if self.model.trim().is_empty() {
            return Err(RagError::config("model must not be empty"));
        }
        Ok(())
    }
}
