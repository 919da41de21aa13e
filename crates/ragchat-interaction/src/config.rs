//! Credential configuration for the remote service.
//!
//! Supports reading secrets from `~/.config/ragchat/secret.json`, with the
//! `GEMINI_API_KEY` environment variable taking precedence.

use ragchat_core::{RagError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Root configuration structure for secret.json
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SecretConfig {
    #[serde(default)]
    pub gemini: Option<GeminiConfig>,
}

/// Gemini API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub api_key: String,
    #[serde(default)]
    pub model_name: Option<String>,
}

/// Loads the secret configuration file from `path`.
///
/// A missing file is an empty configuration, not an error.
pub fn load_secret_config_from(path: &Path) -> Result<SecretConfig> {
    if !path.exists() {
        return Ok(SecretConfig::default());
    }

    let content = fs::read_to_string(path).map_err(|e| {
        RagError::config(format!(
            "Failed to read configuration file at {}: {}",
            path.display(),
            e
        ))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        RagError::config(format!(
            "Failed to parse configuration file at {}: {}",
            path.display(),
            e
        ))
    })
}

/// Loads the secret configuration file from ~/.config/ragchat/secret.json
pub fn load_secret_config() -> Result<SecretConfig> {
    load_secret_config_from(&get_config_path()?)
}

/// Resolves the Gemini credentials: environment first, then `config`.
///
/// Fails with a credential error when no non-empty key is available.
pub fn resolve_gemini_config(
    config: SecretConfig,
    env_key: Option<String>,
) -> Result<GeminiConfig> {
    let file_config = config.gemini;
    let model_name = file_config.as_ref().and_then(|c| c.model_name.clone());

    if let Some(api_key) = env_key.filter(|key| !key.trim().is_empty()) {
        return Ok(GeminiConfig {
            api_key,
            model_name,
        });
    }

    file_config
        .filter(|c| !c.api_key.trim().is_empty())
        .ok_or_else(|| {
            RagError::credential(format!(
                "API key not found. Set {API_KEY_ENV} or add it to secret.json"
            ))
        })
}

/// Returns the path to the configuration file: ~/.config/ragchat/secret.json
fn get_config_path() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| RagError::config("Could not determine home directory"))?;
    Ok(home.join(".config").join("ragchat").join("secret.json"))
}
