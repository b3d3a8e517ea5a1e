use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::error::ChatError;

/// Where the assistant's completion server listens by default.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Overrides the configured base URL when set.
pub const BASE_URL_ENV: &str = "CAREER_PAL_BASE_URL";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub base_url: Option<String>,
}

fn app_config_dir() -> Result<PathBuf, ChatError> {
    let dir = dirs::config_dir()
        .ok_or_else(|| ChatError::Config("Could not determine config directory".to_string()))?
        .join("career-pal");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

fn config_path() -> Result<PathBuf, ChatError> {
    Ok(app_config_dir()?.join("config.json"))
}

pub fn load_config() -> Result<Config, ChatError> {
    let config_path = config_path()?;

    if !config_path.exists() {
        return Ok(Config::default());
    }

    let content = fs::read_to_string(&config_path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Resolve the server base URL: env var, then config file, then the default.
/// An unreadable config file falls back to the default rather than aborting.
pub fn effective_base_url() -> String {
    if let Ok(url) = std::env::var(BASE_URL_ENV) {
        if !url.trim().is_empty() {
            return url;
        }
    }

    load_config()
        .unwrap_or_default()
        .base_url
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

/// Log file next to the config; the TUI owns the terminal, so diagnostics go
/// to a file instead of stderr.
pub fn log_path() -> Result<PathBuf, ChatError> {
    Ok(app_config_dir()?.join("career-pal.log"))
}
