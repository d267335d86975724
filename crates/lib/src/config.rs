//! Configuration types and loading.
//!
//! Config is loaded from a JSON file (e.g. `~/.inbox-companion/config.json`) and environment.
//! Missing keys fall back to defaults that match a local email-assistant service on port 8000.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level application config.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Email-assistant service location and endpoint layout.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Where chat session logs are persisted.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Chat feature overrides (e.g. the draft-chat system prompt).
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Backend base URL, endpoint variant, and request timeout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Base URL of the service (default "http://127.0.0.1:8000"). Overridden by INBOX_COMPANION_BACKEND_URL env.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Which chat / Q&A routes the service exposes: "gmail" (default) or "api".
    #[serde(default)]
    pub variant: EndpointVariant,

    /// Per-request timeout in seconds. Unset means requests wait indefinitely.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Route family for the chat and Q&A endpoints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointVariant {
    /// `/gmail/chat` and `/gmail/email-qa` (body field `question`).
    #[default]
    Gmail,

    /// `/api/chat` and `/api/email-qa` (body field `query`).
    Api,
}

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            variant: EndpointVariant::default(),
            timeout_secs: None,
        }
    }
}

impl BackendConfig {
    /// Request timeout, if one is configured and non-zero.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.filter(|s| *s > 0).map(Duration::from_secs)
    }
}

/// Storage file location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    /// Storage file. Relative paths are resolved against the config file's parent. Default: `storage.json` next to the config file.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Chat feature settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatConfig {
    /// Replaces the default system message that seeds a fresh draft chat.
    #[serde(default)]
    pub system_prompt: Option<String>,
}

/// Resolve the backend base URL: env INBOX_COMPANION_BACKEND_URL overrides config. Trailing slashes are trimmed.
pub fn resolve_base_url(config: &Config) -> String {
    std::env::var("INBOX_COMPANION_BACKEND_URL")
        .ok()
        .and_then(|s| {
            let t = s.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .or_else(|| {
            let t = config.backend.base_url.trim();
            if t.is_empty() {
                None
            } else {
                Some(t.to_string())
            }
        })
        .unwrap_or_else(default_base_url)
        .trim_end_matches('/')
        .to_string()
}

/// Draft-chat system prompt from config, ignoring blank values.
pub fn resolve_system_prompt(config: &Config) -> Option<String> {
    config
        .chat
        .system_prompt
        .as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Resolve config path from env or default.
pub fn default_config_path() -> PathBuf {
    std::env::var("INBOX_COMPANION_CONFIG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            dirs::home_dir()
                .map(|h| h.join(".inbox-companion").join("config.json"))
                .unwrap_or_else(|| PathBuf::from("config.json"))
        })
}

/// Load config from the given path, or the default path (or INBOX_COMPANION_CONFIG_PATH). Missing file => default config.
/// Returns the config and the path that was used (for resolving the storage file).
pub fn load_config(path: Option<PathBuf>) -> Result<(Config, PathBuf)> {
    let path = path.unwrap_or_else(default_config_path);
    let config = if !path.exists() {
        log::debug!("config file not found, using defaults: {}", path.display());
        Config::default()
    } else {
        let s = std::fs::read_to_string(&path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        serde_json::from_str(&s)
            .with_context(|| format!("parsing config from {}", path.display()))?
    };
    Ok((config, path))
}

fn config_parent(config_path: &Path) -> &Path {
    config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// Resolve the storage file: `storage.path` if set (relative paths resolved against the config file's parent), otherwise `storage.json` next to the config file.
pub fn resolve_storage_path(config: &Config, config_path: &Path) -> PathBuf {
    let parent = config_parent(config_path);
    match &config.storage.path {
        Some(p) if !p.as_os_str().is_empty() => {
            if p.is_absolute() {
                p.clone()
            } else {
                parent.join(p)
            }
        }
        _ => parent.join("storage.json"),
    }
}
