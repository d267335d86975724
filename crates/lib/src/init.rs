//! Initialize the configuration directory: create ~/.inbox-companion, a default config, and an empty storage file.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::config;

/// Create the config directory and default files if they do not exist.
/// - Creates the config directory (parent of config file path).
/// - Writes `config.json` with `{}` if missing.
/// - Creates the storage file (resolved from the config) with `{}` if missing.
///
/// Returns the config directory.
pub fn init_config_dir(config_path: &Path) -> Result<PathBuf> {
    let config_dir = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    std::fs::create_dir_all(config_dir)
        .with_context(|| format!("creating config directory {}", config_dir.display()))?;

    if !config_path.exists() {
        std::fs::write(config_path, b"{}")
            .with_context(|| format!("writing default config to {}", config_path.display()))?;
        log::info!("created default config at {}", config_path.display());
    }

    let (config, _) = config::load_config(Some(config_path.to_path_buf()))?;
    let storage = config::resolve_storage_path(&config, config_path);
    if !storage.exists() {
        if let Some(parent) = storage.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating storage directory {}", parent.display()))?;
        }
        std::fs::write(&storage, b"{}")
            .with_context(|| format!("writing empty storage to {}", storage.display()))?;
        log::info!("created storage file at {}", storage.display());
    } else {
        log::debug!("storage file already exists at {}, skipping", storage.display());
    }

    Ok(config_dir.to_path_buf())
}
