//! # Configuration Loader
//!
//! Reads the TOML config file and maps it onto [`AppConfig`]. Defaults for
//! missing keys belong to `hl_core::config`; this module only loads.

use std::path::{Path, PathBuf};

use anyhow::Context;
use hl_core::config::AppConfig;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "HEALTHY_LIVING_CONFIG";

const APP_DIR_NAME: &str = "healthy-living";
const CONFIG_FILE_NAME: &str = "config.toml";

/// `$HEALTHY_LIVING_CONFIG`, else `<config dir>/healthy-living/config.toml`.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Loads the config at `config_path`.
///
/// No path or a missing file yields defaults. An unreadable or malformed file
/// is an error.
pub fn load_config(config_path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let Some(config_path) = config_path else {
        tracing::info!("no config directory available, using defaults");
        return Ok(AppConfig::default());
    };
    if !config_path.exists() {
        tracing::info!(path = %config_path.display(), "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    let content = std::fs::read_to_string(config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
    let toml_value: toml::Value =
        toml::from_str(&content).context("Failed to parse config as TOML")?;
    let config = AppConfig::from_toml(toml_value)
        .with_context(|| format!("Invalid config file: {}", config_path.display()))?;

    tracing::info!(path = %config_path.display(), "config loaded");
    Ok(config)
}
