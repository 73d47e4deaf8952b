//! Locating, reading and parsing the configuration file.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::validation::validate_config;
use super::{Config, RawConfig};
use crate::constants::APP_NAME;

/// `$XDG_CONFIG_HOME/sundial/sundial.toml`.
pub fn default_config_path() -> Result<PathBuf> {
    let config_dir = dirs::config_dir().context("Could not determine config directory")?;
    Ok(config_dir.join(APP_NAME).join(format!("{APP_NAME}.toml")))
}

/// Load the configuration. An explicit path must exist; the default path is
/// populated with a commented default file on first use.
pub fn load(custom_path: Option<&Path>) -> Result<Config> {
    let path = match custom_path {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            path.to_path_buf()
        }
        None => {
            let path = default_config_path()?;
            if !path.exists() {
                super::builder::create_default_config(&path)
                    .context("Failed to create default config during load")?;
            }
            path
        }
    };

    log_debug!("Loading configuration from {}", path.display());
    load_from_path(&path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))
}

/// Load configuration from a specific path without creating it.
pub fn load_from_path(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;
    parse(&content).with_context(|| format!("Invalid configuration in {}", path.display()))
}

/// Parse and validate configuration text.
pub fn parse(content: &str) -> Result<Config> {
    let raw: RawConfig = toml::from_str(content).context("Failed to parse TOML")?;
    Ok(validate_config(&raw)?)
}
