//! Server configuration: CLI/env flags, an optional TOML file, then defaults.

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use telemetry_core::{DEFAULT_CSV_PATH, DEFAULT_PORT};

/// Contents of the optional TOML config file. Every key may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub port: Option<u16>,
    pub csv_path: Option<String>,
}

/// Fully resolved settings the server starts with.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub port: u16,
    pub csv_path: String,
}

impl Settings {
    /// Flags win over the file, the file wins over built-in defaults.
    pub fn resolve(port: Option<u16>, csv_path: Option<String>, file: FileConfig) -> Self {
        Self {
            port: port.or(file.port).unwrap_or(DEFAULT_PORT),
            csv_path: csv_path
                .or(file.csv_path)
                .unwrap_or_else(|| DEFAULT_CSV_PATH.to_string()),
        }
    }
}

/// Load a FileConfig from a TOML file on disk.
pub fn load_config(path: &str) -> anyhow::Result<FileConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config: FileConfig = toml::from_str(&contents)?;
    Ok(config)
}

/// Like `load_config`, but a missing file yields the empty config.
pub fn load_optional(path: &str) -> anyhow::Result<FileConfig> {
    if !Path::new(path).exists() {
        info!(path = %path, "No config file found, using flags and defaults");
        return Ok(FileConfig::default());
    }
    let config = load_config(path)?;
    info!(path = %path, "Loaded configuration from disk");
    Ok(config)
}
