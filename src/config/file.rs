//! TOML configuration file loading
//!
//! Default location is `~/.config/printfarm/config.toml`.
//! All fields are optional — the file is a partial overlay on top of defaults.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct FarmConfigFile {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerFileConfig,

    /// Data and script locations
    #[serde(default)]
    pub paths: PathsFileConfig,

    /// Fan-out tuning
    #[serde(default)]
    pub dispatch: DispatchFileConfig,

    /// State broadcast tuning
    #[serde(default)]
    pub broadcast: BroadcastFileConfig,

    /// Printers keyed by id
    #[serde(default)]
    pub printers: BTreeMap<String, PrinterFileConfig>,
}

/// Server/runtime configuration
#[derive(Debug, Default, Deserialize)]
pub struct ServerFileConfig {
    /// API server port
    pub port: Option<u16>,

    /// Bearer token required on `/api/*`
    pub api_key: Option<String>,
}

/// File locations
#[derive(Debug, Default, Deserialize)]
pub struct PathsFileConfig {
    pub state_file: Option<String>,
    pub active_file: Option<String>,
    pub upload_dir: Option<String>,
    pub shutdown_script: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DispatchFileConfig {
    pub request_timeout_ms: Option<u64>,
    pub max_concurrency: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BroadcastFileConfig {
    pub interval_ms: Option<u64>,
}

/// One printer's connection settings
#[derive(Debug, Deserialize)]
pub struct PrinterFileConfig {
    pub address: String,
    pub port: Option<u16>,
    pub api_key: String,
}

/// Parse a config file from TOML text
///
/// # Errors
///
/// Returns error if the text is not valid TOML for this schema
pub fn parse_config_file(content: &str) -> Result<FarmConfigFile> {
    Ok(toml::from_str(content)?)
}

/// Load a config file from an explicit path
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load_config_file_from(path: &Path) -> Result<FarmConfigFile> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config_file(&content)?;
    tracing::info!(path = %path.display(), printers = config.printers.len(), "loaded config file");
    Ok(config)
}

/// Load the TOML config file from the standard path
///
/// Returns `FarmConfigFile::default()` if the file doesn't exist or can't be parsed.
pub fn load_config_file() -> FarmConfigFile {
    let Some(path) = config_file_path() else {
        return FarmConfigFile::default();
    };

    if !path.exists() {
        return FarmConfigFile::default();
    }

    match load_config_file_from(&path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "failed to load config file, using defaults"
            );
            FarmConfigFile::default()
        }
    }
}

/// Return the config file path: `~/.config/printfarm/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.config_dir().join("printfarm").join("config.toml"))
}
