//! Configuration management for the farm gateway

pub mod file;

use std::path::{Path, PathBuf};
use std::time::Duration;

use self::file::FarmConfigFile;
use crate::dispatch::DispatchConfig;
use crate::farm::{DeviceRecord, Farm};
use crate::{Error, Result};

/// Default API server port
pub const DEFAULT_PORT: u16 = 5000;

/// Default printer control API port
pub const DEFAULT_PRINTER_PORT: u16 = 80;

/// Farm gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP API server configuration
    pub server: ServerConfig,

    /// Data and script locations
    pub paths: PathsConfig,

    /// Fan-out tuning
    pub dispatch: DispatchConfig,

    /// Interval between state broadcasts
    pub broadcast_interval: Duration,

    /// Configured printers
    pub printers: Vec<DeviceRecord>,
}

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,

    /// Bearer token for `/api/*` (from `PRINTFARM_API_KEY` env)
    pub api_key: Option<String>,
}

/// File locations
#[derive(Debug, Clone)]
pub struct PathsConfig {
    /// Printer state snapshot written by the poller
    pub state_file: PathBuf,

    /// Active-flag store cleared by `finish`
    pub active_file: PathBuf,

    /// Directory where uploaded files are kept
    pub upload_dir: PathBuf,

    /// Script run after a farm-wide shutdown
    pub shutdown_script: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from("data/printer-state.json"),
            active_file: PathBuf::from("data/fake-state.json"),
            upload_dir: PathBuf::from("data"),
            shutdown_script: PathBuf::from("shutdown.sh"),
        }
    }
}

impl Config {
    /// Load configuration from an explicit file, or the standard path
    ///
    /// # Errors
    ///
    /// Returns error if an explicit file cannot be loaded or the result is invalid
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(path) => file::load_config_file_from(path)?,
            None => file::load_config_file(),
        };
        Self::from_file(file)
    }

    /// Build configuration from a parsed file, defaults and environment
    ///
    /// Env overrides: `PRINTFARM_PORT`, `PRINTFARM_API_KEY`.
    ///
    /// # Errors
    ///
    /// Returns error if the configuration is invalid
    pub fn from_file(file: FarmConfigFile) -> Result<Self> {
        let port = std::env::var("PRINTFARM_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .or(file.server.port)
            .unwrap_or(DEFAULT_PORT);

        let api_key = std::env::var("PRINTFARM_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .or(file.server.api_key);

        let defaults = PathsConfig::default();
        let paths = PathsConfig {
            state_file: file.paths.state_file.map_or(defaults.state_file, PathBuf::from),
            active_file: file.paths.active_file.map_or(defaults.active_file, PathBuf::from),
            upload_dir: file.paths.upload_dir.map_or(defaults.upload_dir, PathBuf::from),
            shutdown_script: file
                .paths
                .shutdown_script
                .map_or(defaults.shutdown_script, PathBuf::from),
        };

        let dispatch_defaults = DispatchConfig::default();
        let dispatch = DispatchConfig {
            request_timeout: file
                .dispatch
                .request_timeout_ms
                .map_or(dispatch_defaults.request_timeout, Duration::from_millis),
            max_concurrency: file
                .dispatch
                .max_concurrency
                .unwrap_or(dispatch_defaults.max_concurrency),
        };
        if dispatch.max_concurrency == 0 {
            return Err(Error::Config("dispatch.max_concurrency must be at least 1".to_string()));
        }

        let broadcast_interval = file
            .broadcast
            .interval_ms
            .map_or(crate::broadcast::DEFAULT_INTERVAL, Duration::from_millis);
        if broadcast_interval.is_zero() {
            return Err(Error::Config("broadcast.interval_ms must be positive".to_string()));
        }

        let mut printers = Vec::with_capacity(file.printers.len());
        for (id, printer) in file.printers {
            if printer.address.trim().is_empty() {
                return Err(Error::Config(format!("printer '{id}' has no address")));
            }
            printers.push(DeviceRecord {
                id,
                address: printer.address,
                port: printer.port.unwrap_or(DEFAULT_PRINTER_PORT),
                api_key: printer.api_key,
            });
        }

        Ok(Self {
            server: ServerConfig { port, api_key },
            paths,
            dispatch,
            broadcast_interval,
            printers,
        })
    }

    /// Farm registry built from the configured printers
    #[must_use]
    pub fn farm(&self) -> Farm {
        Farm::new(self.printers.iter().cloned())
    }
}
