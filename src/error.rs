//! Error types for the farm gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the farm gateway
///
/// Permission denials and per-device transport failures are not errors:
/// the dispatcher reports them as outcomes.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A selected device is not configured
    #[error("unknown device: {0}")]
    UnknownDevice(String),

    /// State snapshot or active-flag store error
    #[error("state store error: {0}")]
    State(String),

    /// Device transport error
    #[error("transport error: {0}")]
    Transport(String),

    /// Shutdown script error
    #[error("script error: {0}")]
    Script(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
