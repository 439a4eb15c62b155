//! Error types for stockwatch

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StockwatchError {
    // Startup errors
    #[error("Failed to prepare directory {path}: {source}")]
    DirectoryUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // Detector errors
    #[error("Detector unavailable: {reason}. Try: {remediation}")]
    DetectorUnavailable { reason: String, remediation: String },

    #[error("Detector failed on {image}: {reason}")]
    DetectorFailed { image: String, reason: String },

    // Forwarding errors
    #[error("Failed to forward {file}: {reason}")]
    ForwardFailed { file: String, reason: String },

    // Map errors
    #[error("Invalid map metadata in {path}: {reason}")]
    MapMetadata { path: PathBuf, reason: String },

    #[error("Unsupported map image {path}: {reason}")]
    MapImage { path: PathBuf, reason: String },

    // Naming errors
    #[error("No capture timestamp in file name: {name}")]
    InvalidFilename { name: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StockwatchError {
    fn from(err: serde_json::Error) -> Self {
        StockwatchError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StockwatchError>;
