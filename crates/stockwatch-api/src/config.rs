use std::path::PathBuf;
use std::time::Duration;

use stockwatch_core::config::{DataPaths, LayeredConfig};
use stockwatch_core::error::Result;

/// Environment variable naming the optional TOML config file
pub const CONFIG_PATH_ENV: &str = "STOCKWATCH_CONFIG";

/// Environment variable for the dashboard origin allowed by CORS
pub const CORS_ORIGIN_ENV: &str = "STOCKWATCH_CORS_ORIGIN";

/// API server configuration, resolved from the layered stockwatch config
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub cors_origin: Option<String>,
    pub data_dir: PathBuf,
    pub paths: DataPaths,
    pub ingest_token: Option<String>,
    pub monitor_interval: Duration,
    pub notification_capacity: usize,
    pub processed_capacity: usize,
    pub tolerance_secs: f64,
}

impl ApiConfig {
    /// Defaults, then the file named by `STOCKWATCH_CONFIG`, then environment
    pub fn load() -> Result<Self> {
        let mut layered = LayeredConfig::with_defaults();
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            layered = layered.load_from_file(path)?;
        }
        let layered = layered.load_from_env();
        layered.validate()?;

        Ok(Self::from_layered(&layered))
    }

    pub fn from_layered(config: &LayeredConfig) -> Self {
        Self {
            port: config.port.value,
            cors_origin: std::env::var(CORS_ORIGIN_ENV).ok(),
            data_dir: config.data_dir.value.clone(),
            paths: config.paths(),
            ingest_token: config.ingest_token.value.clone(),
            monitor_interval: config.monitor_interval(),
            notification_capacity: config.notification_capacity.value,
            processed_capacity: config.processed_capacity.value,
            tolerance_secs: config.tolerance_secs.value,
        }
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Whether the token-guarded ingest endpoints accept uploads
    pub fn ingest_enabled(&self) -> bool {
        self.ingest_token.is_some()
    }
}
