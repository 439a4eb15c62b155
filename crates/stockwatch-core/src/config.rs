use crate::error::{Result, StockwatchError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for stockwatch
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub data_dir: ConfigValue<PathBuf>,
    pub stockout_label: ConfigValue<String>,
    pub confidence_threshold: ConfigValue<f32>,
    pub poll_interval_ms: ConfigValue<u64>,
    pub monitor_interval_ms: ConfigValue<u64>,
    pub cleanup_interval_secs: ConfigValue<u64>,
    pub retention_days: ConfigValue<u64>,
    pub notification_capacity: ConfigValue<usize>,
    pub processed_capacity: ConfigValue<usize>,
    pub tolerance_secs: ConfigValue<f64>,
    pub detector_command: ConfigValue<Option<String>>,
    pub detector_url: ConfigValue<Option<String>>,
    pub detector_timeout_secs: ConfigValue<u64>,
    pub remote_url: ConfigValue<Option<String>>,
    pub ingest_token: ConfigValue<Option<String>>,
    pub upload_timeout_secs: ConfigValue<u64>,
    pub port: ConfigValue<u16>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        let d = ConfigSource::Default;
        Self {
            data_dir: ConfigValue::new(PathBuf::from("./store_data"), d),
            stockout_label: ConfigValue::new("empty".to_string(), d),
            confidence_threshold: ConfigValue::new(0.5, d),
            poll_interval_ms: ConfigValue::new(500, d),
            monitor_interval_ms: ConfigValue::new(1000, d),
            cleanup_interval_secs: ConfigValue::new(60, d),
            retention_days: ConfigValue::new(3, d),
            notification_capacity: ConfigValue::new(200, d),
            processed_capacity: ConfigValue::new(5000, d),
            tolerance_secs: ConfigValue::new(5.0, d),
            detector_command: ConfigValue::new(None, d),
            detector_url: ConfigValue::new(None, d),
            detector_timeout_secs: ConfigValue::new(30, d),
            remote_url: ConfigValue::new(None, d),
            ingest_token: ConfigValue::new(None, d),
            upload_timeout_secs: ConfigValue::new(10, d),
            port: ConfigValue::new(5000, d),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| StockwatchError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| StockwatchError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        let f = ConfigSource::File;
        if let Some(v) = file_config.data_dir {
            self.data_dir.update(v, f);
        }
        if let Some(v) = file_config.stockout_label {
            self.stockout_label.update(v, f);
        }
        if let Some(v) = file_config.confidence_threshold {
            self.confidence_threshold.update(v, f);
        }
        if let Some(v) = file_config.poll_interval_ms {
            self.poll_interval_ms.update(v, f);
        }
        if let Some(v) = file_config.monitor_interval_ms {
            self.monitor_interval_ms.update(v, f);
        }
        if let Some(v) = file_config.cleanup_interval_secs {
            self.cleanup_interval_secs.update(v, f);
        }
        if let Some(v) = file_config.retention_days {
            self.retention_days.update(v, f);
        }
        if let Some(v) = file_config.notification_capacity {
            self.notification_capacity.update(v, f);
        }
        if let Some(v) = file_config.processed_capacity {
            self.processed_capacity.update(v, f);
        }
        if let Some(v) = file_config.tolerance_secs {
            self.tolerance_secs.update(v, f);
        }
        if let Some(v) = file_config.detector_command {
            self.detector_command.update(Some(v), f);
        }
        if let Some(v) = file_config.detector_url {
            self.detector_url.update(Some(v), f);
        }
        if let Some(v) = file_config.detector_timeout_secs {
            self.detector_timeout_secs.update(v, f);
        }
        if let Some(v) = file_config.remote_url {
            self.remote_url.update(Some(v), f);
        }
        if let Some(v) = file_config.ingest_token {
            self.ingest_token.update(Some(v), f);
        }
        if let Some(v) = file_config.upload_timeout_secs {
            self.upload_timeout_secs.update(v, f);
        }
        if let Some(v) = file_config.port {
            self.port.update(v, f);
        }

        self.validate()?;
        Ok(self)
    }

    /// Load configuration from `STOCKWATCH_*` environment variables.
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn load_from_env(mut self) -> Self {
        let e = ConfigSource::Environment;

        if let Ok(dir) = env::var("STOCKWATCH_DATA_DIR") {
            self.data_dir.update(PathBuf::from(dir), e);
        }
        if let Ok(label) = env::var("STOCKWATCH_STOCKOUT_LABEL") {
            self.stockout_label.update(label, e);
        }
        if let Some(v) = env_parse::<f32>("STOCKWATCH_CONFIDENCE_THRESHOLD", "a number in [0, 1]")
            .filter(|v| (0.0..=1.0).contains(v))
        {
            self.confidence_threshold.update(v, e);
        }
        if let Some(v) = env_parse_positive("STOCKWATCH_POLL_INTERVAL_MS") {
            self.poll_interval_ms.update(v, e);
        }
        if let Some(v) = env_parse_positive("STOCKWATCH_MONITOR_INTERVAL_MS") {
            self.monitor_interval_ms.update(v, e);
        }
        if let Some(v) = env_parse_positive("STOCKWATCH_CLEANUP_INTERVAL_SECS") {
            self.cleanup_interval_secs.update(v, e);
        }
        if let Some(v) = env_parse::<u64>("STOCKWATCH_RETENTION_DAYS", "a whole number of days") {
            self.retention_days.update(v, e);
        }
        if let Some(v) = env_parse_positive("STOCKWATCH_NOTIFICATION_CAPACITY") {
            self.notification_capacity.update(v as usize, e);
        }
        if let Some(v) = env_parse_positive("STOCKWATCH_PROCESSED_CAPACITY") {
            self.processed_capacity.update(v as usize, e);
        }
        if let Some(v) = env_parse::<f64>("STOCKWATCH_TOLERANCE_SECS", "a non-negative number")
            .filter(|v| *v >= 0.0)
        {
            self.tolerance_secs.update(v, e);
        }
        if let Some(v) = env_non_empty("STOCKWATCH_DETECTOR_COMMAND") {
            self.detector_command.update(Some(v), e);
        }
        if let Some(v) = env_non_empty("STOCKWATCH_DETECTOR_URL") {
            self.detector_url.update(Some(v), e);
        }
        if let Some(v) = env_parse_positive("STOCKWATCH_DETECTOR_TIMEOUT_SECS") {
            self.detector_timeout_secs.update(v, e);
        }
        if let Some(v) = env_non_empty("STOCKWATCH_REMOTE_URL") {
            self.remote_url.update(Some(v), e);
        }
        if let Some(v) = env_non_empty("STOCKWATCH_INGEST_TOKEN") {
            self.ingest_token.update(Some(v), e);
        }
        if let Some(v) = env_parse_positive("STOCKWATCH_UPLOAD_TIMEOUT_SECS") {
            self.upload_timeout_secs.update(v, e);
        }
        if let Some(v) = env_parse::<u16>("STOCKWATCH_PORT", "a TCP port") {
            self.port.update(v, e);
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        let c = ConfigSource::Cli;
        if let Some(v) = overrides.data_dir {
            self.data_dir.update(v, c);
        }
        if let Some(v) = overrides.confidence_threshold {
            self.confidence_threshold.update(v, c);
        }
        if let Some(v) = overrides.detector_command {
            self.detector_command.update(Some(v), c);
        }
        if let Some(v) = overrides.detector_url {
            self.detector_url.update(Some(v), c);
        }
        if let Some(v) = overrides.port {
            self.port.update(v, c);
        }
    }

    /// Reject values no component can run with
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold.value) {
            return Err(invalid("confidence_threshold", "must be within [0, 1]"));
        }
        for (key, value) in [
            ("poll_interval_ms", self.poll_interval_ms.value),
            ("monitor_interval_ms", self.monitor_interval_ms.value),
            ("cleanup_interval_secs", self.cleanup_interval_secs.value),
            ("detector_timeout_secs", self.detector_timeout_secs.value),
            ("upload_timeout_secs", self.upload_timeout_secs.value),
        ] {
            if value == 0 {
                return Err(invalid(key, "must be greater than zero"));
            }
        }
        if self.notification_capacity.value == 0 {
            return Err(invalid("notification_capacity", "must be greater than zero"));
        }
        if self.processed_capacity.value == 0 {
            return Err(invalid("processed_capacity", "must be greater than zero"));
        }
        if !(self.tolerance_secs.value >= 0.0) {
            return Err(invalid("tolerance_secs", "must be a non-negative number"));
        }
        Ok(())
    }

    /// Filesystem layout rooted at `data_dir`
    pub fn paths(&self) -> DataPaths {
        DataPaths::under(&self.data_dir.value)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.value)
    }

    pub fn monitor_interval(&self) -> Duration {
        Duration::from_millis(self.monitor_interval_ms.value)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs.value)
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_days.value * 24 * 60 * 60)
    }

    /// Remote forwarding target, only when both URL and token are set
    pub fn remote_target(&self) -> Option<(String, String)> {
        match (&self.remote_url.value, &self.ingest_token.value) {
            (Some(url), Some(token)) => Some((url.clone(), token.clone())),
            _ => None,
        }
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        fn put<T: Display>(
            map: &mut HashMap<String, (String, ConfigSource)>,
            key: &str,
            value: &ConfigValue<T>,
        ) {
            map.insert(key.to_string(), (value.value.to_string(), value.source));
        }

        fn put_opt(
            map: &mut HashMap<String, (String, ConfigSource)>,
            key: &str,
            value: &ConfigValue<Option<String>>,
        ) {
            let shown = value.value.clone().unwrap_or_else(|| "(unset)".to_string());
            map.insert(key.to_string(), (shown, value.source));
        }

        map.insert(
            "data_dir".to_string(),
            (self.data_dir.value.display().to_string(), self.data_dir.source),
        );
        put(&mut map, "stockout_label", &self.stockout_label);
        put(&mut map, "confidence_threshold", &self.confidence_threshold);
        put(&mut map, "poll_interval_ms", &self.poll_interval_ms);
        put(&mut map, "monitor_interval_ms", &self.monitor_interval_ms);
        put(&mut map, "cleanup_interval_secs", &self.cleanup_interval_secs);
        put(&mut map, "retention_days", &self.retention_days);
        put(&mut map, "notification_capacity", &self.notification_capacity);
        put(&mut map, "processed_capacity", &self.processed_capacity);
        put(&mut map, "tolerance_secs", &self.tolerance_secs);
        put_opt(&mut map, "detector_command", &self.detector_command);
        put_opt(&mut map, "detector_url", &self.detector_url);
        put(&mut map, "detector_timeout_secs", &self.detector_timeout_secs);
        put_opt(&mut map, "remote_url", &self.remote_url);
        put(&mut map, "upload_timeout_secs", &self.upload_timeout_secs);
        put(&mut map, "port", &self.port);

        let token = if self.ingest_token.value.is_some() { "********" } else { "(unset)" };
        map.insert("ingest_token".to_string(), (token.to_string(), self.ingest_token.source));

        map
    }
}

impl Default for LayeredConfig {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Where each stage reads and writes on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub raw_dir: PathBuf,
    pub defect_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub tracking_log: PathBuf,
    pub areas_file: PathBuf,
    pub map_metadata: PathBuf,
    pub map_image: PathBuf,
}

impl DataPaths {
    pub fn under(data_dir: &Path) -> Self {
        Self {
            raw_dir: data_dir.join("raw_images"),
            defect_dir: data_dir.join("images"),
            archive_dir: data_dir.join("archive"),
            tracking_log: data_dir.join("tracking.csv"),
            areas_file: data_dir.join("areas.json"),
            map_metadata: data_dir.join("map.yaml"),
            map_image: data_dir.join("map.png"),
        }
    }

    /// Create the inbox, defect and archive directories
    pub fn ensure(&self) -> Result<()> {
        crate::fs::ensure_dir(&self.raw_dir)?;
        crate::fs::ensure_dir(&self.defect_dir)?;
        crate::fs::ensure_dir(&self.archive_dir)?;
        Ok(())
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    data_dir: Option<PathBuf>,
    stockout_label: Option<String>,
    confidence_threshold: Option<f32>,
    poll_interval_ms: Option<u64>,
    monitor_interval_ms: Option<u64>,
    cleanup_interval_secs: Option<u64>,
    retention_days: Option<u64>,
    notification_capacity: Option<usize>,
    processed_capacity: Option<usize>,
    tolerance_secs: Option<f64>,
    detector_command: Option<String>,
    detector_url: Option<String>,
    detector_timeout_secs: Option<u64>,
    remote_url: Option<String>,
    ingest_token: Option<String>,
    upload_timeout_secs: Option<u64>,
    port: Option<u16>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub data_dir: Option<PathBuf>,
    pub confidence_threshold: Option<f32>,
    pub detector_command: Option<String>,
    pub detector_url: Option<String>,
    pub port: Option<u16>,
}

fn invalid(key: &str, reason: &str) -> StockwatchError {
    StockwatchError::ConfigInvalid { key: key.to_string(), reason: reason.to_string() }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(key: &str, expected: &str) -> Option<T> {
    let raw = env_non_empty(key)?;
    match raw.trim().parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::warn!("Invalid {} value '{}': expected {}", key, raw, expected);
            None
        }
    }
}

fn env_parse_positive(key: &str) -> Option<u64> {
    env_parse::<u64>(key, "a positive integer").filter(|v| {
        if *v == 0 {
            tracing::warn!("Invalid {} value '0': expected a positive integer", key);
        }
        *v > 0
    })
}
