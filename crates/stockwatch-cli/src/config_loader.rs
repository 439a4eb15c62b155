//! Configuration loading utilities for CLI commands

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use stockwatch_core::config::{CliConfigOverrides, LayeredConfig};

use crate::cli::{Cli, Commands};

/// Config file read when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "stockwatch.toml";

/// Load layered configuration: defaults, file, environment, then flags
pub fn load_config(cli: &Cli) -> Result<LayeredConfig> {
    let mut config = load_base_config(config_file(cli.config.as_deref()).as_deref())?;
    config.update_from_cli(overrides(cli));
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Load defaults, the config file (if any), and the environment
pub fn load_base_config(config_path: Option<&Path>) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();
    if let Some(path) = config_path {
        config = config
            .load_from_file(path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }
    Ok(config.load_from_env())
}

/// The explicit file, or `stockwatch.toml` in the current directory when present
fn config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let local = PathBuf::from(DEFAULT_CONFIG_FILE);
            local.is_file().then_some(local)
        }
    }
}

fn overrides(cli: &Cli) -> CliConfigOverrides {
    let mut overrides = CliConfigOverrides {
        data_dir: cli.data_dir.clone(),
        ..Default::default()
    };

    if let Commands::Worker(args) = &cli.command {
        overrides.confidence_threshold = args.threshold;
        overrides.detector_command = args.detector_command.clone();
        overrides.detector_url = args.detector_url.clone();
    }

    overrides
}
