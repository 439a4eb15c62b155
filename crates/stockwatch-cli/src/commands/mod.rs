//! Command implementations

mod cleanup;
mod inspect;
mod locate;
mod status;
mod worker;

use crate::cli::{Cli, Commands};
use crate::config_loader::load_config;
use crate::output::OutputWriter;
use anyhow::Result;

/// Execute a CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    let output = OutputWriter::new(cli.json);
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Worker(args) => worker::execute(args, &config, &output).await,
        Commands::Locate(args) => locate::execute(args, &config, &output),
        Commands::Cleanup => cleanup::execute(&config, &output),
        Commands::Status => status::execute(&config, &output),
        Commands::Config => inspect::execute(&config, &output),
    }
}
