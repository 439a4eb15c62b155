use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stockwatch - Shelf stockout detection for store robots
#[derive(Parser, Debug)]
#[command(name = "stockwatch")]
#[command(about = "Shelf stockout detection for store robots", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (TOML)
    #[arg(long, global = true, env = "STOCKWATCH_CONFIG")]
    pub config: Option<PathBuf>,

    /// Data directory holding the inbox, defect images, and map files
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the ingestion worker
    Worker(WorkerArgs),

    /// Find where and in which area an image was captured
    Locate(LocateArgs),

    /// Delete archived images older than the retention period
    Cleanup,

    /// Show pipeline directories and map information
    Status,

    /// Show the resolved configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct WorkerArgs {
    /// Process the inbox once and exit
    #[arg(long)]
    pub once: bool,

    /// Detector command line; the image path and threshold are appended
    #[arg(long)]
    pub detector_command: Option<String>,

    /// Detector HTTP endpoint
    #[arg(long)]
    pub detector_url: Option<String>,

    /// Minimum confidence for a stockout detection
    #[arg(long)]
    pub threshold: Option<f32>,
}

#[derive(Parser, Debug)]
pub struct LocateArgs {
    /// Capture time in epoch seconds, or a defect image name
    pub timestamp: String,
}
