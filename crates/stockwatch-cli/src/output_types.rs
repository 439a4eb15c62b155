use serde::Serialize;
use stockwatch_core::models::{MapConfig, PixelPoint, WorldPoint};
use tabled::Tabled;

/// Output for `worker --once`
#[derive(Debug, Serialize)]
pub struct SweepOutput {
    pub detector: String,
    pub defects: usize,
    pub archived: usize,
    pub failed: usize,
    pub forwarded: usize,
    pub expired: usize,
    pub items: Vec<stockwatch_pipeline::ItemOutcome>,
}

/// Output for the locate command
#[derive(Debug, Serialize)]
pub struct LocateOutput {
    pub timestamp: f64,
    pub world: WorldPoint,
    pub pixel: PixelPoint,
    pub area: String,
}

/// Output for the cleanup command
#[derive(Debug, Serialize)]
pub struct CleanupOutput {
    pub archive_dir: String,
    pub retention_days: u64,
    pub deleted: Vec<String>,
}

/// Output for the status command
#[derive(Debug, Serialize)]
pub struct StatusOutput {
    pub data_dir: String,
    pub directories: Vec<DirectoryRow>,
    pub tracking_records: usize,
    pub areas: Option<usize>,
    pub map: MapConfig,
    pub detector: Option<String>,
    pub forwarding_to: Option<String>,
}

#[derive(Debug, Serialize, Tabled)]
pub struct DirectoryRow {
    #[tabled(rename = "Directory")]
    pub name: String,
    #[tabled(rename = "Path")]
    pub path: String,
    #[tabled(rename = "Files")]
    pub files: usize,
}

#[derive(Debug, Serialize, Tabled)]
pub struct ConfigRow {
    #[tabled(rename = "Key")]
    pub key: String,
    #[tabled(rename = "Value")]
    pub value: String,
    #[tabled(rename = "Source")]
    pub source: String,
}
