//! Cleanup command implementation

use crate::output::OutputWriter;
use crate::output_types::CleanupOutput;
use anyhow::{Context, Result};
use std::time::SystemTime;
use stockwatch_core::config::LayeredConfig;
use stockwatch_pipeline::cleanup_archive;

pub fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let archive_dir = config.paths().archive_dir;

    let deleted = if archive_dir.is_dir() {
        cleanup_archive(&archive_dir, config.retention(), SystemTime::now())
            .with_context(|| format!("Failed to clean {}", archive_dir.display()))?
    } else {
        Vec::new()
    };

    if output.is_json() {
        return output.result(CleanupOutput {
            archive_dir: archive_dir.display().to_string(),
            retention_days: config.retention_days.value,
            deleted,
        });
    }

    if deleted.is_empty() {
        output.info(format!(
            "Nothing older than {} day(s) in {}",
            config.retention_days.value,
            archive_dir.display()
        ));
        return Ok(());
    }

    for name in &deleted {
        println!("  {}", name);
    }
    output.success(format!("Deleted {} archived image(s)", deleted.len()));
    Ok(())
}
