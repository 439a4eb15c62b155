//! Status command implementation

use crate::output::OutputWriter;
use crate::output_types::{DirectoryRow, StatusOutput};
use anyhow::Result;
use std::path::Path;
use stockwatch_core::config::LayeredConfig;
use stockwatch_core::fs::list_files;
use stockwatch_geo::{AreaClassifier, MapConverter, TrackingLog};

pub fn execute(config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let paths = config.paths();

    let directories = vec![
        directory_row("inbox", &paths.raw_dir),
        directory_row("defects", &paths.defect_dir),
        directory_row("archive", &paths.archive_dir),
    ];

    let tracking_records = TrackingLog::new(&paths.tracking_log).records().len();
    let areas = AreaClassifier::new(&paths.areas_file).load().map(|a| a.len());

    let converter = MapConverter::new(&paths.map_metadata, &paths.map_image);
    let map_loaded = converter.force_reload();
    let map = *converter.current();

    let detector = configured_detector(config);
    let forwarding_to = config.remote_target().map(|(url, _)| url);

    if output.is_json() {
        return output.result(StatusOutput {
            data_dir: config.data_dir.value.display().to_string(),
            directories,
            tracking_records,
            areas,
            map,
            detector,
            forwarding_to,
        });
    }

    output.section("Pipeline");
    output.kv("Data directory", config.data_dir.value.display());
    output.table(directories);
    output.kv("Tracking records", tracking_records);
    output.kv(
        "Areas",
        areas.map_or_else(|| "not configured".to_string(), |n| n.to_string()),
    );

    output.section("Map");
    if !map_loaded {
        output.warning("No map metadata found, using defaults");
    }
    output.kv("Resolution", format!("{} m/px", map.resolution));
    output.kv(
        "Origin",
        format!("({}, {}, {})", map.origin.x, map.origin.y, map.origin.theta),
    );
    output.kv("Size", format!("{} x {} px", map.width, map.height));

    output.section("Detector");
    output.kv("Detector", detector.as_deref().unwrap_or("not configured"));
    output.kv("Forwarding", forwarding_to.as_deref().unwrap_or("disabled"));

    Ok(())
}

fn directory_row(name: &str, path: &Path) -> DirectoryRow {
    DirectoryRow {
        name: name.to_string(),
        path: path.display().to_string(),
        files: list_files(path).map(|files| files.len()).unwrap_or(0),
    }
}

fn configured_detector(config: &LayeredConfig) -> Option<String> {
    config
        .detector_command
        .value
        .as_ref()
        .map(|command| format!("command: {}", command))
        .or_else(|| config.detector_url.value.as_ref().map(|url| format!("http: {}", url)))
}
