//! Locate command implementation

use crate::cli::LocateArgs;
use crate::output::OutputWriter;
use crate::output_types::LocateOutput;
use anyhow::Result;
use stockwatch_core::config::LayeredConfig;
use stockwatch_core::error::StockwatchError;
use stockwatch_core::naming::{embedded_timestamp, parse_defect_timestamp};
use stockwatch_geo::{AreaClassifier, MapConverter, TrackingLog};

pub fn execute(args: LocateArgs, config: &LayeredConfig, output: &OutputWriter) -> Result<()> {
    let timestamp = parse_capture_time(&args.timestamp).ok_or_else(|| {
        StockwatchError::InvalidFilename {
            name: args.timestamp.clone(),
        }
    })?;
    let paths = config.paths();

    let tracking = TrackingLog::new(&paths.tracking_log).with_tolerance(config.tolerance_secs.value);
    let Some(world) = tracking.locate(timestamp) else {
        output.warning(format!(
            "No tracked position within {}s of {}",
            tracking.tolerance_secs(),
            timestamp
        ));
        return Ok(());
    };

    let converter = MapConverter::new(&paths.map_metadata, &paths.map_image);
    converter.force_reload();
    let pixel = converter.world_to_pixel(world);
    let area = AreaClassifier::new(&paths.areas_file).classify(pixel);

    if output.is_json() {
        return output.result(LocateOutput {
            timestamp,
            world,
            pixel,
            area: area.label().to_string(),
        });
    }

    output.kv("Area", area.label());
    output.kv("World", format!("({:.2}, {:.2}) m", world.x, world.y));
    output.kv("Pixel", format!("({:.0}, {:.0})", pixel.x, pixel.y));
    Ok(())
}

/// Epoch seconds, a defect image name, or any name with an embedded timestamp
fn parse_capture_time(input: &str) -> Option<f64> {
    input
        .parse::<f64>()
        .ok()
        .filter(|t| t.is_finite())
        .or_else(|| parse_defect_timestamp(input))
        .or_else(|| embedded_timestamp(input)?.parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_capture_time() {
        assert_eq!(parse_capture_time("1707000000.5"), Some(1707000000.5));
        assert_eq!(parse_capture_time("defect_1707000001.jpg"), Some(1707000001.0));
        assert_eq!(parse_capture_time("not-a-time"), None);
        assert_eq!(parse_capture_time("NaN"), None);
    }
}
