//! Map metadata parser.
//!
//! The metadata file is a flat list of `key: value  # comment` lines, the
//! subset of the ROS `map_server` YAML layout this system needs:
//!
//! ```text
//! file    := line*
//! line    := ws (key ws ':' ws value)? ws comment? NEWLINE
//! comment := '#' any*
//! value   := number | list | scalar
//! list    := '[' ws (number (ws ',' ws number)*)? ws ']'
//! ```
//!
//! Only `resolution`, `origin` and `image` are interpreted; other keys are
//! ignored.

use std::fs;
use std::path::Path;

use stockwatch_core::error::{Result, StockwatchError};
use stockwatch_core::models::MapOrigin;

/// Values recovered from a metadata file. Fields that were absent or
/// malformed stay `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MapMetadata {
    pub resolution: Option<f64>,
    pub origin: Option<MapOrigin>,
    pub image: Option<String>,
}

impl MapMetadata {
    /// Whether the file carried anything the converter can use
    pub fn is_usable(&self) -> bool {
        self.resolution.is_some() || self.origin.is_some()
    }
}

/// Parse metadata text. Malformed lines are skipped.
pub fn parse_metadata(text: &str) -> MapMetadata {
    let mut metadata = MapMetadata::default();

    for (number, raw_line) in text.lines().enumerate() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            tracing::debug!(line = number + 1, "Skipping map metadata line without ':'");
            continue;
        };
        let value = value.trim();

        match key.trim() {
            "resolution" => match parse_number(value) {
                Some(r) if r > 0.0 => metadata.resolution = Some(r),
                _ => tracing::warn!(line = number + 1, value, "Ignoring invalid map resolution"),
            },
            "origin" => match parse_origin(value) {
                Some(origin) => metadata.origin = Some(origin),
                None => tracing::warn!(line = number + 1, value, "Ignoring invalid map origin"),
            },
            "image" => {
                let name = unquote(value);
                if !name.is_empty() {
                    metadata.image = Some(name.to_string());
                }
            }
            _ => {}
        }
    }

    metadata
}

/// Read and parse a metadata file
pub fn read_metadata(path: &Path) -> Result<MapMetadata> {
    let text = fs::read_to_string(path)?;
    let metadata = parse_metadata(&text);

    if !metadata.is_usable() {
        return Err(StockwatchError::MapMetadata {
            path: path.to_path_buf(),
            reason: "no valid resolution or origin".to_string(),
        });
    }

    Ok(metadata)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

fn unquote(value: &str) -> &str {
    let value = value.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = value.strip_prefix(quote).and_then(|v| v.strip_suffix(quote)) {
            return inner;
        }
    }
    value
}

fn parse_number(value: &str) -> Option<f64> {
    unquote(value).trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `[x, y]` or `[x, y, theta]`; a missing theta is 0
fn parse_origin(value: &str) -> Option<MapOrigin> {
    let inner = value.trim().strip_prefix('[')?.strip_suffix(']')?;
    let numbers = inner
        .split(',')
        .map(parse_number)
        .collect::<Option<Vec<f64>>>()?;

    match numbers.as_slice() {
        [x, y] => Some(MapOrigin { x: *x, y: *y, theta: 0.0 }),
        [x, y, theta] => Some(MapOrigin { x: *x, y: *y, theta: *theta }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const ROS_MAP: &str = r#"
image: map.pgm   # exported by map_saver
resolution: 0.050000
origin: [-10.000000, -5.500000, 0.000000]
negate: 0
occupied_thresh: 0.65
free_thresh: 0.196
"#;

    #[test]
    fn test_parse_ros_metadata() {
        let metadata = parse_metadata(ROS_MAP);
        assert_eq!(metadata.resolution, Some(0.05));
        assert_eq!(metadata.origin, Some(MapOrigin { x: -10.0, y: -5.5, theta: 0.0 }));
        assert_eq!(metadata.image.as_deref(), Some("map.pgm"));
    }

    #[test]
    fn test_two_element_origin_defaults_theta() {
        let metadata = parse_metadata("origin: [1.5, 2]\n");
        assert_eq!(metadata.origin, Some(MapOrigin { x: 1.5, y: 2.0, theta: 0.0 }));
    }

    #[test]
    fn test_malformed_values_are_skipped() {
        let metadata = parse_metadata(
            "resolution: fast\norigin: [1, two, 3]\nresolution 0.1\norigin: [1]\n",
        );
        assert_eq!(metadata, MapMetadata::default());
        assert!(!metadata.is_usable());
    }

    #[test]
    fn test_negative_resolution_rejected() {
        assert_eq!(parse_metadata("resolution: -0.05").resolution, None);
        assert_eq!(parse_metadata("resolution: 0").resolution, None);
    }

    #[test]
    fn test_read_metadata_without_usable_fields_fails() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("map.yaml");
        fs::write(&path, "image: map.png\n").unwrap();
        assert!(matches!(read_metadata(&path), Err(StockwatchError::MapMetadata { .. })));
    }
}
