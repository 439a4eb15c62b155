//! Store-area lookup for map pixel positions.

use std::fs;
use std::path::{Path, PathBuf};

use geo::{coord, Intersects, Rect};
use serde_json::Value;
use stockwatch_core::models::{AreaDefinition, AreaMatch, PixelPoint};

/// Classifies pixel positions against the area-definition file.
///
/// The file is re-read on every call so edits made through the dashboard
/// apply to the next classification.
#[derive(Debug, Clone)]
pub struct AreaClassifier {
    path: PathBuf,
}

impl AreaClassifier {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Usable area definitions, in file order. `None` when the file is
    /// missing, unreadable, or not a JSON list.
    pub fn load(&self) -> Option<Vec<AreaDefinition>> {
        let text = fs::read_to_string(&self.path).ok()?;
        let value: Value = match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Area file is not valid JSON");
                return None;
            }
        };
        parse_areas(&value)
    }

    pub fn classify(&self, point: PixelPoint) -> AreaMatch {
        match self.load() {
            Some(areas) => classify_point(&areas, point),
            None => AreaMatch::NoAreasConfigured,
        }
    }
}

/// Decode a JSON list of `{name, x, y, w, h}` objects. Entries that do not
/// decode, or have a negative width or height, are skipped.
pub fn parse_areas(value: &Value) -> Option<Vec<AreaDefinition>> {
    let entries = value.as_array()?;

    let areas = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            match serde_json::from_value::<AreaDefinition>(entry.clone()) {
                Ok(area) if area.w >= 0.0 && area.h >= 0.0 => Some(area),
                Ok(area) => {
                    tracing::warn!(index, name = %area.name, "Skipping area with negative size");
                    None
                }
                Err(e) => {
                    tracing::warn!(index, error = %e, "Skipping malformed area entry");
                    None
                }
            }
        })
        .collect();

    Some(areas)
}

/// Name of the first area whose closed rectangle `[x, x+w] x [y, y+h]`
/// contains the point.
pub fn classify_point(areas: &[AreaDefinition], point: PixelPoint) -> AreaMatch {
    if areas.is_empty() {
        return AreaMatch::NoAreasConfigured;
    }

    let target = coord! { x: point.x, y: point.y };

    areas
        .iter()
        .find(|area| {
            let rect = Rect::new(
                coord! { x: area.x, y: area.y },
                coord! { x: area.x + area.w, y: area.y + area.h },
            );
            rect.intersects(&target)
        })
        .map(|area| AreaMatch::Named(area.name.clone()))
        .unwrap_or(AreaMatch::Unclassified)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn shelf_a() -> Vec<AreaDefinition> {
        vec![AreaDefinition::new("A", 50.0, 50.0, 100.0, 200.0)]
    }

    #[test]
    fn test_point_inside_area() {
        assert_eq!(
            classify_point(&shelf_a(), PixelPoint::new(100.0, 100.0)),
            AreaMatch::Named("A".to_string())
        );
    }

    #[test]
    fn test_point_outside_area() {
        assert_eq!(classify_point(&shelf_a(), PixelPoint::new(10.0, 10.0)), AreaMatch::Unclassified);
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let areas = shelf_a();
        assert!(matches!(classify_point(&areas, PixelPoint::new(50.0, 50.0)), AreaMatch::Named(_)));
        assert!(matches!(classify_point(&areas, PixelPoint::new(150.0, 250.0)), AreaMatch::Named(_)));
        assert_eq!(classify_point(&areas, PixelPoint::new(150.01, 250.0)), AreaMatch::Unclassified);
    }

    #[test]
    fn test_first_match_wins() {
        let areas = vec![
            AreaDefinition::new("Dairy", 0.0, 0.0, 100.0, 100.0),
            AreaDefinition::new("Cheese", 40.0, 40.0, 20.0, 20.0),
        ];
        assert_eq!(
            classify_point(&areas, PixelPoint::new(50.0, 50.0)),
            AreaMatch::Named("Dairy".to_string())
        );
    }

    #[test]
    fn test_empty_list_is_not_configured() {
        assert_eq!(classify_point(&[], PixelPoint::new(0.0, 0.0)), AreaMatch::NoAreasConfigured);
    }

    #[test]
    fn test_malformed_entries_skipped() {
        let value = json!([
            {"name": "Broken", "x": "left", "y": 0, "w": 1, "h": 1},
            {"x": 0, "y": 0, "w": 10, "h": 10},
            {"name": "Mirrored", "x": 100, "y": 0, "w": -50, "h": 10},
            {"name": "Snacks", "x": 0, "y": 0, "w": 10, "h": 10}
        ]);
        let areas = parse_areas(&value).unwrap();
        assert_eq!(areas.len(), 1);
        assert_eq!(areas[0].name, "Snacks");
        assert_eq!(
            classify_point(&areas, PixelPoint::new(75.0, 5.0)),
            AreaMatch::Unclassified
        );
    }

    #[test]
    fn test_non_list_is_absent() {
        assert!(parse_areas(&json!({"name": "A"})).is_none());
    }

    #[test]
    fn test_classifier_reads_file() {
        let dir = TempDir::new().unwrap();
        let classifier = AreaClassifier::new(dir.path().join("areas.json"));

        assert_eq!(classifier.classify(PixelPoint::new(1.0, 1.0)), AreaMatch::NoAreasConfigured);

        fs::write(classifier.path(), "not json").unwrap();
        assert_eq!(classifier.classify(PixelPoint::new(1.0, 1.0)), AreaMatch::NoAreasConfigured);

        fs::write(
            classifier.path(),
            r#"[{"name": "A", "x": 50, "y": 50, "w": 100, "h": 200}]"#,
        )
        .unwrap();
        assert_eq!(
            classifier.classify(PixelPoint::new(100.0, 100.0)),
            AreaMatch::Named("A".to_string())
        );
        assert_eq!(classifier.classify(PixelPoint::new(10.0, 10.0)), AreaMatch::Unclassified);
    }
}
