use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AreaMatch, PixelPoint, WorldPoint};

/// A geolocated stockout, immutable once created
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub id: Uuid,

    /// Capture time decoded from the defect image name
    pub captured_at: DateTime<Utc>,

    pub area: AreaMatch,

    /// Robot position at capture time, meters
    pub world: WorldPoint,

    /// Same position on the map image
    pub pixel: PixelPoint,

    /// File name of the defect image
    pub image: String,
}

impl NotificationEvent {
    pub fn new(
        captured_at: DateTime<Utc>,
        area: AreaMatch,
        world: WorldPoint,
        pixel: PixelPoint,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            captured_at,
            area,
            world,
            pixel,
            image: image.into(),
        }
    }

    /// Capture time as `HH:MM:SS` in the local timezone
    pub fn time_label(&self) -> String {
        self.captured_at.with_timezone(&Local).format("%H:%M:%S").to_string()
    }

    /// World coordinates rendered as `(x.x, y.y)`
    pub fn coords_label(&self) -> String {
        format!("({:.1}, {:.1})", self.world.x, self.world.y)
    }
}

/// Convert fractional epoch seconds to a UTC instant, if representable
pub fn epoch_seconds_to_utc(seconds: f64) -> Option<DateTime<Utc>> {
    if !seconds.is_finite() {
        return None;
    }
    let micros = (seconds * 1_000_000.0).round();
    if micros < i64::MIN as f64 || micros > i64::MAX as f64 {
        return None;
    }
    DateTime::from_timestamp_micros(micros as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_epoch_seconds_to_utc() {
        let at = epoch_seconds_to_utc(1_707_000_000.25).unwrap();
        assert_eq!(at.timestamp(), 1_707_000_000);
        assert_eq!(at.timestamp_subsec_micros(), 250_000);
        assert!(epoch_seconds_to_utc(f64::NAN).is_none());
        assert!(epoch_seconds_to_utc(1e300).is_none());
    }

    #[test]
    fn test_labels() {
        let event = NotificationEvent::new(
            Utc::now(),
            AreaMatch::Named("Dairy".to_string()),
            WorldPoint::new(1.26, -3.04),
            PixelPoint::new(25.2, 60.8),
            "defect_1707000000.000000.jpg",
        );
        assert_eq!(event.coords_label(), "(1.3, -3.0)");
        assert_eq!(event.time_label().len(), 8);
    }
}
