use serde::{Deserialize, Serialize};

use super::WorldPoint;

/// One row of the robot's localization log: `time,x,y`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingRecord {
    /// Seconds since the Unix epoch
    pub timestamp: f64,
    pub x: f64,
    pub y: f64,
}

impl TrackingRecord {
    /// Parse a `time,x,y` line. Extra columns are ignored; short or
    /// non-numeric rows yield `None`.
    pub fn parse_line(line: &str) -> Option<Self> {
        let mut fields = line.split(',').map(str::trim);
        let timestamp = fields.next()?.parse::<f64>().ok()?;
        let x = fields.next()?.parse::<f64>().ok()?;
        let y = fields.next()?.parse::<f64>().ok()?;

        if !(timestamp.is_finite() && x.is_finite() && y.is_finite()) {
            return None;
        }

        Some(Self { timestamp, x, y })
    }

    pub fn position(&self) -> WorldPoint {
        WorldPoint::new(self.x, self.y)
    }
}
