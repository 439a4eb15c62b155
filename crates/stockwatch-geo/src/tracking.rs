//! Capture-time to robot-position lookup over the tracking log.
//!
//! The log is an append-only `time,x,y` CSV (no header) written by the robot's
//! localization stack. It is scanned in full on every query; rows are not
//! assumed to be sorted.

use std::fs;
use std::path::{Path, PathBuf};

use stockwatch_core::models::{TrackingRecord, WorldPoint};

pub const DEFAULT_TOLERANCE_SECS: f64 = 5.0;

#[derive(Debug, Clone)]
pub struct TrackingLog {
    path: PathBuf,
    tolerance_secs: f64,
}

impl TrackingLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), tolerance_secs: DEFAULT_TOLERANCE_SECS }
    }

    pub fn with_tolerance(mut self, tolerance_secs: f64) -> Self {
        self.tolerance_secs = tolerance_secs;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn tolerance_secs(&self) -> f64 {
        self.tolerance_secs
    }

    /// Parsed rows in file order. Malformed rows are skipped; an unreadable
    /// file yields no rows.
    pub fn records(&self) -> Vec<TrackingRecord> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(path = %self.path.display(), error = %e, "Tracking log unavailable");
                return Vec::new();
            }
        };

        String::from_utf8_lossy(&bytes).lines().filter_map(TrackingRecord::parse_line).collect()
    }

    /// Position recorded closest in time to `timestamp`, if within tolerance
    pub fn locate(&self, timestamp: f64) -> Option<WorldPoint> {
        nearest(&self.records(), timestamp, self.tolerance_secs).map(|r| r.position())
    }
}

/// Row with the smallest `|row.timestamp - target|`. The first such row in
/// scan order wins ties. `None` if there are no rows or the best gap exceeds
/// `tolerance_secs`.
pub fn nearest(records: &[TrackingRecord], target: f64, tolerance_secs: f64) -> Option<TrackingRecord> {
    let mut best: Option<(f64, TrackingRecord)> = None;

    for record in records {
        let diff = (record.timestamp - target).abs();
        match best {
            Some((best_diff, _)) if diff >= best_diff => {}
            _ => best = Some((diff, *record)),
        }
    }

    best.filter(|(diff, _)| *diff <= tolerance_secs).map(|(_, record)| record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn log_with(content: &str) -> (TempDir, TrackingLog) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracking.csv");
        fs::write(&path, content).unwrap();
        (dir, TrackingLog::new(path))
    }

    #[test]
    fn test_nearest_within_tolerance() {
        let (_dir, log) = log_with("100.0,1,1\n105.0,2,2\n200.0,9,9\n");
        assert_eq!(log.locate(102.0), Some(WorldPoint::new(1.0, 1.0)));
        assert_eq!(log.locate(104.0), Some(WorldPoint::new(2.0, 2.0)));
    }

    #[test]
    fn test_outside_tolerance() {
        let (_dir, log) = log_with("100.0,1,1\n105.0,2,2\n200.0,9,9\n");
        assert_eq!(log.locate(150.0), None);
    }

    #[test]
    fn test_tolerance_boundary_is_inclusive() {
        let (_dir, log) = log_with("100.0,1,1\n");
        assert_eq!(log.locate(105.0), Some(WorldPoint::new(1.0, 1.0)));
        assert_eq!(log.locate(105.001), None);
    }

    #[test]
    fn test_first_row_wins_ties() {
        let (_dir, log) = log_with("110.0,3,3\n100.0,1,1\n");
        assert_eq!(log.locate(105.0), Some(WorldPoint::new(3.0, 3.0)));
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let (_dir, log) = log_with("time,x,y\n101.0,oops,1\n101.5\n\n103.0,4,5\n");
        assert_eq!(log.records().len(), 1);
        assert_eq!(log.locate(101.0), Some(WorldPoint::new(4.0, 5.0)));
    }

    #[test]
    fn test_missing_or_empty_log() {
        let dir = TempDir::new().unwrap();
        let log = TrackingLog::new(dir.path().join("absent.csv"));
        assert_eq!(log.locate(100.0), None);

        let (_dir, empty) = log_with("");
        assert_eq!(empty.locate(100.0), None);
    }

    #[test]
    fn test_custom_tolerance() {
        let (_dir, log) = log_with("100.0,1,1\n");
        let log = log.with_tolerance(60.0);
        assert_eq!(log.locate(150.0), Some(WorldPoint::new(1.0, 1.0)));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_nearest_has_minimal_gap(
                times in proptest::collection::vec(0.0f64..1000.0, 0..40),
                target in 0.0f64..1000.0,
                tolerance in 0.0f64..50.0,
            ) {
                let records: Vec<TrackingRecord> = times
                    .iter()
                    .map(|&timestamp| TrackingRecord { timestamp, x: timestamp, y: 0.0 })
                    .collect();
                let best_gap = times
                    .iter()
                    .map(|t| (t - target).abs())
                    .fold(f64::INFINITY, f64::min);

                match nearest(&records, target, tolerance) {
                    Some(found) => {
                        let gap = (found.timestamp - target).abs();
                        prop_assert_eq!(gap, best_gap);
                        prop_assert!(gap <= tolerance);
                    }
                    None => prop_assert!(best_gap > tolerance),
                }
            }
        }
    }
}
