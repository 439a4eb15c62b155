//! Geolocation monitor
//!
//! Polls the defect directory and turns each defect image it has not seen yet
//! into a notification: capture time from the file name, robot position from
//! the tracking log, pixel position from the map, area from the area file.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use stockwatch_core::fs::list_files;
use stockwatch_core::models::{epoch_seconds_to_utc, NotificationEvent};
use stockwatch_core::naming::{parse_defect_timestamp, DEFECT_SUFFIX};
use stockwatch_geo::{AreaClassifier, MapConverter, TrackingLog};
use stockwatch_store::{NotificationFeed, ProcessedSet};

/// Counts from one pass over the defect directory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Notifications pushed to the feed
    pub published: usize,

    /// Images with no tracked position within tolerance
    pub unmatched: usize,

    /// Images whose name carries no usable timestamp
    pub skipped: usize,

    /// Processed entries dropped because their file disappeared
    pub forgotten: usize,
}

pub struct GeolocationMonitor {
    defect_dir: PathBuf,
    feed: Arc<dyn NotificationFeed>,
    processed: ProcessedSet,
    converter: Arc<MapConverter>,
    tracking: TrackingLog,
    areas: AreaClassifier,
    interval: Duration,
}

impl GeolocationMonitor {
    pub fn new(
        defect_dir: impl Into<PathBuf>,
        feed: Arc<dyn NotificationFeed>,
        processed: ProcessedSet,
        converter: Arc<MapConverter>,
        tracking: TrackingLog,
        areas: AreaClassifier,
    ) -> Self {
        Self {
            defect_dir: defect_dir.into(),
            feed,
            processed,
            converter,
            tracking,
            areas,
            interval: Duration::from_secs(1),
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn defect_dir(&self) -> &Path {
        &self.defect_dir
    }

    pub fn processed(&self) -> &ProcessedSet {
        &self.processed
    }

    /// One pass over the defect directory.
    ///
    /// The processed set is first reconciled with the directory listing, then
    /// every unseen `.jpg` is handled and marked processed whether or not it
    /// produced a notification.
    pub fn scan_once(&self) -> io::Result<ScanReport> {
        let mut report = ScanReport::default();

        if !self.defect_dir.exists() {
            return Ok(report);
        }

        let names: Vec<String> = list_files(&self.defect_dir)?
            .into_iter()
            .filter(|n| n.ends_with(DEFECT_SUFFIX))
            .collect();

        let present: HashSet<&str> = names.iter().map(String::as_str).collect();
        report.forgotten = self.processed.retain(|id| present.contains(id));

        for name in &names {
            if self.processed.contains(name) {
                continue;
            }

            match self.locate(name) {
                Locate::Event(event) => {
                    tracing::info!(
                        image = %name,
                        area = %event.area,
                        coords = %event.coords_label(),
                        "Stockout notification"
                    );
                    self.feed.push_front(event);
                    report.published += 1;
                }
                Locate::NoPosition => {
                    tracing::debug!(image = %name, "No tracked position within tolerance");
                    report.unmatched += 1;
                }
                Locate::BadName => {
                    tracing::warn!(image = %name, "Defect image name has no capture timestamp, skipping");
                    report.skipped += 1;
                }
            }

            self.processed.insert_keeping(name, |id| present.contains(id));
        }

        Ok(report)
    }

    fn locate(&self, name: &str) -> Locate {
        let Some(seconds) = parse_defect_timestamp(name) else {
            return Locate::BadName;
        };
        let Some(captured_at) = epoch_seconds_to_utc(seconds) else {
            return Locate::BadName;
        };
        let Some(world) = self.tracking.locate(seconds) else {
            return Locate::NoPosition;
        };

        let pixel = self.converter.world_to_pixel(world);
        let area = self.areas.classify(pixel);

        Locate::Event(NotificationEvent::new(captured_at, area, world, pixel, name))
    }

    /// Scan until `token` is cancelled. Each scan runs on the blocking pool;
    /// scan failures are logged and retried on the next tick.
    pub async fn run(self: Arc<Self>, token: CancellationToken) {
        tracing::info!(
            dir = %self.defect_dir.display(),
            interval_ms = self.interval.as_millis() as u64,
            "Geolocation monitor started"
        );

        loop {
            if token.is_cancelled() {
                break;
            }

            let monitor = Arc::clone(&self);
            match tokio::task::spawn_blocking(move || monitor.scan_once()).await {
                Ok(Ok(report)) if report.published > 0 => {
                    tracing::debug!(published = report.published, "Monitor scan finished");
                }
                Ok(Ok(_)) => {}
                Ok(Err(e)) => {
                    tracing::warn!(dir = %self.defect_dir.display(), error = %e, "Monitor scan failed");
                }
                Err(e) => {
                    tracing::error!(error = %e, "Monitor scan task panicked");
                }
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!("Geolocation monitor stopped");
    }
}

enum Locate {
    Event(NotificationEvent),
    NoPosition,
    BadName,
}
