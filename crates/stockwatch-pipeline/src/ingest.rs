//! Ingestion & classification worker
//!
//! Drains the raw-image inbox one sweep at a time. Each image is classified by
//! the detector and moved out of the inbox exactly once: to the defect
//! directory when it shows a stockout, to the archive otherwise, and to the
//! archive under an `error_` name when anything along the way fails.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use stockwatch_core::config::LayeredConfig;
use stockwatch_core::error::Result;
use stockwatch_core::fs::{ensure_dir, has_extension, list_files, move_file};
use stockwatch_core::models::is_stockout;
use stockwatch_core::naming::{
    archive_collision_name, error_archive_name, is_defect_file_name, unique_defect_name,
};
use stockwatch_core::ports::{DefectForwarder, Detector};

use crate::retention::cleanup_archive;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Settings for the ingestion worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub raw_dir: PathBuf,
    pub defect_dir: PathBuf,
    pub archive_dir: PathBuf,
    pub stockout_label: String,
    pub confidence_threshold: f32,
    pub poll_interval: Duration,
    pub cleanup_interval: Duration,
    pub retention: Duration,
}

impl WorkerConfig {
    pub fn from_config(config: &LayeredConfig) -> Self {
        let paths = config.paths();
        Self {
            raw_dir: paths.raw_dir,
            defect_dir: paths.defect_dir,
            archive_dir: paths.archive_dir,
            stockout_label: config.stockout_label.value.clone(),
            confidence_threshold: config.confidence_threshold.value,
            poll_interval: config.poll_interval(),
            cleanup_interval: config.cleanup_interval(),
            retention: config.retention(),
        }
    }
}

/// Where one inbox item ended up
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    Defect { source: String, stored_as: String },
    Archived { source: String, stored_as: String },
    Failed { source: String, stored_as: Option<String>, reason: String },
}

/// Summary of one inbox sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub outcomes: Vec<ItemOutcome>,

    /// Defect images uploaded to the remote during this sweep
    pub forwarded: usize,

    /// Archive files removed by retention during this sweep
    pub expired: usize,
}

impl SweepReport {
    pub fn defects(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Defect { .. }))
    }

    pub fn archived(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Archived { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ItemOutcome::Failed { .. }))
    }

    fn count(&self, predicate: impl Fn(&ItemOutcome) -> bool) -> usize {
        self.outcomes.iter().filter(|o| predicate(o)).count()
    }
}

pub struct IngestionWorker {
    config: WorkerConfig,
    detector: Arc<dyn Detector>,
    forwarder: Option<Arc<dyn DefectForwarder>>,

    /// Defect names already uploaded; reconciled against the defect directory
    forwarded: HashSet<String>,

    last_cleanup: Option<Instant>,
}

impl IngestionWorker {
    pub fn new(config: WorkerConfig, detector: Arc<dyn Detector>) -> Self {
        Self {
            config,
            detector,
            forwarder: None,
            forwarded: HashSet::new(),
            last_cleanup: None,
        }
    }

    /// Enable best-effort upload of every confirmed defect
    pub fn with_forwarder(mut self, forwarder: Arc<dyn DefectForwarder>) -> Self {
        self.forwarder = Some(forwarder);
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Create the inbox, defect, and archive directories
    pub fn prepare(&self) -> Result<()> {
        ensure_dir(&self.config.raw_dir)?;
        ensure_dir(&self.config.defect_dir)?;
        ensure_dir(&self.config.archive_dir)?;
        Ok(())
    }

    /// Process every image currently in the inbox, then forward pending
    /// defects and run retention if it is due.
    pub async fn sweep(&mut self) -> SweepReport {
        let mut report = SweepReport::default();

        let names = match list_files(&self.config.raw_dir) {
            Ok(names) => names,
            Err(e) => {
                tracing::warn!(
                    dir = %self.config.raw_dir.display(),
                    error = %e,
                    "Failed to list raw inbox"
                );
                Vec::new()
            }
        };

        for name in names.into_iter().filter(|n| has_extension(n, IMAGE_EXTENSIONS)) {
            let outcome = self.process_item(&name).await;
            if let ItemOutcome::Defect { stored_as, .. } = &outcome {
                if self.forward_one(stored_as).await {
                    report.forwarded += 1;
                }
            }
            report.outcomes.push(outcome);
        }

        report.forwarded += self.forward_pending().await;
        report.expired = self.cleanup_if_due(Instant::now());

        report
    }

    /// Classify and route a single inbox file. Never leaves the file in the
    /// inbox unless even the error move fails.
    pub async fn process_item(&self, name: &str) -> ItemOutcome {
        let raw_path = self.config.raw_dir.join(name);

        match self.classify_and_route(name, &raw_path).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "Processing failed, moving to error archive");
                let stored_as = self.quarantine(name, &raw_path);
                ItemOutcome::Failed {
                    source: name.to_string(),
                    stored_as,
                    reason: e.to_string(),
                }
            }
        }
    }

    async fn classify_and_route(&self, name: &str, raw_path: &Path) -> Result<ItemOutcome> {
        let detections = self
            .detector
            .detect(raw_path, self.config.confidence_threshold)
            .await?;

        if is_stockout(
            &detections,
            &self.config.stockout_label,
            self.config.confidence_threshold,
        ) {
            let stored_as = unique_defect_name(name, &self.config.defect_dir);
            move_file(raw_path, &self.config.defect_dir.join(&stored_as))?;
            tracing::info!(file = %name, defect = %stored_as, "Stockout detected");
            return Ok(ItemOutcome::Defect {
                source: name.to_string(),
                stored_as,
            });
        }

        let mut stored_as = name.to_string();
        if self.config.archive_dir.join(&stored_as).exists() {
            stored_as = archive_collision_name(name);
        }
        move_file(raw_path, &self.config.archive_dir.join(&stored_as))?;
        tracing::info!(file = %name, archived_as = %stored_as, "Archived");

        Ok(ItemOutcome::Archived {
            source: name.to_string(),
            stored_as,
        })
    }

    fn quarantine(&self, name: &str, raw_path: &Path) -> Option<String> {
        if !raw_path.exists() {
            return None;
        }

        let stored_as = error_archive_name(name);
        match move_file(raw_path, &self.config.archive_dir.join(&stored_as)) {
            Ok(()) => Some(stored_as),
            Err(e) => {
                tracing::error!(file = %name, error = %e, "Failed to move item to error archive");
                None
            }
        }
    }

    async fn forward_one(&mut self, defect_name: &str) -> bool {
        let Some(forwarder) = &self.forwarder else {
            return false;
        };

        match forwarder.forward(&self.config.defect_dir.join(defect_name)).await {
            Ok(()) => {
                tracing::debug!(defect = %defect_name, "Forwarded defect image");
                self.forwarded.insert(defect_name.to_string());
                true
            }
            Err(e) => {
                tracing::warn!(defect = %defect_name, error = %e, "Forwarding failed, will retry");
                false
            }
        }
    }

    /// Upload every defect image not yet forwarded. Returns the number
    /// uploaded in this pass.
    pub async fn forward_pending(&mut self) -> usize {
        if self.forwarder.is_none() {
            return 0;
        }

        let present: Vec<String> = match list_files(&self.config.defect_dir) {
            Ok(names) => names.into_iter().filter(|n| is_defect_file_name(n)).collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list defect directory for forwarding");
                return 0;
            }
        };

        let present_set: HashSet<&str> = present.iter().map(String::as_str).collect();
        self.forwarded.retain(|name| present_set.contains(name.as_str()));

        let mut count = 0;
        for name in present {
            if self.forwarded.contains(&name) {
                continue;
            }
            if self.forward_one(&name).await {
                count += 1;
            }
        }
        count
    }

    /// Run archive retention when the cleanup interval has elapsed since the
    /// last run (or on the first call). Returns the number of deleted files.
    pub fn cleanup_if_due(&mut self, now: Instant) -> usize {
        if let Some(last) = self.last_cleanup {
            if now.duration_since(last) < self.config.cleanup_interval {
                return 0;
            }
        }
        self.last_cleanup = Some(now);

        match cleanup_archive(&self.config.archive_dir, self.config.retention, SystemTime::now()) {
            Ok(deleted) => deleted.len(),
            Err(e) => {
                tracing::warn!(
                    dir = %self.config.archive_dir.display(),
                    error = %e,
                    "Archive cleanup failed"
                );
                0
            }
        }
    }

    pub fn forwarded_count(&self) -> usize {
        self.forwarded.len()
    }

    /// Sweep until `token` is cancelled, sleeping the poll interval between
    /// sweeps. Cancellation interrupts the sleep; a sweep in progress runs to
    /// completion so no item is left half-moved.
    pub async fn run(&mut self, token: CancellationToken) -> Result<()> {
        self.prepare()?;

        tracing::info!(
            inbox = %self.config.raw_dir.display(),
            detector = %self.detector.name(),
            forwarding = self.forwarder.is_some(),
            "Ingestion worker started"
        );

        loop {
            if token.is_cancelled() {
                break;
            }

            let report = self.sweep().await;
            if !report.outcomes.is_empty() {
                tracing::debug!(
                    defects = report.defects(),
                    archived = report.archived(),
                    failed = report.failed(),
                    "Sweep finished"
                );
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.config.poll_interval) => {}
            }
        }

        tracing::info!("Ingestion worker stopped");
        Ok(())
    }
}
