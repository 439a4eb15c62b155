//! Stockwatch Pipeline - Ingestion, classification, and geolocation loops
//!
//! This crate implements the two long-running stages of the pipeline. The
//! ingestion worker drains the raw-image inbox through the detector and routes
//! each image to the defect or archive directory. The geolocation monitor turns
//! every new defect image into a notification. The stages only share the
//! defect directory on disk.

pub mod detector;
pub mod forward;
pub mod ingest;
pub mod monitor;
pub mod retention;

pub use detector::{detector_from_config, CommandDetector, HttpDetector};
pub use forward::HttpForwarder;
pub use ingest::{IngestionWorker, ItemOutcome, SweepReport, WorkerConfig};
pub use monitor::{GeolocationMonitor, ScanReport};
pub use retention::cleanup_archive;
