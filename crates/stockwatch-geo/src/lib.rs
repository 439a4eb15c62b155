//! Stockwatch Geo - Map frames, store areas, and position lookup
//!
//! This crate turns a capture timestamp into a named store area: it finds the
//! robot's position in the tracking log, converts it from meters to map
//! pixels, and tests it against the configured area rectangles.

pub mod area;
pub mod image;
pub mod metadata;
pub mod tracking;
pub mod transform;

pub use area::AreaClassifier;
pub use tracking::TrackingLog;
pub use transform::MapConverter;
