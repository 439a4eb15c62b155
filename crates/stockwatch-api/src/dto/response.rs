use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use stockwatch_core::models::{MapConfig, MapOrigin, NotificationEvent, PixelPoint};

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self { status: "ok", service: "stockwatch-api" }
    }
}

/// Plain acknowledgement
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self { status: "ok" }
    }
}

/// One entry of the dashboard notification feed
#[derive(Debug, Serialize)]
pub struct NotificationItem {
    pub id: Uuid,

    /// Capture time, `HH:MM:SS` local
    pub time: String,

    pub area: String,

    /// World position, `(x.x, y.y)`
    pub coords: String,

    /// Defect image name, served from `/api/images/{name}`
    pub img: String,

    pub captured_at: DateTime<Utc>,
    pub pixel: PixelPoint,
}

impl From<&NotificationEvent> for NotificationItem {
    fn from(event: &NotificationEvent) -> Self {
        Self {
            id: event.id,
            time: event.time_label(),
            area: event.area.label().to_string(),
            coords: event.coords_label(),
            img: event.image.clone(),
            captured_at: event.captured_at,
            pixel: event.pixel,
        }
    }
}

/// Map values currently used for pixel conversion
#[derive(Debug, Serialize)]
pub struct MapInfoResponse {
    pub resolution: f64,
    pub origin: MapOrigin,
    pub width: u32,
    pub height: u32,
    pub has_image: bool,
}

impl MapInfoResponse {
    pub fn new(config: &MapConfig, has_image: bool) -> Self {
        Self {
            resolution: config.resolution,
            origin: config.origin,
            width: config.width,
            height: config.height,
            has_image,
        }
    }
}

/// Ingest upload response
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub status: &'static str,
    pub file: String,
    pub bytes: usize,
}

impl IngestResponse {
    pub fn stored(file: impl Into<String>, bytes: usize) -> Self {
        Self {
            status: "ok",
            file: file.into(),
            bytes,
        }
    }
}
