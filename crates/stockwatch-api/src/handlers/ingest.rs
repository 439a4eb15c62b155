//! Token-guarded uploads from the robot side
//!
//! Every upload is a multipart form with a `file` field and is written through
//! a temporary file and a rename, so the monitor never reads a partial file.

use std::path::Path;
use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    Json,
};

use stockwatch_core::fs::write_atomic;
use stockwatch_core::naming::{
    extract_timestamp, free_defect_name, parse_defect_timestamp, unique_defect_name,
};
use stockwatch_geo::image::image_size_from_header;
use stockwatch_geo::metadata::parse_metadata;

use super::files::{blocking, is_safe_file_name, persist};
use crate::dto::IngestResponse;
use crate::error::ApiError;
use crate::state::AppState;

pub const INGEST_TOKEN_HEADER: &str = "x-ingest-token";

/// Replace the robot tracking log
pub async fn ingest_tracking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>, ApiError> {
    authorize(&state, &headers)?;
    let (_, data) = extract_file(&mut multipart).await?;

    let bytes = data.len();
    persist(state.paths.tracking_log.clone(), data).await?;

    tracing::info!(bytes, "Tracking log updated");
    Ok(Json(IngestResponse::stored("tracking.csv", bytes)))
}

/// Store a defect image forwarded by a remote worker
pub async fn ingest_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>, ApiError> {
    authorize(&state, &headers)?;
    let (file_name, data) = extract_file(&mut multipart).await?;

    let Some(file_name) = file_name.filter(|n| is_safe_file_name(n)) else {
        return Err(ApiError::bad_request("Missing or invalid file name"));
    };

    let bytes = data.len();
    let defect_dir = state.paths.defect_dir.clone();
    let stored = blocking(move || store_defect(&defect_dir, &file_name, &data)).await??;

    let stored_as = match stored {
        StoredDefect::Written(name) => name,
        StoredDefect::Duplicate(name) => {
            tracing::debug!(file = %name, "Identical defect image already stored");
            return Ok(Json(IngestResponse::stored(name, bytes)));
        }
    };

    tracing::info!(file = %stored_as, bytes, "Defect image received");
    Ok(Json(IngestResponse::stored(stored_as, bytes)))
}

/// Replace the map metadata and reload the converter
pub async fn ingest_map_yaml(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>, ApiError> {
    authorize(&state, &headers)?;
    let (_, data) = extract_file(&mut multipart).await?;

    let metadata = parse_metadata(&String::from_utf8_lossy(&data));
    if !metadata.is_usable() {
        return Err(ApiError::bad_request("Map metadata has no usable resolution or origin"));
    }

    let bytes = data.len();
    persist(state.converter.metadata_path().to_path_buf(), data).await?;
    reload_map(&state).await?;

    tracing::info!(bytes, "Map metadata updated");
    Ok(Json(IngestResponse::stored("map.yaml", bytes)))
}

/// Replace the map image and reload the converter
pub async fn ingest_map_image(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<IngestResponse>, ApiError> {
    authorize(&state, &headers)?;
    let (_, data) = extract_file(&mut multipart).await?;

    if image_size_from_header(&data).is_none() {
        return Err(ApiError::bad_request("Map image must be a PNG or PGM file"));
    }

    let bytes = data.len();
    persist(state.converter.image_path().to_path_buf(), data).await?;
    reload_map(&state).await?;

    tracing::info!(bytes, "Map image updated");
    Ok(Json(IngestResponse::stored("map.png", bytes)))
}

enum StoredDefect {
    Written(String),
    /// Same name and same bytes as a file already on disk
    Duplicate(String),
}

/// Write an uploaded defect image without replacing an existing one. Names
/// that are not defect names get one from the naming policy; a defect name
/// that is taken keeps its capture time under a disambiguated name.
fn store_defect(defect_dir: &Path, file_name: &str, data: &[u8]) -> std::io::Result<StoredDefect> {
    let stored_as = match parse_defect_timestamp(file_name) {
        Some(_) => {
            let existing = defect_dir.join(file_name);
            if existing.exists() {
                if std::fs::read(&existing)? == data {
                    return Ok(StoredDefect::Duplicate(file_name.to_string()));
                }
                free_defect_name(&extract_timestamp(file_name), defect_dir)
            } else {
                file_name.to_string()
            }
        }
        None => unique_defect_name(file_name, defect_dir),
    };

    write_atomic(&defect_dir.join(&stored_as), data)?;
    Ok(StoredDefect::Written(stored_as))
}

async fn reload_map(state: &AppState) -> Result<(), ApiError> {
    let converter = Arc::clone(&state.converter);
    blocking(move || converter.force_reload()).await?;
    Ok(())
}

fn authorize(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    let Some(expected) = state.ingest_token.as_deref() else {
        return Err(ApiError::forbidden("Ingest is disabled on this server"));
    };

    let provided = headers
        .get(INGEST_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if !tokens_match(provided.as_bytes(), expected.as_bytes()) {
        tracing::warn!("Rejected ingest request with invalid token");
        return Err(ApiError::unauthorized("Invalid ingest token"));
    }
    Ok(())
}

/// Comparison whose duration does not depend on where the inputs differ
fn tokens_match(provided: &[u8], expected: &[u8]) -> bool {
    if provided.len() != expected.len() {
        return false;
    }
    provided
        .iter()
        .zip(expected)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

async fn extract_file(multipart: &mut Multipart) -> Result<(Option<String>, Vec<u8>), ApiError> {
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::bad_request("Failed to parse multipart form").with_details(e.to_string())
    })? {
        if field.name() == Some("file") {
            let file_name = field.file_name().map(str::to_string);
            let data = field.bytes().await.map_err(|e| {
                ApiError::bad_request("Failed to read file data").with_details(e.to_string())
            })?;
            return Ok((file_name, data.to_vec()));
        }
    }

    Err(ApiError::bad_request("No file provided")
        .with_details("Expected a 'file' field in the multipart form"))
}
