use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse, Json};

use super::files::{blocking, read_file};
use crate::dto::MapInfoResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Map values in effect, reloading first if the map files changed
pub async fn get_map_info(
    State(state): State<Arc<AppState>>,
) -> Result<Json<MapInfoResponse>, ApiError> {
    let converter = Arc::clone(&state.converter);
    let (config, has_image) = blocking(move || {
        converter.reload_if_needed();
        (converter.current(), converter.image_path().exists())
    })
    .await?;
    Ok(Json(MapInfoResponse::new(&config, has_image)))
}

pub async fn get_map_image(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ApiError> {
    let path = state.converter.image_path();
    let bytes = read_file(path, "Map image").await?;
    Ok(([(header::CONTENT_TYPE, map_content_type(&bytes))], bytes))
}

fn map_content_type(bytes: &[u8]) -> &'static str {
    if bytes.starts_with(b"\x89PNG") {
        "image/png"
    } else if bytes.starts_with(b"P5") || bytes.starts_with(b"P2") {
        "image/x-portable-graymap"
    } else {
        "application/octet-stream"
    }
}
