use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::Value;

use stockwatch_core::models::AreaDefinition;

use super::files::persist;
use crate::dto::StatusResponse;
use crate::error::ApiError;
use crate::state::AppState;

/// Replace the area definitions drawn on the dashboard map
pub async fn save_areas(
    State(state): State<Arc<AppState>>,
    Json(areas): Json<Vec<AreaDefinition>>,
) -> Result<Json<StatusResponse>, ApiError> {
    if let Some(area) = areas.iter().find(|a| a.w < 0.0 || a.h < 0.0) {
        return Err(ApiError::bad_request("Area size must not be negative")
            .with_details(format!("area '{}'", area.name)));
    }

    let body = serde_json::to_vec_pretty(&areas)
        .map_err(|e| ApiError::internal("Failed to encode areas").with_details(e.to_string()))?;
    persist(state.paths.areas_file.clone(), body).await?;

    tracing::info!(count = areas.len(), "Saved area definitions");
    Ok(Json(StatusResponse::ok()))
}

/// Area definitions as stored, or an empty list when none are saved
pub async fn load_areas(State(state): State<Arc<AppState>>) -> Result<Json<Value>, ApiError> {
    let raw = match tokio::fs::read(&state.paths.areas_file).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Json(Value::Array(Vec::new()))),
        Err(e) => return Err(e.into()),
    };

    let value: Value = serde_json::from_slice(&raw).map_err(|e| {
        ApiError::internal("Stored areas are not valid JSON").with_details(e.to_string())
    })?;
    Ok(Json(value))
}
