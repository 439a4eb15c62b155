use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use super::files::{is_safe_file_name, read_file};
use crate::error::ApiError;
use crate::state::AppState;

/// Serve a defect image by name
pub async fn get_defect_image(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    if !is_safe_file_name(&name) {
        return Err(ApiError::bad_request("Invalid image name").with_details(name));
    }

    let bytes = read_file(&state.paths.defect_dir.join(&name), "Image").await?;
    Ok(([(header::CONTENT_TYPE, "image/jpeg")], bytes))
}
