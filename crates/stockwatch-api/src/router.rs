use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Largest accepted ingest upload (map images can be large)
pub const INGEST_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let ingest = Router::new()
        .route("/api/ingest/tracking", post(handlers::ingest_tracking))
        .route("/api/ingest/image", post(handlers::ingest_image))
        .route("/api/ingest/map_yaml", post(handlers::ingest_map_yaml))
        .route("/api/ingest/map_image", post(handlers::ingest_map_image))
        .layer(DefaultBodyLimit::max(INGEST_BODY_LIMIT));

    Router::new()
        // Health
        .route("/health", get(handlers::health_check))

        // Dashboard
        .route("/api/save_areas", post(handlers::save_areas))
        .route("/api/load_areas", get(handlers::load_areas))
        .route("/api/notifications", get(handlers::list_notifications))
        .route("/api/images/{name}", get(handlers::get_defect_image))
        .route("/api/map/info", get(handlers::get_map_info))
        .route("/api/map/image", get(handlers::get_map_image))

        // Remote ingest
        .merge(ingest)

        .with_state(state)
}
