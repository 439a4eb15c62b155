use std::sync::Arc;

use axum::{extract::State, Json};

use crate::dto::NotificationItem;
use crate::state::AppState;

/// Snapshot of the notification feed, newest first
pub async fn list_notifications(State(state): State<Arc<AppState>>) -> Json<Vec<NotificationItem>> {
    let items = state.feed.snapshot().iter().map(NotificationItem::from).collect();
    Json(items)
}
