use std::sync::Arc;

use stockwatch_core::config::DataPaths;
use stockwatch_geo::MapConverter;
use stockwatch_store::NotificationFeed;

/// Shared by every handler. The feed and the converter are the same instances
/// the geolocation monitor writes to.
#[derive(Clone)]
pub struct AppState {
    pub paths: DataPaths,
    pub feed: Arc<dyn NotificationFeed>,
    pub converter: Arc<MapConverter>,
    pub ingest_token: Option<String>,
}

impl AppState {
    pub fn new(
        paths: DataPaths,
        feed: Arc<dyn NotificationFeed>,
        converter: Arc<MapConverter>,
        ingest_token: Option<String>,
    ) -> Self {
        Self {
            paths,
            feed,
            converter,
            ingest_token,
        }
    }
}
