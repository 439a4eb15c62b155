mod areas;
mod files;
mod health;
mod images;
mod ingest;
mod map;
mod notifications;

pub use areas::{load_areas, save_areas};
pub use health::health_check;
pub use images::get_defect_image;
pub use ingest::{ingest_image, ingest_map_image, ingest_map_yaml, ingest_tracking, INGEST_TOKEN_HEADER};
pub use map::{get_map_image, get_map_info};
pub use notifications::list_notifications;
