pub mod area;
pub mod detection;
pub mod geometry;
pub mod notification;
pub mod tracking;

pub use area::{AreaDefinition, AreaMatch};
pub use detection::{is_stockout, Detection};
pub use geometry::{MapConfig, MapOrigin, PixelPoint, WorldPoint};
pub use notification::{epoch_seconds_to_utc, NotificationEvent};
pub use tracking::TrackingRecord;
