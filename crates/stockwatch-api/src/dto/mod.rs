mod response;

pub use response::{
    HealthResponse, IngestResponse, MapInfoResponse, NotificationItem, StatusResponse,
};
