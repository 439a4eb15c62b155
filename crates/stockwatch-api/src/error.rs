use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use stockwatch_core::error::StockwatchError;

/// Unified API error type
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<String>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = %self.status,
                error = %self.message,
                details = self.details.as_deref().unwrap_or(""),
                "Request failed"
            );
        }

        let body = ErrorBody {
            error: self.message,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<StockwatchError> for ApiError {
    fn from(err: StockwatchError) -> Self {
        match &err {
            StockwatchError::InvalidFilename { .. } => {
                Self::bad_request("Invalid file name").with_details(err.to_string())
            }
            StockwatchError::MapMetadata { .. } | StockwatchError::MapImage { .. } => {
                Self::bad_request("Unusable map file").with_details(err.to_string())
            }
            StockwatchError::Serialization(_) => {
                Self::bad_request("Malformed payload").with_details(err.to_string())
            }
            _ => Self::internal("Internal error").with_details(err.to_string()),
        }
    }
}

impl From<std::io::Error> for ApiError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            return Self::not_found("File not found");
        }
        Self::internal("Storage error").with_details(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stockwatch_error_mapping() {
        let err: ApiError = StockwatchError::InvalidFilename { name: "../x".to_string() }.into();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let err: ApiError = StockwatchError::ConfigInvalid {
            key: "port".to_string(),
            reason: "not a TCP port".to_string(),
        }.into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_io_not_found_is_404() {
        let err: ApiError = std::io::Error::from(std::io::ErrorKind::NotFound).into();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
