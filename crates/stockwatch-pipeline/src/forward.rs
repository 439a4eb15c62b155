//! Remote forwarding of confirmed defect images

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use stockwatch_core::error::{Result, StockwatchError};
use stockwatch_core::ports::DefectForwarder;

/// Header carrying the shared ingest secret
pub const INGEST_TOKEN_HEADER: &str = "X-Ingest-Token";

/// Uploads defect images to another stockwatch instance's ingest endpoint
pub struct HttpForwarder {
    /// Full URL of the image ingest endpoint
    endpoint: String,

    token: String,

    client: reqwest::Client,
}

impl HttpForwarder {
    /// Create a forwarder targeting `<base_url>/api/ingest/image`
    pub fn new(base_url: &str, token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StockwatchError::ConfigInvalid {
                key: "remote_url".to_string(),
                reason: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            endpoint: ingest_endpoint(base_url),
            token: token.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// `<base>/api/ingest/image`, tolerating a trailing slash on the base
pub fn ingest_endpoint(base_url: &str) -> String {
    format!("{}/api/ingest/image", base_url.trim_end_matches('/'))
}

#[async_trait]
impl DefectForwarder for HttpForwarder {
    async fn forward(&self, image: &Path) -> Result<()> {
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let failed = |reason: String| StockwatchError::ForwardFailed {
            file: file_name.clone(),
            reason,
        };

        let bytes = tokio::fs::read(image).await?;
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str("image/jpeg")
            .map_err(|e| failed(e.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(&self.endpoint)
            .header(INGEST_TOKEN_HEADER, &self.token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if status.as_u16() >= 300 {
            return Err(failed(format!("remote answered {}", status)));
        }

        Ok(())
    }
}
