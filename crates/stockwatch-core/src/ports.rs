//! Port trait definitions
//!
//! These traits define the collaborators the pipeline talks to without
//! knowing their internals.

use async_trait::async_trait;
use std::path::Path;

use crate::error::Result;
use crate::models::Detection;

/// Port for the image classification model
#[async_trait]
pub trait Detector: Send + Sync {
    /// Run the model on one image
    ///
    /// # Arguments
    /// * `image` - Path of the image to classify
    /// * `threshold` - Minimum confidence the model should report
    ///
    /// # Returns
    /// Every detection the model produced for the image
    async fn detect(&self, image: &Path, threshold: f32) -> Result<Vec<Detection>>;

    /// Human-readable identifier for logs
    fn name(&self) -> &str;
}

/// Port for shipping confirmed defect images to a remote dashboard
#[async_trait]
pub trait DefectForwarder: Send + Sync {
    /// Upload one defect image. Best effort; the caller retries on failure.
    async fn forward(&self, image: &Path) -> Result<()>;
}
