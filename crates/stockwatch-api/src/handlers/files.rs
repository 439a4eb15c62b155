//! File helpers shared by the handlers

use std::path::{Path, PathBuf};

use crate::error::ApiError;

/// A bare file name: no separators, no parent references, not hidden
pub(crate) fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
        && Path::new(name).file_name().and_then(|n| n.to_str()) == Some(name)
}

/// Atomically replace `path` with `data` without blocking the runtime
pub(crate) async fn persist(path: PathBuf, data: Vec<u8>) -> Result<(), ApiError> {
    blocking(move || stockwatch_core::fs::write_atomic(&path, &data)).await??;
    Ok(())
}

/// Run filesystem work on the blocking pool
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::internal("Filesystem task failed").with_details(e.to_string()))
}

/// Read a file that is expected to exist, mapping absence to 404
pub(crate) async fn read_file(path: &Path, what: &str) -> Result<Vec<u8>, ApiError> {
    tokio::fs::read(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ApiError::not_found(format!("{what} not found"))
        } else {
            ApiError::from(e)
        }
    })
}
