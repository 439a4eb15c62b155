//! World-to-pixel conversion with hot-reloaded map metadata.
//!
//! The converter owns the current [`MapConfig`] as an immutable snapshot.
//! A reload builds a new snapshot and swaps it in; readers keep whatever
//! snapshot they already hold. The check-and-reload step runs under a mutex so
//! concurrent reloads (the monitor loop and an upload handler) never interleave.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::{Mutex, RwLock};
use stockwatch_core::fs::modified_time;
use stockwatch_core::models::{MapConfig, PixelPoint, WorldPoint};

use crate::image::read_image_size;
use crate::metadata::read_metadata;

/// Modification times seen at the last successful parse
#[derive(Debug, Default)]
struct ReloadState {
    metadata_mtime: Option<SystemTime>,
    image_mtime: Option<SystemTime>,
}

#[derive(Debug)]
pub struct MapConverter {
    metadata_path: PathBuf,
    image_path: PathBuf,
    reload: Mutex<ReloadState>,
    current: RwLock<Arc<MapConfig>>,
}

impl MapConverter {
    /// Create a converter with default map values. Nothing is read until the
    /// first reload.
    pub fn new(metadata_path: impl Into<PathBuf>, image_path: impl Into<PathBuf>) -> Self {
        Self {
            metadata_path: metadata_path.into(),
            image_path: image_path.into(),
            reload: Mutex::new(ReloadState::default()),
            current: RwLock::new(Arc::new(MapConfig::default())),
        }
    }

    pub fn metadata_path(&self) -> &Path {
        &self.metadata_path
    }

    pub fn image_path(&self) -> &Path {
        &self.image_path
    }

    /// Snapshot of the map values currently in effect
    pub fn current(&self) -> Arc<MapConfig> {
        self.current.read().clone()
    }

    /// Re-parse whichever of the metadata and image files changed since the
    /// last reload. Returns `true` if the map values changed.
    pub fn reload_if_needed(&self) -> bool {
        let mut state = self.reload.lock();
        self.reload_locked(&mut state, false)
    }

    /// Re-parse both files regardless of modification times
    pub fn force_reload(&self) -> bool {
        let mut state = self.reload.lock();
        self.reload_locked(&mut state, true)
    }

    /// Reload if needed, then convert against the resulting snapshot
    pub fn world_to_pixel(&self, world: WorldPoint) -> PixelPoint {
        let config = {
            let mut state = self.reload.lock();
            self.reload_locked(&mut state, false);
            self.current()
        };
        config.world_to_pixel(world)
    }

    fn reload_locked(&self, state: &mut ReloadState, force: bool) -> bool {
        let metadata_mtime = modified_time(&self.metadata_path);
        let image_mtime = modified_time(&self.image_path);

        let metadata_changed =
            metadata_mtime.is_some() && (force || metadata_mtime != state.metadata_mtime);
        let image_changed = image_mtime.is_some() && (force || image_mtime != state.image_mtime);

        if !metadata_changed && !image_changed {
            return false;
        }

        let mut next = *self.current();

        if metadata_changed {
            match read_metadata(&self.metadata_path) {
                Ok(metadata) => {
                    if let Some(resolution) = metadata.resolution {
                        next.resolution = resolution;
                    }
                    if let Some(origin) = metadata.origin {
                        next.origin = origin;
                    }
                    state.metadata_mtime = metadata_mtime;
                }
                Err(e) => {
                    tracing::warn!(
                        path = %self.metadata_path.display(),
                        error = %e,
                        "Keeping previous map metadata"
                    );
                }
            }
        }

        if image_changed {
            match read_image_size(&self.image_path) {
                Ok(size) => {
                    next.width = size.width;
                    next.height = size.height;
                    state.image_mtime = image_mtime;
                }
                Err(e) => {
                    tracing::warn!(
                        path = %self.image_path.display(),
                        error = %e,
                        "Keeping previous map dimensions"
                    );
                }
            }
        }

        let changed = next != *self.current();
        if changed {
            tracing::info!(
                resolution = next.resolution,
                origin_x = next.origin.x,
                origin_y = next.origin.y,
                width = next.width,
                height = next.height,
                "Map configuration reloaded"
            );
            *self.current.write() = Arc::new(next);
        }
        changed
    }
}
