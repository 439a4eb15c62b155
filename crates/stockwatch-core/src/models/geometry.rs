//! Coordinate types shared by the map converter, the area classifier and the
//! notification feed.
//!
//! World coordinates are meters in the robot's map frame (origin bottom-left).
//! Pixel coordinates index the displayed map image (origin top-left).

use serde::{Deserialize, Serialize};

/// Robot/map-frame position in meters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldPoint {
    pub x: f64,
    pub y: f64,
}

impl WorldPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Position in the map image's pixel grid
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pose of the map image's lower-left pixel in the world frame
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MapOrigin {
    pub x: f64,
    pub y: f64,
    pub theta: f64,
}

/// Map metadata needed to go from meters to pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Meters per pixel
    pub resolution: f64,

    pub origin: MapOrigin,

    /// Image width in pixels, 0 while unknown
    pub width: u32,

    /// Image height in pixels, 0 while unknown
    pub height: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            resolution: 0.05,
            origin: MapOrigin::default(),
            width: 0,
            height: 0,
        }
    }
}

impl MapConfig {
    /// Convert a world position to pixel space.
    ///
    /// The vertical axis is flipped against the image height. While the height
    /// is unknown (0) no flip is applied.
    pub fn world_to_pixel(&self, world: WorldPoint) -> PixelPoint {
        let px = (world.x - self.origin.x) / self.resolution;
        let mut py = (world.y - self.origin.y) / self.resolution;

        if self.height > 0 {
            py = f64::from(self.height) - py;
        }

        PixelPoint::new(px, py)
    }
}
