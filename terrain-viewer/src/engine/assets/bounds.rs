use crate::error::TerrainError;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Integer coordinate in raster pixel space, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelCoord {
    pub x: i32,
    pub y: i32,
}

impl PixelCoord {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Clamp into `[0, width-1] x [0, height-1]`.
    pub fn clamped(self, width: u32, height: u32) -> Self {
        let max_x = width.saturating_sub(1).min(i32::MAX as u32) as i32;
        let max_y = height.saturating_sub(1).min(i32::MAX as u32) as i32;
        Self {
            x: self.x.clamp(0, max_x),
            y: self.y.clamp(0, max_y),
        }
    }

    /// Wire representation used by the path service.
    pub fn to_array(self) -> [i32; 2] {
        [self.x, self.y]
    }

    pub fn from_array([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

/// World extent of the placed terrain together with the raster resolution
/// that covers it. Produced once when the mesh finishes loading.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TerrainBounds {
    pub min_x: f32,
    pub max_x: f32,
    pub min_y: f32,
    pub max_y: f32,
    pub min_z: f32,
    pub max_z: f32,
    pub image_width: u32,
    pub image_height: u32,
}

impl TerrainBounds {
    /// Bounds from world-space corners of the placed terrain.
    pub fn from_extents(min: Vec3, max: Vec3, image_width: u32, image_height: u32) -> Self {
        Self {
            min_x: min.x,
            max_x: max.x,
            min_y: min.y,
            max_y: max.y,
            min_z: min.z,
            max_z: max.z,
            image_width,
            image_height,
        }
    }

    /// True when mapping between pixel and world space is undefined.
    pub fn is_degenerate(&self) -> bool {
        let extent_x = self.max_x - self.min_x;
        let extent_z = self.max_z - self.min_z;
        !(extent_x.is_finite() && extent_x > 0.0)
            || !(extent_z.is_finite() && extent_z > 0.0)
            || self.image_width < 2
            || self.image_height < 2
    }

    /// Report degenerate geometry so loaders can log it once.
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.is_degenerate() {
            return Err(TerrainError::DegenerateGeometry {
                min_x: self.min_x,
                max_x: self.max_x,
                min_z: self.min_z,
                max_z: self.max_z,
                image_width: self.image_width,
                image_height: self.image_height,
            });
        }
        Ok(())
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn depth(&self) -> f32 {
        self.max_z - self.min_z
    }

    /// Center of the terrain footprint at its base elevation.
    pub fn center(&self) -> Vec3 {
        Vec3::new(
            (self.min_x + self.max_x) * 0.5,
            self.min_y,
            (self.min_z + self.max_z) * 0.5,
        )
    }

    /// Pixel used whenever the mapping is undefined.
    pub fn center_pixel(&self) -> PixelCoord {
        PixelCoord::new(
            (self.image_width.saturating_sub(1) / 2) as i32,
            (self.image_height.saturating_sub(1) / 2) as i32,
        )
    }

    /// Map a world position onto the raster. The result is not clamped;
    /// raster reads clamp explicitly.
    pub fn world_to_pixel(&self, point: Vec3) -> PixelCoord {
        if self.is_degenerate() || !point.x.is_finite() || !point.z.is_finite() {
            return self.center_pixel();
        }

        let u = (point.x - self.min_x) / self.width();
        let v = (point.z - self.min_z) / self.depth();
        let px = (u * (self.image_width - 1) as f32).floor();
        let py = (v * (self.image_height - 1) as f32).floor();
        PixelCoord::new(px as i32, py as i32)
    }

    /// Map a raster pixel back into world space. `y` is carried through
    /// unchanged because elevation is resolved separately.
    pub fn pixel_to_world(&self, px: i32, py: i32, y: f32) -> Vec3 {
        if self.is_degenerate() {
            let center = self.center();
            let fallback = |v: f32| if v.is_finite() { v } else { 0.0 };
            return Vec3::new(fallback(center.x), y, fallback(center.z));
        }

        let u = px as f32 / (self.image_width - 1) as f32;
        let v = py as f32 / (self.image_height - 1) as f32;
        Vec3::new(
            self.min_x + u * self.width(),
            y,
            self.min_z + v * self.depth(),
        )
    }

    /// World size of one raster pixel along x and z.
    pub fn pixel_size(&self) -> Vec2 {
        if self.is_degenerate() {
            return Vec2::ZERO;
        }
        Vec2::new(
            self.width() / (self.image_width - 1) as f32,
            self.depth() / (self.image_height - 1) as f32,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reference_bounds() -> TerrainBounds {
        TerrainBounds {
            min_x: -100.0,
            max_x: 100.0,
            min_y: 0.0,
            max_y: 20.0,
            min_z: -50.0,
            max_z: 50.0,
            image_width: 512,
            image_height: 256,
        }
    }

    #[test]
    fn corners_map_to_raster_corners() {
        let bounds = reference_bounds();
        assert_eq!(
            bounds.world_to_pixel(Vec3::new(-100.0, 0.0, -50.0)),
            PixelCoord::new(0, 0)
        );
        assert_eq!(
            bounds.world_to_pixel(Vec3::new(100.0, 0.0, 50.0)),
            PixelCoord::new(511, 255)
        );
        assert_eq!(
            bounds.pixel_to_world(511, 255, 3.0),
            Vec3::new(100.0, 3.0, 50.0)
        );
    }

    #[test]
    fn world_to_pixel_is_not_clamped() {
        let bounds = reference_bounds();
        let outside = bounds.world_to_pixel(Vec3::new(150.0, 0.0, -80.0));
        assert!(outside.x > 511);
        assert!(outside.y < 0);
        assert_eq!(outside.clamped(512, 256), PixelCoord::new(511, 0));
    }

    #[test]
    fn degenerate_bounds_fail_closed() {
        let mut bounds = reference_bounds();
        bounds.max_x = bounds.min_x;
        assert!(bounds.is_degenerate());
        assert!(bounds.validate().is_err());

        let pixel = bounds.world_to_pixel(Vec3::new(10.0, 0.0, 10.0));
        assert_eq!(pixel, PixelCoord::new(255, 127));

        let world = bounds.pixel_to_world(10, 10, 0.0);
        assert!(world.is_finite());
        assert_eq!(world.x, -100.0);
        assert_eq!(world.z, 0.0);
    }

    #[test]
    fn tiny_raster_is_degenerate() {
        let mut bounds = reference_bounds();
        bounds.image_width = 1;
        assert!(bounds.is_degenerate());
        assert!(bounds.pixel_to_world(0, 0, 0.0).is_finite());
    }

    #[test]
    fn non_finite_points_map_to_center_pixel() {
        let bounds = reference_bounds();
        assert_eq!(
            bounds.world_to_pixel(Vec3::new(f32::NAN, 0.0, 0.0)),
            bounds.center_pixel()
        );
    }

    proptest! {
        #[test]
        fn pixel_round_trip_stays_within_one_pixel(
            x in -100.0f32..100.0,
            z in -50.0f32..50.0,
        ) {
            let bounds = reference_bounds();
            let pixel = bounds.world_to_pixel(Vec3::new(x, 0.0, z));
            let back = bounds.pixel_to_world(pixel.x, pixel.y, 0.0);
            let cell = bounds.pixel_size();
            prop_assert!((back.x - x).abs() <= cell.x + 1e-3);
            prop_assert!((back.z - z).abs() <= cell.y + 1e-3);
        }
    }
}
