use crate::engine::assets::bounds::TerrainBounds;
use crate::tools::engine::TerrainPicker;
use bevy::prelude::*;
use constants::tools::ELEVATION_RAY_LIFT;

/// Drop a vertical ray onto the terrain at `(x, z)`.
///
/// A miss resolves to the terrain's minimum elevation, so the returned
/// point always carries a finite `y`.
pub fn resolve_elevation<P>(picker: &mut P, bounds: &TerrainBounds, x: f32, z: f32) -> Vec3
where
    P: TerrainPicker + ?Sized,
{
    let fallback = Vec3::new(x, bounds.min_y, z);
    let origin_y = bounds.max_y + ELEVATION_RAY_LIFT;
    if !(x.is_finite() && z.is_finite() && origin_y.is_finite()) {
        return fallback;
    }

    let ray = Ray3d::new(Vec3::new(x, origin_y, z), Dir3::NEG_Y);
    match picker.pick_terrain(ray) {
        Some(hit) if hit.is_finite() => hit,
        _ => fallback,
    }
}

/// Resolve a raster pixel to a point on the terrain surface.
pub fn resolve_pixel<P>(picker: &mut P, bounds: &TerrainBounds, px: i32, py: i32) -> Vec3
where
    P: TerrainPicker + ?Sized,
{
    let planar = bounds.pixel_to_world(px, py, bounds.min_y);
    resolve_elevation(picker, bounds, planar.x, planar.z)
}
