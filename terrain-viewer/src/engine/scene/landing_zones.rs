use crate::engine::assets::bounds::{PixelCoord, TerrainBounds};
use crate::engine::assets::terrain_manifest::{LandingZoneConfig, TerrainManifest};
use crate::tools::bevy_engine::{ArtifactAssets, TerrainRayCaster};
use crate::tools::elevation::resolve_pixel;
use crate::tools::engine::TerrainPicker;
use crate::tools::sampler::{AttributeSampler, HazardStatus};
use bevy::prelude::*;
use constants::render_settings::LANDING_ZONE_LIFT;
use serde::Serialize;

/// Candidate landing site drawn as a translucent overlay.
#[derive(Component, Debug, Clone, PartialEq, Serialize)]
pub struct LandingZone {
    /// Index in the manifest.
    pub id: usize,
    /// `(x, y)` raster pixel of the zone center.
    pub center_pixel: [i32; 2],
    pub area_pixels: u32,
    pub hazard: HazardStatus,
    pub world_center: Vec3,
    /// Overlay extent along x and z.
    pub size: Vec2,
}

/// Planar center and x/z extent of a zone's bounding box in world units.
pub fn zone_footprint(bounds: &TerrainBounds, zone: &LandingZoneConfig) -> (Vec2, Vec2) {
    let ([x0, y0], [x1, y1]) = zone.corner_pixels();
    let a = bounds.pixel_to_world(x0, y0, bounds.min_y);
    let b = bounds.pixel_to_world(x1, y1, bounds.min_y);
    let [cx, cy] = zone.center_xy();
    let center = bounds.pixel_to_world(cx, cy, bounds.min_y);
    (
        Vec2::new(center.x, center.z),
        Vec2::new((b.x - a.x).abs(), (b.z - a.z).abs()),
    )
}

impl LandingZone {
    /// Derive a zone's placement: footprint from the bbox, overlay just above
    /// the resolved surface, hazard read at the center pixel. Without a
    /// hazard raster the zone counts as safe.
    pub fn from_config<P>(
        picker: &mut P,
        bounds: &TerrainBounds,
        sampler: &AttributeSampler,
        id: usize,
        zone: &LandingZoneConfig,
    ) -> Self
    where
        P: TerrainPicker + ?Sized,
    {
        let (_, size) = zone_footprint(bounds, zone);
        let [cx, cy] = zone.center_xy();
        let surface = resolve_pixel(picker, bounds, cx, cy);
        let hazard = sampler
            .sample_hazard(bounds, PixelCoord::new(cx, cy))
            .unwrap_or(HazardStatus::Safe);
        Self {
            id,
            center_pixel: [cx, cy],
            area_pixels: zone.area_pixels,
            hazard,
            world_center: surface + Vec3::Y * LANDING_ZONE_LIFT,
            size,
        }
    }
}

pub fn spawn_landing_zones(
    mut commands: Commands,
    manifest: Res<TerrainManifest>,
    bounds: Res<TerrainBounds>,
    sampler: Res<AttributeSampler>,
    assets: Res<ArtifactAssets>,
    mut picker: TerrainRayCaster,
) {
    for (id, config) in manifest.landing_zones.iter().enumerate() {
        let zone = LandingZone::from_config(&mut picker, &bounds, &sampler, id, config);
        debug!(
            "Landing zone {} at ({:.2}, {:.2}, {:.2}), {:.1}x{:.1} units, {}",
            id,
            zone.world_center.x,
            zone.world_center.y,
            zone.world_center.z,
            zone.size.x,
            zone.size.y,
            zone.hazard.label()
        );
        let transform = Transform::from_translation(zone.world_center)
            .with_scale(Vec3::new(zone.size.x, 1.0, zone.size.y));
        commands.spawn((
            zone,
            Name::new(format!("LandingZone{id}")),
            Mesh3d(assets.overlay_plane.clone()),
            MeshMaterial3d(assets.landing_zone.clone()),
            transform,
        ));
    }
    info!("Spawned {} landing zones", manifest.landing_zones.len());
}
