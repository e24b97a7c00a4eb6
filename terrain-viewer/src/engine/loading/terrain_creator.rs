use crate::engine::assets::bounds::TerrainBounds;
use crate::engine::assets::terrain_manifest::TerrainManifest;
use crate::engine::camera::viewport_camera::ViewportCamera;
use crate::engine::loading::manifest_loader::TerrainAssets;
use crate::engine::loading::progress::LoadingProgress;
use crate::error::TerrainError;
use crate::tools::bevy_engine::TerrainSurface;
use bevy::asset::LoadState;
use bevy::prelude::*;
use bevy::render::mesh::VertexAttributeValues;
use constants::render_settings::{
    GROUND_COLOUR, GROUND_PLANE_DROP, GROUND_PLANE_SCALE, TERRAIN_BASE_OFFSET,
    UNTEXTURED_TERRAIN_COLOUR,
};

/// Materials the terrain switches between with the view keys.
#[derive(Resource, Debug, Clone)]
pub struct TerrainMaterials {
    pub textured: Handle<StandardMaterial>,
    pub slope: Handle<StandardMaterial>,
    pub hazard: Handle<StandardMaterial>,
}

#[derive(Component)]
pub struct GroundPlane;

/// Where the terrain mesh ends up after placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainPlacement {
    pub translation: Vec3,
    pub world_min: Vec3,
    pub world_max: Vec3,
}

/// Center the mesh footprint on the origin and lift it so its lowest
/// point sits `TERRAIN_BASE_OFFSET` above zero.
pub fn place_terrain(local_min: Vec3, local_max: Vec3) -> TerrainPlacement {
    let center = (local_min + local_max) * 0.5;
    let translation = Vec3::new(-center.x, TERRAIN_BASE_OFFSET - local_min.y, -center.z);
    TerrainPlacement {
        translation,
        world_min: local_min + translation,
        world_max: local_max + translation,
    }
}

pub fn mesh_extents(mesh: &Mesh) -> Result<(Vec3, Vec3), TerrainError> {
    let Some(VertexAttributeValues::Float32x3(positions)) = mesh.attribute(Mesh::ATTRIBUTE_POSITION)
    else {
        return Err(TerrainError::MissingMeshPositions);
    };
    if positions.is_empty() {
        return Err(TerrainError::MissingMeshPositions);
    }

    Ok(positions.iter().map(|p| Vec3::from_array(*p)).fold(
        (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
        |(min, max), p| (min.min(p), max.max(p)),
    ))
}

fn raster_material(texture: Handle<Image>) -> StandardMaterial {
    StandardMaterial {
        base_color_texture: Some(texture),
        unlit: true,
        ..default()
    }
}

/// Spawn the placed terrain and its ground plane once the mesh is loaded.
pub fn create_terrain_when_ready(
    mut loading_progress: ResMut<LoadingProgress>,
    mut commands: Commands,
    terrain_assets: Option<Res<TerrainAssets>>,
    manifest: Option<Res<TerrainManifest>>,
    asset_server: Res<AssetServer>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut viewport: ResMut<ViewportCamera>,
) {
    if loading_progress.terrain_created || loading_progress.terrain_error.is_some() {
        return;
    }
    let (Some(terrain_assets), Some(manifest)) = (terrain_assets, manifest) else {
        return;
    };

    if let Some(LoadState::Failed(e)) = asset_server.get_load_state(&terrain_assets.mesh) {
        let reason = format!("Terrain mesh {} failed to load: {}", manifest.terrain.mesh, e);
        error!("{}", reason);
        loading_progress.fail_terrain(reason);
        return;
    }
    let Some(mesh) = meshes.get(&terrain_assets.mesh) else {
        return;
    };

    let (local_min, local_max) = match mesh_extents(mesh) {
        Ok(extents) => extents,
        Err(e) => {
            let reason = format!("Terrain mesh {} unusable: {}", manifest.terrain.mesh, e);
            error!("{}", reason);
            loading_progress.fail_terrain(reason);
            return;
        }
    };
    let placement = place_terrain(local_min, local_max);
    let bounds = TerrainBounds::from_extents(
        placement.world_min,
        placement.world_max,
        manifest.raster.width,
        manifest.raster.height,
    );
    match bounds.validate() {
        Ok(()) => info!(
            "✓ Terrain placed: x [{:.2}, {:.2}], y [{:.2}, {:.2}], z [{:.2}, {:.2}]",
            bounds.min_x, bounds.max_x, bounds.min_y, bounds.max_y, bounds.min_z, bounds.max_z
        ),
        Err(e) => error!("Terrain bounds unusable, coordinate mapping disabled: {}", e),
    }

    let textured = match &terrain_assets.surface_texture {
        Some(texture) => StandardMaterial {
            base_color_texture: Some(texture.clone()),
            perceptual_roughness: 0.9,
            ..default()
        },
        None => StandardMaterial {
            base_color: Color::srgb(
                UNTEXTURED_TERRAIN_COLOUR[0],
                UNTEXTURED_TERRAIN_COLOUR[1],
                UNTEXTURED_TERRAIN_COLOUR[2],
            ),
            perceptual_roughness: 0.9,
            ..default()
        },
    };
    let terrain_materials = TerrainMaterials {
        textured: materials.add(textured),
        slope: materials.add(raster_material(terrain_assets.slope_map.clone())),
        hazard: materials.add(raster_material(terrain_assets.hazard_map.clone())),
    };

    commands.spawn((
        TerrainSurface,
        Name::new("Terrain"),
        Mesh3d(terrain_assets.mesh.clone()),
        MeshMaterial3d(terrain_materials.textured.clone()),
        Transform::from_translation(placement.translation),
    ));

    let ground_size = Vec2::new(bounds.width(), bounds.depth()) * GROUND_PLANE_SCALE;
    commands.spawn((
        GroundPlane,
        Name::new("GroundPlane"),
        Mesh3d(meshes.add(Plane3d::default().mesh().size(ground_size.x, ground_size.y))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(GROUND_COLOUR[0], GROUND_COLOUR[1], GROUND_COLOUR[2]),
            perceptual_roughness: 1.0,
            ..default()
        })),
        Transform::from_xyz(
            bounds.center().x,
            bounds.min_y - GROUND_PLANE_DROP,
            bounds.center().z,
        ),
    ));

    viewport.frame(&bounds);
    commands.insert_resource(terrain_materials);
    commands.insert_resource(bounds);
    loading_progress.terrain_created = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::asset::RenderAssetUsages;
    use bevy::render::mesh::PrimitiveTopology;

    #[test]
    fn placement_centres_footprint_and_lifts_base() {
        let placement = place_terrain(Vec3::new(10.0, -20.0, 4.0), Vec3::new(50.0, 5.0, 24.0));
        assert!(placement.translation.abs_diff_eq(Vec3::new(-30.0, 20.05, -14.0), 1e-5));
        assert!((placement.world_min.y - TERRAIN_BASE_OFFSET).abs() < 1e-5);
        assert_eq!(placement.world_min.x, -20.0);
        assert_eq!(placement.world_max.x, 20.0);
        assert_eq!(placement.world_min.z, -10.0);
        assert_eq!(placement.world_max.z, 10.0);
    }

    #[test]
    fn extents_cover_every_vertex() {
        let mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
            .with_inserted_attribute(
                Mesh::ATTRIBUTE_POSITION,
                vec![[0.0, 1.0, 2.0], [-3.0, 4.0, 0.5], [2.0, -1.0, 6.0]],
            );
        let (min, max) = mesh_extents(&mesh).unwrap();
        assert_eq!(min, Vec3::new(-3.0, -1.0, 0.5));
        assert_eq!(max, Vec3::new(2.0, 4.0, 6.0));
    }

    #[test]
    fn mesh_without_positions_is_rejected() {
        let mesh = Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default());
        assert_eq!(mesh_extents(&mesh), Err(TerrainError::MissingMeshPositions));
    }
}
