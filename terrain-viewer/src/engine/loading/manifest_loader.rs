use crate::engine::assets::terrain_manifest::TerrainManifest;
use crate::engine::loading::progress::LoadingProgress;
use crate::tools::path_planning::PathPlanner;
use crate::tools::tool_manager::ToolManager;
use bevy::prelude::*;
use constants::path::RELATIVE_MANIFEST_PATH;

#[derive(Resource, Default)]
pub struct ManifestLoader {
    handle: Option<Handle<TerrainManifest>>,
}

/// Handles for everything the manifest names.
#[derive(Resource, Debug, Clone)]
pub struct TerrainAssets {
    pub mesh: Handle<Mesh>,
    pub slope_map: Handle<Image>,
    pub hazard_map: Handle<Image>,
    pub surface_texture: Option<Handle<Image>>,
}

pub fn start_loading(mut manifest_loader: ResMut<ManifestLoader>, asset_server: Res<AssetServer>) {
    info!("Loading terrain manifest from {}", RELATIVE_MANIFEST_PATH);
    manifest_loader.handle = Some(asset_server.load(RELATIVE_MANIFEST_PATH));
}

/// Once the manifest parses: expose it as a resource, configure the path
/// planner and tool defaults, then start loading the terrain assets.
pub fn load_manifest_system(
    mut loading_progress: ResMut<LoadingProgress>,
    manifest_loader: Res<ManifestLoader>,
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    manifests: Res<Assets<TerrainManifest>>,
) {
    if loading_progress.manifest_loaded {
        return;
    }
    let Some(handle) = manifest_loader.handle.as_ref() else {
        return;
    };
    let Some(manifest) = manifests.get(handle) else {
        return;
    };

    info!(
        "Terrain manifest loaded: mesh {}, rasters {}x{}, {} landing zones",
        manifest.terrain.mesh,
        manifest.raster.width,
        manifest.raster.height,
        manifest.landing_zones.len()
    );

    let files = &manifest.terrain;
    commands.insert_resource(TerrainAssets {
        mesh: asset_server
            .load(GltfAssetLabel::Primitive { mesh: 0, primitive: 0 }.from_asset(files.mesh.clone())),
        slope_map: asset_server.load(files.slope_map.clone()),
        hazard_map: asset_server.load(files.hazard_map.clone()),
        surface_texture: files
            .surface_texture
            .as_ref()
            .map(|path| asset_server.load(path.clone())),
    });

    commands.insert_resource(PathPlanner::from_config(&manifest.path_service));
    commands.insert_resource(ToolManager::with_max_slope(
        manifest.path_service.default_max_slope,
    ));
    commands.insert_resource(manifest.clone());
    loading_progress.manifest_loaded = true;
}
