use crate::engine::assets::raster::RasterBuffer;
use crate::engine::assets::terrain_manifest::TerrainManifest;
use crate::engine::loading::manifest_loader::TerrainAssets;
use crate::engine::loading::progress::{AssetReadiness, LoadingProgress};
use crate::tools::sampler::AttributeSampler;
use bevy::asset::LoadState;
use bevy::prelude::*;

fn readiness(asset_server: &AssetServer, handle: &Handle<Image>) -> AssetReadiness {
    match asset_server.get_load_state(handle) {
        Some(LoadState::Loaded) => AssetReadiness::Ready,
        Some(LoadState::Failed(_)) => AssetReadiness::Failed,
        _ => AssetReadiness::Pending,
    }
}

/// Decode a loaded raster. Any failure leaves the layer unavailable and
/// sampling on it reports `N/A`.
fn decode(
    name: &str,
    state: AssetReadiness,
    handle: &Handle<Image>,
    images: &Assets<Image>,
    manifest: &TerrainManifest,
) -> Option<RasterBuffer> {
    if state != AssetReadiness::Ready {
        warn!("{} failed to load; {} sampling disabled", name, name);
        return None;
    }
    let image = images.get(handle)?;
    match RasterBuffer::from_image(image) {
        Ok(buffer) => {
            if buffer.width() != manifest.raster.width || buffer.height() != manifest.raster.height {
                warn!(
                    "{} is {}x{} but the manifest declares {}x{}",
                    name,
                    buffer.width(),
                    buffer.height(),
                    manifest.raster.width,
                    manifest.raster.height
                );
            }
            info!("✓ {} decoded ({}x{})", name, buffer.width(), buffer.height());
            Some(buffer)
        }
        Err(e) => {
            error!("{} could not be decoded: {}", name, e);
            None
        }
    }
}

/// Decode slope and hazard rasters into the sampler once both settle.
pub fn check_raster_loading(
    mut loading_progress: ResMut<LoadingProgress>,
    mut commands: Commands,
    terrain_assets: Option<Res<TerrainAssets>>,
    manifest: Option<Res<TerrainManifest>>,
    asset_server: Res<AssetServer>,
    images: Res<Assets<Image>>,
) {
    if loading_progress.sampler_ready {
        return;
    }
    let (Some(terrain_assets), Some(manifest)) = (terrain_assets, manifest) else {
        return;
    };

    let slope_state = readiness(&asset_server, &terrain_assets.slope_map);
    let hazard_state = readiness(&asset_server, &terrain_assets.hazard_map);
    if slope_state != loading_progress.slope_raster
        || hazard_state != loading_progress.hazard_raster
        || loading_progress.asset_loading_states.is_empty()
    {
        loading_progress.slope_raster = slope_state;
        loading_progress.hazard_raster = hazard_state;
        loading_progress.asset_loading_states = vec![
            (String::from("Slope map"), i32::from(slope_state.is_settled())),
            (String::from("Hazard map"), i32::from(hazard_state.is_settled())),
        ];
    }
    if !loading_progress.rasters_settled() {
        return;
    }

    let slope = decode(
        "Slope map",
        loading_progress.slope_raster,
        &terrain_assets.slope_map,
        &images,
        &manifest,
    );
    let hazard = decode(
        "Hazard map",
        loading_progress.hazard_raster,
        &terrain_assets.hazard_map,
        &images,
        &manifest,
    );
    commands.insert_resource(AttributeSampler::new(slope, hazard));
    loading_progress.sampler_ready = true;
}
