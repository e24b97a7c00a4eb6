use crate::engine::loading::progress::LoadingProgress;
use crate::rpc::web_rpc::WebRpcInterface;
use bevy::prelude::*;

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    #[default]
    Loading,
    Running,
}

#[derive(Component)]
pub struct FpsText;

/// Enter `Running` once rasters are decoded and the terrain is placed.
pub fn transition_to_running(
    loading_progress: Res<LoadingProgress>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    if loading_progress.ready_to_run() {
        info!("→ Terrain ready, transitioning to Running state");
        next_state.set(AppState::Running);
    }
}

/// Payload of the `loading_progress` notification.
pub fn loading_progress_json(progress: &LoadingProgress) -> serde_json::Value {
    let states: Vec<_> = progress
        .asset_loading_states
        .iter()
        .map(|(name, done)| serde_json::json!({ "name": name, "loaded": *done == 1 }))
        .collect();
    serde_json::json!({
        "manifest_loaded": progress.manifest_loaded,
        "terrain_created": progress.terrain_created,
        "assets": states,
        "error": progress.terrain_error,
    })
}

/// Report per-asset load state and terrain failures to the host page while loading.
pub fn update_loading_frontend(
    loading_progress: Res<LoadingProgress>,
    mut rpc_interface: ResMut<WebRpcInterface>,
) {
    if !loading_progress.is_changed() {
        return;
    }
    rpc_interface.send_notification("loading_progress", loading_progress_json(&loading_progress));
}
