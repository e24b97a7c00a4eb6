use bevy::asset::AssetMetaCheck;
use bevy::diagnostic::FrameTimeDiagnosticsPlugin;
use bevy::log::{Level, LogPlugin};
use bevy::prelude::*;
use bevy_common_assets::json::JsonAssetPlugin;
use constants::render_settings::CLEAR_COLOUR;

use crate::engine::assets::terrain_manifest::TerrainManifest;
use crate::engine::camera::viewport_camera::{ViewportCamera, camera_controller};
use crate::engine::core::app_state::{
    AppState, FpsText, transition_to_running, update_loading_frontend,
};
use crate::engine::core::window_config::create_window_config;
use crate::engine::loading::manifest_loader::{ManifestLoader, load_manifest_system, start_loading};
use crate::engine::loading::progress::LoadingProgress;
use crate::engine::loading::raster_loader::check_raster_loading;
use crate::engine::loading::terrain_creator::create_terrain_when_ready;
use crate::engine::scene::landing_zones::spawn_landing_zones;
use crate::engine::scene::terrain_view::apply_terrain_view;
use crate::engine::systems::fps_tracking::fps_notification_system;
use crate::rpc::web_rpc::WebRpcPlugin;
use crate::tools::ToolsPlugin;

const LOG_FILTER: &str = "wgpu=error,naga=warn,bevy_render=info,terrain_viewer=debug";

pub fn create_app() -> App {
    let mut app = App::new();

    app.add_plugins(create_default_plugins())
        .init_state::<AppState>()
        .add_plugins(FrameTimeDiagnosticsPlugin::default())
        // Registers TerrainManifest as a loadable asset type from JSON files.
        .add_plugins(JsonAssetPlugin::<TerrainManifest>::new(&["json"]))
        .add_plugins(WebRpcPlugin)
        .add_plugins(TerrainPlugin)
        .add_plugins(ToolsPlugin)
        .insert_resource(ClearColor(Color::srgb(
            CLEAR_COLOUR[0],
            CLEAR_COLOUR[1],
            CLEAR_COLOUR[2],
        )))
        .insert_resource(AmbientLight {
            brightness: 400.0,
            ..default()
        });

    app
}

/// Loading pipeline, terrain scene and camera.
pub struct TerrainPlugin;

impl Plugin for TerrainPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LoadingProgress>()
            .init_resource::<ManifestLoader>()
            .init_resource::<ViewportCamera>()
            .add_systems(Startup, (setup, start_loading).chain())
            .add_systems(
                Update,
                (
                    load_manifest_system,
                    check_raster_loading,
                    create_terrain_when_ready,
                    update_loading_frontend,
                    transition_to_running,
                )
                    .chain()
                    .run_if(in_state(AppState::Loading)),
            )
            .add_systems(OnEnter(AppState::Running), spawn_landing_zones)
            .add_systems(
                Update,
                (camera_controller, apply_terrain_view, fps_notification_system)
                    .run_if(in_state(AppState::Running)),
            );

        #[cfg(not(target_arch = "wasm32"))]
        {
            use crate::engine::systems::fps_tracking::fps_text_update_system;
            app.add_systems(Update, fps_text_update_system);
        }
    }
}

fn spawn_lighting(commands: &mut Commands) {
    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(
            EulerRot::ZYX,
            0.0,
            1.0,
            -std::f32::consts::FRAC_PI_4,
        )),
    ));
}

fn spawn_camera(commands: &mut Commands, viewport: &ViewportCamera) {
    commands.spawn((Camera3d::default(), viewport.transform()));
}

fn setup(mut commands: Commands, viewport: Res<ViewportCamera>) {
    spawn_lighting(&mut commands);
    spawn_camera(&mut commands, &viewport);

    #[cfg(not(target_arch = "wasm32"))]
    {
        create_native_overlays(&mut commands);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn create_native_overlays(commands: &mut Commands) {
    commands.spawn((
        Text::new("FPS: "),
        TextFont {
            font_size: 16.0,
            ..default()
        },
        TextColor(Color::srgb(1., 0., 0.)),
        Node {
            position_type: PositionType::Absolute,
            bottom: Val::Px(12.0),
            right: Val::Px(12.0),
            ..default()
        },
        FpsText,
    ));
}

fn create_default_plugins() -> impl PluginGroup {
    let window_config = WindowPlugin {
        primary_window: Some(create_window_config()),
        ..default()
    };

    let asset_config = AssetPlugin {
        meta_check: AssetMetaCheck::Never,
        ..default()
    };

    let log_config = LogPlugin {
        filter: LOG_FILTER.to_string(),
        level: Level::INFO,
        ..default()
    };

    DefaultPlugins
        .set(window_config)
        .set(asset_config)
        .set(log_config)
}
