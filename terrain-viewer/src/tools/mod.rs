//! Interactive terrain tools: distance measurement and rover path planning.
//!
//! ## Tool Manager Architecture
//!
//! The `ToolManager` resource owns a single `ActiveTool` value, so only one
//! tool can be active at a time by construction:
//! - Tools are toggled via native buttons or the `tool_selection` RPC
//! - Activation detaches camera control and suppresses the context menu
//! - Every reset disposes the session's artifacts and restores both
//!
//! ### Command Flow
//!
//! ```text
//! Keyboard / Button / RPC
//!   └─> ToolCommandEvent
//!       └─> apply_tool_commands()
//!           ├─> ToolManager transition (through the ToolEngine trait)
//!           ├─> PathPlanner dispatch / cancel
//!           └─> RPC notification to frontend
//! ```
//!
//! Pointer input goes straight to `ToolManager::click` and `hover` with the
//! terrain hit resolved by a mesh ray cast restricted to the terrain.
//!
//! ## Available Tools
//!
//! ### Distance Tool (`ToolType::Distance`)
//! - First click sets P1, second click measures and draws a red line
//! - Average slope is sampled at 21 evenly spaced points along the segment
//! - A third click starts a new measurement
//!
//! ### Path Planning Tool (`ToolType::Path`)
//! - Clicks place the start (cyan) and end (orange) markers
//! - The end click sends the pixel pair and max slope to the path service
//! - The returned pixel path is draped on the terrain as a green polyline
//! - Requests carry a token; only the reply for the latest one is applied
//!
//! ## Keyboard
//!
//! `Escape` resets both tools, `D`/`P` reset the matching tool, `S`/`H`/`M`
//! switch the terrain view and `R` recentres the camera.

/// Bevy implementation of the tool engine: ray casts and artifact entities.
pub mod bevy_engine;

/// Terrain elevation by vertical ray cast.
pub mod elevation;

/// Capability traits the state machine drives, plus the test fake.
pub mod engine;

/// Input systems and RPC notifications around the state machine.
pub mod interaction;

/// Two-point distance and average slope.
pub mod measure;

/// Path service client, request ownership and polyline construction.
pub mod path_planning;

/// Slope and hazard raster lookups.
pub mod sampler;

/// Exclusive tool state machine.
pub mod tool_manager;

/// Native control panel.
#[cfg(not(target_arch = "wasm32"))]
pub mod ui;

use crate::engine::core::app_state::AppState;
use bevy::prelude::*;
use bevy_engine::{CanvasInputState, setup_artifact_assets};
use interaction::{
    apply_tool_commands, handle_tool_clicks, handle_tool_hover, handle_tool_keyboard,
    poll_path_results, publish_info_changes, sync_context_menu,
};
use tool_manager::ToolCommandEvent;

pub struct ToolsPlugin;

impl Plugin for ToolsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CanvasInputState>()
            .add_event::<ToolCommandEvent>()
            .add_systems(Startup, setup_artifact_assets)
            .add_systems(
                Update,
                (
                    handle_tool_keyboard,
                    apply_tool_commands,
                    handle_tool_clicks,
                    handle_tool_hover,
                    poll_path_results,
                    publish_info_changes,
                    sync_context_menu,
                )
                    .chain()
                    .run_if(in_state(AppState::Running)),
            );

        #[cfg(not(target_arch = "wasm32"))]
        {
            use ui::{
                path_option_interactions, reflect_tool_state, spawn_tool_ui,
                tool_button_interactions,
            };
            app.add_systems(Startup, spawn_tool_ui).add_systems(
                Update,
                (
                    tool_button_interactions,
                    path_option_interactions,
                    reflect_tool_state,
                )
                    .chain()
                    .before(apply_tool_commands)
                    .run_if(in_state(AppState::Running)),
            );
        }
    }
}
