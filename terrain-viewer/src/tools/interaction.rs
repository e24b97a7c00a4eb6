use crate::engine::assets::bounds::TerrainBounds;
use crate::rpc::web_rpc::{WebRpcInterface, tool_state_json};
use crate::tools::bevy_engine::{BevyToolEngine, CanvasInputState};
use crate::tools::engine::TerrainPicker;
use crate::tools::path_planning::PathPlanner;
use crate::tools::sampler::AttributeSampler;
use crate::tools::tool_manager::{
    PathReport, ToolCommand, ToolCommandEvent, ToolKey, ToolManager, ToolOutcome,
    ToolSelectionSource,
};
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::window::{CursorMoved, PrimaryWindow};

/// Everything a tool transition touches, bundled for the input systems.
#[derive(SystemParam)]
pub struct ToolContext<'w, 's> {
    manager: ResMut<'w, ToolManager>,
    engine: BevyToolEngine<'w, 's>,
    planner: ResMut<'w, PathPlanner>,
    rpc: ResMut<'w, WebRpcInterface>,
    bounds: Res<'w, TerrainBounds>,
    sampler: Res<'w, AttributeSampler>,
}

impl ToolContext<'_, '_> {
    fn run(&mut self, command: ToolCommand) {
        let Self {
            manager,
            engine,
            bounds,
            ..
        } = self;
        let outcome = match command {
            ToolCommand::Toggle(tool) => manager.toggle(tool, engine),
            ToolCommand::Key(key) => manager.handle_key(key, engine),
            ToolCommand::SetView(view) => manager.set_view(view, engine),
            ToolCommand::SetMaxSlope(value) => manager.set_max_slope(value),
            ToolCommand::RecalculatePath => manager.recalculate_path(),
            ToolCommand::SetDistanceMetric(metric) => {
                manager.set_distance_metric(metric);
                ToolOutcome::Ignored
            }
        };
        if matches!(outcome, ToolOutcome::CameraReset) {
            engine.reset_camera(bounds);
        }
        self.publish(outcome);
    }

    /// Side effects of a transition outside the engine: planner dispatch
    /// and host notifications.
    fn publish(&mut self, outcome: ToolOutcome) {
        match &outcome {
            ToolOutcome::Ignored | ToolOutcome::StaleResult(_) | ToolOutcome::CameraReset => {}
            ToolOutcome::Activated(_) | ToolOutcome::Deactivated(_) | ToolOutcome::Reset => {
                self.notify_state();
            }
            ToolOutcome::Rejected { requested, notice } => {
                self.rpc.send_notification(
                    "tool_notice",
                    serde_json::json!({ "requested": requested.to_string(), "notice": notice }),
                );
            }
            ToolOutcome::DistanceStarted(_) => self.notify_state(),
            ToolOutcome::Measured(measurement) => {
                self.rpc.send_notification(
                    "measure_completed",
                    serde_json::to_value(measurement).unwrap_or_default(),
                );
                self.notify_state();
            }
            ToolOutcome::PathStartPlaced(pixel) => {
                self.rpc.send_notification(
                    "path_started",
                    serde_json::json!({ "start_pixel": pixel.to_array() }),
                );
                self.notify_state();
            }
            ToolOutcome::PathRequested(dispatch) => {
                let forward = self.planner.dispatch(dispatch.token, dispatch.request.clone());
                if forward {
                    self.rpc.send_notification(
                        "path_request",
                        serde_json::json!({ "token": dispatch.token, "request": dispatch.request }),
                    );
                }
                self.notify_state();
            }
            ToolOutcome::ViewChanged(_) | ToolOutcome::MaxSlopeChanged(_) => self.notify_state(),
            ToolOutcome::PathApplied(report) => {
                self.rpc.send_notification("path_result", path_report_json(report));
                self.notify_state();
            }
        }

        // Resets and restarts leave nothing to wait for.
        if self.manager.pending_path_token().is_none() && self.planner.is_pending() {
            self.planner.cancel();
        }
    }

    fn notify_state(&mut self) {
        self.rpc
            .send_notification("tool_state_changed", tool_state_json(&self.manager));
    }
}

pub fn path_report_json(report: &PathReport) -> serde_json::Value {
    match report {
        PathReport::Found {
            steps,
            distance,
            cumulative_length,
            straight_line_distance,
        } => serde_json::json!({
            "status": "found",
            "steps": steps,
            "distance": distance,
            "cumulative_length": cumulative_length,
            "straight_line_distance": straight_line_distance,
        }),
        PathReport::Empty { message } => serde_json::json!({ "status": "empty", "message": message }),
        PathReport::Failed { error } => serde_json::json!({ "status": "error", "error": error }),
    }
}

fn cursor_ray(
    windows: &Query<&Window, With<PrimaryWindow>>,
    cameras: &Query<(&Camera, &GlobalTransform), With<Camera3d>>,
) -> Option<Ray3d> {
    let window = windows.single().ok()?;
    let cursor = window.cursor_position()?;
    let (camera, camera_transform) = cameras.single().ok()?;
    camera.viewport_to_world(camera_transform, cursor).ok()
}

/// Route left clicks on the canvas to the active tool.
pub fn handle_tool_clicks(
    mouse: Res<ButtonInput<MouseButton>>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    ui_interactions: Query<&Interaction>,
    mut ctx: ToolContext,
) {
    if !mouse.just_pressed(MouseButton::Left) || ctx.manager.active_tool().is_none() {
        return;
    }
    if ui_interactions.iter().any(|i| *i != Interaction::None) {
        return;
    }
    let Some(ray) = cursor_ray(&windows, &cameras) else {
        return;
    };

    let hit = ctx.engine.pick_terrain(ray);
    let ToolContext {
        manager,
        engine,
        bounds,
        sampler,
        ..
    } = &mut ctx;
    let outcome = manager.click(engine, bounds, sampler, hit);
    ctx.publish(outcome);
}

/// Hover readout, refreshed whenever the cursor moves.
pub fn handle_tool_hover(
    mut cursor_moved: EventReader<CursorMoved>,
    windows: Query<&Window, With<PrimaryWindow>>,
    cameras: Query<(&Camera, &GlobalTransform), With<Camera3d>>,
    mut ctx: ToolContext,
) {
    if cursor_moved.read().count() == 0 || ctx.manager.active_tool().is_some() {
        return;
    }
    let hit = cursor_ray(&windows, &cameras).and_then(|ray| ctx.engine.pick_terrain(ray));
    let ToolContext {
        manager,
        bounds,
        sampler,
        ..
    } = &mut ctx;
    manager.hover(bounds, sampler, hit);
}

/// Map keyboard shortcuts to tool commands.
pub fn handle_tool_keyboard(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut tool_events: EventWriter<ToolCommandEvent>,
) {
    let bindings = [
        (KeyCode::Escape, ToolKey::Escape),
        (KeyCode::KeyD, ToolKey::ResetDistance),
        (KeyCode::KeyP, ToolKey::ResetPath),
        (KeyCode::KeyS, ToolKey::SlopeView),
        (KeyCode::KeyH, ToolKey::HazardView),
        (KeyCode::KeyM, ToolKey::TexturedView),
        (KeyCode::KeyR, ToolKey::ResetCamera),
    ];
    for (code, key) in bindings {
        if keyboard.just_pressed(code) {
            tool_events.write(ToolCommandEvent {
                command: ToolCommand::Key(key),
                source: ToolSelectionSource::Keyboard,
            });
        }
    }
}

pub fn apply_tool_commands(mut events: EventReader<ToolCommandEvent>, mut ctx: ToolContext) {
    for event in events.read() {
        debug!("Tool command {:?} from {:?}", event.command, event.source);
        ctx.run(event.command.clone());
    }
}

/// Apply finished path requests on the main schedule.
pub fn poll_path_results(mut ctx: ToolContext) {
    while let Some((token, result)) = ctx.planner.poll() {
        let ToolContext {
            manager,
            engine,
            bounds,
            ..
        } = &mut ctx;
        let outcome = manager.apply_path_result(engine, bounds, token, result);
        ctx.publish(outcome);
    }
}

/// Forward info panel changes to the host page.
pub fn publish_info_changes(
    manager: Res<ToolManager>,
    mut rpc: ResMut<WebRpcInterface>,
    mut last: Local<String>,
) {
    if !manager.is_changed() || manager.info().text == *last {
        return;
    }
    *last = manager.info().text.clone();
    rpc.send_notification(
        "info_changed",
        serde_json::json!({
            "text": manager.info().text,
            "hazard": manager.info().hazard.map(|h| h.label()),
        }),
    );
}

/// Reflect context-menu suppression on the primary window.
pub fn sync_context_menu(
    canvas: Res<CanvasInputState>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    if !canvas.is_changed() {
        return;
    }
    if let Ok(mut window) = windows.single_mut() {
        window.prevent_default_event_handling = canvas.context_menu_suppressed;
    }
}
