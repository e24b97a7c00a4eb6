use crate::engine::scene::landing_zones::LandingZone;
use crate::error::PathPlanningError;
use crate::tools::path_planning::{DistanceMetric, PathPlanner, PathResponse, PathResult};
use crate::tools::tool_manager::{
    TerrainView, ToolCommand, ToolCommandEvent, ToolKey, ToolManager, ToolSelectionSource,
    ToolType,
};
use bevy::diagnostic::{DiagnosticsStore, FrameTimeDiagnosticsPlugin};
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use serde::{Deserialize, Serialize};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsValue;

#[cfg(target_arch = "wasm32")]
use web_sys::{MessageEvent, window};

/// JSON-RPC 2.0 request structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcResponse {
    pub jsonrpc: String,
    pub result: Option<serde_json::Value>,
    pub error: Option<RpcError>,
    pub id: Option<serde_json::Value>,
}

/// JSON-RPC 2.0 notification structure for one-way communication.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RpcNotification {
    pub jsonrpc: String,
    pub method: String,
    pub params: serde_json::Value,
}

/// JSON-RPC 2.0 error object.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Outgoing RPC traffic to the host page, flushed once per frame.
#[derive(Resource, Default)]
pub struct WebRpcInterface {
    outgoing_notifications: Vec<RpcNotification>,
    outgoing_responses: Vec<RpcResponse>,
}

impl WebRpcInterface {
    /// Send notification to the host page without expecting a response.
    pub fn send_notification(&mut self, method: &str, params: serde_json::Value) {
        self.outgoing_notifications.push(RpcNotification {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
        });
    }

    fn queue_response(&mut self, response: RpcResponse) {
        self.outgoing_responses.push(response);
    }

    /// Method names of queued notifications, oldest first.
    pub fn pending_notifications(&self) -> impl Iterator<Item = &str> {
        self.outgoing_notifications.iter().map(|n| n.method.as_str())
    }
}

/// Plugin establishing the JSON-RPC channel for iframe deployment.
pub struct WebRpcPlugin;

impl Plugin for WebRpcPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WebRpcInterface>()
            .add_event::<IncomingRpcMessage>()
            .add_systems(
                Update,
                (process_incoming_messages, handle_rpc_messages).chain(),
            )
            .add_systems(PostUpdate, send_outgoing_messages);

        #[cfg(target_arch = "wasm32")]
        app.add_systems(Startup, setup_message_listener);
    }
}

#[cfg(target_arch = "wasm32")]
fn setup_message_listener(mut commands: Commands) {
    use std::sync::Arc;
    use std::sync::Mutex;

    let message_queue: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let queue_clone = message_queue.clone();

    let closure = Closure::wrap(Box::new(move |event: MessageEvent| {
        if let Ok(data) = event.data().dyn_into::<js_sys::JsString>() {
            let message_str: String = data.into();
            if message_str.contains("jsonrpc") {
                if let Ok(mut queue) = queue_clone.lock() {
                    queue.push(message_str);
                }
            }
        }
    }) as Box<dyn FnMut(MessageEvent)>);

    let Some(window) = window() else {
        error!("Window object not available; RPC listener not installed");
        return;
    };
    if let Err(e) =
        window.add_event_listener_with_callback("message", closure.as_ref().unchecked_ref())
    {
        error!("Failed to register message listener: {:?}", e);
        return;
    }

    // JS owns the closure from here on.
    closure.forget();
    commands.insert_resource(MessageQueue(message_queue));
}

#[derive(Resource)]
struct MessageQueue(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

/// Raw message received from the host page.
#[derive(Event)]
struct IncomingRpcMessage {
    content: String,
}

fn process_incoming_messages(
    message_queue: Option<Res<MessageQueue>>,
    mut message_events: EventWriter<IncomingRpcMessage>,
) {
    let Some(queue_res) = message_queue else {
        return;
    };

    let messages = if let Ok(mut queue) = queue_res.0.lock() {
        std::mem::take(&mut *queue)
    } else {
        Vec::new()
    };

    for message_str in messages {
        message_events.write(IncomingRpcMessage {
            content: message_str,
        });
    }
}

/// World state the RPC handlers read or feed.
#[derive(SystemParam)]
struct RpcContext<'w, 's> {
    diagnostics: Res<'w, DiagnosticsStore>,
    tool_events: EventWriter<'w, ToolCommandEvent>,
    manager: Option<Res<'w, ToolManager>>,
    planner: Option<ResMut<'w, PathPlanner>>,
    landing_zones: Query<'w, 's, &'static LandingZone>,
}

fn handle_rpc_messages(
    mut events: EventReader<IncomingRpcMessage>,
    mut rpc_interface: ResMut<WebRpcInterface>,
    mut ctx: RpcContext,
) {
    for event in events.read() {
        match serde_json::from_str::<RpcRequest>(&event.content) {
            Ok(request) => {
                debug!("Processing RPC method: {}", request.method);
                if let Some(response) = handle_rpc_request(&request, &mut ctx) {
                    rpc_interface.queue_response(response);
                }
            }
            Err(parse_error) => {
                warn!("RPC parse error: {}", parse_error);
            }
        }
    }
}

/// Handle one request. Calls without an id are notifications: they are
/// executed but never answered.
fn handle_rpc_request(request: &RpcRequest, ctx: &mut RpcContext) -> Option<RpcResponse> {
    let result = match request.method.as_str() {
        "tool_selection" => {
            parse_tool(&request.params).map(|tool| send_command(ctx, ToolCommand::Toggle(tool)))
        }
        "clear_tool" => Ok(send_command(ctx, ToolCommand::Key(ToolKey::Escape))),
        "set_max_slope" => parse_max_slope(&request.params)
            .map(|value| send_command(ctx, ToolCommand::SetMaxSlope(value))),
        "recalculate_path" => Ok(send_command(ctx, ToolCommand::RecalculatePath)),
        "set_terrain_view" => parse_view(&request.params)
            .map(|view| send_command(ctx, ToolCommand::SetView(view))),
        "set_distance_metric" => parse_metric(&request.params)
            .map(|metric| send_command(ctx, ToolCommand::SetDistanceMetric(metric))),
        "reset_camera" => Ok(send_command(ctx, ToolCommand::Key(ToolKey::ResetCamera))),
        "path_response" => handle_path_response(&request.params, ctx),
        "get_tool_state" => handle_get_tool_state(ctx),
        "get_landing_zones" => Ok(handle_get_landing_zones(ctx)),
        "get_fps" => handle_get_fps(&ctx.diagnostics),
        _ => {
            warn!("Unknown RPC method: {}", request.method);
            let id = request.id.clone()?;
            return Some(create_error_response(
                id,
                -32601,
                "Method not found",
                Some(serde_json::json!({"method": request.method})),
            ));
        }
    };

    let id = request.id.clone()?;
    Some(match result {
        Ok(result_value) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: Some(result_value),
            error: None,
            id: Some(id),
        },
        Err(error) => RpcResponse {
            jsonrpc: "2.0".to_string(),
            result: None,
            error: Some(error),
            id: Some(id),
        },
    })
}

fn send_command(ctx: &mut RpcContext, command: ToolCommand) -> serde_json::Value {
    info!("RPC tool command: {:?}", command);
    ctx.tool_events.write(ToolCommandEvent {
        command,
        source: ToolSelectionSource::Rpc,
    });
    serde_json::json!({ "success": true })
}

fn parse_tool(params: &serde_json::Value) -> Result<ToolType, RpcError> {
    #[derive(Deserialize)]
    struct ToolSelectionParams {
        tool: String,
    }

    let tool_params = serde_json::from_value::<ToolSelectionParams>(params.clone())
        .map_err(|_| RpcError::invalid_params("Expected 'tool' parameter"))?;
    ToolType::from_string(&tool_params.tool)
        .ok_or_else(|| RpcError::invalid_params(&format!("Unknown tool: {}", tool_params.tool)))
}

fn parse_max_slope(params: &serde_json::Value) -> Result<f32, RpcError> {
    params
        .get("value")
        .or_else(|| params.get("max_slope"))
        .and_then(serde_json::Value::as_f64)
        .map(|v| v as f32)
        .ok_or_else(|| RpcError::invalid_params("Expected numeric 'value' parameter"))
}

fn parse_view(params: &serde_json::Value) -> Result<TerrainView, RpcError> {
    let name = params
        .get("view")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| RpcError::invalid_params("Expected 'view' parameter"))?;
    TerrainView::from_string(name)
        .ok_or_else(|| RpcError::invalid_params(&format!("Unknown view: {name}")))
}

fn parse_metric(params: &serde_json::Value) -> Result<DistanceMetric, RpcError> {
    let name = params
        .get("metric")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| RpcError::invalid_params("Expected 'metric' parameter"))?;
    DistanceMetric::from_string(name)
        .ok_or_else(|| RpcError::invalid_params(&format!("Unknown metric: {name}")))
}

/// Host reply to a `path_request` notification.
#[derive(Deserialize)]
struct PathResponseParams {
    token: u64,
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    error: Option<String>,
    #[serde(flatten)]
    response: PathResponse,
}

/// Convert host reply params into the planner's result type.
fn path_result_from_params(params: &serde_json::Value) -> Result<(u64, PathResult), RpcError> {
    let reply = serde_json::from_value::<PathResponseParams>(params.clone())
        .map_err(|e| RpcError::invalid_params(&format!("Invalid path response: {e}")))?;

    let result = match (reply.status, reply.error) {
        (Some(status), _) if !(200..300).contains(&status) => {
            Err(PathPlanningError::Status(status))
        }
        (_, Some(error)) => Err(PathPlanningError::Transport(error)),
        _ => Ok(reply.response),
    };
    Ok((reply.token, result))
}

fn handle_path_response(
    params: &serde_json::Value,
    ctx: &mut RpcContext,
) -> Result<serde_json::Value, RpcError> {
    let (token, result) = path_result_from_params(params)?;
    let planner = ctx
        .planner
        .as_mut()
        .ok_or_else(|| RpcError::internal_error("Path planner not ready"))?;
    let accepted = planner.deliver(token, result);
    Ok(serde_json::json!({ "accepted": accepted }))
}

fn handle_get_tool_state(ctx: &RpcContext) -> Result<serde_json::Value, RpcError> {
    let manager = ctx
        .manager
        .as_ref()
        .ok_or_else(|| RpcError::internal_error("Tools not ready"))?;
    Ok(tool_state_json(manager))
}

/// Snapshot used by `get_tool_state` and `tool_state_changed`.
pub fn tool_state_json(manager: &ToolManager) -> serde_json::Value {
    serde_json::json!({
        "active_tool": manager.active_tool().map(|t| t.to_string()),
        "stage": manager.stage(),
        "view": manager.view(),
        "max_slope": manager.max_slope_deg(),
        "distance_metric": manager.distance_metric(),
        "path_options_visible": manager.path_options_visible(),
        "info": manager.info().text,
    })
}

fn handle_get_landing_zones(ctx: &RpcContext) -> serde_json::Value {
    let mut zones: Vec<&LandingZone> = ctx.landing_zones.iter().collect();
    zones.sort_by_key(|zone| zone.id);
    serde_json::json!({ "landing_zones": zones })
}

fn handle_get_fps(diagnostics: &DiagnosticsStore) -> Result<serde_json::Value, RpcError> {
    let fps = diagnostics
        .get(&FrameTimeDiagnosticsPlugin::FPS)
        .and_then(|fps_diagnostic| fps_diagnostic.smoothed())
        .unwrap_or(0.0) as f32;

    Ok(serde_json::json!({
        "fps": fps
    }))
}

fn create_error_response(
    id: serde_json::Value,
    code: i32,
    message: &str,
    data: Option<serde_json::Value>,
) -> RpcResponse {
    RpcResponse {
        jsonrpc: "2.0".to_string(),
        result: None,
        error: Some(RpcError {
            code,
            message: message.to_string(),
            data,
        }),
        id: Some(id),
    }
}

/// Send queued notifications and responses to the host page.
fn send_outgoing_messages(mut rpc_interface: ResMut<WebRpcInterface>) {
    for notification in rpc_interface.outgoing_notifications.drain(..) {
        send_message_to_parent(&notification);
    }

    for response in rpc_interface.outgoing_responses.drain(..) {
        send_message_to_parent(&response);
    }
}

fn send_message_to_parent<T: Serialize>(message: &T) {
    #[cfg(target_arch = "wasm32")]
    {
        match serde_json::to_string(message) {
            Ok(json) => {
                if let Some(window) = window() {
                    if let Some(parent) = window.parent().ok().flatten() {
                        if let Err(e) = parent.post_message(&JsValue::from_str(&json), "*") {
                            error!("Failed to send message to parent: {:?}", e);
                        }
                    } else {
                        warn!("No parent window available for message transmission");
                    }
                } else {
                    error!("Window object not available");
                }
            }
            Err(e) => {
                error!("Failed to serialize message: {}", e);
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
    }
}

/// Standard RPC error codes and constructors.
impl RpcError {
    pub fn invalid_params(message: &str) -> Self {
        Self {
            code: -32602,
            message: message.to_string(),
            data: None,
        }
    }

    pub fn internal_error(message: &str) -> Self {
        Self {
            code: -32603,
            message: message.to_string(),
            data: None,
        }
    }
}
