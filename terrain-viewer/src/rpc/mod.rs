//! JSON-RPC 2.0 communication layer for iframe deployment.
//!
//! The viewer runs inside an iframe; the host page drives tools and
//! receives state through `postMessage`.
//!
//! ## Message Flow
//!
//! ```text
//! Host page (parent)  <──postMessage──>  Viewer (iframe)
//!        │                                      │
//!        ├─ Request (with ID) ────────────────> │
//!        │                                      ├─ ToolCommandEvent
//!        │ <─────────────── Response (with ID) ─┤
//!        │                                      │
//!        │ <──────── Notification (no ID) ──────┤
//! ```
//!
//! Requests without an `id` are executed as notifications and never answered.
//!
//! ## Methods
//!
//! ### Tools
//! - `tool_selection` `{ tool: "distance" | "path" }`: toggle a tool
//! - `clear_tool`: reset both tools
//! - `set_max_slope` `{ value }`: clamp to `[0, 90]` and apply to the path session
//! - `recalculate_path`: re-issue the request for the placed start and end
//! - `set_terrain_view` `{ view: "textured" | "slope" | "hazard" }`
//! - `set_distance_metric` `{ metric: "cumulative" | "straight_line" }`
//! - `reset_camera`
//! - `get_tool_state`, `get_landing_zones`
//!
//! ### Path transport (browser builds)
//! The viewer sends `path_request` `{ token, request }`; the host performs the
//! HTTP call and answers with `path_response`
//! `{ token, path?, message?, status?, error? }`. Replies for a superseded
//! token are dropped.
//!
//! ### Diagnostics
//! - `get_fps`
//!
//! ## Notifications
//!
//! `tool_state_changed`, `tool_notice`, `measure_completed`, `path_started`,
//! `path_request`, `path_result`, `info_changed`, `fps_update`.
//!
//! ## Error Handling
//!
//! Standard JSON-RPC 2.0 error codes:
//! - `-32601`: Method not found
//! - `-32602`: Invalid params
//! - `-32603`: Internal error

/// JSON-RPC 2.0 bidirectional communication system.
///
/// Handles request-response patterns, notifications, and WASM message listeners.
pub mod web_rpc;
