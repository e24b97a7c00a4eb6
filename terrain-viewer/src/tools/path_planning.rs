use crate::engine::assets::bounds::{PixelCoord, TerrainBounds};
use crate::engine::assets::terrain_manifest::PathServiceConfig;
use crate::error::PathPlanningError;
use crate::tools::elevation::resolve_pixel;
use crate::tools::engine::TerrainPicker;
use bevy::prelude::*;
use bevy::tasks::futures_lite::future;
use bevy::tasks::{IoTaskPool, Task, TaskPool};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;

/// Body of `POST /find_rover_path`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathRequest {
    pub start_pixel: [i32; 2],
    pub end_pixel: [i32; 2],
    pub max_slope: f32,
}

impl PathRequest {
    pub fn new(start: PixelCoord, end: PixelCoord, max_slope: f32) -> Self {
        Self {
            start_pixel: start.to_array(),
            end_pixel: end.to_array(),
            max_slope,
        }
    }
}

/// Successful service reply. An absent or null `path` is treated as empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathResponse {
    #[serde(default)]
    pub path: Option<Vec<[i32; 2]>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PathResponse {
    pub fn pixels(&self) -> &[[i32; 2]] {
        self.path.as_deref().unwrap_or_default()
    }
}

pub type PathResult = Result<PathResponse, PathPlanningError>;

pub fn parse_path_response(body: &str) -> PathResult {
    serde_json::from_str(body).map_err(|e| PathPlanningError::Decode(e.to_string()))
}

/// Blocking path-finding backend. Calls run on the IO task pool.
pub trait PathService: Send + Sync + 'static {
    fn find_path(&self, request: &PathRequest) -> PathResult;
}

/// HTTP client for the rover path endpoint.
#[cfg(not(target_arch = "wasm32"))]
pub struct HttpPathService {
    client: reqwest::blocking::Client,
    url: String,
    timeout: std::time::Duration,
}

#[cfg(not(target_arch = "wasm32"))]
impl HttpPathService {
    pub fn new(url: String, timeout: std::time::Duration) -> Result<Self, PathPlanningError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PathPlanningError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            url,
            timeout,
        })
    }

    fn transport_error(&self, error: reqwest::Error) -> PathPlanningError {
        if error.is_timeout() {
            PathPlanningError::Timeout(self.timeout)
        } else {
            PathPlanningError::Transport(error.to_string())
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl PathService for HttpPathService {
    fn find_path(&self, request: &PathRequest) -> PathResult {
        let response = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PathPlanningError::Status(status.as_u16()));
        }

        let body = response.text().map_err(|e| self.transport_error(e))?;
        parse_path_response(&body)
    }
}

/// Stand-in used when no HTTP client could be built.
pub struct OfflinePathService {
    reason: String,
}

impl OfflinePathService {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl PathService for OfflinePathService {
    fn find_path(&self, _request: &PathRequest) -> PathResult {
        Err(PathPlanningError::Transport(self.reason.clone()))
    }
}

/// How requests leave the viewer.
#[derive(Clone)]
pub enum PathTransport {
    /// Run a service call on the IO task pool.
    Service(Arc<dyn PathService>),
    /// Forward the request to the embedding page over RPC and wait for
    /// it to deliver the reply.
    Host,
}

struct PendingPath {
    token: u64,
    task: Task<PathResult>,
}

/// Owns the single in-flight path request.
///
/// Dispatching drops the previous task and its result is discarded. A
/// blocking call already running on an IO worker keeps that worker busy
/// until the service answers or the request timeout fires. Replies are
/// tagged with the token they were issued under; the tool state machine
/// discards tokens that are no longer current.
#[derive(Resource)]
pub struct PathPlanner {
    transport: PathTransport,
    pending: Option<PendingPath>,
    awaiting_host: Option<u64>,
    delivered: VecDeque<(u64, PathResult)>,
}

impl PathPlanner {
    pub fn new(service: Arc<dyn PathService>) -> Self {
        Self::with_transport(PathTransport::Service(service))
    }

    pub fn host() -> Self {
        Self::with_transport(PathTransport::Host)
    }

    fn with_transport(transport: PathTransport) -> Self {
        Self {
            transport,
            pending: None,
            awaiting_host: None,
            delivered: VecDeque::new(),
        }
    }

    /// HTTP on native targets; browser builds route through the host page.
    pub fn from_config(config: &PathServiceConfig) -> Self {
        #[cfg(not(target_arch = "wasm32"))]
        {
            let url = config.resolved_url();
            match HttpPathService::new(url.clone(), config.timeout()) {
                Ok(service) => {
                    info!("Path service endpoint: {} (timeout {:?})", url, config.timeout());
                    Self::new(Arc::new(service))
                }
                Err(e) => {
                    warn!("Path service unavailable: {}", e);
                    Self::new(Arc::new(OfflinePathService::new(e.to_string())))
                }
            }
        }

        #[cfg(target_arch = "wasm32")]
        {
            let _ = config;
            Self::host()
        }
    }

    pub fn uses_host(&self) -> bool {
        matches!(self.transport, PathTransport::Host)
    }

    /// Start a request, replacing whatever was in flight. Returns `true`
    /// when the caller must forward the request to the host page.
    pub fn dispatch(&mut self, token: u64, request: PathRequest) -> bool {
        self.cancel();
        match &self.transport {
            PathTransport::Service(service) => {
                let service = Arc::clone(service);
                let task = IoTaskPool::get_or_init(TaskPool::new)
                    .spawn(async move { service.find_path(&request) });
                self.pending = Some(PendingPath { token, task });
                false
            }
            PathTransport::Host => {
                self.awaiting_host = Some(token);
                true
            }
        }
    }

    /// Reply from the host page. Ignored unless it answers the request
    /// currently awaited.
    pub fn deliver(&mut self, token: u64, result: PathResult) -> bool {
        if self.awaiting_host != Some(token) {
            debug!("Dropping host path reply for stale token {}", token);
            return false;
        }
        self.awaiting_host = None;
        self.delivered.push_back((token, result));
        true
    }

    /// Non-blocking check for a finished request.
    pub fn poll(&mut self) -> Option<(u64, PathResult)> {
        if let Some(ready) = self.delivered.pop_front() {
            return Some(ready);
        }

        let pending = self.pending.as_mut()?;
        let result = future::block_on(future::poll_once(&mut pending.task))?;
        let token = pending.token;
        self.pending = None;
        Some((token, result))
    }

    pub fn cancel(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("Discarding result of path request {}", pending.token);
        }
        self.awaiting_host = None;
        self.delivered.clear();
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some() || self.awaiting_host.is_some()
    }
}

/// Which distance the path summary reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// Sum of segment lengths along the polyline.
    #[default]
    Cumulative,
    /// Direct distance between the first and last point.
    StraightLine,
}

impl DistanceMetric {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "cumulative" => Some(Self::Cumulative),
            "straight_line" | "straight" => Some(Self::StraightLine),
            _ => None,
        }
    }
}

/// Path drawn on the terrain surface.
#[derive(Debug, Clone, PartialEq)]
pub struct PathPolyline {
    pub points: Vec<Vec3>,
}

impl PathPolyline {
    pub fn steps(&self) -> usize {
        self.points.len()
    }

    pub fn cumulative_length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    pub fn straight_line_distance(&self) -> f32 {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => first.distance(*last),
            _ => 0.0,
        }
    }

    pub fn distance(&self, metric: DistanceMetric) -> f32 {
        match metric {
            DistanceMetric::Cumulative => self.cumulative_length(),
            DistanceMetric::StraightLine => self.straight_line_distance(),
        }
    }
}

/// Lift each returned pixel onto the terrain surface.
pub fn build_polyline<P>(picker: &mut P, bounds: &TerrainBounds, pixels: &[[i32; 2]]) -> PathPolyline
where
    P: TerrainPicker + ?Sized,
{
    let points = pixels
        .iter()
        .map(|&[px, py]| resolve_pixel(picker, bounds, px, py))
        .collect();
    PathPolyline { points }
}
