use crate::engine::assets::bounds::{PixelCoord, TerrainBounds};
use crate::tools::engine::{ArtifactHandle, ArtifactKind, ToolEngine};
use crate::tools::measure::{Measurement, format_point};
use crate::tools::path_planning::{DistanceMetric, PathRequest, PathResult, build_polyline};
use crate::tools::sampler::{AttributeSampler, HazardStatus, format_hazard, format_slope};
use bevy::prelude::*;
use constants::path::DEFAULT_MAX_SLOPE_DEGREES;
use constants::raster::SLOPE_MAX_DEGREES;
use serde::{Deserialize, Serialize};

pub const HOVER_PROMPT: &str = "Hover over terrain to see elevation";
pub const DEFAULT_NO_PATH_MESSAGE: &str = "No path found.";

/// Enumeration of available tools in the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolType {
    Distance,
    Path,
}

impl ToolType {
    /// Convert string identifier to tool type for RPC compatibility.
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "distance" | "measure" => Some(Self::Distance),
            "path" | "path_planning" => Some(Self::Path),
            _ => None,
        }
    }

    /// Convert tool type to string identifier for frontend communication.
    pub fn to_string(&self) -> &'static str {
        match self {
            Self::Distance => "distance",
            Self::Path => "path",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Distance => "Distance Tool",
            Self::Path => "Path Planning Tool",
        }
    }
}

/// Material currently applied to the terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TerrainView {
    #[default]
    Textured,
    Slope,
    Hazard,
}

impl TerrainView {
    pub fn from_string(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "textured" | "normal" => Some(Self::Textured),
            "slope" => Some(Self::Slope),
            "hazard" => Some(Self::Hazard),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Textured => "View: Normal (Textured)",
            Self::Slope => "View: Slope Map",
            Self::Hazard => "View: Hazard Map",
        }
    }

    /// Tool artifacts and landing zones are only drawn over the textured view.
    pub fn shows_overlays(&self) -> bool {
        matches!(self, Self::Textured)
    }
}

/// Keyboard actions understood by the tool state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKey {
    Escape,
    ResetDistance,
    ResetPath,
    SlopeView,
    HazardView,
    TexturedView,
    ResetCamera,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceSession {
    first_point: Option<Vec3>,
    line: Option<ArtifactHandle>,
    last: Option<Measurement>,
}

impl DistanceSession {
    pub fn first_point(&self) -> Option<Vec3> {
        self.first_point
    }

    pub fn last_measurement(&self) -> Option<&Measurement> {
        self.last.as_ref()
    }

    fn artifacts(&self) -> impl Iterator<Item = ArtifactHandle> {
        self.line.into_iter()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PathSession {
    start_pixel: Option<PixelCoord>,
    end_pixel: Option<PixelCoord>,
    max_slope_deg: f32,
    start_marker: Option<ArtifactHandle>,
    end_marker: Option<ArtifactHandle>,
    polyline: Option<ArtifactHandle>,
    request_token: Option<u64>,
}

impl PathSession {
    fn new(max_slope_deg: f32) -> Self {
        Self {
            start_pixel: None,
            end_pixel: None,
            max_slope_deg,
            start_marker: None,
            end_marker: None,
            polyline: None,
            request_token: None,
        }
    }

    pub fn start_pixel(&self) -> Option<PixelCoord> {
        self.start_pixel
    }

    pub fn end_pixel(&self) -> Option<PixelCoord> {
        self.end_pixel
    }

    pub fn max_slope_deg(&self) -> f32 {
        self.max_slope_deg
    }

    pub fn request_token(&self) -> Option<u64> {
        self.request_token
    }

    fn stage(&self) -> u8 {
        match (self.start_pixel, self.end_pixel) {
            (None, _) => 0,
            (Some(_), None) => 1,
            (Some(_), Some(_)) => 2,
        }
    }

    fn artifacts(&self) -> impl Iterator<Item = ArtifactHandle> {
        self.start_marker
            .into_iter()
            .chain(self.end_marker)
            .chain(self.polyline)
    }
}

/// Exclusive tool state. Holding the session inside the variant makes two
/// simultaneously active tools unrepresentable.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ActiveTool {
    #[default]
    Idle,
    Distance(DistanceSession),
    Path(PathSession),
}

/// Compact view of `ActiveTool` with click-sequence progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tool", content = "stage", rename_all = "lowercase")]
pub enum ToolStage {
    Idle,
    Distance(u8),
    Path(u8),
}

/// Text shown in the info panel. `hazard` colours the hover readout.
#[derive(Debug, Clone, PartialEq)]
pub struct InfoText {
    pub text: String,
    pub hazard: Option<HazardStatus>,
}

impl InfoText {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            hazard: None,
        }
    }
}

impl Default for InfoText {
    fn default() -> Self {
        Self::plain(HOVER_PROMPT)
    }
}

/// Path request ready to be handed to the planner.
#[derive(Debug, Clone, PartialEq)]
pub struct PathDispatch {
    pub token: u64,
    pub request: PathRequest,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PathReport {
    Found {
        steps: usize,
        distance: f32,
        cumulative_length: f32,
        straight_line_distance: f32,
    },
    Empty {
        message: String,
    },
    Failed {
        error: String,
    },
}

/// Result of a single transition, consumed by the app layer for
/// notifications and side effects outside the tool engine.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Ignored,
    Activated(ToolType),
    Deactivated(ToolType),
    Rejected { requested: ToolType, notice: String },
    Reset,
    DistanceStarted(Vec3),
    Measured(Measurement),
    PathStartPlaced(PixelCoord),
    PathRequested(PathDispatch),
    ViewChanged(TerrainView),
    CameraReset,
    MaxSlopeChanged(f32),
    PathApplied(PathReport),
    StaleResult(u64),
}

/// Resource owning the active tool, its session and the shared
/// view settings. All mutation goes through the transition methods.
#[derive(Resource, Debug)]
pub struct ToolManager {
    active: ActiveTool,
    max_slope_deg: f32,
    view: TerrainView,
    distance_metric: DistanceMetric,
    next_token: u64,
    info: InfoText,
    notice: Option<String>,
}

impl Default for ToolManager {
    fn default() -> Self {
        Self::with_max_slope(DEFAULT_MAX_SLOPE_DEGREES)
    }
}

impl ToolManager {
    pub fn with_max_slope(max_slope_deg: f32) -> Self {
        Self {
            active: ActiveTool::Idle,
            max_slope_deg: clamp_slope(max_slope_deg),
            view: TerrainView::default(),
            distance_metric: DistanceMetric::default(),
            next_token: 0,
            info: InfoText::default(),
            notice: None,
        }
    }

    pub fn active(&self) -> &ActiveTool {
        &self.active
    }

    /// Get currently active tool type.
    pub fn active_tool(&self) -> Option<ToolType> {
        match self.active {
            ActiveTool::Idle => None,
            ActiveTool::Distance(_) => Some(ToolType::Distance),
            ActiveTool::Path(_) => Some(ToolType::Path),
        }
    }

    /// Check if specific tool is currently active.
    pub fn is_tool_active(&self, tool_type: ToolType) -> bool {
        self.active_tool() == Some(tool_type)
    }

    pub fn stage(&self) -> ToolStage {
        match &self.active {
            ActiveTool::Idle => ToolStage::Idle,
            ActiveTool::Distance(s) => ToolStage::Distance(u8::from(s.first_point.is_some())),
            ActiveTool::Path(s) => ToolStage::Path(s.stage()),
        }
    }

    pub fn view(&self) -> TerrainView {
        self.view
    }

    pub fn max_slope_deg(&self) -> f32 {
        self.max_slope_deg
    }

    pub fn distance_metric(&self) -> DistanceMetric {
        self.distance_metric
    }

    pub fn set_distance_metric(&mut self, metric: DistanceMetric) {
        self.distance_metric = metric;
    }

    pub fn info(&self) -> &InfoText {
        &self.info
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Token of the path request the state machine is waiting on.
    pub fn pending_path_token(&self) -> Option<u64> {
        match &self.active {
            ActiveTool::Path(s) => s.request_token,
            _ => None,
        }
    }

    /// Whether the path options panel should be shown.
    pub fn path_options_visible(&self) -> bool {
        self.is_tool_active(ToolType::Path) && self.view.shows_overlays()
    }

    pub fn toggle(&mut self, tool: ToolType, engine: &mut impl ToolEngine) -> ToolOutcome {
        let notice = match (&self.active, tool) {
            (ActiveTool::Path(_), ToolType::Distance) => Some("Please deactivate Path Planning Tool first."),
            (ActiveTool::Distance(_), ToolType::Path) => Some("Please deactivate Distance Tool first."),
            _ => None,
        };
        if let Some(notice) = notice {
            warn!("{} rejected: {}", tool.label(), notice);
            self.notice = Some(notice.to_string());
            return ToolOutcome::Rejected {
                requested: tool,
                notice: notice.to_string(),
            };
        }

        self.notice = None;
        if self.is_tool_active(tool) {
            self.reset_all(engine);
            info!("{} deactivated", tool.label());
            return ToolOutcome::Deactivated(tool);
        }

        let (session, prompt) = match tool {
            ToolType::Distance => (
                ActiveTool::Distance(DistanceSession::default()),
                "Click first point on terrain.",
            ),
            ToolType::Path => (
                ActiveTool::Path(PathSession::new(self.max_slope_deg)),
                "Click start point on terrain.",
            ),
        };
        self.active = session;
        engine.detach_camera_control();
        engine.set_context_menu_suppressed(true);
        self.info = InfoText::plain(format!("{}: {}", tool.label(), prompt));
        info!("{} activated", tool.label());
        ToolOutcome::Activated(tool)
    }

    /// Pointer click. `hit` is the terrain intersection under the cursor.
    pub fn click(
        &mut self,
        engine: &mut impl ToolEngine,
        bounds: &TerrainBounds,
        sampler: &AttributeSampler,
        hit: Option<Vec3>,
    ) -> ToolOutcome {
        let Some(point) = hit else {
            if matches!(self.active, ActiveTool::Idle) {
                return ToolOutcome::Ignored;
            }
            self.reset_all(engine);
            self.info = InfoText::plain(format!(
                "{HOVER_PROMPT}\nTool Reset: Clicked outside terrain."
            ));
            info!("Tools reset: click outside terrain");
            return ToolOutcome::Reset;
        };

        self.notice = None;
        let visible = self.view.shows_overlays();
        match &mut self.active {
            ActiveTool::Idle => ToolOutcome::Ignored,
            ActiveTool::Distance(session) => match session.first_point.take() {
                None => {
                    session.first_point = Some(point);
                    self.info = InfoText::plain(format!(
                        "Distance Tool: First point set at {}.\nClick second point on terrain.",
                        format_point(point)
                    ));
                    ToolOutcome::DistanceStarted(point)
                }
                Some(first) => {
                    let measurement = Measurement::between(first, point, bounds, sampler);
                    if let Some(old) = session.line.take() {
                        engine.dispose_artifact(old);
                    }
                    let line = engine.create_polyline(&[first, point], ArtifactKind::MeasurementLine);
                    engine.set_artifact_visible(line, visible);
                    session.line = Some(line);
                    session.last = Some(measurement.clone());
                    self.info = InfoText::plain(format!("Distance Tool:\n{}", measurement.summary()));
                    info!(
                        "Measured {:.2} units, average slope {:.2}° ({} samples)",
                        measurement.distance, measurement.average_slope_deg, measurement.slope_samples
                    );
                    ToolOutcome::Measured(measurement)
                }
            },
            ActiveTool::Path(session) => {
                let pixel = bounds
                    .world_to_pixel(point)
                    .clamped(bounds.image_width, bounds.image_height);
                if session.stage() == 1 {
                    session.end_pixel = Some(pixel);
                    let marker = engine.create_marker(point, ArtifactKind::EndMarker);
                    engine.set_artifact_visible(marker, visible);
                    session.end_marker = Some(marker);

                    self.next_token += 1;
                    let token = self.next_token;
                    session.request_token = Some(token);
                    let request = PathRequest::new(
                        session.start_pixel.unwrap_or(pixel),
                        pixel,
                        session.max_slope_deg,
                    );
                    self.info = InfoText::plain(format!(
                        "Path Planning Tool: End point set at {}.\nCalculating path...",
                        format_point(point)
                    ));
                    info!(
                        "Path request {}: {:?} -> {:?} at max slope {}°",
                        token, request.start_pixel, request.end_pixel, request.max_slope
                    );
                    return ToolOutcome::PathRequested(PathDispatch { token, request });
                }

                // Stage 0, or a fresh start after a completed pair.
                for handle in session.artifacts().collect::<Vec<_>>() {
                    engine.dispose_artifact(handle);
                }
                *session = PathSession::new(session.max_slope_deg);
                session.start_pixel = Some(pixel);
                let marker = engine.create_marker(point, ArtifactKind::StartMarker);
                engine.set_artifact_visible(marker, visible);
                session.start_marker = Some(marker);
                self.info = InfoText::plain(format!(
                    "Path Planning Tool: Start point set at {}.\nClick end point on terrain.",
                    format_point(point)
                ));
                ToolOutcome::PathStartPlaced(pixel)
            }
        }
    }

    /// Hover readout, shown only while no tool is active.
    pub fn hover(&mut self, bounds: &TerrainBounds, sampler: &AttributeSampler, hit: Option<Vec3>) {
        if !matches!(self.active, ActiveTool::Idle) {
            return;
        }

        self.info = match hit {
            Some(point) => {
                let pixel = bounds.world_to_pixel(point);
                let slope = sampler.sample_slope(bounds, pixel);
                let hazard = sampler.sample_hazard(bounds, pixel);
                InfoText {
                    text: format!(
                        "Terrain Coordinates\nX: {:.2} units\nElevation (Y): {:.2} units\nZ: {:.2} units\nSlope Angle: {}\nHazard Status: {}",
                        point.x,
                        point.y,
                        point.z,
                        format_slope(slope),
                        format_hazard(hazard),
                    ),
                    hazard,
                }
            }
            None => InfoText::default(),
        };
    }

    pub fn handle_key(&mut self, key: ToolKey, engine: &mut impl ToolEngine) -> ToolOutcome {
        match key {
            ToolKey::Escape => {
                let was_active = self.active_tool().is_some();
                self.reset_all(engine);
                if was_active {
                    info!("All tools reset via Escape key");
                    ToolOutcome::Reset
                } else {
                    ToolOutcome::Ignored
                }
            }
            ToolKey::ResetDistance => self.reset_if_active(ToolType::Distance, engine),
            ToolKey::ResetPath => self.reset_if_active(ToolType::Path, engine),
            ToolKey::SlopeView => self.set_view(TerrainView::Slope, engine),
            ToolKey::HazardView => self.set_view(TerrainView::Hazard, engine),
            ToolKey::TexturedView => self.set_view(TerrainView::Textured, engine),
            ToolKey::ResetCamera => ToolOutcome::CameraReset,
        }
    }

    /// Switch terrain material. Tool state is untouched; only the
    /// visibility of session artifacts follows the view.
    pub fn set_view(&mut self, view: TerrainView, engine: &mut impl ToolEngine) -> ToolOutcome {
        self.view = view;
        let visible = view.shows_overlays();
        for handle in self.live_artifacts() {
            engine.set_artifact_visible(handle, visible);
        }
        debug!("{}", view.label());
        ToolOutcome::ViewChanged(view)
    }

    /// Clamp to `[0, 90]`; NaN becomes 0.
    pub fn set_max_slope(&mut self, value: f32) -> ToolOutcome {
        let clamped = clamp_slope(value);
        self.max_slope_deg = clamped;
        if let ActiveTool::Path(session) = &mut self.active {
            session.max_slope_deg = clamped;
        }
        ToolOutcome::MaxSlopeChanged(clamped)
    }

    /// Re-issue the request for the current start and end pixels.
    pub fn recalculate_path(&mut self) -> ToolOutcome {
        let ActiveTool::Path(session) = &mut self.active else {
            return ToolOutcome::Ignored;
        };
        let (Some(start), Some(end)) = (session.start_pixel, session.end_pixel) else {
            self.notice = Some("Place start and end points first.".to_string());
            return ToolOutcome::Ignored;
        };

        self.next_token += 1;
        let token = self.next_token;
        session.request_token = Some(token);
        self.notice = None;
        self.info = InfoText::plain("Path Planning Tool: Calculating path...");
        ToolOutcome::PathRequested(PathDispatch {
            token,
            request: PathRequest::new(start, end, session.max_slope_deg),
        })
    }

    /// Apply a planner reply. Replies for anything but the current request
    /// are dropped.
    pub fn apply_path_result(
        &mut self,
        engine: &mut impl ToolEngine,
        bounds: &TerrainBounds,
        token: u64,
        result: PathResult,
    ) -> ToolOutcome {
        let visible = self.view.shows_overlays();
        let metric = self.distance_metric;
        let ActiveTool::Path(session) = &mut self.active else {
            return ToolOutcome::StaleResult(token);
        };
        if session.request_token != Some(token) {
            debug!("Ignoring stale path result {}", token);
            return ToolOutcome::StaleResult(token);
        }
        session.request_token = None;

        if let Some(old) = session.polyline.take() {
            engine.dispose_artifact(old);
        }

        let report = match result {
            Ok(response) if !response.pixels().is_empty() => {
                let polyline = build_polyline(engine, bounds, response.pixels());
                let handle = engine.create_polyline(&polyline.points, ArtifactKind::PathLine);
                engine.set_artifact_visible(handle, visible);
                session.polyline = Some(handle);

                let distance = polyline.distance(metric);
                self.info = InfoText::plain(format!(
                    "Path Planning Tool: Path found with {} steps.\nTotal Distance: {:.2} units.",
                    polyline.steps(),
                    distance
                ));
                info!("Path {} drawn with {} steps", token, polyline.steps());
                PathReport::Found {
                    steps: polyline.steps(),
                    distance,
                    cumulative_length: polyline.cumulative_length(),
                    straight_line_distance: polyline.straight_line_distance(),
                }
            }
            Ok(response) => {
                let message = response
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| DEFAULT_NO_PATH_MESSAGE.to_string());
                self.info = InfoText::plain(format!("Path Planning Tool: {message}"));
                info!("Path {}: {}", token, message);
                PathReport::Empty { message }
            }
            Err(error) => {
                self.info = InfoText::plain(format!(
                    "Path Planning Tool: Error calculating path: {error}."
                ));
                warn!("Path {} failed: {}", token, error);
                PathReport::Failed {
                    error: error.to_string(),
                }
            }
        };
        ToolOutcome::PathApplied(report)
    }

    /// Dispose every artifact and return to `Idle` with camera control
    /// and the context menu restored.
    pub fn reset_all(&mut self, engine: &mut impl ToolEngine) {
        for handle in self.live_artifacts() {
            engine.dispose_artifact(handle);
        }
        self.active = ActiveTool::Idle;
        engine.attach_camera_control();
        engine.set_context_menu_suppressed(false);
        self.info = InfoText::default();
    }

    fn reset_if_active(&mut self, tool: ToolType, engine: &mut impl ToolEngine) -> ToolOutcome {
        if !self.is_tool_active(tool) {
            return ToolOutcome::Ignored;
        }
        self.reset_all(engine);
        info!("{} reset via keyboard", tool.label());
        ToolOutcome::Deactivated(tool)
    }

    fn live_artifacts(&self) -> Vec<ArtifactHandle> {
        match &self.active {
            ActiveTool::Idle => Vec::new(),
            ActiveTool::Distance(s) => s.artifacts().collect(),
            ActiveTool::Path(s) => s.artifacts().collect(),
        }
    }
}

fn clamp_slope(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, SLOPE_MAX_DEGREES)
    }
}

/// Commands accepted from keyboard, buttons and RPC.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCommand {
    Toggle(ToolType),
    Key(ToolKey),
    SetView(TerrainView),
    SetMaxSlope(f32),
    RecalculatePath,
    SetDistanceMetric(DistanceMetric),
}

/// Event carrying a tool command and where it came from.
#[derive(Event, Debug, Clone)]
pub struct ToolCommandEvent {
    pub command: ToolCommand,
    pub source: ToolSelectionSource,
}

/// Source of tool selection for debugging and conditional logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolSelectionSource {
    Rpc,
    Keyboard,
    Button,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::raster::RasterBuffer;
    use crate::error::PathPlanningError;
    use crate::tools::engine::fake::FakeEngine;
    use crate::tools::path_planning::PathResponse;
    use proptest::prelude::*;

    fn bounds() -> TerrainBounds {
        TerrainBounds {
            min_x: -100.0,
            max_x: 100.0,
            min_y: 0.0,
            max_y: 10.0,
            min_z: -50.0,
            max_z: 50.0,
            image_width: 512,
            image_height: 256,
        }
    }

    fn engine() -> FakeEngine {
        FakeEngine::flat(2.0, Vec2::new(-100.0, -50.0), Vec2::new(100.0, 50.0))
    }

    fn sampler() -> AttributeSampler {
        AttributeSampler::new(
            Some(RasterBuffer::uniform(512, 256, [170, 0, 0, 255])),
            Some(RasterBuffer::uniform(512, 256, [0, 255, 0, 255])),
        )
    }

    fn at(x: f32, z: f32) -> Option<Vec3> {
        Some(Vec3::new(x, 2.0, z))
    }

    /// Drive a path session to `Path{2}` and return the dispatched request.
    fn request_path(manager: &mut ToolManager, engine: &mut FakeEngine) -> PathDispatch {
        manager.toggle(ToolType::Path, engine);
        manager.click(engine, &bounds(), &sampler(), at(-50.0, 0.0));
        match manager.click(engine, &bounds(), &sampler(), at(50.0, 10.0)) {
            ToolOutcome::PathRequested(dispatch) => dispatch,
            other => panic!("expected path request, got {other:?}"),
        }
    }

    #[test]
    fn activation_detaches_camera_and_suppresses_menu() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        assert_eq!(
            manager.toggle(ToolType::Distance, &mut engine),
            ToolOutcome::Activated(ToolType::Distance)
        );
        assert_eq!(manager.stage(), ToolStage::Distance(0));
        assert!(!engine.camera_attached);
        assert!(engine.context_menu_suppressed);
        assert_eq!(manager.info().text, "Distance Tool: Click first point on terrain.");

        assert_eq!(
            manager.toggle(ToolType::Distance, &mut engine),
            ToolOutcome::Deactivated(ToolType::Distance)
        );
        assert_eq!(manager.stage(), ToolStage::Idle);
        assert!(engine.camera_attached);
        assert!(!engine.context_menu_suppressed);
        assert_eq!(manager.info().text, HOVER_PROMPT);
    }

    #[test]
    fn other_tool_is_rejected_while_one_is_active() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        manager.toggle(ToolType::Path, &mut engine);

        let outcome = manager.toggle(ToolType::Distance, &mut engine);
        assert_eq!(
            outcome,
            ToolOutcome::Rejected {
                requested: ToolType::Distance,
                notice: "Please deactivate Path Planning Tool first.".into(),
            }
        );
        assert_eq!(manager.active_tool(), Some(ToolType::Path));
        assert_eq!(manager.notice(), Some("Please deactivate Path Planning Tool first."));
    }

    #[test]
    fn third_click_starts_a_fresh_measurement() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        let (b, s) = (bounds(), sampler());
        manager.toggle(ToolType::Distance, &mut engine);

        manager.click(&mut engine, &b, &s, at(0.0, 0.0));
        assert_eq!(manager.stage(), ToolStage::Distance(1));
        let outcome = manager.click(&mut engine, &b, &s, at(3.0, 4.0));
        let ToolOutcome::Measured(m) = outcome else {
            panic!("expected measurement, got {outcome:?}");
        };
        assert_eq!(m.distance, 5.0);
        assert!((m.average_slope_deg - 60.0).abs() < 1e-4);
        assert_eq!(manager.stage(), ToolStage::Distance(0));
        assert_eq!(engine.live(ArtifactKind::MeasurementLine).len(), 1);

        assert_eq!(
            manager.click(&mut engine, &b, &s, at(10.0, 10.0)),
            ToolOutcome::DistanceStarted(Vec3::new(10.0, 2.0, 10.0))
        );
        manager.click(&mut engine, &b, &s, at(20.0, 10.0));
        // previous line replaced, never accumulated
        assert_eq!(engine.live(ArtifactKind::MeasurementLine).len(), 1);
        assert_eq!(engine.disposed.len(), 1);
    }

    #[test]
    fn click_off_terrain_resets_everything() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        let dispatch = request_path(&mut manager, &mut engine);
        assert_eq!(engine.live_count(), 2);

        assert_eq!(
            manager.click(&mut engine, &bounds(), &sampler(), None),
            ToolOutcome::Reset
        );
        assert_eq!(manager.stage(), ToolStage::Idle);
        assert_eq!(engine.live_count(), 0);
        assert!(engine.camera_attached);
        assert!(manager.info().text.ends_with("Tool Reset: Clicked outside terrain."));

        // reply for the abandoned request must not draw anything
        let late = Ok(PathResponse {
            path: Some(vec![[0, 0], [1, 1]]),
            message: None,
        });
        assert_eq!(
            manager.apply_path_result(&mut engine, &bounds(), dispatch.token, late),
            ToolOutcome::StaleResult(dispatch.token)
        );
        assert_eq!(engine.live_count(), 0);
    }

    #[test]
    fn idle_click_off_terrain_is_ignored() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        assert_eq!(
            manager.click(&mut engine, &bounds(), &sampler(), None),
            ToolOutcome::Ignored
        );
    }

    #[test]
    fn path_request_carries_pixels_and_slope() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        manager.set_max_slope(30.0);
        let dispatch = request_path(&mut manager, &mut engine);
        let b = bounds();
        assert_eq!(
            dispatch.request.start_pixel,
            b.world_to_pixel(Vec3::new(-50.0, 0.0, 0.0)).to_array()
        );
        assert_eq!(dispatch.request.max_slope, 30.0);
        assert_eq!(manager.stage(), ToolStage::Path(2));
        assert_eq!(manager.pending_path_token(), Some(dispatch.token));
        assert!(manager.info().text.ends_with("Calculating path..."));
    }

    #[test]
    fn found_path_is_drawn_on_terrain() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        let dispatch = request_path(&mut manager, &mut engine);
        let reply = Ok(PathResponse {
            path: Some(vec![[0, 0], [511, 0], [511, 255]]),
            message: None,
        });

        let outcome = manager.apply_path_result(&mut engine, &bounds(), dispatch.token, reply);
        let ToolOutcome::PathApplied(PathReport::Found { steps, distance, .. }) = outcome else {
            panic!("expected found path, got {outcome:?}");
        };
        assert_eq!(steps, 3);
        assert!((distance - 300.0).abs() < 1e-3);

        let lines = engine.live(ArtifactKind::PathLine);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].points.iter().all(|p| p.y == 2.0));
        assert_eq!(manager.pending_path_token(), None);
        assert!(manager.info().text.contains("Path found with 3 steps."));
    }

    #[test]
    fn empty_path_shows_server_message_and_removes_polyline() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        let dispatch = request_path(&mut manager, &mut engine);
        manager.apply_path_result(
            &mut engine,
            &bounds(),
            dispatch.token,
            Ok(PathResponse {
                path: Some(vec![[0, 0], [4, 4]]),
                message: None,
            }),
        );

        let redo = manager.recalculate_path();
        let ToolOutcome::PathRequested(redo) = redo else {
            panic!("expected re-issued request");
        };
        let outcome = manager.apply_path_result(
            &mut engine,
            &bounds(),
            redo.token,
            Ok(PathResponse {
                path: Some(vec![]),
                message: Some("blocked".into()),
            }),
        );
        assert_eq!(
            outcome,
            ToolOutcome::PathApplied(PathReport::Empty {
                message: "blocked".into()
            })
        );
        assert_eq!(manager.info().text, "Path Planning Tool: blocked");
        assert!(engine.live(ArtifactKind::PathLine).is_empty());
    }

    #[test]
    fn empty_path_without_message_uses_default() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        let dispatch = request_path(&mut manager, &mut engine);
        manager.apply_path_result(&mut engine, &bounds(), dispatch.token, Ok(PathResponse::default()));
        assert_eq!(manager.info().text, "Path Planning Tool: No path found.");
    }

    #[test]
    fn network_error_is_reported_as_text() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        let dispatch = request_path(&mut manager, &mut engine);
        let outcome = manager.apply_path_result(
            &mut engine,
            &bounds(),
            dispatch.token,
            Err(PathPlanningError::Status(500)),
        );
        assert!(matches!(outcome, ToolOutcome::PathApplied(PathReport::Failed { .. })));
        assert_eq!(
            manager.info().text,
            "Path Planning Tool: Error calculating path: HTTP error! status: 500."
        );
    }

    #[test]
    fn superseded_request_is_ignored() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        let first = request_path(&mut manager, &mut engine);
        let ToolOutcome::PathRequested(second) = manager.recalculate_path() else {
            panic!("expected re-issued request");
        };
        assert!(second.token > first.token);

        let reply = Ok(PathResponse {
            path: Some(vec![[0, 0], [1, 1]]),
            message: None,
        });
        assert_eq!(
            manager.apply_path_result(&mut engine, &bounds(), first.token, reply.clone()),
            ToolOutcome::StaleResult(first.token)
        );
        assert!(matches!(
            manager.apply_path_result(&mut engine, &bounds(), second.token, reply),
            ToolOutcome::PathApplied(PathReport::Found { .. })
        ));
    }

    #[test]
    fn click_after_completed_pair_restarts_path() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        let dispatch = request_path(&mut manager, &mut engine);

        let outcome = manager.click(&mut engine, &bounds(), &sampler(), at(10.0, 10.0));
        assert!(matches!(outcome, ToolOutcome::PathStartPlaced(_)));
        assert_eq!(manager.stage(), ToolStage::Path(1));
        assert_eq!(engine.live(ArtifactKind::StartMarker).len(), 1);
        assert!(engine.live(ArtifactKind::EndMarker).is_empty());
        assert_eq!(
            manager.apply_path_result(&mut engine, &bounds(), dispatch.token, Ok(PathResponse::default())),
            ToolOutcome::StaleResult(dispatch.token)
        );
    }

    #[test]
    fn view_keys_toggle_artifact_visibility_only() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        request_path(&mut manager, &mut engine);

        assert_eq!(
            manager.handle_key(ToolKey::SlopeView, &mut engine),
            ToolOutcome::ViewChanged(TerrainView::Slope)
        );
        assert_eq!(manager.stage(), ToolStage::Path(2));
        assert!(engine.artifacts.values().all(|a| !a.visible));
        assert!(!manager.path_options_visible());

        manager.handle_key(ToolKey::TexturedView, &mut engine);
        assert!(engine.artifacts.values().all(|a| a.visible));
        assert!(manager.path_options_visible());
    }

    #[test]
    fn artifacts_created_in_hidden_view_start_hidden() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        manager.handle_key(ToolKey::HazardView, &mut engine);
        manager.toggle(ToolType::Distance, &mut engine);
        manager.click(&mut engine, &bounds(), &sampler(), at(0.0, 0.0));
        manager.click(&mut engine, &bounds(), &sampler(), at(1.0, 0.0));
        assert!(engine.live(ArtifactKind::MeasurementLine).iter().all(|a| !a.visible));
    }

    #[test]
    fn reset_keys_only_affect_their_tool() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        manager.toggle(ToolType::Distance, &mut engine);
        assert_eq!(manager.handle_key(ToolKey::ResetPath, &mut engine), ToolOutcome::Ignored);
        assert_eq!(manager.active_tool(), Some(ToolType::Distance));
        assert_eq!(
            manager.handle_key(ToolKey::ResetDistance, &mut engine),
            ToolOutcome::Deactivated(ToolType::Distance)
        );
        assert_eq!(manager.handle_key(ToolKey::Escape, &mut engine), ToolOutcome::Ignored);
    }

    #[test]
    fn max_slope_is_clamped() {
        let mut manager = ToolManager::default();
        assert_eq!(manager.set_max_slope(120.0), ToolOutcome::MaxSlopeChanged(90.0));
        assert_eq!(manager.set_max_slope(-5.0), ToolOutcome::MaxSlopeChanged(0.0));
        assert_eq!(manager.set_max_slope(f32::NAN), ToolOutcome::MaxSlopeChanged(0.0));
    }

    #[test]
    fn recalculate_requires_both_points() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        manager.toggle(ToolType::Path, &mut engine);
        assert_eq!(manager.recalculate_path(), ToolOutcome::Ignored);
        assert!(manager.notice().is_some());
    }

    #[test]
    fn hover_readout_reports_attributes() {
        let mut manager = ToolManager::default();
        manager.hover(&bounds(), &sampler(), Some(Vec3::new(1.0, 2.5, -3.0)));
        let info = manager.info();
        assert!(info.text.contains("Elevation (Y): 2.50 units"));
        assert!(info.text.contains("Slope Angle: 60.00°"));
        assert!(info.text.contains("Hazard Status: Safe"));
        assert_eq!(info.hazard, Some(HazardStatus::Safe));

        manager.hover(&bounds(), &AttributeSampler::default(), Some(Vec3::ZERO));
        assert!(manager.info().text.contains("Slope Angle: N/A"));

        manager.hover(&bounds(), &sampler(), None);
        assert_eq!(manager.info().text, HOVER_PROMPT);
    }

    #[test]
    fn hover_is_ignored_while_a_tool_is_active() {
        let mut manager = ToolManager::default();
        let mut engine = engine();
        manager.toggle(ToolType::Distance, &mut engine);
        manager.hover(&bounds(), &sampler(), Some(Vec3::ZERO));
        assert_eq!(manager.info().text, "Distance Tool: Click first point on terrain.");
    }

    #[derive(Debug, Clone)]
    enum Action {
        Toggle(ToolType),
        Click(Option<(f32, f32)>),
        Key(ToolKey),
    }

    fn action() -> impl Strategy<Value = Action> {
        let tool = prop_oneof![Just(ToolType::Distance), Just(ToolType::Path)];
        let key = prop_oneof![
            Just(ToolKey::Escape),
            Just(ToolKey::ResetDistance),
            Just(ToolKey::ResetPath),
            Just(ToolKey::SlopeView),
            Just(ToolKey::HazardView),
            Just(ToolKey::TexturedView),
        ];
        let click = proptest::option::of((-100.0f32..100.0, -50.0f32..50.0));
        prop_oneof![
            tool.prop_map(Action::Toggle),
            click.prop_map(Action::Click),
            key.prop_map(Action::Key),
        ]
    }

    proptest! {
        #[test]
        fn engine_state_tracks_the_active_tool(actions in proptest::collection::vec(action(), 0..40)) {
            let mut manager = ToolManager::default();
            let mut engine = engine();
            let (b, s) = (bounds(), sampler());

            for action in actions {
                match action {
                    Action::Toggle(tool) => { manager.toggle(tool, &mut engine); }
                    Action::Click(hit) => {
                        let hit = hit.map(|(x, z)| Vec3::new(x, 2.0, z));
                        manager.click(&mut engine, &b, &s, hit);
                    }
                    Action::Key(key) => { manager.handle_key(key, &mut engine); }
                }

                let idle = manager.active_tool().is_none();
                prop_assert_eq!(engine.camera_attached, idle);
                prop_assert_eq!(engine.context_menu_suppressed, !idle);
                match manager.active_tool() {
                    None => prop_assert_eq!(engine.live_count(), 0),
                    Some(ToolType::Distance) => {
                        prop_assert!(engine.live_count() <= 1);
                        prop_assert!(engine.live(ArtifactKind::StartMarker).is_empty());
                    }
                    Some(ToolType::Path) => {
                        prop_assert!(engine.live_count() <= 2);
                        prop_assert!(engine.live(ArtifactKind::MeasurementLine).is_empty());
                    }
                }
                let visible = manager.view().shows_overlays();
                prop_assert!(engine.artifacts.values().all(|a| a.visible == visible));
            }
        }
    }
}
