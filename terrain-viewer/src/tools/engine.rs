use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Opaque reference to a visual artifact owned by a tool session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactHandle(pub u64);

/// Visual role of an artifact, used by the engine to pick geometry and colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    MeasurementLine,
    PathLine,
    StartMarker,
    EndMarker,
}

/// Ray queries restricted to the terrain surface.
pub trait TerrainPicker {
    /// Nearest intersection of `ray` with the terrain mesh only.
    fn pick_terrain(&mut self, ray: Ray3d) -> Option<Vec3>;
}

/// Everything the tool state machine asks of the renderer.
///
/// The Bevy implementation lives in `bevy_engine`; tests drive the state
/// machine through a recording fake.
pub trait ToolEngine: TerrainPicker {
    fn create_polyline(&mut self, points: &[Vec3], kind: ArtifactKind) -> ArtifactHandle;
    fn create_marker(&mut self, position: Vec3, kind: ArtifactKind) -> ArtifactHandle;
    fn dispose_artifact(&mut self, handle: ArtifactHandle);
    fn set_artifact_visible(&mut self, handle: ArtifactHandle, visible: bool);
    fn attach_camera_control(&mut self);
    fn detach_camera_control(&mut self);
    fn set_context_menu_suppressed(&mut self, suppressed: bool);
}

#[cfg(test)]
pub(crate) mod fake {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq)]
    pub struct FakeArtifact {
        pub kind: ArtifactKind,
        pub points: Vec<Vec3>,
        pub visible: bool,
    }

    /// Deterministic engine: a flat terrain at `ground` over `footprint`
    /// (min xz, max xz), or no terrain at all.
    pub struct FakeEngine {
        pub ground: Option<f32>,
        pub footprint: (Vec2, Vec2),
        pub artifacts: HashMap<ArtifactHandle, FakeArtifact>,
        pub disposed: Vec<ArtifactHandle>,
        pub camera_attached: bool,
        pub context_menu_suppressed: bool,
        next_handle: u64,
    }

    impl FakeEngine {
        pub fn flat(ground: f32, min: Vec2, max: Vec2) -> Self {
            Self {
                ground: Some(ground),
                footprint: (min, max),
                artifacts: HashMap::new(),
                disposed: Vec::new(),
                camera_attached: true,
                context_menu_suppressed: false,
                next_handle: 1,
            }
        }

        pub fn without_terrain() -> Self {
            let mut engine = Self::flat(0.0, Vec2::ZERO, Vec2::ZERO);
            engine.ground = None;
            engine
        }

        pub fn live(&self, kind: ArtifactKind) -> Vec<&FakeArtifact> {
            self.artifacts.values().filter(|a| a.kind == kind).collect()
        }

        pub fn live_count(&self) -> usize {
            self.artifacts.len()
        }

        fn insert(&mut self, kind: ArtifactKind, points: Vec<Vec3>) -> ArtifactHandle {
            let handle = ArtifactHandle(self.next_handle);
            self.next_handle += 1;
            self.artifacts.insert(
                handle,
                FakeArtifact {
                    kind,
                    points,
                    visible: true,
                },
            );
            handle
        }
    }

    impl TerrainPicker for FakeEngine {
        fn pick_terrain(&mut self, ray: Ray3d) -> Option<Vec3> {
            let ground = self.ground?;
            if ray.direction.y.abs() < f32::EPSILON {
                return None;
            }
            let t = (ground - ray.origin.y) / ray.direction.y;
            if t < 0.0 {
                return None;
            }
            let hit = ray.origin + *ray.direction * t;
            let (min, max) = self.footprint;
            let inside = hit.x >= min.x && hit.x <= max.x && hit.z >= min.y && hit.z <= max.y;
            inside.then_some(hit)
        }
    }

    impl ToolEngine for FakeEngine {
        fn create_polyline(&mut self, points: &[Vec3], kind: ArtifactKind) -> ArtifactHandle {
            self.insert(kind, points.to_vec())
        }

        fn create_marker(&mut self, position: Vec3, kind: ArtifactKind) -> ArtifactHandle {
            self.insert(kind, vec![position])
        }

        fn dispose_artifact(&mut self, handle: ArtifactHandle) {
            if self.artifacts.remove(&handle).is_some() {
                self.disposed.push(handle);
            }
        }

        fn set_artifact_visible(&mut self, handle: ArtifactHandle, visible: bool) {
            if let Some(artifact) = self.artifacts.get_mut(&handle) {
                artifact.visible = visible;
            }
        }

        fn attach_camera_control(&mut self) {
            self.camera_attached = true;
        }

        fn detach_camera_control(&mut self) {
            self.camera_attached = false;
        }

        fn set_context_menu_suppressed(&mut self, suppressed: bool) {
            self.context_menu_suppressed = suppressed;
        }
    }
}
