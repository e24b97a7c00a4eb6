use crate::engine::assets::bounds::TerrainBounds;
use crate::engine::camera::viewport_camera::ViewportCamera;
use crate::tools::engine::{ArtifactHandle, ArtifactKind, TerrainPicker, ToolEngine};
use bevy::ecs::system::SystemParam;
use bevy::picking::mesh_picking::ray_cast::{MeshRayCast, MeshRayCastSettings, RayCastVisibility};
use bevy::prelude::*;
use constants::render_settings::{
    ARTIFACT_LINE_WIDTH, END_MARKER_COLOUR, LANDING_ZONE_COLOUR, MARKER_DIAMETER,
    MEASUREMENT_LINE_COLOUR, PATH_LINE_COLOUR, START_MARKER_COLOUR,
};

/// Marks the mesh that tool rays are allowed to hit.
#[derive(Component)]
pub struct TerrainSurface;

#[derive(Component, Debug, Clone, Copy)]
pub struct ToolArtifact {
    pub kind: ArtifactKind,
}

/// Whether the canvas swallows the browser context menu.
#[derive(Resource, Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CanvasInputState {
    pub context_menu_suppressed: bool,
}

/// Shared meshes and materials for tool artifacts.
///
/// Segments reuse one unit cuboid along +X, scaled per segment.
#[derive(Resource, Clone)]
pub struct ArtifactAssets {
    pub segment: Handle<Mesh>,
    pub marker: Handle<Mesh>,
    pub measurement_line: Handle<StandardMaterial>,
    pub path_line: Handle<StandardMaterial>,
    pub start_marker: Handle<StandardMaterial>,
    pub end_marker: Handle<StandardMaterial>,
    /// Unit XZ quad for landing-zone overlays.
    pub overlay_plane: Handle<Mesh>,
    pub landing_zone: Handle<StandardMaterial>,
}

impl ArtifactAssets {
    pub fn material(&self, kind: ArtifactKind) -> Handle<StandardMaterial> {
        match kind {
            ArtifactKind::MeasurementLine => self.measurement_line.clone(),
            ArtifactKind::PathLine => self.path_line.clone(),
            ArtifactKind::StartMarker => self.start_marker.clone(),
            ArtifactKind::EndMarker => self.end_marker.clone(),
        }
    }
}

fn unlit(colour: [f32; 3]) -> StandardMaterial {
    StandardMaterial {
        base_color: Color::srgb(colour[0], colour[1], colour[2]),
        unlit: true,
        ..default()
    }
}

pub fn setup_artifact_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(ArtifactAssets {
        segment: meshes.add(Cuboid::new(1.0, ARTIFACT_LINE_WIDTH, ARTIFACT_LINE_WIDTH)),
        marker: meshes.add(Sphere::new(MARKER_DIAMETER * 0.5)),
        measurement_line: materials.add(unlit(MEASUREMENT_LINE_COLOUR)),
        path_line: materials.add(unlit(PATH_LINE_COLOUR)),
        start_marker: materials.add(unlit(START_MARKER_COLOUR)),
        end_marker: materials.add(unlit(END_MARKER_COLOUR)),
        overlay_plane: meshes.add(Plane3d::default().mesh().size(1.0, 1.0)),
        landing_zone: materials.add(StandardMaterial {
            base_color: Color::srgba(
                LANDING_ZONE_COLOUR[0],
                LANDING_ZONE_COLOUR[1],
                LANDING_ZONE_COLOUR[2],
                LANDING_ZONE_COLOUR[3],
            ),
            alpha_mode: AlphaMode::Blend,
            unlit: true,
            double_sided: true,
            cull_mode: None,
            ..default()
        }),
    });
}

/// Transform placing the unit segment cuboid between `a` and `b`.
/// `None` for zero-length segments.
pub fn segment_transform(a: Vec3, b: Vec3) -> Option<Transform> {
    let delta = b - a;
    let length = delta.length();
    if !length.is_finite() || length <= f32::EPSILON {
        return None;
    }
    Some(Transform {
        translation: (a + b) * 0.5,
        rotation: Quat::from_rotation_arc(Vec3::X, delta / length),
        scale: Vec3::new(length, 1.0, 1.0),
    })
}

/// Mesh ray cast filtered to [`TerrainSurface`] entities, so markers,
/// lines and overlays never occlude an elevation query.
#[derive(SystemParam)]
pub struct TerrainRayCaster<'w, 's> {
    ray_cast: MeshRayCast<'w, 's>,
    terrain: Query<'w, 's, Entity, With<TerrainSurface>>,
}

impl TerrainPicker for TerrainRayCaster<'_, '_> {
    fn pick_terrain(&mut self, ray: Ray3d) -> Option<Vec3> {
        let Self { ray_cast, terrain } = self;
        let filter = |entity: Entity| terrain.contains(entity);
        let settings = MeshRayCastSettings::default()
            .with_filter(&filter)
            .with_visibility(RayCastVisibility::Any);
        ray_cast
            .cast_ray(ray, &settings)
            .first()
            .map(|(_, hit)| hit.point)
            .filter(|point| point.is_finite())
    }
}

/// Bevy-backed [`ToolEngine`]: artifacts are entities, handles are entity bits.
#[derive(SystemParam)]
pub struct BevyToolEngine<'w, 's> {
    commands: Commands<'w, 's>,
    assets: Res<'w, ArtifactAssets>,
    picker: TerrainRayCaster<'w, 's>,
    viewport: ResMut<'w, ViewportCamera>,
    canvas: ResMut<'w, CanvasInputState>,
}

impl BevyToolEngine<'_, '_> {
    pub fn reset_camera(&mut self, bounds: &TerrainBounds) {
        self.viewport.frame(bounds);
        info!("Camera reset to terrain center");
    }

    fn entity(handle: ArtifactHandle) -> Option<Entity> {
        Entity::try_from_bits(handle.0).ok()
    }
}

impl TerrainPicker for BevyToolEngine<'_, '_> {
    fn pick_terrain(&mut self, ray: Ray3d) -> Option<Vec3> {
        self.picker.pick_terrain(ray)
    }
}

impl ToolEngine for BevyToolEngine<'_, '_> {
    fn create_polyline(&mut self, points: &[Vec3], kind: ArtifactKind) -> ArtifactHandle {
        let mesh = self.assets.segment.clone();
        let material = self.assets.material(kind);
        let segments: Vec<Transform> = points
            .windows(2)
            .filter_map(|pair| segment_transform(pair[0], pair[1]))
            .collect();

        let entity = self
            .commands
            .spawn((
                ToolArtifact { kind },
                Transform::default(),
                Visibility::default(),
                Name::new(format!("{kind:?}")),
            ))
            .with_children(|parent| {
                for transform in segments {
                    parent.spawn((Mesh3d(mesh.clone()), MeshMaterial3d(material.clone()), transform));
                }
            })
            .id();
        ArtifactHandle(entity.to_bits())
    }

    fn create_marker(&mut self, position: Vec3, kind: ArtifactKind) -> ArtifactHandle {
        let entity = self
            .commands
            .spawn((
                ToolArtifact { kind },
                Mesh3d(self.assets.marker.clone()),
                MeshMaterial3d(self.assets.material(kind)),
                Transform::from_translation(position),
                Visibility::default(),
                Name::new(format!("{kind:?}")),
            ))
            .id();
        ArtifactHandle(entity.to_bits())
    }

    fn dispose_artifact(&mut self, handle: ArtifactHandle) {
        let Some(entity) = Self::entity(handle) else {
            return;
        };
        if let Ok(mut entity_commands) = self.commands.get_entity(entity) {
            entity_commands.despawn();
        }
    }

    fn set_artifact_visible(&mut self, handle: ArtifactHandle, visible: bool) {
        let Some(entity) = Self::entity(handle) else {
            return;
        };
        let visibility = if visible {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
        if let Ok(mut entity_commands) = self.commands.get_entity(entity) {
            entity_commands.try_insert(visibility);
        }
    }

    fn attach_camera_control(&mut self) {
        self.viewport.control_attached = true;
    }

    fn detach_camera_control(&mut self) {
        self.viewport.control_attached = false;
    }

    fn set_context_menu_suppressed(&mut self, suppressed: bool) {
        self.canvas.context_menu_suppressed = suppressed;
    }
}
