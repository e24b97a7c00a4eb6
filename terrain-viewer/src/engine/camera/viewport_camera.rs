use crate::engine::assets::bounds::TerrainBounds;
use bevy::input::mouse::{MouseMotion, MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use constants::render_settings::{CAMERA_ELEVATION, CAMERA_RADIUS_FACTOR};

const MIN_PITCH: f32 = 0.05;
const MAX_PITCH: f32 = 1.52;
const MIN_RADIUS: f32 = 1.0;

/// Orbit camera around a focus point.
///
/// `control_attached` is cleared while a tool owns the pointer so that
/// clicks and drags go to the tool instead of the camera.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct ViewportCamera {
    pub focus_point: Vec3,
    pub radius: f32,
    pub yaw: f32,
    pub pitch: f32,
    pub control_attached: bool,
}

impl Default for ViewportCamera {
    fn default() -> Self {
        Self {
            focus_point: Vec3::ZERO,
            radius: 150.0,
            yaw: 0.0,
            pitch: CAMERA_ELEVATION,
            control_attached: true,
        }
    }
}

impl ViewportCamera {
    pub fn with_bounds(bounds: &TerrainBounds) -> Self {
        let mut camera = Self::default();
        camera.frame(bounds);
        camera
    }

    /// Target the terrain center at a radius covering the larger side.
    /// Control attachment is left as is.
    pub fn frame(&mut self, bounds: &TerrainBounds) {
        let radius = bounds.width().max(bounds.depth()) * CAMERA_RADIUS_FACTOR;
        self.focus_point = bounds.center();
        self.radius = if radius.is_finite() {
            radius.max(MIN_RADIUS)
        } else {
            Self::default().radius
        };
        self.yaw = 0.0;
        self.pitch = CAMERA_ELEVATION;
    }

    pub fn eye_position(&self) -> Vec3 {
        let horizontal = self.radius * self.pitch.cos();
        self.focus_point
            + Vec3::new(
                horizontal * self.yaw.sin(),
                self.radius * self.pitch.sin(),
                horizontal * self.yaw.cos(),
            )
    }

    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye_position()).looking_at(self.focus_point, Vec3::Y)
    }

    fn orbit(&mut self, delta: Vec2) {
        let yaw_sens = 0.0035;
        let pitch_sens = 0.0030;
        self.yaw -= delta.x * yaw_sens;
        self.pitch = (self.pitch + delta.y * pitch_sens).clamp(MIN_PITCH, MAX_PITCH);
    }

    fn pan(&mut self, delta: Vec2) {
        let forward = Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos());
        let right = Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin());
        let speed = self.radius * 0.0015;
        self.focus_point += (right * -delta.x + forward * delta.y) * speed;
    }

    fn zoom(&mut self, scroll: f32) {
        self.radius = (self.radius * (1.0 - scroll * 0.1)).max(MIN_RADIUS);
    }
}

pub fn camera_controller(
    mut camera_query: Query<&mut Transform, With<Camera3d>>,
    mut viewport: ResMut<ViewportCamera>,
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut mouse_motion: EventReader<MouseMotion>,
    mut scroll_events: EventReader<MouseWheel>,
    keyboard: Res<ButtonInput<KeyCode>>,
    time: Res<Time>,
) {
    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    let mouse_delta: Vec2 = mouse_motion.read().map(|m| m.delta).sum();
    let scroll: f32 = scroll_events
        .read()
        .map(|ev| match ev.unit {
            MouseScrollUnit::Line => ev.y,
            MouseScrollUnit::Pixel => ev.y * 0.05,
        })
        .sum();

    if viewport.control_attached {
        if mouse_button.pressed(MouseButton::Left) && mouse_delta != Vec2::ZERO {
            viewport.orbit(mouse_delta);
        }
        if mouse_button.pressed(MouseButton::Right) && mouse_delta != Vec2::ZERO {
            viewport.pan(mouse_delta);
        }
        if scroll.abs() > f32::EPSILON {
            viewport.zoom(scroll);
        }

        // Arrow keys only; letter keys are tool shortcuts.
        let mut move_input = Vec2::ZERO;
        if keyboard.pressed(KeyCode::ArrowUp) {
            move_input.y += 1.0;
        }
        if keyboard.pressed(KeyCode::ArrowDown) {
            move_input.y -= 1.0;
        }
        if keyboard.pressed(KeyCode::ArrowRight) {
            move_input.x -= 1.0;
        }
        if keyboard.pressed(KeyCode::ArrowLeft) {
            move_input.x += 1.0;
        }
        if move_input != Vec2::ZERO {
            let step = 400.0 * time.delta_secs();
            viewport.pan(move_input * step);
        }
    }

    let target = viewport.transform();
    let lerp_speed = (12.0 * time.delta_secs()).min(1.0);
    camera_transform.translation = camera_transform.translation.lerp(target.translation, lerp_speed);
    camera_transform.rotation = camera_transform.rotation.slerp(target.rotation, lerp_speed);
}
