/// Diameter of the path start and end markers (world units).
pub const MARKER_DIAMETER: f32 = 5.0;

/// Cross-section of measurement and path line segments (world units).
pub const ARTIFACT_LINE_WIDTH: f32 = 0.6;

/// Vertical offset of landing-zone overlays above the resolved surface.
pub const LANDING_ZONE_LIFT: f32 = 0.1;

/// Clearance between the terrain minimum and the world origin after placement.
pub const TERRAIN_BASE_OFFSET: f32 = 0.05;

/// Ground plane extent relative to the terrain footprint.
pub const GROUND_PLANE_SCALE: f32 = 1.2;

/// Ground plane drop below the terrain minimum.
pub const GROUND_PLANE_DROP: f32 = 0.1;

/// Camera orbit radius relative to the larger terrain side.
pub const CAMERA_RADIUS_FACTOR: f32 = 0.8;

/// Initial camera elevation above the horizon (radians).
pub const CAMERA_ELEVATION: f32 = std::f32::consts::PI / 2.0 - std::f32::consts::PI / 2.5;

pub const MEASUREMENT_LINE_COLOUR: [f32; 3] = [1.0, 0.0, 0.0];
pub const PATH_LINE_COLOUR: [f32; 3] = [0.0, 1.0, 0.0];
pub const START_MARKER_COLOUR: [f32; 3] = [0.0, 1.0, 1.0];
pub const END_MARKER_COLOUR: [f32; 3] = [1.0, 0.5, 0.0];
pub const LANDING_ZONE_COLOUR: [f32; 4] = [0.0, 1.0, 0.0, 0.4];
pub const GROUND_COLOUR: [f32; 3] = [0.7, 0.7, 0.7];
pub const UNTEXTURED_TERRAIN_COLOUR: [f32; 3] = [0.5, 0.5, 0.5];
pub const CLEAR_COLOUR: [f32; 3] = [0.7, 0.85, 1.0];
