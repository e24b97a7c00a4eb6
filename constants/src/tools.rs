/// Segments along a measured line; slope is sampled at each of the
/// `SLOPE_SAMPLE_SEGMENTS + 1` endpoints.
pub const SLOPE_SAMPLE_SEGMENTS: usize = 20;

/// Height above the terrain maximum from which elevation rays are cast.
pub const ELEVATION_RAY_LIFT: f32 = 1000.0;

/// Max-slope step applied by the path options panel buttons (degrees).
pub const MAX_SLOPE_STEP: f32 = 1.0;
