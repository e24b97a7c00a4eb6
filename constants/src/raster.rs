/// Largest value a raster channel can hold.
pub const CHANNEL_MAX: f32 = 255.0;

/// Slope angle encoded by a full-scale red channel.
pub const SLOPE_MAX_DEGREES: f32 = 90.0;

/// A channel counts as "high" above this value when classifying hazards.
pub const HAZARD_CHANNEL_HIGH: u8 = 200;

/// A channel counts as "low" below this value when classifying hazards.
pub const HAZARD_CHANNEL_LOW: u8 = 50;
