//! Shared constants for the terrain viewer workspace.

/// Asset locations and path-service defaults.
pub mod path;

/// Slope and hazard raster encoding.
pub mod raster;

/// Artifact sizes, colours and camera framing.
pub mod render_settings;

/// Tool sampling parameters.
pub mod tools;
