//! Asset loading and initialisation systems for the terrain scene.
//!
//! Manages the loading pipeline from manifest parsing through raster
//! decoding to terrain placement, with progress tracking.

/// Terrain manifest loading and asset handle creation.
///
/// Configures the path planner and tool defaults once the manifest parses.
pub mod manifest_loader;

/// Loading progress tracking resource for state transitions.
pub mod progress;

/// Slope and hazard raster decoding into the attribute sampler.
pub mod raster_loader;

/// Terrain placement, materials and ground plane.
///
/// Derives the terrain bounds from the placed mesh and frames the camera.
pub mod terrain_creator;
