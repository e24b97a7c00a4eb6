//! Terrain configuration and decoded raster data.
//!
//! Handles the JSON terrain manifest, world/raster coordinate mapping,
//! and CPU-side slope and hazard buffers.

/// Terrain extents and the world <-> raster pixel mapping.
pub mod bounds;

/// Pixel-addressable RGBA buffers decoded from loaded images.
pub mod raster;

/// Terrain manifest: asset paths, raster size, landing zones, path service.
pub mod terrain_manifest;
