//! Error types for terrain loading and path planning.
//!
//! Sampling and coordinate mapping never fail: they fall back to sentinels.
//! The enums here cover conditions the caller must surface or log.

use std::time::Duration;
use thiserror::Error;

/// Problems detected while turning loaded assets into terrain state.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TerrainError {
    /// Terrain extent or raster size cannot support pixel/world mapping.
    #[error(
        "degenerate terrain geometry: x [{min_x}, {max_x}], z [{min_z}, {max_z}], raster {image_width}x{image_height}"
    )]
    DegenerateGeometry {
        min_x: f32,
        max_x: f32,
        min_z: f32,
        max_z: f32,
        image_width: u32,
        image_height: u32,
    },

    /// Raster uses a pixel layout the sampler cannot address.
    #[error("unsupported raster format: {0}")]
    UnsupportedRasterFormat(String),

    /// Pixel buffer length disagrees with the declared dimensions.
    #[error("raster buffer holds {actual} bytes, expected {expected} for {width}x{height}")]
    RasterSizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Terrain mesh carries no vertex positions to derive bounds from.
    #[error("terrain mesh has no vertex positions")]
    MissingMeshPositions,
}

/// Failures of the path-finding round trip. All variants are network errors
/// from the user's point of view and are shown as text without retry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PathPlanningError {
    #[error("HTTP error! status: {0}")]
    Status(u16),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Decode(String),
}
