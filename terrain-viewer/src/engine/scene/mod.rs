//! Scene overlays that follow the terrain view.

/// Landing-zone overlays from the manifest.
pub mod landing_zones;

/// Terrain material switching between textured, slope and hazard views.
pub mod terrain_view;
