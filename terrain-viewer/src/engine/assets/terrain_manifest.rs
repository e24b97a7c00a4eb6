use bevy::prelude::*;
use constants::path::{
    DEFAULT_MAX_SLOPE_DEGREES, DEFAULT_PATH_REQUEST_TIMEOUT_SECS, DEFAULT_PATH_SERVICE_URL,
    PATH_SERVICE_URL_ENV,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Asset paths for the terrain mesh and its analysis rasters, relative to
/// the asset root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainFiles {
    pub mesh: String,
    pub slope_map: String,
    pub hazard_map: String,
    /// Optional colour texture draped over the mesh; grey when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_texture: Option<String>,
}

/// Dimensions shared by the slope and hazard rasters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RasterSize {
    pub width: u32,
    pub height: u32,
}

/// Landing zone as produced by the terrain pre-processor.
///
/// Pixel pairs are row-major: `bbox` is `[y_start, x_start, y_end, x_end]`
/// and `center_pixel` is `[y, x]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LandingZoneConfig {
    pub bbox: [i32; 4],
    pub center_pixel: [i32; 2],
    #[serde(default)]
    pub area_pixels: u32,
}

impl LandingZoneConfig {
    /// `(x, y)` of the top-left and bottom-right bbox corners.
    pub fn corner_pixels(&self) -> ([i32; 2], [i32; 2]) {
        let [y_start, x_start, y_end, x_end] = self.bbox;
        ([x_start, y_start], [x_end, y_end])
    }

    /// `(x, y)` of the zone center.
    pub fn center_xy(&self) -> [i32; 2] {
        let [y, x] = self.center_pixel;
        [x, y]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathServiceConfig {
    #[serde(default = "default_service_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_slope")]
    pub default_max_slope: f32,
}

fn default_service_url() -> String {
    DEFAULT_PATH_SERVICE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_PATH_REQUEST_TIMEOUT_SECS
}

fn default_max_slope() -> f32 {
    DEFAULT_MAX_SLOPE_DEGREES
}

impl Default for PathServiceConfig {
    fn default() -> Self {
        Self {
            url: default_service_url(),
            timeout_secs: default_timeout_secs(),
            default_max_slope: default_max_slope(),
        }
    }
}

impl PathServiceConfig {
    /// Endpoint after applying the environment override.
    pub fn resolved_url(&self) -> String {
        Self::pick_url(std::env::var(PATH_SERVICE_URL_ENV).ok(), &self.url)
    }

    fn pick_url(env_value: Option<String>, configured: &str) -> String {
        env_value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| configured.to_string())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Terrain manifest as a Bevy asset, loaded from JSON at startup.
#[derive(Asset, Debug, Clone, Serialize, Deserialize, TypePath, Resource)]
pub struct TerrainManifest {
    pub terrain: TerrainFiles,
    pub raster: RasterSize,
    #[serde(default)]
    pub landing_zones: Vec<LandingZoneConfig>,
    #[serde(default)]
    pub path_service: PathServiceConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "terrain": {
            "mesh": "terrain/lunar_terrain.glb",
            "slope_map": "terrain/slope_map.png",
            "hazard_map": "terrain/hazard_map.png"
        },
        "raster": { "width": 512, "height": 256 },
        "landing_zones": [
            { "bbox": [10, 20, 30, 60], "center_pixel": [20, 40], "area_pixels": 800 }
        ]
    }"#;

    #[test]
    fn parses_with_defaults() {
        let manifest: TerrainManifest = serde_json::from_str(MANIFEST).unwrap();
        assert_eq!(manifest.raster.width, 512);
        assert!(manifest.terrain.surface_texture.is_none());
        assert_eq!(manifest.path_service.default_max_slope, 25.0);
        assert_eq!(manifest.path_service.url, DEFAULT_PATH_SERVICE_URL);
        assert_eq!(manifest.landing_zones.len(), 1);
    }

    #[test]
    fn landing_zone_pixels_are_row_major() {
        let manifest: TerrainManifest = serde_json::from_str(MANIFEST).unwrap();
        let zone = &manifest.landing_zones[0];
        assert_eq!(zone.corner_pixels(), ([20, 10], [60, 30]));
        assert_eq!(zone.center_xy(), [40, 20]);
    }

    #[test]
    fn environment_value_overrides_configured_url() {
        assert_eq!(
            PathServiceConfig::pick_url(Some("http://planner:9000/path".into()), "http://a"),
            "http://planner:9000/path"
        );
        assert_eq!(PathServiceConfig::pick_url(Some("  ".into()), "http://a"), "http://a");
        assert_eq!(PathServiceConfig::pick_url(None, "http://a"), "http://a");
    }

    #[test]
    fn zero_timeout_is_raised() {
        let config = PathServiceConfig {
            timeout_secs: 0,
            ..default()
        };
        assert_eq!(config.timeout(), Duration::from_secs(1));
    }
}
