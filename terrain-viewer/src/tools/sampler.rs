use crate::engine::assets::bounds::{PixelCoord, TerrainBounds};
use crate::engine::assets::raster::RasterBuffer;
use bevy::prelude::*;
use constants::raster::{CHANNEL_MAX, HAZARD_CHANNEL_HIGH, HAZARD_CHANNEL_LOW, SLOPE_MAX_DEGREES};
use serde::{Deserialize, Serialize};

/// Terrain safety class read from the hazard raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardStatus {
    Safe,
    Moderate,
    Critical,
    Undetermined,
}

impl HazardStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Safe => "Safe",
            Self::Moderate => "Moderate",
            Self::Critical => "Critical",
            Self::Undetermined => "Undetermined",
        }
    }

    pub fn colour(&self) -> Color {
        match self {
            Self::Safe => Color::srgb_u8(0x00, 0xFF, 0x00),
            Self::Moderate => Color::srgb_u8(0xFF, 0xFF, 0x00),
            Self::Critical => Color::srgb_u8(0xFF, 0x00, 0x00),
            Self::Undetermined => Color::srgb_u8(0xAA, 0xAA, 0xAA),
        }
    }
}

/// First matching rule wins.
pub fn classify_hazard(r: u8, g: u8, b: u8) -> HazardStatus {
    let high = |c: u8| c > HAZARD_CHANNEL_HIGH;
    let low = |c: u8| c < HAZARD_CHANNEL_LOW;

    if high(g) && low(r) && low(b) {
        HazardStatus::Safe
    } else if high(r) && high(g) && low(b) {
        HazardStatus::Moderate
    } else if high(r) && low(g) && low(b) {
        HazardStatus::Critical
    } else {
        HazardStatus::Undetermined
    }
}

/// Slope map encodes 0..=255 in the red channel as 0..=90 degrees.
pub fn slope_from_channel(r: u8) -> f32 {
    (r as f32 / CHANNEL_MAX) * SLOPE_MAX_DEGREES
}

/// `NN.NN°`, or `N/A` when the raster could not answer.
pub fn format_slope(slope: Option<f32>) -> String {
    match slope {
        Some(angle) => format!("{angle:.2}°"),
        None => "N/A".to_string(),
    }
}

pub fn format_hazard(hazard: Option<HazardStatus>) -> &'static str {
    hazard.map_or("N/A", |status| status.label())
}

/// Cached slope and hazard rasters. Either may be absent when its asset
/// failed to load or decode; lookups then report "unavailable".
#[derive(Resource, Default, Debug, Clone)]
pub struct AttributeSampler {
    slope: Option<RasterBuffer>,
    hazard: Option<RasterBuffer>,
}

impl AttributeSampler {
    pub fn new(slope: Option<RasterBuffer>, hazard: Option<RasterBuffer>) -> Self {
        Self { slope, hazard }
    }

    pub fn has_slope(&self) -> bool {
        self.slope.is_some()
    }

    pub fn has_hazard(&self) -> bool {
        self.hazard.is_some()
    }

    pub fn sample_slope(&self, bounds: &TerrainBounds, pixel: PixelCoord) -> Option<f32> {
        let [r, ..] = read_clamped(self.slope.as_ref()?, bounds, pixel)?;
        Some(slope_from_channel(r))
    }

    pub fn sample_hazard(&self, bounds: &TerrainBounds, pixel: PixelCoord) -> Option<HazardStatus> {
        let [r, g, b, _] = read_clamped(self.hazard.as_ref()?, bounds, pixel)?;
        Some(classify_hazard(r, g, b))
    }

    pub fn slope_at(&self, bounds: &TerrainBounds, point: Vec3) -> Option<f32> {
        self.sample_slope(bounds, bounds.world_to_pixel(point))
    }

    pub fn hazard_at(&self, bounds: &TerrainBounds, point: Vec3) -> Option<HazardStatus> {
        self.sample_hazard(bounds, bounds.world_to_pixel(point))
    }
}

// Clamp against the configured raster size, then reject anything the
// decoded image does not actually cover.
fn read_clamped(raster: &RasterBuffer, bounds: &TerrainBounds, pixel: PixelCoord) -> Option<[u8; 4]> {
    let clamped = pixel.clamped(bounds.image_width, bounds.image_height);
    raster.pixel(clamped.x, clamped.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds(width: u32, height: u32) -> TerrainBounds {
        TerrainBounds {
            min_x: 0.0,
            max_x: 10.0,
            min_y: 0.0,
            max_y: 1.0,
            min_z: 0.0,
            max_z: 10.0,
            image_width: width,
            image_height: height,
        }
    }

    #[test]
    fn slope_channel_scales_to_degrees() {
        assert_eq!(slope_from_channel(255), 90.0);
        assert_eq!(slope_from_channel(0), 0.0);
        assert!((slope_from_channel(128) - 45.176).abs() < 0.01);
    }

    #[test]
    fn hazard_classification_table() {
        assert_eq!(classify_hazard(0, 255, 0), HazardStatus::Safe);
        assert_eq!(classify_hazard(255, 255, 0), HazardStatus::Moderate);
        assert_eq!(classify_hazard(255, 0, 0), HazardStatus::Critical);
        assert_eq!(classify_hazard(10, 10, 10), HazardStatus::Undetermined);
        // thresholds are strict
        assert_eq!(classify_hazard(50, 201, 0), HazardStatus::Undetermined);
        assert_eq!(classify_hazard(0, 200, 0), HazardStatus::Undetermined);
    }

    #[test]
    fn missing_rasters_report_unavailable() {
        let sampler = AttributeSampler::default();
        let b = bounds(4, 4);
        assert_eq!(sampler.sample_slope(&b, PixelCoord::new(1, 1)), None);
        assert_eq!(sampler.sample_hazard(&b, PixelCoord::new(1, 1)), None);
        assert_eq!(format_slope(None), "N/A");
        assert_eq!(format_hazard(None), "N/A");
    }

    #[test]
    fn out_of_range_pixels_are_clamped() {
        let sampler = AttributeSampler::new(
            Some(RasterBuffer::uniform(4, 4, [255, 0, 0, 255])),
            Some(RasterBuffer::uniform(4, 4, [255, 0, 0, 255])),
        );
        let b = bounds(4, 4);
        assert_eq!(sampler.sample_slope(&b, PixelCoord::new(-20, 99)), Some(90.0));
        assert_eq!(
            sampler.sample_hazard(&b, PixelCoord::new(400, -3)),
            Some(HazardStatus::Critical)
        );
    }

    #[test]
    fn decoded_extent_smaller_than_configured_raster() {
        let sampler = AttributeSampler::new(Some(RasterBuffer::uniform(2, 2, [10, 0, 0, 255])), None);
        let b = bounds(8, 8);
        assert!(sampler.sample_slope(&b, PixelCoord::new(1, 1)).is_some());
        assert_eq!(sampler.sample_slope(&b, PixelCoord::new(5, 5)), None);
    }

    #[test]
    fn slope_formatting() {
        assert_eq!(format_slope(Some(45.176_47)), "45.18°");
    }
}
