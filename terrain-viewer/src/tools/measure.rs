use crate::engine::assets::bounds::TerrainBounds;
use crate::tools::sampler::AttributeSampler;
use bevy::prelude::*;
use constants::tools::SLOPE_SAMPLE_SEGMENTS;
use serde::{Deserialize, Serialize};

/// Completed two-point measurement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    pub start: Vec3,
    pub end: Vec3,
    pub distance: f32,
    pub average_slope_deg: f32,
    /// Raster lookups that succeeded out of `SLOPE_SAMPLE_SEGMENTS + 1`.
    pub slope_samples: usize,
}

impl Measurement {
    pub fn between(
        start: Vec3,
        end: Vec3,
        bounds: &TerrainBounds,
        sampler: &AttributeSampler,
    ) -> Self {
        let (average_slope_deg, slope_samples) = average_slope_along(bounds, sampler, start, end);
        Self {
            start,
            end,
            distance: start.distance(end),
            average_slope_deg,
            slope_samples,
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "P1: {}\nP2: {}\nDistance: {:.2} units\nAverage Slope: {:.2}°\nClick again to start new measurement or deactivate.",
            format_point(self.start),
            format_point(self.end),
            self.distance,
            self.average_slope_deg,
        )
    }
}

/// Mean slope over evenly spaced samples on the segment, endpoints included.
/// Failed lookups are skipped; with no successful lookup the average is 0.
pub fn average_slope_along(
    bounds: &TerrainBounds,
    sampler: &AttributeSampler,
    start: Vec3,
    end: Vec3,
) -> (f32, usize) {
    let (total, count) = (0..=SLOPE_SAMPLE_SEGMENTS)
        .map(|i| start.lerp(end, i as f32 / SLOPE_SAMPLE_SEGMENTS as f32))
        .filter_map(|point| sampler.slope_at(bounds, point))
        .fold((0.0f32, 0usize), |(total, count), angle| (total + angle, count + 1));

    if count == 0 {
        (0.0, 0)
    } else {
        (total / count as f32, count)
    }
}

pub fn format_point(point: Vec3) -> String {
    format!(
        "X:{:.2} units Y:{:.2} units Z:{:.2} units",
        point.x, point.y, point.z
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::assets::raster::RasterBuffer;

    fn bounds() -> TerrainBounds {
        TerrainBounds {
            min_x: -100.0,
            max_x: 100.0,
            min_y: 0.0,
            max_y: 10.0,
            min_z: -50.0,
            max_z: 50.0,
            image_width: 64,
            image_height: 32,
        }
    }

    #[test]
    fn uniform_raster_averages_to_its_value() {
        let sampler = AttributeSampler::new(Some(RasterBuffer::uniform(64, 32, [170, 0, 0, 255])), None);
        let m = Measurement::between(
            Vec3::new(-80.0, 1.0, -40.0),
            Vec3::new(90.0, 4.0, 45.0),
            &bounds(),
            &sampler,
        );
        assert!((m.average_slope_deg - (170.0 / 255.0) * 90.0).abs() < 1e-4);
        assert_eq!(m.slope_samples, 21);
    }

    #[test]
    fn no_raster_gives_zero_average() {
        let (avg, count) = average_slope_along(
            &bounds(),
            &AttributeSampler::default(),
            Vec3::ZERO,
            Vec3::new(10.0, 0.0, 10.0),
        );
        assert_eq!((avg, count), (0.0, 0));
    }

    #[test]
    fn distance_is_euclidean_in_three_dimensions() {
        let m = Measurement::between(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(3.0, 4.0, 12.0),
            &bounds(),
            &AttributeSampler::default(),
        );
        assert_eq!(m.distance, 13.0);
    }

    #[test]
    fn summary_lists_both_points() {
        let m = Measurement {
            start: Vec3::new(1.0, 2.0, 3.0),
            end: Vec3::new(4.0, 5.0, 6.0),
            distance: 5.196,
            average_slope_deg: 12.3456,
            slope_samples: 21,
        };
        let text = m.summary();
        assert!(text.contains("P1: X:1.00 units Y:2.00 units Z:3.00 units"));
        assert!(text.contains("Distance: 5.20 units"));
        assert!(text.contains("Average Slope: 12.35°"));
    }
}
