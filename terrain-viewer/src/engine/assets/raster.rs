use crate::error::TerrainError;
use bevy::prelude::*;
use bevy::render::render_resource::TextureFormat;

/// Decoded, pixel-addressable RGBA8 copy of a raster image.
///
/// Built once from the loaded `Image` so lookups never touch the GPU copy.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterBuffer {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl RasterBuffer {
    pub fn from_rgba8(width: u32, height: u32, data: &[u8]) -> Result<Self, TerrainError> {
        let expected = width as usize * height as usize * 4;
        if data.len() != expected {
            return Err(TerrainError::RasterSizeMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }

        let pixels = data
            .chunks_exact(4)
            .map(|px| [px[0], px[1], px[2], px[3]])
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Single-colour buffer.
    pub fn uniform(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![rgba; width as usize * height as usize],
        }
    }

    /// Convert a CPU-side Bevy image. Grey and grey-alpha rasters are
    /// expanded to RGBA.
    pub fn from_image(image: &Image) -> Result<Self, TerrainError> {
        let width = image.width();
        let height = image.height();
        let format = image.texture_descriptor.format;
        let Some(data) = image.data.as_deref() else {
            return Err(TerrainError::UnsupportedRasterFormat(format!(
                "{format:?} without CPU-side pixel data"
            )));
        };

        match format {
            TextureFormat::Rgba8Unorm | TextureFormat::Rgba8UnormSrgb => {
                Self::from_rgba8(width, height, data)
            }
            TextureFormat::Bgra8Unorm | TextureFormat::Bgra8UnormSrgb => {
                let mut buffer = Self::from_rgba8(width, height, data)?;
                for px in &mut buffer.pixels {
                    px.swap(0, 2);
                }
                Ok(buffer)
            }
            TextureFormat::R8Unorm => {
                let expected = width as usize * height as usize;
                if data.len() != expected {
                    return Err(TerrainError::RasterSizeMismatch {
                        width,
                        height,
                        expected,
                        actual: data.len(),
                    });
                }
                Ok(Self {
                    width,
                    height,
                    pixels: data.iter().map(|&v| [v, v, v, 255]).collect(),
                })
            }
            TextureFormat::Rg8Unorm => {
                let expected = width as usize * height as usize * 2;
                if data.len() != expected {
                    return Err(TerrainError::RasterSizeMismatch {
                        width,
                        height,
                        expected,
                        actual: data.len(),
                    });
                }
                Ok(Self {
                    width,
                    height,
                    pixels: data
                        .chunks_exact(2)
                        .map(|pair| [pair[0], pair[0], pair[0], pair[1]])
                        .collect(),
                })
            }
            other => Err(TerrainError::UnsupportedRasterFormat(format!("{other:?}"))),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel at `(x, y)`, or `None` outside the decoded extent.
    pub fn pixel(&self, x: i32, y: i32) -> Option<[u8; 4]> {
        if x < 0 || y < 0 || x as u32 >= self.width || y as u32 >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        self.pixels.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::asset::RenderAssetUsages;
    use bevy::render::render_resource::{Extent3d, TextureDimension};

    #[test]
    fn rejects_short_buffers() {
        let err = RasterBuffer::from_rgba8(2, 2, &[0; 12]).unwrap_err();
        assert!(matches!(
            err,
            TerrainError::RasterSizeMismatch {
                expected: 16,
                actual: 12,
                ..
            }
        ));
    }

    #[test]
    fn pixel_lookup_is_row_major() {
        let mut data = vec![0u8; 3 * 2 * 4];
        // pixel (2, 1)
        data[(1 * 3 + 2) * 4] = 77;
        let buffer = RasterBuffer::from_rgba8(3, 2, &data).unwrap();
        assert_eq!(buffer.pixel(2, 1).map(|p| p[0]), Some(77));
        assert_eq!(buffer.pixel(3, 0), None);
        assert_eq!(buffer.pixel(-1, 0), None);
    }

    #[test]
    fn expands_single_channel_images() {
        let image = Image::new(
            Extent3d {
                width: 2,
                height: 1,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            vec![10, 200],
            TextureFormat::R8Unorm,
            RenderAssetUsages::MAIN_WORLD,
        );
        let buffer = RasterBuffer::from_image(&image).unwrap();
        assert_eq!(buffer.pixel(1, 0), Some([200, 200, 200, 255]));
    }

    #[test]
    fn expands_grey_alpha_images() {
        let image = Image::new(
            Extent3d {
                width: 2,
                height: 1,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            vec![170, 255, 40, 128],
            TextureFormat::Rg8Unorm,
            RenderAssetUsages::MAIN_WORLD,
        );
        let buffer = RasterBuffer::from_image(&image).unwrap();
        assert_eq!(buffer.pixel(0, 0), Some([170, 170, 170, 255]));
        assert_eq!(buffer.pixel(1, 0), Some([40, 40, 40, 128]));
    }

    #[test]
    fn swaps_bgra_channels() {
        let image = Image::new(
            Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            vec![1, 2, 3, 4],
            TextureFormat::Bgra8Unorm,
            RenderAssetUsages::MAIN_WORLD,
        );
        let buffer = RasterBuffer::from_image(&image).unwrap();
        assert_eq!(buffer.pixel(0, 0), Some([3, 2, 1, 4]));
    }

    #[test]
    fn unsupported_formats_are_reported() {
        let image = Image::new(
            Extent3d {
                width: 1,
                height: 1,
                depth_or_array_layers: 1,
            },
            TextureDimension::D2,
            vec![0; 16],
            TextureFormat::Rgba32Float,
            RenderAssetUsages::MAIN_WORLD,
        );
        assert!(matches!(
            RasterBuffer::from_image(&image),
            Err(TerrainError::UnsupportedRasterFormat(_))
        ));
    }
}
