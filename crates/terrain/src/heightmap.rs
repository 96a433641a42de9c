//! Grayscale raster decoding.
//!
//! Pixels are kept as signed packed ARGB values with an opaque alpha byte,
//! so a white pixel is `-1` and a black one is `-256^3`. Dividing the negated
//! value by [`MAX_PIXEL_COLOR`] gives a darkness in `[0, 1]` that existing
//! heightmap and vegetation assets are authored against.

use std::path::Path;

use engine_core::AssetError;
use image::DynamicImage;

use crate::TerrainError;

/// Number of distinct RGB colours.
pub const MAX_PIXEL_COLOR: f32 = 256.0 * 256.0 * 256.0;

/// Pack an opaque RGB pixel into a signed ARGB integer.
pub fn pack_argb(r: u8, g: u8, b: u8) -> i32 {
    i32::from_be_bytes([0xFF, r, g, b])
}

/// Square grid of packed pixels, row-major with `x` varying fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct Heightmap {
    resolution: usize,
    pixels: Vec<i32>,
}

impl Heightmap {
    pub fn from_pixels(resolution: usize, pixels: Vec<i32>) -> Result<Self, TerrainError> {
        if resolution < 2 {
            return Err(TerrainError::TooSmall(resolution));
        }
        let expected = resolution * resolution;
        if pixels.len() != expected {
            return Err(TerrainError::SampleCount {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { resolution, pixels })
    }

    pub fn from_image(image: &DynamicImage) -> Result<Self, TerrainError> {
        let rgb = image.to_rgb8();
        let (width, height) = rgb.dimensions();
        if width != height {
            return Err(TerrainError::NotSquare { width, height });
        }
        let pixels = rgb.pixels().map(|p| pack_argb(p[0], p[1], p[2])).collect();
        Self::from_pixels(width as usize, pixels)
    }

    /// Decode a PNG (or any format `image` was built with) from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TerrainError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| AssetError::io(path, e))?;
        let image = image::load_from_memory(&bytes).map_err(|e| AssetError::decode(path, e))?;
        let map = Self::from_image(&image)?;
        log::debug!("Decoded {:?}: {}x{}", path, map.resolution, map.resolution);
        Ok(map)
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Packed pixel at `(x, y)`, or `None` outside the image.
    pub fn pixel(&self, x: i64, y: i64) -> Option<i32> {
        let n = self.resolution as i64;
        if x < 0 || y < 0 || x >= n || y >= n {
            return None;
        }
        Some(self.pixels[(y * n + x) as usize])
    }

    /// `-pixel / 256^3`: about 1 for black, about 0 for white, 0 outside.
    pub fn darkness(&self, x: i64, y: i64) -> f32 {
        match self.pixel(x, y) {
            Some(p) => -(p as f32) / MAX_PIXEL_COLOR,
            None => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn packing_matches_signed_argb() {
        assert_eq!(pack_argb(255, 255, 255), -1);
        assert_eq!(pack_argb(0, 0, 0), -16_777_216);
        assert_eq!(pack_argb(0, 0, 1), -16_777_215);
    }

    /// Black reads as fully dark, white as (almost) zero.
    #[test]
    fn darkness_from_image() {
        let mut img = RgbImage::from_pixel(2, 2, Rgb([255, 255, 255]));
        img.put_pixel(1, 0, Rgb([0, 0, 0]));
        let map = Heightmap::from_image(&DynamicImage::ImageRgb8(img)).unwrap();
        assert_eq!(map.resolution(), 2);
        assert!((map.darkness(1, 0) - 1.0).abs() < 1e-6);
        assert!(map.darkness(0, 0) < 1e-6);
        assert_eq!(map.darkness(-1, 0), 0.0);
        assert_eq!(map.darkness(0, 2), 0.0);
    }

    #[test]
    fn rejects_non_square_images() {
        let img = RgbImage::new(4, 3);
        let err = Heightmap::from_image(&DynamicImage::ImageRgb8(img)).unwrap_err();
        assert!(matches!(err, TerrainError::NotSquare { width: 4, height: 3 }));
    }

    #[test]
    fn rejects_wrong_sample_count() {
        assert!(matches!(
            Heightmap::from_pixels(3, vec![0; 8]),
            Err(TerrainError::SampleCount { expected: 9, actual: 8 })
        ));
        assert!(matches!(Heightmap::from_pixels(1, vec![0]), Err(TerrainError::TooSmall(1))));
    }

    /// A missing file is an error, not an empty map.
    #[test]
    fn missing_file_is_fatal() {
        let err = Heightmap::load("definitely/not/here.png").unwrap_err();
        assert!(matches!(err, TerrainError::Asset(AssetError::Io { .. })));
    }
}
