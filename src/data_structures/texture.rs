//! CPU-side image pixel buffers.
//!
//! This module provides [`Image`], a float RGBA pixel buffer that texture
//! baking samples from. Pixels are stored bottom row first so that a UV
//! coordinate of `(0, 0)` addresses the first pixel in the buffer.

use image::{DynamicImage, GenericImageView};

/// A decoded image: `width * height` RGBA pixels as `f32` channels.
///
/// Rows are ordered bottom to top. 8-bit sources map to `byte / 255`, so color
/// values keep whatever encoding (usually sRGB) the file was stored in.
#[derive(Clone, Debug, PartialEq)]
pub struct Image {
    pub name: String,
    width: u32,
    height: u32,
    pixels: Vec<f32>,
}

impl Image {
    /// Number of channels per pixel.
    pub const CHANNELS: usize = 4;

    /// Build an image from raw bottom-up RGBA floats.
    ///
    /// Returns `None` if either dimension is zero or the buffer length does not
    /// match `width * height * 4`.
    pub fn from_rgba(name: &str, width: u32, height: u32, pixels: Vec<f32>) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        if pixels.len() != width as usize * height as usize * Self::CHANNELS {
            return None;
        }
        Some(Self {
            name: name.to_string(),
            width,
            height,
            pixels,
        })
    }

    /// Convert a decoded [`DynamicImage`] (top row first) into a bottom-up buffer.
    pub fn from_dynamic(name: &str, img: &DynamicImage) -> Option<Self> {
        let (width, height) = img.dimensions();
        let rgba = img.flipv().to_rgba32f();
        Self::from_rgba(name, width, height, rgba.into_raw())
    }

    /// A single-color image, handy as a placeholder.
    pub fn solid(name: &str, width: u32, height: u32, color: [f32; 4]) -> Option<Self> {
        let count = width as usize * height as usize;
        let pixels = std::iter::repeat_n(color, count).flatten().collect();
        Self::from_rgba(name, width, height, pixels)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// `(width, height)` in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// The flat bottom-up RGBA buffer.
    pub fn pixels(&self) -> &[f32] {
        &self.pixels
    }

    /// RGBA of pixel `(x, y)` with `y` counted from the bottom row.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = (y as usize * self.width as usize + x as usize) * Self::CHANNELS;
        let p = &self.pixels[index..index + Self::CHANNELS];
        Some([p[0], p[1], p[2], p[3]])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn rejects_empty_and_mismatched_buffers() {
        assert!(Image::from_rgba("empty", 0, 4, Vec::new()).is_none());
        assert!(Image::from_rgba("short", 2, 2, vec![0.0; 15]).is_none());
        assert!(Image::from_rgba("ok", 2, 2, vec![0.0; 16]).is_some());
    }

    #[test]
    fn dynamic_images_are_stored_bottom_row_first() {
        let mut img = RgbaImage::new(1, 2);
        // top row red, bottom row blue
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(0, 1, Rgba([0, 0, 255, 255]));
        let image = Image::from_dynamic("flip", &DynamicImage::ImageRgba8(img)).unwrap();

        assert_eq!(image.pixel(0, 0), Some([0.0, 0.0, 1.0, 1.0]));
        assert_eq!(image.pixel(0, 1), Some([1.0, 0.0, 0.0, 1.0]));
        assert_eq!(image.pixel(1, 0), None);
    }
}
