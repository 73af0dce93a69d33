//! Host-resident byte-color images.

use lumen_math::Rgba8;
use lumen_memory::{Array, Host, MemoryError};

use crate::error::ImageError;

/// A `width` x `height` grid of [`Rgba8`] pixels in host memory, stored
/// row-major with row 0 at the top.
#[derive(Debug)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Array<Rgba8, Host>,
}

impl Image {
    /// A transparent black image.
    pub fn new(width: u32, height: u32) -> Result<Self, MemoryError> {
        Ok(Self {
            width,
            height,
            pixels: Array::zeroed(width as usize * height as usize)?,
        })
    }

    /// An image holding a copy of `pixels`, which must be `width * height` long.
    pub fn from_pixels(width: u32, height: u32, pixels: &[Rgba8]) -> Result<Self, ImageError> {
        if pixels.len() != width as usize * height as usize {
            return Err(ImageError::SizeMismatch {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels: Array::from_slice(pixels)?,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major index of `(x, y)`.
    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// The pixel at `(x, y)`, or `None` outside the image.
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index(x, y)])
    }

    /// Overwrite the pixel at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` lies outside the image.
    pub fn set(&mut self, x: u32, y: u32, pixel: Rgba8) {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} image",
            self.width,
            self.height
        );
        let i = self.index(x, y);
        self.pixels[i] = pixel;
    }

    /// All pixels, row-major.
    pub fn pixels(&self) -> &[Rgba8] {
        &self.pixels
    }

    /// All pixels, row-major, mutably.
    pub fn pixels_mut(&mut self) -> &mut [Rgba8] {
        &mut self.pixels
    }

    /// Interleaved `r, g, b, a` bytes, row-major, no padding.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.pixels())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_major_access() {
        let mut img = Image::new(3, 2).unwrap();
        img.set(2, 0, Rgba8::new(1, 2, 3, 4));
        img.set(0, 1, Rgba8::new(5, 6, 7, 8));
        assert_eq!(img.pixels()[2], Rgba8::new(1, 2, 3, 4));
        assert_eq!(img.pixels()[3], Rgba8::new(5, 6, 7, 8));
        assert_eq!(img.get(0, 1), Some(Rgba8::new(5, 6, 7, 8)));
        assert_eq!(img.get(3, 0), None);
        assert_eq!(&img.as_bytes()[8..16], &[1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_from_pixels_checks_length() {
        let px = vec![Rgba8::default(); 5];
        assert!(matches!(
            Image::from_pixels(2, 3, &px),
            Err(ImageError::SizeMismatch { len: 5, .. })
        ));
        assert!(Image::from_pixels(5, 1, &px).is_ok());
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_set_out_of_bounds() {
        Image::new(2, 2).unwrap().set(0, 2, Rgba8::default());
    }
}
