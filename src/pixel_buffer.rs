// Pixel buffer module
// Immutable in-memory RGBA image data

use crate::error::{AlphaError, AlphaResult};

/// One pixel as straight (non-premultiplied) red, green, blue, alpha.
pub type Rgba = [u8; 4];

/// Decoded image data, row-major, one [`Rgba`] per pixel.
///
/// A buffer is read-only once built. Transforms never touch an existing
/// buffer; they produce a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Rgba>,
}

impl PixelBuffer {
    /// Build a buffer from decoded pixels.
    ///
    /// Fails with [`AlphaError::InvalidBuffer`] when `pixels.len()` is not
    /// `width * height`.
    pub fn new(width: u32, height: u32, pixels: Vec<Rgba>) -> AlphaResult<Self> {
        let expected = pixel_count(width, height)?;
        if pixels.len() != expected {
            return Err(AlphaError::invalid_buffer(format!(
                "{}x{} needs {} pixels, got {}",
                width,
                height,
                expected,
                pixels.len()
            )));
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a buffer from packed RGBA bytes (4 bytes per pixel).
    pub fn from_raw_rgba(width: u32, height: u32, data: Vec<u8>) -> AlphaResult<Self> {
        let pixels: &[Rgba] = bytemuck::try_cast_slice(data.as_slice()).map_err(|e| {
            AlphaError::invalid_buffer(format!("raw data of {} bytes: {:?}", data.len(), e))
        })?;
        Self::new(width, height, pixels.to_vec())
    }

    /// A buffer with every pixel set to `color`.
    pub fn filled(width: u32, height: u32, color: Rgba) -> AlphaResult<Self> {
        let count = pixel_count(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![color; count],
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Read the pixel at column `x`, row `y`.
    pub fn pixel(&self, x: u32, y: u32) -> AlphaResult<Rgba> {
        if x >= self.width || y >= self.height {
            return Err(AlphaError::OutOfBounds {
                x,
                y,
                width: self.width,
                height: self.height,
            });
        }
        let idx = y as usize * self.width as usize + x as usize;
        Ok(self.pixels[idx])
    }

    pub fn pixels(&self) -> &[Rgba] {
        &self.pixels
    }

    /// Packed RGBA bytes, borrowed without copying.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.pixels.as_slice())
    }

    pub fn into_raw(self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            width: 0,
            height: 0,
            pixels: Vec::with_capacity(capacity),
        }
    }

    // Only the compositing code may write into an existing allocation, and
    // only into a buffer it exclusively owns.
    pub(crate) fn pixels_mut(&mut self) -> &mut Vec<Rgba> {
        &mut self.pixels
    }

    pub(crate) fn set_dimensions(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

fn pixel_count(width: u32, height: u32) -> AlphaResult<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .ok_or_else(|| AlphaError::invalid_buffer(format!("{}x{} overflows", width, height)))
}
