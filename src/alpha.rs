// Alpha transform module
// Scales the alpha channel of a pixel buffer by an opacity factor

use crate::opacity::Opacity;
use crate::pixel_buffer::{PixelBuffer, Rgba};

/// Scale one alpha value: `round(alpha * factor)`, rounding halves away
/// from zero (255 at 50% gives 128).
pub fn scale_alpha(alpha: u8, opacity: Opacity) -> u8 {
    (f32::from(alpha) * opacity.get()).round().clamp(0.0, 255.0) as u8
}

/// Alpha lookup table for a single opacity factor.
///
/// Entry `a` holds `scale_alpha(a, opacity)`, so compositing a pixel is one
/// table read.
#[derive(Clone)]
pub struct AlphaLut {
    opacity: Opacity,
    table: [u8; 256],
}

impl AlphaLut {
    pub fn new(opacity: Opacity) -> Self {
        let mut table = [0u8; 256];
        for (a, slot) in table.iter_mut().enumerate() {
            *slot = scale_alpha(a as u8, opacity);
        }
        Self { opacity, table }
    }

    pub fn opacity(&self) -> Opacity {
        self.opacity
    }

    #[inline]
    pub fn scale(&self, alpha: u8) -> u8 {
        self.table[usize::from(alpha)]
    }

    #[inline]
    pub fn apply_pixel(&self, [r, g, b, a]: Rgba) -> Rgba {
        [r, g, b, self.scale(a)]
    }
}

/// Composite `buffer` at `opacity` into a freshly allocated buffer.
///
/// Color channels are copied unchanged; only alpha is scaled. The input is
/// never modified and the result never aliases it.
pub fn apply(buffer: &PixelBuffer, opacity: Opacity) -> PixelBuffer {
    let lut = AlphaLut::new(opacity);
    let mut out = PixelBuffer::with_capacity(buffer.len());
    apply_into(buffer, &lut, &mut out);
    out
}

/// Recompose `src` into `dst`, reusing `dst`'s allocation.
pub(crate) fn apply_into(src: &PixelBuffer, lut: &AlphaLut, dst: &mut PixelBuffer) {
    let pixels = dst.pixels_mut();
    pixels.clear();
    pixels.extend(src.pixels().iter().map(|&px| lut.apply_pixel(px)));
    dst.set_dimensions(src.width(), src.height());
}
