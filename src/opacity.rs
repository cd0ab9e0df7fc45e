// Opacity module
// Normalized opacity factor applied to the alpha channel

use crate::error::{AlphaError, AlphaResult};
use std::fmt;

/// Opacity factor in the closed range [0.0, 1.0].
///
/// Values outside the range (and NaN) are rejected at construction rather
/// than clamped, so holding an `Opacity` means the factor is valid.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Opacity(f32);

impl Opacity {
    pub const TRANSPARENT: Self = Self(0.0);
    pub const OPAQUE: Self = Self(1.0);

    pub fn new(factor: f32) -> AlphaResult<Self> {
        if !(0.0..=1.0).contains(&factor) {
            return Err(AlphaError::OutOfRange(factor));
        }
        Ok(Self(factor))
    }

    /// Convert a slider position (integer percent, 0-100).
    pub fn from_percent(percent: u32) -> AlphaResult<Self> {
        Self::new(percent as f32 / 100.0)
    }

    pub fn get(self) -> f32 {
        self.0
    }

    /// Nearest integer percent, for putting the factor back on a slider.
    pub fn percent(self) -> u32 {
        (self.0 * 100.0).round() as u32
    }
}

impl Default for Opacity {
    fn default() -> Self {
        Self::OPAQUE
    }
}

impl TryFrom<f32> for Opacity {
    type Error = AlphaError;

    fn try_from(factor: f32) -> AlphaResult<Self> {
        Self::new(factor)
    }
}

impl fmt::Display for Opacity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_closed_unit_range() {
        assert_eq!(Opacity::new(0.0).unwrap(), Opacity::TRANSPARENT);
        assert_eq!(Opacity::new(1.0).unwrap(), Opacity::OPAQUE);
        assert_eq!(Opacity::new(0.25).unwrap().get(), 0.25);
    }

    #[test]
    fn rejects_out_of_range_without_clamping() {
        assert_eq!(Opacity::new(1.01), Err(AlphaError::OutOfRange(1.01)));
        assert_eq!(Opacity::new(-0.1), Err(AlphaError::OutOfRange(-0.1)));
        assert!(matches!(
            Opacity::new(f32::NAN),
            Err(AlphaError::OutOfRange(_))
        ));
        assert!(Opacity::new(f32::INFINITY).is_err());
    }

    #[test]
    fn percent_maps_slider_positions() {
        assert_eq!(Opacity::from_percent(0).unwrap(), Opacity::TRANSPARENT);
        assert_eq!(Opacity::from_percent(100).unwrap(), Opacity::OPAQUE);
        assert_eq!(Opacity::from_percent(50).unwrap().get(), 0.5);
        assert_eq!(Opacity::from_percent(37).unwrap().percent(), 37);
        assert!(Opacity::from_percent(101).is_err());
    }

    #[test]
    fn defaults_to_opaque() {
        assert_eq!(Opacity::default(), Opacity::OPAQUE);
        assert_eq!(Opacity::default().to_string(), "100%");
    }
}
