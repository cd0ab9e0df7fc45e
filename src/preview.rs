// Preview module
// Holds the loaded image and keeps its composite in step with the slider

use crate::alpha::{self, AlphaLut};
use crate::error::{AlphaError, AlphaResult};
use crate::export::ExportSnapshot;
use crate::opacity::Opacity;
use crate::pixel_buffer::PixelBuffer;
use log::debug;
use std::sync::Arc;

/// Loaded image state: source, committed opacity and the composite for it
struct Loaded {
    source: Arc<PixelBuffer>,
    opacity: Opacity,
    composite: PixelBuffer,
}

/// Interactive preview state machine (Empty or Loaded).
///
/// All mutation goes through `&mut self`, so a caller holding
/// `&PixelBuffer` from [`current_composite`](Self::current_composite) can
/// never observe a half-recomputed composite.
#[derive(Default)]
pub struct PreviewEngine {
    loaded: Option<Loaded>,
}

impl PreviewEngine {
    /// Create an engine with no image loaded
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the source image and reset opacity to fully opaque
    pub fn load(&mut self, source: PixelBuffer) {
        debug!(
            "Loading {}x{} source into preview",
            source.width(),
            source.height()
        );
        let opacity = Opacity::OPAQUE;
        let composite = alpha::apply(&source, opacity);
        self.loaded = Some(Loaded {
            source: Arc::new(source),
            opacity,
            composite,
        });
    }

    /// Commit a new opacity and recompute the composite.
    ///
    /// Runs synchronously; the composite allocation is reused between calls.
    pub fn set_factor(&mut self, factor: f32) -> AlphaResult<()> {
        let loaded = self
            .loaded
            .as_mut()
            .ok_or(AlphaError::invalid_state("set_factor"))?;
        let opacity = Opacity::new(factor)?;
        if opacity == loaded.opacity {
            return Ok(());
        }

        alpha::apply_into(&loaded.source, &AlphaLut::new(opacity), &mut loaded.composite);
        loaded.opacity = opacity;
        debug!("Preview opacity set to {}", opacity);
        Ok(())
    }

    /// The composite for the current opacity, for repainting
    pub fn current_composite(&self) -> AlphaResult<&PixelBuffer> {
        self.loaded
            .as_ref()
            .map(|l| &l.composite)
            .ok_or(AlphaError::invalid_state("current_composite"))
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn opacity(&self) -> Option<Opacity> {
        self.loaded.as_ref().map(|l| l.opacity)
    }

    pub fn source(&self) -> AlphaResult<&PixelBuffer> {
        self.loaded
            .as_ref()
            .map(|l| l.source.as_ref())
            .ok_or(AlphaError::invalid_state("source"))
    }

    /// Capture (source, opacity) as they stand right now.
    ///
    /// The snapshot shares the immutable source and copies the factor, so
    /// later `set_factor` calls do not reach it.
    pub fn snapshot(&self) -> AlphaResult<ExportSnapshot> {
        let loaded = self
            .loaded
            .as_ref()
            .ok_or(AlphaError::invalid_state("export"))?;
        Ok(ExportSnapshot::new(Arc::clone(&loaded.source), loaded.opacity))
    }
}
