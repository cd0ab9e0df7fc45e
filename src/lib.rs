// alpha-adjust - Scale the opacity of an image and export the result
// Compositing core plus the loader and app state the binary drives

#![forbid(unsafe_code)]

pub mod alpha;
pub mod app;
pub mod error;
pub mod export;
pub mod image_loader;
pub mod opacity;
pub mod pixel_buffer;
pub mod preview;

pub use alpha::AlphaLut;
pub use app::{App, PendingExport};
pub use error::{AlphaError, AlphaResult};
pub use export::{ExportConfig, ExportJob, ExportPipeline, ExportSnapshot};
pub use opacity::Opacity;
pub use pixel_buffer::{PixelBuffer, Rgba};
pub use preview::PreviewEngine;
