// Application state module
// Routes host events (image selected, slider moved, export requested) into the core

use crate::error::AlphaResult;
use crate::export::{ExportConfig, ExportJob, ExportPipeline};
use crate::image_loader;
use crate::opacity::Opacity;
use crate::pixel_buffer::PixelBuffer;
use crate::preview::PreviewEngine;
use anyhow::{bail, Result};
use image::ImageFormat;
use log::info;
use std::path::{Path, PathBuf};

/// An export running on the worker pool: composite, encode and write
pub struct PendingExport {
    path: PathBuf,
    job: ExportJob<Result<PathBuf>>,
}

impl PendingExport {
    fn start(
        exporter: &ExportPipeline,
        engine: &PreviewEngine,
        path: PathBuf,
        format: Option<ImageFormat>,
    ) -> AlphaResult<Self> {
        let target = path.clone();
        let job = exporter.export_async_then(engine, move |buffer| {
            write_export(&buffer, target, format)
        })?;
        Ok(Self { path, job })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Block until the export has been written
    pub fn finish(self) -> Result<PathBuf> {
        self.job.wait()?
    }

    /// The export outcome if the worker is done, otherwise the export back
    fn try_finish(self) -> std::result::Result<Result<PathBuf>, Self> {
        let path = self.path;
        match self.job.try_take() {
            Ok(result) => Ok(result.map_err(anyhow::Error::from).and_then(|written| written)),
            Err(job) => Err(Self { path, job }),
        }
    }
}

fn write_export(buffer: &PixelBuffer, path: PathBuf, format: Option<ImageFormat>) -> Result<PathBuf> {
    let format = image_loader::save(buffer, &path, format)?;
    info!(
        "Exported {}x{} image as {:?} to {}",
        buffer.width(),
        buffer.height(),
        format,
        path.display()
    );
    Ok(path)
}

/// Main application state
pub struct App {
    engine: PreviewEngine,
    exporter: ExportPipeline,
    pending: Vec<PendingExport>,
    /// Accept input files regardless of extension
    pub any_extension: bool,
}

impl App {
    /// Create a new application state
    pub fn new(config: ExportConfig) -> AlphaResult<Self> {
        Ok(Self {
            engine: PreviewEngine::new(),
            exporter: ExportPipeline::new(config)?,
            pending: Vec::new(),
            any_extension: false,
        })
    }

    /// "Image selected": decode the bytes and load them into the preview
    pub fn image_selected(&mut self, data: &[u8], hint: Option<ImageFormat>) -> Result<()> {
        let buffer = image_loader::decode(data, hint)?;
        info!("Image loaded: {}x{} pixels", buffer.width(), buffer.height());
        self.engine.load(buffer);
        Ok(())
    }

    /// "Image selected" from a file dropped or chosen by path
    pub fn open_path(&mut self, path: &Path) -> Result<()> {
        if !self.any_extension && !image_loader::is_accepted_extension(path) {
            bail!(
                "Unsupported image extension: {} (accepted: {})",
                path.display(),
                image_loader::ACCEPTED_EXTENSIONS.join(", ")
            );
        }
        let buffer = image_loader::load_file(path)?;
        info!(
            "Image loaded from {}: {}x{} pixels",
            path.display(),
            buffer.width(),
            buffer.height()
        );
        self.engine.load(buffer);
        Ok(())
    }

    /// "Opacity slider moved" (integer percent, 0-100)
    pub fn slider_moved(&mut self, percent: u32) -> AlphaResult<()> {
        let opacity = Opacity::from_percent(percent)?;
        self.engine.set_factor(opacity.get())
    }

    /// Set opacity directly as a normalized factor
    pub fn set_opacity(&mut self, opacity: Opacity) -> AlphaResult<()> {
        self.engine.set_factor(opacity.get())
    }

    /// Current composite, for repainting
    pub fn preview(&self) -> AlphaResult<&PixelBuffer> {
        self.engine.current_composite()
    }

    pub fn engine(&self) -> &PreviewEngine {
        &self.engine
    }

    /// "Export requested": snapshot now; composite, encode and write in the
    /// background.
    ///
    /// The export is tracked until [`poll_exports`](Self::poll_exports) or
    /// [`finish_exports`](Self::finish_exports) writes it out.
    pub fn export_requested(&mut self, path: PathBuf, format: Option<ImageFormat>) -> AlphaResult<()> {
        let export = PendingExport::start(&self.exporter, &self.engine, path, format)?;
        info!("Export to {} started", export.path().display());
        self.pending.push(export);
        Ok(())
    }

    /// Like [`export_requested`](Self::export_requested), but hands the
    /// pending export to the caller instead of tracking it
    pub fn export_detached(&self, path: PathBuf, format: Option<ImageFormat>) -> AlphaResult<PendingExport> {
        PendingExport::start(&self.exporter, &self.engine, path, format)
    }

    pub fn pending_exports(&self) -> usize {
        self.pending.len()
    }

    /// Collect every export the workers have finished writing, without
    /// blocking
    pub fn poll_exports(&mut self) -> Vec<Result<PathBuf>> {
        let mut done = Vec::new();
        let mut still_pending = Vec::with_capacity(self.pending.len());
        for export in self.pending.drain(..) {
            match export.try_finish() {
                Ok(result) => done.push(result),
                Err(export) => still_pending.push(export),
            }
        }
        self.pending = still_pending;
        done
    }

    /// Block until every tracked export has been written
    pub fn finish_exports(&mut self) -> Vec<Result<PathBuf>> {
        self.pending.drain(..).map(PendingExport::finish).collect()
    }
}
