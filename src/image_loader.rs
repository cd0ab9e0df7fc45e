// Image loading module
// Decodes image files into pixel buffers and encodes composites back to disk

use crate::pixel_buffer::PixelBuffer;
use anyhow::{Context, Result};
use image::{DynamicImage, ImageFormat, RgbaImage};
use log::{debug, warn};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Extensions accepted for input images, matching the drop target filter
pub const ACCEPTED_EXTENSIONS: &[&str] = &["jpg", "png", "bmp"];

/// Decode image bytes, auto-detecting the format.
///
/// `hint` is only used when the format cannot be detected from the data.
pub fn decode(data: &[u8], hint: Option<ImageFormat>) -> Result<PixelBuffer> {
    let format = match image::guess_format(data) {
        Ok(format) => format,
        Err(e) => hint.ok_or(e).context("Failed to detect image format")?,
    };

    let img = image::load(Cursor::new(data), format).context("Failed to decode image")?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    debug!("Decoded {:?} image: {}x{}", format, width, height);

    Ok(PixelBuffer::from_raw_rgba(width, height, rgba.into_raw())?)
}

/// Read and decode an image file
pub fn load_file(path: &Path) -> Result<PixelBuffer> {
    let data = fs::read(path)
        .with_context(|| format!("Failed to read image file: {}", path.display()))?;
    decode(&data, format_from_path(path))
        .with_context(|| format!("Failed to load image: {}", path.display()))
}

/// Whether `path` has one of the [`ACCEPTED_EXTENSIONS`] (case-insensitive)
pub fn is_accepted_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            ACCEPTED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Get the appropriate image format from file extension
pub fn format_from_extension(ext: &str) -> Option<ImageFormat> {
    match ext.to_lowercase().as_str() {
        "png" => Some(ImageFormat::Png),
        "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
        "gif" => Some(ImageFormat::Gif),
        "webp" => Some(ImageFormat::WebP),
        "bmp" => Some(ImageFormat::Bmp),
        "ico" => Some(ImageFormat::Ico),
        "tiff" | "tif" => Some(ImageFormat::Tiff),
        _ => None,
    }
}

pub fn format_from_path(path: &Path) -> Option<ImageFormat> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(format_from_extension)
}

fn supports_alpha(format: ImageFormat) -> bool {
    !matches!(format, ImageFormat::Jpeg)
}

/// Encode a composite into `format`.
///
/// Formats that cannot store alpha get the color channels only.
pub fn encode(buffer: &PixelBuffer, format: ImageFormat) -> Result<Vec<u8>> {
    let (width, height) = buffer.dimensions();
    let rgba = RgbaImage::from_raw(width, height, buffer.as_bytes().to_vec())
        .context("Pixel data does not match image dimensions")?;
    let img = if supports_alpha(format) {
        DynamicImage::ImageRgba8(rgba)
    } else {
        warn!("{:?} has no alpha channel, opacity will be dropped", format);
        DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(rgba).to_rgb8())
    };

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format)
        .with_context(|| format!("Failed to encode {}x{} image as {:?}", width, height, format))?;
    Ok(out.into_inner())
}

/// Write encoded bytes to `path`
pub fn write(data: &[u8], path: &Path) -> Result<()> {
    fs::write(path, data).with_context(|| format!("Failed to write image: {}", path.display()))
}

/// Encode and write a composite, picking the format from `format` or the
/// path's extension, PNG otherwise. Returns the format used.
pub fn save(buffer: &PixelBuffer, path: &Path, format: Option<ImageFormat>) -> Result<ImageFormat> {
    let format = format
        .or_else(|| format_from_path(path))
        .unwrap_or(ImageFormat::Png);
    let data = encode(buffer, format)?;
    write(&data, path)?;
    Ok(format)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PixelBuffer {
        PixelBuffer::new(2, 1, vec![[255, 0, 0, 128], [0, 0, 255, 0]]).unwrap()
    }

    #[test]
    fn extension_filter_matches_drop_target() {
        assert!(is_accepted_extension(Path::new("a/photo.JPG")));
        assert!(is_accepted_extension(Path::new("logo.png")));
        assert!(is_accepted_extension(Path::new("x.Bmp")));
        assert!(!is_accepted_extension(Path::new("anim.gif")));
        assert!(!is_accepted_extension(Path::new("photo.jpeg")));
        assert!(!is_accepted_extension(Path::new("noext")));
    }

    #[test]
    fn format_lookup_is_case_insensitive() {
        assert_eq!(format_from_extension("PNG"), Some(ImageFormat::Png));
        assert_eq!(format_from_extension("jpeg"), Some(ImageFormat::Jpeg));
        assert_eq!(format_from_extension("psd"), None);
        assert_eq!(
            format_from_path(Path::new("out/Result.TIF")),
            Some(ImageFormat::Tiff)
        );
    }

    #[test]
    fn png_keeps_alpha() {
        let bytes = encode(&sample(), ImageFormat::Png).unwrap();
        let decoded = decode(&bytes, None).unwrap();
        assert_eq!(decoded, sample());
    }

    #[test]
    fn jpeg_drops_alpha_without_failing() {
        let bytes = encode(&sample(), ImageFormat::Jpeg).unwrap();
        let decoded = decode(&bytes, None).unwrap();
        assert_eq!(decoded.dimensions(), (2, 1));
        assert!(decoded.pixels().iter().all(|p| p[3] == 255));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode(b"not an image", Some(ImageFormat::Png)).unwrap_err();
        assert!(err.to_string().contains("Failed to decode image"));
        assert!(decode(b"not an image", None).is_err());
    }
}
