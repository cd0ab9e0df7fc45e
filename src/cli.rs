// Command line interface module
// Handles parsing of command line arguments and stdin input

use alpha_adjust::image_loader;
use alpha_adjust::{ExportConfig, Opacity};
use anyhow::{bail, Result};
use clap::Parser;
use image::ImageFormat;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// alpha-adjust - Scale the opacity of an image and export the result
#[derive(Parser, Debug)]
#[command(name = "alpha-adjust")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the image file (can also be provided via stdin pipe)
    #[arg(value_name = "IMAGE")]
    pub image_path: Option<PathBuf>,

    /// Opacity to apply (0.0 - 1.0)
    #[arg(short, long, value_parser = parse_opacity, conflicts_with = "percent")]
    pub opacity: Option<f32>,

    /// Opacity as a slider percentage (0 - 100)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=100))]
    pub percent: Option<u32>,

    /// Where to write the result (default: <IMAGE stem>_alpha.png)
    #[arg(long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Output format extension (png, bmp, tiff, ...); defaults to the output extension
    #[arg(long, value_parser = parse_format)]
    pub format: Option<ImageFormat>,

    /// Number of export worker threads
    #[arg(long, value_name = "N")]
    pub export_threads: Option<usize>,

    /// Accept input files with any extension, not only jpg/png/bmp
    #[arg(long, default_value = "false")]
    pub any_extension: bool,
}

/// Parsed arguments with resolved image source
#[derive(Debug)]
pub struct ParsedArgs {
    pub image_path: Option<PathBuf>,
    pub image_data: Option<Vec<u8>>,
    pub opacity: Opacity,
    pub output: PathBuf,
    pub format: Option<ImageFormat>,
    pub export: ExportConfig,
    pub any_extension: bool,
}

/// Parse opacity value and ensure it's within valid range
fn parse_opacity(s: &str) -> Result<f32, String> {
    let opacity: f32 = s.parse().map_err(|_| "Invalid opacity value")?;
    if !(0.0..=1.0).contains(&opacity) {
        return Err("Opacity must be between 0.0 and 1.0".to_string());
    }
    Ok(opacity)
}

fn parse_format(s: &str) -> Result<ImageFormat, String> {
    image_loader::format_from_extension(s).ok_or_else(|| format!("Unknown image format: {}", s))
}

/// Check if stdin has data available (is a pipe)
fn stdin_has_data() -> bool {
    !atty::is(atty::Stream::Stdin)
}

/// Read image data from stdin
fn read_stdin() -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    io::stdin().read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// `<dir>/<stem>_alpha.png` next to the input, or `alpha.png` for stdin
fn default_output(image_path: Option<&Path>) -> PathBuf {
    match image_path.and_then(|p| p.file_stem().map(|stem| (p, stem))) {
        Some((path, stem)) => {
            path.with_file_name(format!("{}_alpha.png", stem.to_string_lossy()))
        }
        None => PathBuf::from("alpha.png"),
    }
}

/// Whether two paths name the same file, resolving `.`/`..` and symlinks
/// when both exist
fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Parse command line arguments and handle stdin input
pub fn parse_args() -> Result<ParsedArgs> {
    resolve(Args::parse())
}

fn resolve(args: Args) -> Result<ParsedArgs> {
    // A path on the command line wins over piped data
    let (image_path, image_data) = if let Some(path) = args.image_path {
        (Some(path), None)
    } else if stdin_has_data() {
        let data = read_stdin()?;
        if data.is_empty() {
            bail!("No data received from stdin");
        }
        (None, Some(data))
    } else {
        bail!("No image provided. Please provide an image path or pipe image data to stdin.\n\
               Usage: alpha-adjust <IMAGE> [OPTIONS]\n\
               Or:    cat image.png | alpha-adjust [OPTIONS]");
    };

    let opacity = match (args.opacity, args.percent) {
        (Some(factor), _) => Opacity::new(factor)?,
        (None, Some(percent)) => Opacity::from_percent(percent)?,
        (None, None) => Opacity::OPAQUE,
    };

    let output = args
        .output
        .unwrap_or_else(|| default_output(image_path.as_deref()));
    if image_path
        .as_deref()
        .is_some_and(|input| same_file(input, &output))
    {
        bail!("Refusing to overwrite the input image: {}", output.display());
    }

    Ok(ParsedArgs {
        image_path,
        image_data,
        opacity,
        output,
        format: args.format,
        export: ExportConfig {
            threads: args.export_threads,
        },
        any_extension: args.any_extension,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("alpha-adjust").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn opacity_flag_is_range_checked() {
        assert!(parse_opacity("0.25").is_ok());
        assert!(parse_opacity("1.5").is_err());
        assert!(parse_opacity("half").is_err());
        assert!(Args::try_parse_from(["alpha-adjust", "a.png", "-o", "2"]).is_err());
    }

    #[test]
    fn percent_and_opacity_conflict() {
        assert!(Args::try_parse_from(["alpha-adjust", "a.png", "-o", "0.5", "-p", "50"]).is_err());
        assert!(Args::try_parse_from(["alpha-adjust", "a.png", "-p", "101"]).is_err());
    }

    #[test]
    fn resolves_percent_and_default_output() {
        let parsed = resolve(args(&["dir/photo.jpg", "-p", "40"])).unwrap();
        assert_eq!(parsed.opacity, Opacity::from_percent(40).unwrap());
        assert_eq!(parsed.output, PathBuf::from("dir/photo_alpha.png"));
        assert_eq!(parsed.format, None);
        assert!(parsed.export.threads.is_none());
    }

    #[test]
    fn explicit_output_and_format() {
        let parsed = resolve(args(&[
            "in.png",
            "--opacity",
            "0.5",
            "--output",
            "out.img",
            "--format",
            "bmp",
            "--export-threads",
            "3",
        ]))
        .unwrap();
        assert_eq!(parsed.opacity.get(), 0.5);
        assert_eq!(parsed.output, PathBuf::from("out.img"));
        assert_eq!(parsed.format, Some(ImageFormat::Bmp));
        assert_eq!(parsed.export.threads, Some(3));
    }

    #[test]
    fn refuses_to_overwrite_input() {
        assert!(resolve(args(&["in.png", "--output", "in.png"])).is_err());
    }

    #[test]
    fn refuses_to_overwrite_input_through_another_spelling() {
        let dir = std::env::temp_dir().join(format!("alpha-adjust-cli-{}", std::process::id()));
        fs::create_dir_all(dir.join("sub")).unwrap();
        let input = dir.join("in.png");
        fs::write(&input, b"x").unwrap();

        let dotted = dir.join(".").join("in.png");
        let via_parent = dir.join("sub").join("..").join("in.png");
        for output in [&dotted, &via_parent] {
            let argv = [
                input.to_str().unwrap(),
                "--output",
                output.to_str().unwrap(),
            ];
            assert!(resolve(args(&argv)).is_err(), "{}", output.display());
        }

        let other = dir.join("other.png");
        let argv = [input.to_str().unwrap(), "--output", other.to_str().unwrap()];
        assert!(resolve(args(&argv)).is_ok());
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn unknown_format_is_rejected() {
        assert!(Args::try_parse_from(["alpha-adjust", "a.png", "--format", "psd"]).is_err());
    }
}
