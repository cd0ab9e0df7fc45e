// alpha-adjust - Scale the opacity of an image and export the result
// Loads one image, applies the requested opacity and writes the composite

mod cli;

use alpha_adjust::App;
use anyhow::Result;
use log::info;

fn main() -> Result<()> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Parse command line arguments
    let args = cli::parse_args()?;

    info!(
        "Starting alpha-adjust with image: {:?}, opacity: {}",
        args.image_path, args.opacity
    );

    let mut app = App::new(args.export)?;
    app.any_extension = args.any_extension;

    // Load the image
    match (&args.image_path, &args.image_data) {
        (_, Some(data)) => app.image_selected(data, None)?,
        (Some(path), None) => app.open_path(path)?,
        (None, None) => anyhow::bail!("No image source provided"),
    }

    // Same path as a slider move: commit the factor, refresh the preview
    app.set_opacity(args.opacity)?;
    let preview = app.preview()?;
    info!(
        "Preview ready: {}x{} at {}",
        preview.width(),
        preview.height(),
        args.opacity
    );

    app.export_requested(args.output, args.format)?;
    for result in app.finish_exports() {
        result?;
    }
    Ok(())
}
