use anyhow::Result;
use clap::Parser;
use imgpages::{DEFAULT_RESOLUTION, EncodeOptions, build_document_with};
use log::info;
use std::path::PathBuf;

/// Concatenate images into a single PDF document, one image per page.
///
/// Images with an alpha channel are flattened onto a white background, every
/// page is embedded as a JPEG of the requested quality. An existing file at the
/// output path is overwritten.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output path of the PDF document
    #[arg(short = 'o')]
    output_path: PathBuf,
    /// JPEG quality level of the pages, an integer in 1..=100 (clamped otherwise)
    #[arg(short = 'q', allow_hyphen_values = true)]
    quality: String,
    /// Pixel density of the images in dots per inch, it determines the page size
    #[arg(short, long, default_value_t = DEFAULT_RESOLUTION)]
    resolution: f32,
    /// Title stored in the document metadata
    #[arg(short, long)]
    title: Option<String>,
    /// Images, in page order
    #[arg(required = true, num_args = 1..)]
    images: Vec<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("Application error: {}", err);
        std::process::exit(1);
    }
}

pub fn run() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    let mut options = EncodeOptions::new(cli.quality.parse()?).with_resolution(cli.resolution)?;
    if let Some(title) = cli.title {
        options = options.with_title(title);
    }

    build_document_with(&cli.images, &cli.output_path, &options)?;
    info!(
        "{} pages written to '{}'",
        cli.images.len(),
        cli.output_path.display()
    );
    println!("Output document saved as '{}'", cli.output_path.display());

    Ok(())
}
