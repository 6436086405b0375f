use anyhow::{Result, anyhow};
use clap::Parser;
use imgpages::utils::random_image;
use std::path::Path;

/// Generate an image of random pixels, to be used as an input page. The format is
/// chosen from the extension of the output path.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Output path
    #[arg(short = 'o')]
    output_path: String,
    /// Width in pixels
    #[arg(short = 'W')]
    width: u32,
    /// Height in pixels
    #[arg(short = 'H')]
    height: u32,
    /// Add a random alpha channel
    #[arg(short, long)]
    alpha: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    if let Err(err) = generate_random_image(cli.output_path, cli.width, cli.height, cli.alpha) {
        eprintln!("Error encountered: {}", err);
        std::process::exit(1);
    }
}

fn generate_random_image(
    output_path: impl AsRef<Path>,
    width: u32,
    height: u32,
    with_alpha: bool,
) -> Result<()> {
    let output_path = output_path.as_ref();

    if std::fs::exists(output_path)? {
        return Err(anyhow!(
            "A file at location '{}' exists already",
            output_path.display()
        ));
    }

    if width == 0 || height == 0 {
        return Err(anyhow!("The image must be at least 1x1, got {width}x{height}"));
    }

    random_image(width, height, with_alpha).save(output_path)?;
    log::info!(
        "Random {width}x{height} image saved as '{}'",
        output_path.display()
    );

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flags_are_top_level() -> Result<()> {
        let cli = Cli::try_parse_from(["random-image", "-o", "x.png", "-W", "4", "-H", "3", "--alpha"])?;

        assert_eq!(cli.output_path, "x.png");
        assert_eq!((cli.width, cli.height), (4, 3));
        assert!(cli.alpha);

        Ok(())
    }

    #[test]
    fn alpha_defaults_to_off() -> Result<()> {
        let cli = Cli::try_parse_from(["random-image", "-o", "x.png", "-W", "4", "-H", "3"])?;
        assert!(!cli.alpha);
        Ok(())
    }

    #[test]
    fn refuses_empty_images() {
        assert!(generate_random_image("dev-playground/never-written.png", 0, 5, false).is_err());
    }
}
