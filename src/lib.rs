pub mod encoder;
pub mod error;
pub mod normalize;
pub mod utils;

use image::DynamicImage;
use log::{info, trace};
use lopdf::Document;
use std::path::Path;

pub use encoder::{DEFAULT_RESOLUTION, EncodeOptions, PageEncoder, Quality};
pub use error::{DecodeError, EncodeError, Error, Result};
pub use normalize::normalize;

/// Decode the images at `paths`, flatten their transparency onto white and write
/// them as the pages of the PDF document `output_path`, in order.
///
/// `quality` is the JPEG quality level of the pages and must be an integer.
/// Storage optimization is enabled.
pub fn build_document(
    paths: &[impl AsRef<Path>],
    output_path: impl AsRef<Path>,
    quality: &str,
) -> Result<()> {
    let options = EncodeOptions::new(quality.parse()?);
    build_document_with(paths, output_path, &options)
}

/// Same as [`build_document`] with already validated options.
///
/// The whole document is serialized in memory before anything is written, so
/// no output file is left behind when an image cannot be decoded or encoded.
pub fn build_document_with(
    paths: &[impl AsRef<Path>],
    output_path: impl AsRef<Path>,
    options: &EncodeOptions,
) -> Result<()> {
    let output_path = output_path.as_ref();

    if paths.is_empty() {
        return Err(Error::NoImages);
    }

    info!("Decoding {} images", paths.len());
    let images = paths
        .iter()
        .map(|path| decode(path.as_ref()))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    let mut doc = compose_document(images, options)?;

    info!("Writing '{}'", output_path.display());
    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).map_err(EncodeError::Serialize)?;
    std::fs::write(output_path, buffer).map_err(|source| EncodeError::Write {
        path: output_path.to_path_buf(),
        source,
    })?;

    Ok(())
}

/// Normalize `images` and lay them out as consecutive pages of a new document.
pub fn compose_document(
    images: impl IntoIterator<Item = DynamicImage>,
    options: &EncodeOptions,
) -> Result<Document> {
    let mut encoder = PageEncoder::new(options.clone());

    for image in images {
        let page = normalize(image);
        encoder.append_page(&page)?;
    }

    if encoder.page_count() == 0 {
        return Err(Error::NoImages);
    }

    info!(
        "Composed {} pages with quality {}",
        encoder.page_count(),
        options.quality.level()
    );
    Ok(encoder.finish()?)
}

fn decode(path: &Path) -> std::result::Result<DynamicImage, DecodeError> {
    trace!("Decoding '{}'", path.display());

    image::open(path).map_err(|source| DecodeError {
        path: path.to_path_buf(),
        source,
    })
}
