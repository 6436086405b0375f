use std::path::PathBuf;

use thiserror::Error;

/// An input path could not be opened or decoded as an image.
#[derive(Debug, Error)]
#[error("could not decode '{}' as an image: {source}", .path.display())]
pub struct DecodeError {
    pub path: PathBuf,
    #[source]
    pub source: image::ImageError,
}

/// The output document could not be produced.
#[derive(Debug, Error)]
pub enum EncodeError {
    #[error("the quality level '{0}' is not a valid integer")]
    InvalidQuality(String),

    #[error("the resolution {0} is not a positive number of dots per inch")]
    InvalidResolution(f32),

    #[error("could not encode page {page} as JPEG: {source}")]
    Jpeg {
        page: usize,
        #[source]
        source: image::ImageError,
    },

    #[error("could not assemble the PDF document: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("could not serialize the PDF document: {0}")]
    Serialize(#[source] std::io::Error),

    #[error("could not write the output document '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("at least one input image is required")]
    NoImages,
}

pub type Result<T> = std::result::Result<T, Error>;
