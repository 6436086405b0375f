use std::str::FromStr;

use image::{DynamicImage, GenericImageView, codecs::jpeg::JpegEncoder};
use log::{debug, trace, warn};
use lopdf::{
    Document, Object, ObjectId, Stream, StringFormat,
    content::{Content, Operation},
    dictionary,
};

use crate::error::EncodeError;

pub const DEFAULT_RESOLUTION: f32 = 72.0;
const POINTS_PER_INCH: f32 = 72.0;
const PDF_VERSION: &str = "1.7";
const IMAGE_RESOURCE_NAME: &str = "Im0";
const PRODUCER: &str = concat!(env!("CARGO_PKG_NAME"), " ", env!("CARGO_PKG_VERSION"));

/// JPEG quality level of the embedded pages, in `1..=100`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 100;

    /// Out of range levels are clamped to the nearest valid one.
    pub fn new(level: i64) -> Self {
        let clamped = level.clamp(Self::MIN as i64, Self::MAX as i64);
        if clamped != level {
            warn!(
                "The quality level {level} is outside of {}..={}, using {clamped}",
                Self::MIN,
                Self::MAX
            );
        }
        Self(clamped as u8)
    }

    pub fn level(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

impl FromStr for Quality {
    type Err = EncodeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let level = text
            .trim()
            .parse::<i64>()
            .map_err(|_| EncodeError::InvalidQuality(text.to_string()))?;
        Ok(Self::new(level))
    }
}

/// How the normalized pages are written into the output document.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    pub quality: Quality,
    /// Compress the content streams and drop unreferenced objects.
    pub optimize: bool,
    pub title: Option<String>,
    resolution: f32,
}

impl EncodeOptions {
    pub fn new(quality: Quality) -> Self {
        Self {
            quality,
            optimize: true,
            title: None,
            resolution: DEFAULT_RESOLUTION,
        }
    }

    /// Pixel density of the images, in dots per inch. It sets the physical size of the pages.
    pub fn with_resolution(mut self, resolution: f32) -> Result<Self, EncodeError> {
        if !resolution.is_finite() || resolution <= 0.0 {
            return Err(EncodeError::InvalidResolution(resolution));
        }
        self.resolution = resolution;
        Ok(self)
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn without_optimization(mut self) -> Self {
        self.optimize = false;
        self
    }

    pub fn resolution(&self) -> f32 {
        self.resolution
    }
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self::new(Quality::default())
    }
}

/// Builds a PDF document page by page, one JPEG image per page.
///
/// The first appended image is the base page, the following ones are appended
/// after it in call order.
pub struct PageEncoder {
    doc: Document,
    pages_root_id: ObjectId,
    page_count: usize,
    options: EncodeOptions,
}

impl PageEncoder {
    pub fn new(options: EncodeOptions) -> Self {
        let mut doc = Document::with_version(PDF_VERSION);

        let pages_root_id = doc.add_object(dictionary! {
            "Type" => "Pages",
            "Kids" => Object::Array(vec![]),
            "Count" => Object::Integer(0),
        });

        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_root_id),
        });
        doc.trailer.set("Root", catalog_id);

        Self {
            doc,
            pages_root_id,
            page_count: 0,
            options,
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Embed `image` as the next page. The image must be opaque, see [`crate::normalize`].
    pub fn append_page(&mut self, image: &DynamicImage) -> Result<ObjectId, EncodeError> {
        let page_number = self.page_count + 1;
        let (width, height) = image.dimensions();

        let (color_space, jpeg) = encode_jpeg(image, self.options.quality, page_number)?;
        trace!(
            "Page {page_number}: {width}x{height} {color_space}, {} bytes of JPEG data",
            jpeg.len()
        );

        let mut image_stream = Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => Object::Integer(width as i64),
                "Height" => Object::Integer(height as i64),
                "ColorSpace" => color_space,
                "BitsPerComponent" => Object::Integer(8),
                "Filter" => "DCTDecode",
            },
            jpeg,
        );
        // Already DCT encoded, Flate would only add overhead.
        image_stream.allows_compression = false;
        let image_id = self.doc.add_object(image_stream);

        let page_width = self.points(width);
        let page_height = self.points(height);

        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Real(page_width),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Real(page_height),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE_NAME.into())]),
                Operation::new("Q", vec![]),
            ],
        };
        let content_id = self
            .doc
            .add_object(Stream::new(dictionary! {}, content.encode()?));

        let page_id = self.doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => self.pages_root_id,
            "MediaBox" => vec![
                Object::Integer(0),
                Object::Integer(0),
                Object::Real(page_width),
                Object::Real(page_height),
            ],
            "Contents" => content_id,
            "Resources" => dictionary! {
                "XObject" => dictionary! {
                    IMAGE_RESOURCE_NAME => image_id,
                },
            },
        });

        let pages_root = self
            .doc
            .get_object_mut(self.pages_root_id)?
            .as_dict_mut()?;
        pages_root
            .get_mut(b"Kids")?
            .as_array_mut()?
            .push(Object::Reference(page_id));
        let count = pages_root.get(b"Count")?.as_i64()?;
        pages_root.set("Count", Object::Integer(count + 1));
        self.page_count = page_number;

        Ok(page_id)
    }

    /// Write the information dictionary and, if enabled, optimize the document.
    pub fn finish(mut self) -> Result<Document, EncodeError> {
        let mut info = dictionary! {
            "Producer" => Object::string_literal(PRODUCER),
        };
        if let Some(title) = &self.options.title {
            info.set("Title", text_string(title));
        }
        let info_id = self.doc.add_object(info);
        self.doc.trailer.set("Info", info_id);

        if self.options.optimize {
            let pruned = self.doc.prune_objects();
            debug!("Pruned {} unreferenced objects", pruned.len());
            self.doc.compress();
        }

        Ok(self.doc)
    }

    fn points(&self, pixels: u32) -> f32 {
        pixels as f32 * POINTS_PER_INCH / self.options.resolution
    }
}

fn encode_jpeg(
    image: &DynamicImage,
    quality: Quality,
    page: usize,
) -> Result<(&'static str, Vec<u8>), EncodeError> {
    let mut buffer = Vec::new();

    let color_space = {
        let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality.level());
        let (color_space, encoded) = match image {
            DynamicImage::ImageLuma8(gray) => ("DeviceGray", encoder.encode_image(gray)),
            other => ("DeviceRGB", encoder.encode_image(&other.to_rgb8())),
        };
        encoded.map_err(|source| EncodeError::Jpeg { page, source })?;
        color_space
    };

    Ok((color_space, buffer))
}

/// PDF text string: literal when ASCII, UTF-16BE with a byte order mark otherwise.
fn text_string(text: &str) -> Object {
    if text.is_ascii() {
        return Object::string_literal(text);
    }

    let mut bytes = vec![0xFE, 0xFF];
    bytes.extend(text.encode_utf16().flat_map(u16::to_be_bytes));
    Object::String(bytes, StringFormat::Hexadecimal)
}
