use anyhow::{Result, anyhow};
use image::{DynamicImage, RgbImage, RgbaImage};
use lopdf::{Document, Object};
use rand::Rng;
use std::path::{Path, PathBuf};

/// Get an image of random pixels, with a random alpha plane if `with_alpha` is set.
pub fn random_image(width: u32, height: u32, with_alpha: bool) -> DynamicImage {
    let mut rng = rand::rng();

    if with_alpha {
        let mut rgba = RgbaImage::new(width, height);
        rgba.pixels_mut().for_each(|pixel| pixel.0 = rng.random());
        DynamicImage::ImageRgba8(rgba)
    } else {
        let mut rgb = RgbImage::new(width, height);
        rgb.pixels_mut().for_each(|pixel| pixel.0 = rng.random());
        DynamicImage::ImageRgb8(rgb)
    }
}

/// Writes one random PNG image per `(width, height, with_alpha)` entry in `dir`,
/// named `page_1.png`, `page_2.png`, ... and returns their paths in order.
pub fn write_random_images(
    dir: impl AsRef<Path>,
    specs: &[(u32, u32, bool)],
) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();

    if !std::fs::exists(dir)? {
        std::fs::create_dir_all(dir)?;
    }

    specs
        .iter()
        .enumerate()
        .map(|(index, &(width, height, with_alpha))| {
            let path = dir.join(format!("page_{}.png", index + 1));
            random_image(width, height, with_alpha).save(&path)?;
            Ok(path)
        })
        .collect()
}

/// Width and height in points of every page, in page order.
pub fn page_sizes(doc: &Document) -> Result<Vec<(f32, f32)>> {
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let media_box = doc
                .get_object(page_id)?
                .as_dict()?
                .get(b"MediaBox")?
                .as_array()?;

            match media_box.as_slice() {
                [_, _, width, height] => Ok((width.as_float()?, height.as_float()?)),
                _ => Err(anyhow!(
                    "The MediaBox of page {page_id:?} does not have 4 entries"
                )),
            }
        })
        .collect()
}

/// Color space of the image painted on every page, in page order.
pub fn page_color_spaces(doc: &Document) -> Result<Vec<String>> {
    doc.get_pages()
        .values()
        .map(|&page_id| {
            let xobjects = doc
                .get_object(page_id)?
                .as_dict()?
                .get(b"Resources")?
                .as_dict()?
                .get(b"XObject")?
                .as_dict()?;

            let (_name, image_ref) = xobjects
                .iter()
                .next()
                .ok_or(anyhow!("The page {page_id:?} paints no image"))?;
            let image = doc.get_object(image_ref.as_reference()?)?.as_stream()?;

            match image.dict.get(b"ColorSpace")? {
                Object::Name(name) => Ok(String::from_utf8(name.clone())?),
                other => Err(anyhow!("Unexpected color space object {other:?}")),
            }
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn random_image_has_requested_layout() {
        let opaque = random_image(7, 3, false);
        assert_eq!((opaque.width(), opaque.height()), (7, 3));
        assert!(!opaque.color().has_alpha());

        let transparent = random_image(2, 9, true);
        assert_eq!((transparent.width(), transparent.height()), (2, 9));
        assert!(transparent.color().has_alpha());
    }
}
