//! Color-mode normalization of the decoded pages.
//!
//! A page embedded in the output document must be opaque. Images carrying an
//! alpha plane are flattened onto a white canvas, every other image goes
//! through untouched.

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, RgbaImage};
use log::trace;

pub const WHITE_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Whether the color type of `image` carries an alpha plane.
pub fn has_alpha(image: &DynamicImage) -> bool {
    image.color().has_alpha()
}

/// Extract the alpha plane of `image` as an 8-bit mask.
///
/// Returns `None` when the image exposes no alpha plane, which is an expected
/// input variation and not an error.
pub fn alpha_plane(image: &DynamicImage) -> Option<GrayImage> {
    if !has_alpha(image) {
        return None;
    }

    Some(split_alpha(&image.to_rgba8()))
}

/// Flatten `image` onto a white background if it has an alpha plane.
///
/// Opaque images are returned as they are, with their original color type.
/// Transparent ones become an 8-bit RGB image of the same dimensions.
pub fn normalize(image: DynamicImage) -> DynamicImage {
    if !has_alpha(&image) {
        trace!(
            "Image {}x{} ({:?}) has no alpha plane, kept unchanged",
            image.width(),
            image.height(),
            image.color()
        );
        return image;
    }

    trace!(
        "Flattening image {}x{} ({:?}) onto a white background",
        image.width(),
        image.height(),
        image.color()
    );

    let rgba = image.into_rgba8();
    let mask = split_alpha(&rgba);

    let mut canvas = RgbImage::from_pixel(rgba.width(), rgba.height(), WHITE_BACKGROUND);
    paste_with_mask(&mut canvas, &rgba, &mask);

    DynamicImage::ImageRgb8(canvas)
}

fn split_alpha(rgba: &RgbaImage) -> GrayImage {
    GrayImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        Luma([rgba.get_pixel(x, y).0[3]])
    })
}

fn paste_with_mask(canvas: &mut RgbImage, source: &RgbaImage, mask: &GrayImage) {
    for ((canvas_pixel, source_pixel), mask_pixel) in canvas
        .pixels_mut()
        .zip(source.pixels())
        .zip(mask.pixels())
    {
        let Luma([alpha]) = *mask_pixel;
        // The source carries 4 channels, only the 3 color ones are zipped in.
        for (background, foreground) in canvas_pixel.0.iter_mut().zip(source_pixel.0.iter()) {
            *background = blend(*foreground, *background, alpha);
        }
    }
}

/// `foreground * alpha + background * (1 - alpha)`, rounded to nearest.
fn blend(foreground: u8, background: u8, alpha: u8) -> u8 {
    let (foreground, background, alpha) = (foreground as u32, background as u32, alpha as u32);
    ((foreground * alpha + background * (255 - alpha) + 127) / 255) as u8
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils;
    use image::{GenericImageView, LumaA, Rgba};

    #[test]
    fn opaque_rgb_is_returned_pixel_identical() {
        let original = utils::random_image(37, 21, false);
        let normalized = normalize(original.clone());

        assert_eq!(normalized.color(), original.color());
        assert_eq!(normalized.as_bytes(), original.as_bytes());
    }

    #[test]
    fn opaque_luma_keeps_its_color_type() {
        let original = DynamicImage::ImageLuma8(GrayImage::from_fn(8, 4, |x, y| {
            Luma([(x * 30 + y) as u8])
        }));
        let normalized = normalize(original.clone());

        assert_eq!(normalized, original);
    }

    #[test]
    fn fully_transparent_becomes_white() {
        let transparent = RgbaImage::from_fn(13, 7, |x, y| Rgba([x as u8, y as u8, 200, 0]));
        let normalized = normalize(DynamicImage::ImageRgba8(transparent));

        assert!(!has_alpha(&normalized));
        assert_eq!(normalized.dimensions(), (13, 7));
        assert!(
            normalized
                .to_rgb8()
                .pixels()
                .all(|pixel| *pixel == WHITE_BACKGROUND)
        );
    }

    #[test]
    fn fully_opaque_keeps_colors_and_drops_alpha() {
        let mut original = utils::random_image(19, 11, true).into_rgba8();
        original.pixels_mut().for_each(|pixel| pixel.0[3] = 255);

        let normalized = normalize(DynamicImage::ImageRgba8(original.clone()));

        assert_eq!(normalized.color(), image::ColorType::Rgb8);
        for (x, y, pixel) in normalized.to_rgb8().enumerate_pixels() {
            let [r, g, b, _] = original.get_pixel(x, y).0;
            assert_eq!(pixel.0, [r, g, b]);
        }
    }

    #[test]
    fn half_transparent_blends_halfway_to_white() {
        let black = RgbaImage::from_pixel(2, 2, Rgba([0, 0, 0, 128]));
        let normalized = normalize(DynamicImage::ImageRgba8(black)).to_rgb8();

        assert!(normalized.pixels().all(|pixel| pixel.0 == [127, 127, 127]));
    }

    #[test]
    fn luma_alpha_is_flattened_too() {
        let original = image::GrayAlphaImage::from_pixel(3, 5, LumaA([0, 0]));
        let normalized = normalize(DynamicImage::ImageLumaA8(original));

        assert!(!has_alpha(&normalized));
        assert!(
            normalized
                .to_rgb8()
                .pixels()
                .all(|pixel| *pixel == WHITE_BACKGROUND)
        );
    }

    #[test]
    fn alpha_plane_is_absent_on_opaque_images() {
        assert!(alpha_plane(&utils::random_image(4, 4, false)).is_none());
    }

    #[test]
    fn alpha_plane_matches_fourth_channel() {
        let original = utils::random_image(9, 6, true);
        let plane = alpha_plane(&original).expect("the image has an alpha plane");

        let rgba = original.to_rgba8();
        for (x, y, Luma([alpha])) in plane.enumerate_pixels() {
            assert_eq!(*alpha, rgba.get_pixel(x, y).0[3]);
        }
    }

    #[test]
    fn blend_endpoints() {
        assert_eq!(blend(42, 255, 255), 42);
        assert_eq!(blend(42, 255, 0), 255);
    }
}
