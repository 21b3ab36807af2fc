//! White canvases and color-mode conversion shared by the validator, stitcher and renderer.

use image::{ColorType, DynamicImage, ImageBuffer, Luma, LumaA, Rgb, Rgba, imageops};

/// Color mode an image is written in once the pipeline synthesizes it.
///
/// Float modes are narrowed to 8 bits because the output encoder does not store them.
pub fn output_color(color: ColorType) -> ColorType {
    match color {
        ColorType::Rgb32F => ColorType::Rgb8,
        ColorType::Rgba32F => ColorType::Rgba8,
        ColorType::L8
        | ColorType::La8
        | ColorType::Rgb8
        | ColorType::Rgba8
        | ColorType::L16
        | ColorType::La16
        | ColorType::Rgb16
        | ColorType::Rgba16 => color,
        _ => ColorType::Rgba8,
    }
}

/// A solid white canvas of the given size in the output form of `color`.
pub fn white_canvas(color: ColorType, width: u32, height: u32) -> DynamicImage {
    match output_color(color) {
        ColorType::L8 => {
            DynamicImage::ImageLuma8(ImageBuffer::from_pixel(width, height, Luma([u8::MAX])))
        }
        ColorType::La8 => DynamicImage::ImageLumaA8(ImageBuffer::from_pixel(
            width,
            height,
            LumaA([u8::MAX, u8::MAX]),
        )),
        ColorType::Rgb8 => {
            DynamicImage::ImageRgb8(ImageBuffer::from_pixel(width, height, Rgb([u8::MAX; 3])))
        }
        ColorType::L16 => {
            DynamicImage::ImageLuma16(ImageBuffer::from_pixel(width, height, Luma([u16::MAX])))
        }
        ColorType::La16 => DynamicImage::ImageLumaA16(ImageBuffer::from_pixel(
            width,
            height,
            LumaA([u16::MAX, u16::MAX]),
        )),
        ColorType::Rgb16 => {
            DynamicImage::ImageRgb16(ImageBuffer::from_pixel(width, height, Rgb([u16::MAX; 3])))
        }
        ColorType::Rgba16 => DynamicImage::ImageRgba16(ImageBuffer::from_pixel(
            width,
            height,
            Rgba([u16::MAX; 4]),
        )),
        _ => DynamicImage::ImageRgba8(ImageBuffer::from_pixel(width, height, Rgba([u8::MAX; 4]))),
    }
}

/// Converts an image into the output form of `color`, leaving it untouched when it already matches.
pub fn convert_to(image: DynamicImage, color: ColorType) -> DynamicImage {
    let target = output_color(color);
    if image.color() == target {
        return image;
    }
    match target {
        ColorType::L8 => DynamicImage::ImageLuma8(image.to_luma8()),
        ColorType::La8 => DynamicImage::ImageLumaA8(image.to_luma_alpha8()),
        ColorType::Rgb8 => DynamicImage::ImageRgb8(image.to_rgb8()),
        ColorType::L16 => DynamicImage::ImageLuma16(image.to_luma16()),
        ColorType::La16 => DynamicImage::ImageLumaA16(image.to_luma_alpha16()),
        ColorType::Rgb16 => DynamicImage::ImageRgb16(image.to_rgb16()),
        ColorType::Rgba16 => DynamicImage::ImageRgba16(image.to_rgba16()),
        _ => DynamicImage::ImageRgba8(image.to_rgba8()),
    }
}

/// Copies `top` onto `canvas` at (`x`, `y`) without blending, clipping at the canvas edge.
///
/// Matching modes are copied in their native depth; anything else goes through RGBA8.
pub fn paste(canvas: &mut DynamicImage, top: &DynamicImage, x: i64, y: i64) {
    match (canvas, top) {
        (DynamicImage::ImageLuma8(c), DynamicImage::ImageLuma8(t)) => imageops::replace(c, t, x, y),
        (DynamicImage::ImageLumaA8(c), DynamicImage::ImageLumaA8(t)) => {
            imageops::replace(c, t, x, y)
        }
        (DynamicImage::ImageRgb8(c), DynamicImage::ImageRgb8(t)) => imageops::replace(c, t, x, y),
        (DynamicImage::ImageRgba8(c), DynamicImage::ImageRgba8(t)) => imageops::replace(c, t, x, y),
        (DynamicImage::ImageLuma16(c), DynamicImage::ImageLuma16(t)) => {
            imageops::replace(c, t, x, y)
        }
        (DynamicImage::ImageLumaA16(c), DynamicImage::ImageLumaA16(t)) => {
            imageops::replace(c, t, x, y)
        }
        (DynamicImage::ImageRgb16(c), DynamicImage::ImageRgb16(t)) => {
            imageops::replace(c, t, x, y)
        }
        (DynamicImage::ImageRgba16(c), DynamicImage::ImageRgba16(t)) => {
            imageops::replace(c, t, x, y)
        }
        (canvas, top) => imageops::replace(canvas, top, x, y),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn test_white_canvas_keeps_mode() {
        let canvas = white_canvas(ColorType::L8, 4, 3);
        assert_eq!(canvas.color(), ColorType::L8);
        assert_eq!(canvas.dimensions(), (4, 3));
        assert_eq!(canvas.get_pixel(2, 1), Rgba([255, 255, 255, 255]));
    }

    #[test]
    fn test_float_modes_are_narrowed() {
        assert_eq!(output_color(ColorType::Rgba32F), ColorType::Rgba8);
        assert_eq!(white_canvas(ColorType::Rgb32F, 1, 1).color(), ColorType::Rgb8);
    }

    #[test]
    fn test_paste_clips_at_edge() {
        let mut canvas = white_canvas(ColorType::Rgb8, 4, 2);
        let black = DynamicImage::ImageRgb8(ImageBuffer::from_pixel(3, 3, Rgb([0, 0, 0])));
        paste(&mut canvas, &black, 2, 0);
        assert_eq!(canvas.get_pixel(1, 0), Rgba([255, 255, 255, 255]));
        assert_eq!(canvas.get_pixel(3, 1), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn test_convert_to() {
        let rgba = white_canvas(ColorType::Rgba8, 2, 2);
        assert_eq!(convert_to(rgba, ColorType::Rgb8).color(), ColorType::Rgb8);
    }
}
