use std::io::Cursor;

use image::imageops::FilterType;

use crate::errors::AppError;
use crate::formats::ImageKind;

/// Image bytes ready to serve, plus the detected native format the caller
/// uses for the response content type.
#[derive(Debug)]
pub struct RenderedImage {
    pub bytes: Vec<u8>,
    pub kind: ImageKind,
}

/// Width that keeps the aspect ratio at `target_height`, truncating the
/// floating-point ratio the way the original dimensions were divided:
/// floor(width / height * target_height).
pub fn scaled_width(width: u32, height: u32, target_height: u32) -> u32 {
    let aspect_ratio = width as f64 / height as f64;
    (aspect_ratio * target_height as f64) as u32
}

/// Detects the stored format and produces the bytes to serve. Height 0
/// returns the original bytes untouched (no re-encode); any other height
/// resizes to `(scaled_width, height)` and re-encodes in the native format.
pub fn render(bytes: &[u8], target_height: u32) -> Result<RenderedImage, AppError> {
    let format = image::guess_format(bytes)
        .map_err(|e| AppError::InternalError(format!("Unrecognized stored image format: {}", e)))?;

    let kind = ImageKind::from_image_format(format)
        .ok_or_else(|| AppError::InternalError("Unsupported stored image format".to_string()))?;

    if target_height == 0 {
        return Ok(RenderedImage {
            bytes: bytes.to_vec(),
            kind,
        });
    }

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| AppError::InternalError(format!("Failed to decode image: {}", e)))?;

    let new_width = scaled_width(img.width(), img.height(), target_height);
    let resized = img.resize_exact(new_width, target_height, FilterType::Triangle);

    let mut out = Cursor::new(Vec::new());
    resized
        .write_to(&mut out, format)
        .map_err(|e| AppError::InternalError(format!("Failed to encode image: {}", e)))?;

    Ok(RenderedImage {
        bytes: out.into_inner(),
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageFormat, RgbImage};

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn scaled_width_truncates() {
        // 1000/600 * 200 = 333.33..
        assert_eq!(scaled_width(1000, 600, 200), 333);
        assert_eq!(scaled_width(100, 100, 200), 200);
        assert_eq!(scaled_width(640, 480, 240), 320);
    }

    #[test]
    fn height_zero_returns_original_bytes() {
        let original = png_bytes(40, 30);
        let rendered = render(&original, 0).unwrap();
        assert_eq!(rendered.bytes, original);
        assert_eq!(rendered.kind, ImageKind::Png);
    }

    #[test]
    fn resize_produces_requested_height_and_floored_width() {
        let original = png_bytes(100, 60);
        let rendered = render(&original, 20).unwrap();
        assert_eq!(rendered.kind, ImageKind::Png);

        let resized = image::load_from_memory(&rendered.bytes).unwrap();
        assert_eq!(resized.height(), 20);
        // 100/60 * 20 = 33.33.. -> 33
        assert_eq!(resized.width(), 33);
    }

    #[test]
    fn format_is_preserved_through_resize() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(64, 64));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Jpeg).unwrap();

        let rendered = render(out.get_ref(), 32).unwrap();
        assert_eq!(rendered.kind, ImageKind::Jpeg);
        assert_eq!(image::guess_format(&rendered.bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn unknown_stored_bytes_are_rejected() {
        assert!(render(b"not an image at all", 0).is_err());
    }
}
