//! Encoding crop results.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder};

use crate::options::OutputFormat;

use super::{BitmapError, DecodedImage};

/// Encode RGB pixel data as `format`.
///
/// # Arguments
///
/// * `image` - Bitmap to encode
/// * `format` - Output container; WebP is written as PNG
/// * `quality` - JPEG quality, clamped to 1-100; ignored by PNG
///
/// # Errors
///
/// Returns `BitmapError::InvalidDimensions` for an empty image or a pixel
/// buffer that does not match the dimensions, and
/// `BitmapError::EncodingFailed` if the encoder fails.
pub fn encode_image(
    image: &DecodedImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, BitmapError> {
    let (width, height) = (image.width, image.height);
    let expected_len = width as usize * height as usize * 3;
    if width == 0 || height == 0 || image.pixels.len() != expected_len {
        return Err(BitmapError::InvalidDimensions { width, height });
    }

    let mut buffer = Cursor::new(Vec::new());
    let written = match format {
        OutputFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100)).write_image(
                &image.pixels,
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
        OutputFormat::Png | OutputFormat::Webp => {
            if format == OutputFormat::Webp {
                tracing::warn!("WebP encoding is not available, writing PNG");
            }
            PngEncoder::new(&mut buffer).write_image(
                &image.pixels,
                width,
                height,
                ExtendedColorType::Rgb8,
            )
        }
    };
    written.map_err(|e| BitmapError::EncodingFailed(e.to_string()))?;

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_jpeg() {
        let img = DecodedImage::new(16, 8, vec![128; 16 * 8 * 3]);
        let bytes = encode_image(&img, OutputFormat::Jpeg, 90).unwrap();
        assert_eq!(&bytes[0..2], &[0xFF, 0xD8]);
        assert_eq!(&bytes[bytes.len() - 2..], &[0xFF, 0xD9]);
    }

    #[test]
    fn test_encode_png_and_webp_fallback() {
        let img = DecodedImage::new(3, 2, vec![10; 3 * 2 * 3]);
        let png = encode_image(&img, OutputFormat::Png, 0).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        let webp = encode_image(&img, OutputFormat::Webp, 50).unwrap();
        assert_eq!(webp, png);
    }

    #[test]
    fn test_encode_quality_is_clamped() {
        let img = DecodedImage::new(4, 4, vec![200; 4 * 4 * 3]);
        assert!(encode_image(&img, OutputFormat::Jpeg, 0).is_ok());
        assert!(encode_image(&img, OutputFormat::Jpeg, 255).is_ok());
    }

    #[test]
    fn test_encode_rejects_bad_buffers() {
        assert_eq!(
            encode_image(&DecodedImage::empty(), OutputFormat::Png, 90),
            Err(BitmapError::InvalidDimensions {
                width: 0,
                height: 0
            })
        );
        let short = DecodedImage {
            width: 10,
            height: 10,
            pixels: vec![0; 10],
        };
        assert!(matches!(
            encode_image(&short, OutputFormat::Jpeg, 90),
            Err(BitmapError::InvalidDimensions { .. })
        ));
    }
}
