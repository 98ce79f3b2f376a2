//! Output resizing for crop results.

use image::imageops::FilterType;

use crate::options::RequestSizeOptions;

use super::DecodedImage;

/// Resize a crop result to the requested output size.
///
/// # Arguments
///
/// * `image` - The cropped bitmap
/// * `req_width`, `req_height` - Requested output size, both must be positive
/// * `options` - How the request is applied
///
/// # Behavior
///
/// - `None` and `Sampling` return the image unchanged; sampling happens at decode
/// - `ResizeInside` shrinks to fit the request, never enlarges
/// - `ResizeFit` scales to fit the request, enlarging if needed
/// - `ResizeExact` stretches to exactly the requested size
///
/// A zero request or an empty image returns the input unchanged.
pub fn resize_for_request(
    image: &DecodedImage,
    req_width: u32,
    req_height: u32,
    options: RequestSizeOptions,
) -> DecodedImage {
    if req_width == 0 || req_height == 0 || image.is_empty() {
        return image.clone();
    }

    let (width, height) = match options {
        RequestSizeOptions::None | RequestSizeOptions::Sampling => return image.clone(),
        RequestSizeOptions::ResizeExact => (req_width, req_height),
        RequestSizeOptions::ResizeInside | RequestSizeOptions::ResizeFit => {
            let scale = (f64::from(image.width) / f64::from(req_width))
                .max(f64::from(image.height) / f64::from(req_height));
            if scale <= 1.0 && options == RequestSizeOptions::ResizeInside {
                return image.clone();
            }
            (
                ((f64::from(image.width) / scale) as u32).max(1),
                ((f64::from(image.height) / scale) as u32).max(1),
            )
        }
    };

    resize(image, width, height)
}

/// Resize to exact dimensions with a triangle filter.
pub(crate) fn resize(image: &DecodedImage, width: u32, height: u32) -> DecodedImage {
    if image.width == width && image.height == height {
        return image.clone();
    }
    match image.to_rgb_image() {
        Some(rgb) => DecodedImage::from_rgb_image(image::imageops::resize(
            &rgb,
            width,
            height,
            FilterType::Triangle,
        )),
        None => {
            tracing::warn!(
                width = image.width,
                height = image.height,
                "pixel buffer does not match its size, skipping resize"
            );
            image.clone()
        }
    }
}
