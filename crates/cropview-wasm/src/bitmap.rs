//! Bitmap bindings: decoding for display, quad cropping and encoding.
//!
//! # Example
//!
//! ```typescript
//! const loaded = decode_image(bytes, canvas.width, canvas.height);
//! view.on_image_loaded(loaded.image().width, loaded.image().height,
//!                      loaded.sample_size, loaded.rotation);
//! const cropped = view.crop_bitmap(loaded.image());
//! const png = encode_image(cropped, 1, 90);
//! ```

use cropview_core::bitmap::{self, BitmapError, ImageCrateIo, ImageSource};
use cropview_core::geometry::Quad;
use wasm_bindgen::prelude::*;

use crate::types::{format_from_u8, JsDecodedImage, JsLoadedBitmap};

fn to_js(err: BitmapError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Decode an image for display at about `req_width` x `req_height`.
///
/// A zero request decodes at the largest size the texture limit allows.
///
/// # Errors
///
/// Returns an error if the bytes are not a supported image.
#[wasm_bindgen]
pub fn decode_image(bytes: Vec<u8>, req_width: u32, req_height: u32) -> Result<JsLoadedBitmap, JsValue> {
    decode_image_inner(bytes, req_width, req_height).map_err(to_js)
}

fn decode_image_inner(bytes: Vec<u8>, req_width: u32, req_height: u32) -> Result<JsLoadedBitmap, BitmapError> {
    let source = ImageSource::from(bytes);
    Ok(bitmap::load_sampled(&ImageCrateIo::new(), &source, req_width, req_height)?.into())
}

/// Sample the quadrilateral `points` of `image` into an upright bitmap.
///
/// # Arguments
///
/// * `image` - Bitmap the points refer to
/// * `points` - Eight numbers: the crop window's top-left, top-right,
///   bottom-right and bottom-left corners in `image` pixels
///
/// # Errors
///
/// Returns an error unless exactly eight points are given.
#[wasm_bindgen]
pub fn crop_image(image: &JsDecodedImage, points: &[f64]) -> Result<JsDecodedImage, JsValue> {
    let quad = quad_from_slice(points).ok_or_else(|| JsValue::from_str("Expected 8 crop point values"))?;
    Ok(JsDecodedImage::from_decoded(bitmap::crop_quad(&image.to_decoded(), &quad)))
}

pub(crate) fn quad_from_slice(points: &[f64]) -> Option<Quad> {
    let points: [f64; 8] = points.try_into().ok()?;
    Some(Quad::new(points))
}

/// Encode `image`; `format` is 0 for JPEG, 1 for PNG, 2 for WebP (written as PNG).
///
/// # Errors
///
/// Returns an error for an empty image or if encoding fails.
#[wasm_bindgen]
pub fn encode_image(image: &JsDecodedImage, format: u8, quality: u8) -> Result<Vec<u8>, JsValue> {
    bitmap::encode_image(&image.to_decoded(), format_from_u8(format), quality).map_err(to_js)
}
