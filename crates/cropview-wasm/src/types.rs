//! WASM-compatible wrapper types for bitmaps.

use cropview_core::bitmap::{DecodedImage, LoadedBitmap};
use cropview_core::options::{CropShape, OutputFormat};
use cropview_core::TouchPhase;
use wasm_bindgen::prelude::*;

/// An RGB bitmap for JavaScript.
///
/// # Memory Management
///
/// The pixel data lives in WASM memory. `pixels()` copies it into a
/// `Uint8Array`; keep images on the WASM side between calls where possible.
#[wasm_bindgen]
pub struct JsDecodedImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

#[wasm_bindgen]
impl JsDecodedImage {
    /// Create an image from RGB pixel data (3 bytes per pixel, row-major).
    #[wasm_bindgen(constructor)]
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> JsDecodedImage {
        JsDecodedImage {
            width,
            height,
            pixels,
        }
    }

    #[wasm_bindgen(getter)]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[wasm_bindgen(getter)]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[wasm_bindgen(getter)]
    pub fn byte_length(&self) -> usize {
        self.pixels.len()
    }

    /// Copy of the RGB pixel data.
    pub fn pixels(&self) -> Vec<u8> {
        self.pixels.clone()
    }

    /// Pixels expanded to RGBA, ready for `new ImageData(...)`.
    pub fn rgba_pixels(&self) -> Vec<u8> {
        let mut rgba = Vec::with_capacity(self.pixels.len() / 3 * 4);
        for rgb in self.pixels.chunks_exact(3) {
            rgba.extend_from_slice(rgb);
            rgba.push(255);
        }
        rgba
    }
}

impl JsDecodedImage {
    pub(crate) fn from_decoded(img: DecodedImage) -> Self {
        Self {
            width: img.width,
            height: img.height,
            pixels: img.pixels,
        }
    }

    /// Convert back to a core `DecodedImage`. Clones the pixel data.
    pub(crate) fn to_decoded(&self) -> DecodedImage {
        DecodedImage {
            width: self.width,
            height: self.height,
            pixels: self.pixels.clone(),
        }
    }
}

/// A bitmap decoded for display, with the size of the source it came from.
#[wasm_bindgen]
pub struct JsLoadedBitmap {
    image: DecodedImage,
    sample_size: u32,
    source_width: u32,
    source_height: u32,
    rotation: u32,
}

#[wasm_bindgen]
impl JsLoadedBitmap {
    /// The decoded bitmap. Copies the pixel data.
    pub fn image(&self) -> JsDecodedImage {
        JsDecodedImage::from_decoded(self.image.clone())
    }

    #[wasm_bindgen(getter)]
    pub fn sample_size(&self) -> u32 {
        self.sample_size
    }

    #[wasm_bindgen(getter)]
    pub fn source_width(&self) -> u32 {
        self.source_width
    }

    #[wasm_bindgen(getter)]
    pub fn source_height(&self) -> u32 {
        self.source_height
    }

    /// Clockwise EXIF rotation in degrees.
    #[wasm_bindgen(getter)]
    pub fn rotation(&self) -> u32 {
        self.rotation
    }
}

impl From<LoadedBitmap> for JsLoadedBitmap {
    fn from(loaded: LoadedBitmap) -> Self {
        Self {
            image: loaded.image,
            sample_size: loaded.sample_size,
            source_width: loaded.source_width,
            source_height: loaded.source_height,
            rotation: loaded.rotation,
        }
    }
}

/// Convert a u8 touch phase.
///
/// Values:
/// - 0 = Down
/// - 1 = Move
/// - 2 = Up
///
/// Any other value is Cancel.
pub(crate) fn phase_from_u8(value: u8) -> TouchPhase {
    match value {
        0 => TouchPhase::Down,
        1 => TouchPhase::Move,
        2 => TouchPhase::Up,
        _ => TouchPhase::Cancel,
    }
}

/// 0 = Jpeg, 1 = Png, 2 = Webp. Any other value is Jpeg.
pub(crate) fn format_from_u8(value: u8) -> OutputFormat {
    match value {
        1 => OutputFormat::Png,
        2 => OutputFormat::Webp,
        _ => OutputFormat::Jpeg,
    }
}

/// 1 = Oval. Any other value is Rectangle.
pub(crate) fn shape_from_u8(value: u8) -> CropShape {
    match value {
        1 => CropShape::Oval,
        _ => CropShape::Rectangle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_decoded_image_creation() {
        let img = JsDecodedImage::new(100, 50, vec![0u8; 100 * 50 * 3]);
        assert_eq!(img.width(), 100);
        assert_eq!(img.height(), 50);
        assert_eq!(img.byte_length(), 15000);
    }

    #[test]
    fn test_rgba_pixels() {
        let img = JsDecodedImage::new(2, 1, vec![255, 128, 64, 32, 16, 8]);
        assert_eq!(img.rgba_pixels(), vec![255, 128, 64, 255, 32, 16, 8, 255]);
    }

    #[test]
    fn test_decoded_conversions() {
        let decoded = DecodedImage::new(20, 10, vec![7u8; 20 * 10 * 3]);
        let js_img = JsDecodedImage::from_decoded(decoded.clone());
        assert_eq!(js_img.to_decoded(), decoded);
    }

    #[test]
    fn test_u8_mappings() {
        assert_eq!(phase_from_u8(0), TouchPhase::Down);
        assert_eq!(phase_from_u8(1), TouchPhase::Move);
        assert_eq!(phase_from_u8(2), TouchPhase::Up);
        assert_eq!(phase_from_u8(9), TouchPhase::Cancel);
        assert_eq!(format_from_u8(1), OutputFormat::Png);
        assert_eq!(format_from_u8(2), OutputFormat::Webp);
        assert_eq!(format_from_u8(7), OutputFormat::Jpeg);
        assert_eq!(shape_from_u8(1), CropShape::Oval);
        assert_eq!(shape_from_u8(0), CropShape::Rectangle);
    }
}
