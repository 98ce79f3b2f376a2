//! Cropview WASM - WebAssembly bindings for the crop view engine
//!
//! This crate exposes cropview-core to JavaScript/TypeScript hosts that draw
//! the image and the crop window on a canvas.
//!
//! # Module Structure
//!
//! - `view` - `JsCropView`, layout, touch, rotation and crop geometry
//! - `bitmap` - Decoding for display, quad cropping and encoding
//! - `types` - WASM-compatible wrapper types for image data
//!
//! # Usage
//!
//! ```typescript
//! import init, { JsCropView, decode_image } from '@cropview/wasm';
//!
//! await init();
//!
//! const loaded = decode_image(bytes, canvas.width, canvas.height);
//! const view = new JsCropView(undefined);
//! view.on_view_resized(canvas.width, canvas.height);
//! ```

use wasm_bindgen::prelude::*;

mod bitmap;
mod types;
mod view;

pub use bitmap::{crop_image, decode_image, encode_image};
pub use types::{JsDecodedImage, JsLoadedBitmap};
pub use view::JsCropView;

/// Initialize the WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn init() {}

/// Get the version of the WASM module
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
