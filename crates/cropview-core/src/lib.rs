//! Cropview Core - crop window engine
//!
//! This crate provides the platform independent part of an interactive image
//! cropper: the transform that places a bitmap in a view, the crop window
//! and its touch handling, and turning the final window back into source
//! pixels.
//!
//! # Module Structure
//!
//! - `geometry` - Rectangles, quadrilaterals, the affine transform and bounds clamping
//! - `window` - The crop overlay: constraints, hit testing, dragging, render geometry
//! - `view` - `CropImageView`, the view engine hosts talk to
//! - `options` - `CropOptions` and its validation
//! - `bitmap` - Sampled decoding, quad cropping, resizing and encoding
//! - `worker` - Background load and crop threads (not on wasm32)
//!
//! All geometry runs synchronously on the caller's thread and never blocks.
//! The crate logs through `tracing` and never installs a subscriber.

pub mod bitmap;
pub mod geometry;
pub mod options;
pub mod view;
pub mod window;

#[cfg(not(target_arch = "wasm32"))]
pub mod worker;

pub use bitmap::{BitmapError, BitmapIo, DecodedImage, ImageCrateIo, ImageSource};
pub use geometry::{AffineTransform2D, PixelRect, Quad, Rect, TransformError};
pub use options::{
    CropOptions, CropShape, Guidelines, OptionsError, OutputFormat, RequestSizeOptions, ScaleType,
};
pub use view::{CropImageView, CropViewState, SourceCrop, TouchPhase};
pub use window::{CropOverlay, MoveHandle};

#[cfg(not(target_arch = "wasm32"))]
pub use worker::{CropWorker, WorkerReply};
