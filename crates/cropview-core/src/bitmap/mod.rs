//! Bitmap loading, cropping and encoding.
//!
//! This module turns crop geometry from the view into pixels:
//! - Sampled decoding sized for display, with EXIF orientation lookup
//! - Cropping a (possibly rotated, possibly flipped) quadrilateral into an
//!   upright bitmap
//! - Resizing crop results to a requested output size
//! - Encoding results as JPEG or PNG
//!
//! # Architecture
//!
//! The decoder sits behind the [`BitmapIo`] trait. [`load_sampled`],
//! [`crop_source`] and [`crop_bitmap`] are plain synchronous functions over
//! it; the background worker in `worker` runs them off the UI thread.
//!
//! # Memory
//!
//! Large sources are never decoded at full resolution for display. Decoding
//! and cropping both answer `OutOfMemory` by retrying with a larger sample
//! size before giving up.

mod crop;
mod encode;
mod io;
mod resize;
mod sampling;
mod types;

pub use crop::{crop_output_size, crop_quad};
pub use encode::encode_image;
pub use io::{
    crop_bitmap, crop_source, exif_orientation_to_degrees, load_sampled, BitmapIo, ImageCrateIo,
    LoadedBitmap, OutputRequest, DEFAULT_MAX_TEXTURE_SIZE,
};
pub use resize::resize_for_request;
pub use sampling::{
    calculate_in_sample_size_by_max_texture_size, calculate_in_sample_size_by_requested_size,
    crop_with_backoff, decode_with_backoff, MAX_CROP_SAMPLE_MULTIPLIER, MAX_DECODE_SAMPLE_SIZE,
};
pub use types::{BitmapError, DecodedImage, ImageSource, SampledImage};
