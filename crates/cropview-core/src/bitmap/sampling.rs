//! Sample size selection and out-of-memory backoff.
//!
//! A sample size `n` means every `n`x`n` block of source pixels becomes one
//! decoded pixel. Sample sizes are powers of two.

use super::{BitmapError, DecodedImage, SampledImage};

/// Largest sample size tried when decoding keeps running out of memory.
pub const MAX_DECODE_SAMPLE_SIZE: u32 = 512;

/// Largest extra sampling multiplier tried when cropping runs out of memory.
pub const MAX_CROP_SAMPLE_MULTIPLIER: u32 = 16;

/// Largest power of two that keeps both sides at least the requested size.
///
/// A zero request means no limit on that side is wanted, which also allows
/// the largest reduction.
pub fn calculate_in_sample_size_by_requested_size(
    width: u32,
    height: u32,
    req_width: u32,
    req_height: u32,
) -> u32 {
    let mut sample_size = 1u32;
    if height > req_height || width > req_width {
        while height / 2 / sample_size > req_height && width / 2 / sample_size > req_width {
            sample_size *= 2;
        }
    }
    sample_size
}

/// Smallest power of two that brings both sides within `max_texture_size`.
///
/// A zero `max_texture_size` means no limit.
pub fn calculate_in_sample_size_by_max_texture_size(
    width: u32,
    height: u32,
    max_texture_size: u32,
) -> u32 {
    let mut sample_size = 1u32;
    if max_texture_size > 0 {
        while height / sample_size > max_texture_size || width / sample_size > max_texture_size {
            sample_size *= 2;
        }
    }
    sample_size
}

/// Decode with `decode(sample_size)`, doubling the sample size after every
/// `OutOfMemory` until it exceeds [`MAX_DECODE_SAMPLE_SIZE`].
///
/// # Errors
///
/// Returns the first error that is not `OutOfMemory`, or `OutOfMemory` once
/// the largest sample size also failed.
pub fn decode_with_backoff<F>(initial_sample_size: u32, mut decode: F) -> Result<SampledImage, BitmapError>
where
    F: FnMut(u32) -> Result<DecodedImage, BitmapError>,
{
    let mut sample_size = initial_sample_size.max(1);
    loop {
        match decode(sample_size) {
            Ok(image) => return Ok(SampledImage { image, sample_size }),
            Err(BitmapError::OutOfMemory) if sample_size < MAX_DECODE_SAMPLE_SIZE => {
                tracing::warn!(sample_size, "decode ran out of memory, retrying smaller");
                sample_size *= 2;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Run `crop(multiplier)` with multipliers 1, 2, 4 up to
/// [`MAX_CROP_SAMPLE_MULTIPLIER`], moving on only after `OutOfMemory`.
///
/// # Errors
///
/// Returns the first error that is not `OutOfMemory`, or `OutOfMemory` once
/// the largest multiplier also failed.
pub fn crop_with_backoff<T, F>(mut crop: F) -> Result<T, BitmapError>
where
    F: FnMut(u32) -> Result<T, BitmapError>,
{
    let mut multiplier = 1u32;
    loop {
        match crop(multiplier) {
            Err(BitmapError::OutOfMemory) if multiplier < MAX_CROP_SAMPLE_MULTIPLIER => {
                tracing::warn!(multiplier, "crop ran out of memory, retrying with more sampling");
                multiplier *= 2;
            }
            result => return result,
        }
    }
}
