//! The bitmap I/O collaborator and the load and crop pipelines built on it.
//!
//! [`BitmapIo`] is the seam between the geometry and actual pixels. The
//! pipelines here only talk to the trait, so a host can swap in a platform
//! decoder; [`ImageCrateIo`] is the default implementation.

use std::io::Cursor;
use std::path::Path;

use exif::{In, Reader, Tag};
use image::ImageReader;
use serde::{Deserialize, Serialize};

use crate::geometry::{PixelRect, Quad};
use crate::options::{CropOptions, OutputFormat, RequestSizeOptions};
use crate::view::SourceCrop;

use super::crop::crop_quad;
use super::encode::encode_image;
use super::resize::{resize, resize_for_request};
use super::sampling::{
    calculate_in_sample_size_by_max_texture_size, calculate_in_sample_size_by_requested_size,
    crop_with_backoff, decode_with_backoff,
};
use super::{BitmapError, DecodedImage, ImageSource, SampledImage};

/// Largest bitmap side the default implementation hands to a renderer.
pub const DEFAULT_MAX_TEXTURE_SIZE: u32 = 2048;

/// Decoding, region decoding, EXIF and encoding for the crop pipelines.
pub trait BitmapIo {
    /// Full resolution size of `source`, read from its header.
    fn dimensions(&self, source: &ImageSource) -> Result<(u32, u32), BitmapError>;

    /// Decode the whole image, reduced by `sample_size`.
    fn decode(&self, source: &ImageSource, sample_size: u32) -> Result<DecodedImage, BitmapError>;

    /// Decode only `region`, in full resolution pixels, reduced by `sample_size`.
    ///
    /// An empty region decodes to an empty image.
    fn decode_region(
        &self,
        source: &ImageSource,
        region: &PixelRect,
        sample_size: u32,
    ) -> Result<DecodedImage, BitmapError>;

    /// Clockwise rotation recorded in the source's EXIF orientation, in degrees.
    fn exif_rotation(&self, source: &ImageSource) -> Result<u32, BitmapError>;

    /// Encode `image` and write it to `dest`.
    fn encode(
        &self,
        image: &DecodedImage,
        dest: &Path,
        format: OutputFormat,
        quality: u8,
    ) -> Result<(), BitmapError>;

    /// Largest side a decoded bitmap may have, 0 for no limit.
    fn max_texture_size(&self) -> u32 {
        0
    }
}

/// Map an EXIF orientation tag to a clockwise rotation.
///
/// Only the pure rotations are recognized: 6 is 90, 3 is 180 and 8 is 270
/// degrees. Everything else, mirrored orientations included, is 0.
pub fn exif_orientation_to_degrees(orientation: u32) -> u32 {
    match orientation {
        6 => 90,
        3 => 180,
        8 => 270,
        _ => 0,
    }
}

/// [`BitmapIo`] on the `image` and `kamadak-exif` crates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageCrateIo {
    max_texture_size: u32,
    max_output_bytes: Option<u64>,
}

impl Default for ImageCrateIo {
    fn default() -> Self {
        Self {
            max_texture_size: DEFAULT_MAX_TEXTURE_SIZE,
            max_output_bytes: None,
        }
    }
}

impl ImageCrateIo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Limit the side of loaded bitmaps, 0 for no limit.
    pub fn with_max_texture_size(mut self, max_texture_size: u32) -> Self {
        self.max_texture_size = max_texture_size;
        self
    }

    /// Refuse decodes whose output exceeds `bytes` with `OutOfMemory`.
    pub fn with_max_output_bytes(mut self, bytes: u64) -> Self {
        self.max_output_bytes = Some(bytes);
        self
    }

    fn check_budget(&self, width: u32, height: u32) -> Result<(), BitmapError> {
        match self.max_output_bytes {
            Some(max) if u64::from(width) * u64::from(height) * 3 > max => {
                Err(BitmapError::OutOfMemory)
            }
            _ => Ok(()),
        }
    }
}

fn reader(bytes: &[u8]) -> Result<ImageReader<Cursor<&[u8]>>, BitmapError> {
    Ok(ImageReader::new(Cursor::new(bytes)).with_guessed_format()?)
}

fn sampled_size(width: u32, height: u32, sample_size: u32) -> (u32, u32) {
    let s = sample_size.max(1);
    (width.div_ceil(s), height.div_ceil(s))
}

impl BitmapIo for ImageCrateIo {
    fn dimensions(&self, source: &ImageSource) -> Result<(u32, u32), BitmapError> {
        let bytes = source.read()?;
        Ok(reader(&bytes)?.into_dimensions()?)
    }

    fn decode(&self, source: &ImageSource, sample_size: u32) -> Result<DecodedImage, BitmapError> {
        let bytes = source.read()?;
        let (width, height) = reader(&bytes)?.into_dimensions()?;
        let (out_w, out_h) = sampled_size(width, height, sample_size);
        self.check_budget(out_w, out_h)?;

        let decoded = DecodedImage::from_rgb_image(reader(&bytes)?.decode()?.into_rgb8());
        Ok(resize(&decoded, out_w, out_h))
    }

    fn decode_region(
        &self,
        source: &ImageSource,
        region: &PixelRect,
        sample_size: u32,
    ) -> Result<DecodedImage, BitmapError> {
        let bytes = source.read()?;
        let (width, height) = reader(&bytes)?.into_dimensions()?;
        let region = PixelRect::new(
            region.left.min(width),
            region.top.min(height),
            region.right.min(width),
            region.bottom.min(height),
        );
        if region.width() == 0 || region.height() == 0 {
            return Ok(DecodedImage::empty());
        }
        let (out_w, out_h) = sampled_size(region.width(), region.height(), sample_size);
        self.check_budget(out_w, out_h)?;

        let cropped = reader(&bytes)?
            .decode()?
            .crop_imm(region.left, region.top, region.width(), region.height())
            .into_rgb8();
        Ok(resize(&DecodedImage::from_rgb_image(cropped), out_w, out_h))
    }

    fn exif_rotation(&self, source: &ImageSource) -> Result<u32, BitmapError> {
        let bytes = source.read()?;
        match Reader::new().read_from_container(&mut Cursor::new(&bytes[..])) {
            Ok(exif) => Ok(exif
                .get_field(Tag::Orientation, In::PRIMARY)
                .and_then(|field| field.value.get_uint(0))
                .map_or(0, exif_orientation_to_degrees)),
            Err(exif::Error::NotFound(_)) => Ok(0),
            Err(err) => Err(BitmapError::Exif(err.to_string())),
        }
    }

    fn encode(
        &self,
        image: &DecodedImage,
        dest: &Path,
        format: OutputFormat,
        quality: u8,
    ) -> Result<(), BitmapError> {
        let bytes = encode_image(image, format, quality)?;
        std::fs::write(dest, bytes)?;
        Ok(())
    }

    fn max_texture_size(&self) -> u32 {
        self.max_texture_size
    }
}

/// A bitmap ready for display, with what the view needs to place it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedBitmap {
    pub image: DecodedImage,
    pub sample_size: u32,
    pub source_width: u32,
    pub source_height: u32,
    /// Clockwise rotation from EXIF, to pass to the view as the initial rotation.
    pub rotation: u32,
}

/// Requested output size of a crop and how to apply it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OutputRequest {
    pub width: u32,
    pub height: u32,
    pub options: RequestSizeOptions,
}

impl OutputRequest {
    pub fn from_options(options: &CropOptions) -> Self {
        Self {
            width: options.output_request_width,
            height: options.output_request_height,
            options: options.output_request_size_options,
        }
    }

    fn is_sized(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Decode `source` for display at about `req_width` x `req_height`.
///
/// The sample size is the larger of the one fitting the request and the one
/// fitting the texture limit, raised further if decoding runs out of
/// memory. A zero request only applies the texture limit. A missing or
/// unreadable EXIF orientation counts as no rotation.
///
/// # Errors
///
/// Returns `BitmapError::InvalidDimensions` for an image without pixels and
/// any error from the decoder.
pub fn load_sampled<I: BitmapIo + ?Sized>(
    io: &I,
    source: &ImageSource,
    req_width: u32,
    req_height: u32,
) -> Result<LoadedBitmap, BitmapError> {
    let (width, height) = io.dimensions(source)?;
    if width == 0 || height == 0 {
        return Err(BitmapError::InvalidDimensions { width, height });
    }

    let by_request = if req_width > 0 && req_height > 0 {
        calculate_in_sample_size_by_requested_size(width, height, req_width, req_height)
    } else {
        1
    };
    let by_texture = calculate_in_sample_size_by_max_texture_size(width, height, io.max_texture_size());
    let sampled = decode_with_backoff(by_request.max(by_texture), |s| io.decode(source, s))?;

    let rotation = io.exif_rotation(source).unwrap_or_else(|err| {
        tracing::warn!(%err, %source, "ignoring unreadable EXIF orientation");
        0
    });

    tracing::debug!(
        %source,
        width,
        height,
        sample_size = sampled.sample_size,
        rotation,
        "bitmap loaded"
    );
    Ok(LoadedBitmap {
        image: sampled.image,
        sample_size: sampled.sample_size,
        source_width: width,
        source_height: height,
        rotation,
    })
}

/// Crop `crop` out of the full resolution `source`.
///
/// Only the bounding box of the crop is decoded. With
/// [`RequestSizeOptions::Sampling`] the region is decoded at the largest
/// sample size that still covers the request; after an `OutOfMemory` the
/// sampling is doubled up to 16 times over. `is_cancelled` is polled between
/// decoding and sampling.
///
/// # Returns
///
/// The upright crop, resized per `output`, with the sample size it was cut
/// at. A crop without area gives an empty image.
///
/// # Errors
///
/// Returns `BitmapError::Cancelled` when `is_cancelled` reports true, and
/// any error from the decoder.
pub fn crop_source<I: BitmapIo + ?Sized>(
    io: &I,
    source: &ImageSource,
    crop: &SourceCrop,
    output: &OutputRequest,
    is_cancelled: &dyn Fn() -> bool,
) -> Result<SampledImage, BitmapError> {
    let (width, height) = io.dimensions(source)?;
    let rect = PixelRect::from_points(
        &crop.points,
        width,
        height,
        crop.fix_aspect_ratio,
        crop.aspect_ratio_x,
        crop.aspect_ratio_y,
    );

    let base_sample = if output.options == RequestSizeOptions::Sampling && output.is_sized() {
        calculate_in_sample_size_by_requested_size(
            rect.width(),
            rect.height(),
            output.width,
            output.height,
        )
    } else {
        1
    };

    let cropped = crop_with_backoff(|multiplier| {
        let sample_size = base_sample * multiplier;
        let region = io.decode_region(source, &rect, sample_size)?;
        if is_cancelled() {
            return Err(BitmapError::Cancelled);
        }
        let points = to_region_space(&crop.points, &rect, sample_size);
        Ok(SampledImage {
            image: crop_quad(&region, &points),
            sample_size,
        })
    })?;

    tracing::debug!(
        %source,
        width = cropped.image.width,
        height = cropped.image.height,
        sample_size = cropped.sample_size,
        "crop decoded"
    );
    Ok(SampledImage {
        image: resize_for_request(&cropped.image, output.width, output.height, output.options),
        sample_size: cropped.sample_size,
    })
}

/// Crop `crop` out of the bitmap currently shown, which was decoded at
/// `crop.sample_size`.
pub fn crop_bitmap(image: &DecodedImage, crop: &SourceCrop, output: &OutputRequest) -> DecodedImage {
    let points = crop.points.scaled(1.0 / f64::from(crop.sample_size.max(1)));
    let cropped = crop_quad(image, &points);
    resize_for_request(&cropped, output.width, output.height, output.options)
}

/// Move full resolution `points` into the pixel space of `region` decoded at `sample_size`.
fn to_region_space(points: &Quad, region: &PixelRect, sample_size: u32) -> Quad {
    let s = f64::from(sample_size.max(1));
    let mut mapped = points.points;
    for pair in mapped.chunks_exact_mut(2) {
        pair[0] = (pair[0] - f64::from(region.left)) / s;
        pair[1] = (pair[1] - f64::from(region.top)) / s;
    }
    Quad::new(mapped)
}
