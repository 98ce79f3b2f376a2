//! Core types for bitmap I/O.

use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use image::error::LimitErrorKind;
use image::ImageError;
use thiserror::Error;

/// Error types for decode, crop and encode operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitmapError {
    /// The data is not a recognized or supported image format.
    #[error("Invalid or unsupported image format")]
    InvalidFormat,

    /// The image file is corrupted or incomplete.
    #[error("Corrupted or incomplete image file: {0}")]
    CorruptedFile(String),

    /// The decoded or cropped bitmap would not fit in memory.
    #[error("Out of memory while processing bitmap")]
    OutOfMemory,

    /// I/O error while reading or writing.
    #[error("I/O error: {0}")]
    Io(String),

    /// EXIF parsing error.
    #[error("EXIF error: {0}")]
    Exif(String),

    /// Encoding the output failed.
    #[error("Encoding failed: {0}")]
    EncodingFailed(String),

    /// Width or height is zero, or the pixel buffer does not match them.
    #[error("Invalid dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// The task was superseded before it finished.
    #[error("Cancelled")]
    Cancelled,
}

impl From<ImageError> for BitmapError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::Limits(limit) => match limit.kind() {
                LimitErrorKind::InsufficientMemory => BitmapError::OutOfMemory,
                _ => BitmapError::CorruptedFile(limit.to_string()),
            },
            ImageError::Unsupported(_) => BitmapError::InvalidFormat,
            ImageError::IoError(e) => BitmapError::Io(e.to_string()),
            ImageError::Encoding(e) => BitmapError::EncodingFailed(e.to_string()),
            other => BitmapError::CorruptedFile(other.to_string()),
        }
    }
}

impl From<std::io::Error> for BitmapError {
    fn from(err: std::io::Error) -> Self {
        BitmapError::Io(err.to_string())
    }
}

/// A decoded image with RGB pixel data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedImage {
    /// Image width in pixels.
    pub width: u32,
    /// Image height in pixels.
    pub height: u32,
    /// RGB pixel data in row-major order (3 bytes per pixel).
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    /// Create a new DecodedImage with the given dimensions and pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Self {
        debug_assert_eq!(
            pixels.len(),
            width as usize * height as usize * 3,
            "Pixel buffer size mismatch"
        );
        Self {
            width,
            height,
            pixels,
        }
    }

    /// A 0x0 image, the result of cropping an empty region.
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        }
    }

    /// Create a DecodedImage from an image::RgbImage.
    pub fn from_rgb_image(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            width,
            height,
            pixels: img.into_raw(),
        }
    }

    /// Convert to an image::RgbImage for further processing.
    pub fn to_rgb_image(&self) -> Option<image::RgbImage> {
        image::RgbImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    /// RGB value at `(x, y)`, `None` outside the image.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.pixels
            .get(idx..idx + 3)
            .map(|p| [p[0], p[1], p[2]])
    }

    pub fn pixel_count(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    pub fn byte_size(&self) -> usize {
        self.pixels.len()
    }

    /// Check if this is an empty/invalid image.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.pixels.is_empty()
    }
}

/// A bitmap decoded at a reduced resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampledImage {
    pub image: DecodedImage,
    /// How much smaller `image` is than the source, at least 1.
    pub sample_size: u32,
}

/// Where image bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Arc<[u8]>),
}

impl ImageSource {
    /// Read the encoded bytes. In-memory sources are borrowed.
    ///
    /// # Errors
    ///
    /// Returns `BitmapError::Io` if a file cannot be read.
    pub fn read(&self) -> Result<Cow<'_, [u8]>, BitmapError> {
        match self {
            ImageSource::Path(path) => Ok(Cow::Owned(std::fs::read(path)?)),
            ImageSource::Bytes(bytes) => Ok(Cow::Borrowed(bytes)),
        }
    }
}

impl From<Vec<u8>> for ImageSource {
    fn from(bytes: Vec<u8>) -> Self {
        ImageSource::Bytes(bytes.into())
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::Path(path)
    }
}

impl fmt::Display for ImageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageSource::Path(path) => write!(f, "{}", path.display()),
            ImageSource::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
        }
    }
}
