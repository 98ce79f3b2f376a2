//! Configuration for the crop view.
//!
//! `CropOptions` collects every tunable of the crop window, the view engine
//! and the output stage. It is validated once, when a view is configured,
//! and never inside the per-frame geometry path.
//!
//! Values documented as "dp" are density independent; call
//! [`CropOptions::scaled_for_density`] to convert them to physical pixels.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::Rect;

/// Validation failures for [`CropOptions`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OptionsError {
    #[error("Cannot set max zoom to a number < 1")]
    MaxZoom,

    #[error("Cannot set touch radius value to a number < 0")]
    TouchRadius,

    #[error("Cannot set initial crop window padding value to a number < 0 or >= 0.5")]
    Padding,

    #[error("Cannot set aspect ratio value to a number less than or equal to 0.")]
    AspectRatio,

    #[error("Cannot set {0} to a number < 0")]
    Negative(&'static str),

    #[error("Cannot set max crop result {axis} to smaller value than min crop result {axis}")]
    MaxResultBelowMin { axis: &'static str },

    #[error("Cannot set rotation degrees value to a number < 0 or > 360")]
    RotationDegrees,

    #[error("Cannot set output quality to a number outside 0..=100")]
    Quality,
}

/// Shape of the crop window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CropShape {
    #[default]
    Rectangle,
    /// Oval inscribed in the crop rectangle. Only affects hit testing and overlay geometry.
    Oval,
}

/// When to show the rule-of-thirds guidelines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Guidelines {
    Off,
    /// Only while a handle is being dragged.
    #[default]
    OnTouch,
    On,
}

/// How the image is scaled to the view before zoom is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleType {
    /// Scale up or down so the image fits the view.
    #[default]
    FitCenter,
    /// No scaling, unless auto-zoom is on and the image is smaller than the view.
    Center,
    /// Scale so the image covers the whole view.
    CenterCrop,
    /// Like `FitCenter` but never scales above 1x.
    CenterInside,
}

/// How the cropped output is resized to the requested size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestSizeOptions {
    /// No resize, the requested size is ignored.
    #[default]
    None,
    /// Only sample-size reduction during decode, so the output may be up to 2x the request.
    Sampling,
    /// Shrink to fit inside the requested size, never enlarge.
    ResizeInside,
    /// Fit inside the requested size, enlarging if needed.
    ResizeFit,
    /// Exactly the requested size, ignoring aspect ratio.
    ResizeExact,
}

/// Encoded output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

/// All crop view options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropOptions {
    pub crop_shape: CropShape,
    /// Distance (dp) at which a dragged edge snaps to the image edge.
    pub snap_radius: f64,
    /// Radius (dp) around a handle that still counts as touching it.
    pub touch_radius: f64,
    pub guidelines: Guidelines,
    pub scale_type: ScaleType,
    pub show_crop_overlay: bool,
    pub auto_zoom_enabled: bool,
    pub multi_touch_enabled: bool,
    pub max_zoom: f64,
    /// Fraction of the image size left between the image edge and the initial crop window.
    pub initial_crop_window_padding_ratio: f64,
    pub fix_aspect_ratio: bool,
    pub aspect_ratio_x: u32,
    pub aspect_ratio_y: u32,
    pub border_line_thickness: f64,
    pub border_corner_thickness: f64,
    pub border_corner_offset: f64,
    pub border_corner_length: f64,
    pub guidelines_thickness: f64,
    pub min_crop_window_width: f64,
    pub min_crop_window_height: f64,
    pub min_crop_result_width: u32,
    pub min_crop_result_height: u32,
    pub max_crop_result_width: u32,
    pub max_crop_result_height: u32,
    pub output_compress_format: OutputFormat,
    pub output_compress_quality: u8,
    pub output_request_width: u32,
    pub output_request_height: u32,
    pub output_request_size_options: RequestSizeOptions,
    /// Initial crop window in source image pixels.
    pub initial_crop_rect: Option<Rect>,
    /// Rotation applied when an image is loaded, overriding the EXIF rotation.
    pub initial_rotation: Option<f64>,
    pub allow_rotation: bool,
    pub allow_flipping: bool,
    /// Step used by the rotate clockwise and counter clockwise actions.
    pub rotation_degrees: f64,
    pub flip_horizontally: bool,
    pub flip_vertically: bool,
}

impl Default for CropOptions {
    fn default() -> Self {
        Self {
            crop_shape: CropShape::Rectangle,
            snap_radius: 3.0,
            touch_radius: 24.0,
            guidelines: Guidelines::OnTouch,
            scale_type: ScaleType::FitCenter,
            show_crop_overlay: true,
            auto_zoom_enabled: true,
            multi_touch_enabled: false,
            max_zoom: 4.0,
            initial_crop_window_padding_ratio: 0.1,
            fix_aspect_ratio: false,
            aspect_ratio_x: 1,
            aspect_ratio_y: 1,
            border_line_thickness: 3.0,
            border_corner_thickness: 2.0,
            border_corner_offset: 5.0,
            border_corner_length: 14.0,
            guidelines_thickness: 1.0,
            min_crop_window_width: 42.0,
            min_crop_window_height: 42.0,
            min_crop_result_width: 40,
            min_crop_result_height: 40,
            max_crop_result_width: 99999,
            max_crop_result_height: 99999,
            output_compress_format: OutputFormat::Jpeg,
            output_compress_quality: 90,
            output_request_width: 0,
            output_request_height: 0,
            output_request_size_options: RequestSizeOptions::None,
            initial_crop_rect: None,
            initial_rotation: None,
            allow_rotation: true,
            allow_flipping: true,
            rotation_degrees: 90.0,
            flip_horizontally: false,
            flip_vertically: false,
        }
    }
}

impl CropOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target aspect ratio (width / height).
    pub fn aspect_ratio(&self) -> f64 {
        f64::from(self.aspect_ratio_x) / f64::from(self.aspect_ratio_y)
    }

    /// Copy of these options with every dp value multiplied by `density`.
    pub fn scaled_for_density(&self, density: f64) -> Self {
        let mut scaled = self.clone();
        scaled.snap_radius *= density;
        scaled.touch_radius *= density;
        scaled.border_line_thickness *= density;
        scaled.border_corner_thickness *= density;
        scaled.border_corner_offset *= density;
        scaled.border_corner_length *= density;
        scaled.guidelines_thickness *= density;
        scaled.min_crop_window_width *= density;
        scaled.min_crop_window_height *= density;
        scaled
    }

    /// Check every option, failing on the first invalid one.
    ///
    /// # Errors
    ///
    /// Returns the `OptionsError` variant describing the first bad value.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.max_zoom < 1.0 || !self.max_zoom.is_finite() {
            return Err(OptionsError::MaxZoom);
        }
        if self.touch_radius < 0.0 {
            return Err(OptionsError::TouchRadius);
        }
        if !(0.0..0.5).contains(&self.initial_crop_window_padding_ratio) {
            return Err(OptionsError::Padding);
        }
        if self.aspect_ratio_x == 0 || self.aspect_ratio_y == 0 {
            return Err(OptionsError::AspectRatio);
        }
        let non_negative = [
            ("snap radius", self.snap_radius),
            ("line thickness", self.border_line_thickness),
            ("corner thickness", self.border_corner_thickness),
            ("corner length", self.border_corner_length),
            ("guidelines thickness", self.guidelines_thickness),
            ("min crop window width", self.min_crop_window_width),
            ("min crop window height", self.min_crop_window_height),
        ];
        for (name, value) in non_negative {
            if value < 0.0 {
                return Err(OptionsError::Negative(name));
            }
        }
        if self.max_crop_result_width < self.min_crop_result_width {
            return Err(OptionsError::MaxResultBelowMin { axis: "width" });
        }
        if self.max_crop_result_height < self.min_crop_result_height {
            return Err(OptionsError::MaxResultBelowMin { axis: "height" });
        }
        if !(0.0..=360.0).contains(&self.rotation_degrees) {
            return Err(OptionsError::RotationDegrees);
        }
        if self.output_compress_quality > 100 {
            return Err(OptionsError::Quality);
        }
        Ok(())
    }
}
