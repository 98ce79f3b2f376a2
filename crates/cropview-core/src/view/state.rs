//! Plain records handed across the view boundary.

use serde::{Deserialize, Serialize};

use crate::geometry::{Quad, Rect};
use crate::options::CropShape;

/// Pointer phase of a single-finger touch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TouchPhase {
    Down,
    Move,
    Up,
    Cancel,
}

/// Saved view state.
///
/// Flat on purpose: every field is a scalar so any serde format round-trips
/// it. The crop window is stored in image pixels of the loaded bitmap, which
/// keeps it valid across view size changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropViewState {
    pub crop_left: f64,
    pub crop_top: f64,
    pub crop_right: f64,
    pub crop_bottom: f64,
    pub rotation: f64,
    pub flip_horizontally: bool,
    pub flip_vertically: bool,
    pub zoom: f64,
    pub crop_shape: CropShape,
    pub auto_zoom_enabled: bool,
    pub max_zoom: f64,
}

impl CropViewState {
    pub fn crop_rect(&self) -> Rect {
        Rect::new(self.crop_left, self.crop_top, self.crop_right, self.crop_bottom)
    }
}

/// Everything a cropping backend needs, detached from the live view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceCrop {
    /// Crop window corners in full resolution source pixels, in window
    /// order (top-left, top-right, bottom-right, bottom-left on screen).
    pub points: Quad,
    pub rotation: f64,
    pub flip_horizontally: bool,
    pub flip_vertically: bool,
    /// Downsample factor of the bitmap shown in the view.
    pub sample_size: u32,
    pub fix_aspect_ratio: bool,
    pub aspect_ratio_x: u32,
    pub aspect_ratio_y: u32,
}
