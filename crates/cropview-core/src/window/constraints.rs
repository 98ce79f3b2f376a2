//! Size limits for the crop window.
//!
//! Two kinds of limits apply at once: window limits in view pixels (the
//! smallest window a finger can still grab, the view size) and result limits
//! in source pixels. Result limits are converted to view pixels with the
//! current view-to-source scale factor and the tighter of the two wins.

use serde::{Deserialize, Serialize};

use crate::options::CropOptions;

/// Min/max crop window size bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropWindowConstraints {
    min_window_width: f64,
    min_window_height: f64,
    max_window_width: f64,
    max_window_height: f64,
    min_result_width: f64,
    min_result_height: f64,
    max_result_width: f64,
    max_result_height: f64,
    /// Source pixels per view pixel, horizontally.
    scale_factor_width: f64,
    /// Source pixels per view pixel, vertically.
    scale_factor_height: f64,
}

impl Default for CropWindowConstraints {
    fn default() -> Self {
        Self {
            min_window_width: 0.0,
            min_window_height: 0.0,
            max_window_width: f64::MAX,
            max_window_height: f64::MAX,
            min_result_width: 0.0,
            min_result_height: 0.0,
            max_result_width: f64::MAX,
            max_result_height: f64::MAX,
            scale_factor_width: 1.0,
            scale_factor_height: 1.0,
        }
    }
}

impl CropWindowConstraints {
    /// Limits taken from the options, with no view attached yet.
    pub fn from_options(options: &CropOptions) -> Self {
        let mut constraints = Self::default();
        constraints.set_min_crop_window_size(
            options.min_crop_window_width,
            options.min_crop_window_height,
        );
        constraints.set_min_crop_result_size(
            f64::from(options.min_crop_result_width),
            f64::from(options.min_crop_result_height),
        );
        constraints.set_max_crop_result_size(
            f64::from(options.max_crop_result_width),
            f64::from(options.max_crop_result_height),
        );
        constraints
    }

    /// Effective minimum window width in view pixels.
    pub fn min_crop_width(&self) -> f64 {
        self.min_window_width
            .max(self.min_result_width / self.scale_factor_width)
    }

    /// Effective minimum window height in view pixels.
    pub fn min_crop_height(&self) -> f64 {
        self.min_window_height
            .max(self.min_result_height / self.scale_factor_height)
    }

    /// Effective maximum window width in view pixels.
    pub fn max_crop_width(&self) -> f64 {
        self.max_window_width
            .min(self.max_result_width / self.scale_factor_width)
    }

    /// Effective maximum window height in view pixels.
    pub fn max_crop_height(&self) -> f64 {
        self.max_window_height
            .min(self.max_result_height / self.scale_factor_height)
    }

    pub fn scale_factor_width(&self) -> f64 {
        self.scale_factor_width
    }

    pub fn scale_factor_height(&self) -> f64 {
        self.scale_factor_height
    }

    pub fn set_min_crop_window_size(&mut self, width: f64, height: f64) {
        self.min_window_width = width;
        self.min_window_height = height;
    }

    pub fn set_min_crop_result_size(&mut self, width: f64, height: f64) {
        self.min_result_width = width;
        self.min_result_height = height;
    }

    pub fn set_max_crop_result_size(&mut self, width: f64, height: f64) {
        self.max_result_width = width;
        self.max_result_height = height;
    }

    /// Update the view-dependent limits.
    ///
    /// # Arguments
    ///
    /// * `max_width`, `max_height` - View size, the largest possible window
    /// * `scale_factor_width`, `scale_factor_height` - Source pixels per view pixel
    ///
    /// Non-positive scale factors are ignored so result limits never divide by zero.
    pub fn set_crop_window_limits(
        &mut self,
        max_width: f64,
        max_height: f64,
        scale_factor_width: f64,
        scale_factor_height: f64,
    ) {
        self.max_window_width = max_width;
        self.max_window_height = max_height;
        if scale_factor_width > 0.0 && scale_factor_width.is_finite() {
            self.scale_factor_width = scale_factor_width;
        }
        if scale_factor_height > 0.0 && scale_factor_height.is_finite() {
            self.scale_factor_height = scale_factor_height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_options() {
        let c = CropWindowConstraints::from_options(&CropOptions::default());
        // scale factor 1: result min 40 loses to window min 42
        assert_eq!(c.min_crop_width(), 42.0);
        assert_eq!(c.min_crop_height(), 42.0);
        assert_eq!(c.max_crop_width(), 99999.0);
    }

    #[test]
    fn test_result_limits_scale_with_view() {
        let mut c = CropWindowConstraints::from_options(&CropOptions::default());
        // image shown at 2x: one view pixel covers half a source pixel
        c.set_crop_window_limits(1000.0, 800.0, 0.5, 0.5);
        assert_eq!(c.min_crop_width(), 80.0);
        assert_eq!(c.min_crop_height(), 80.0);
        assert_eq!(c.max_crop_width(), 1000.0);
        assert_eq!(c.max_crop_height(), 800.0);
    }

    #[test]
    fn test_max_result_limit_wins_when_tighter() {
        let mut c = CropWindowConstraints::default();
        c.set_max_crop_result_size(300.0, 200.0);
        c.set_crop_window_limits(1000.0, 1000.0, 2.0, 2.0);
        assert_eq!(c.max_crop_width(), 150.0);
        assert_eq!(c.max_crop_height(), 100.0);
    }

    #[test]
    fn test_zero_scale_factor_is_ignored() {
        let mut c = CropWindowConstraints::default();
        c.set_min_crop_result_size(40.0, 40.0);
        c.set_crop_window_limits(500.0, 500.0, 0.0, 0.0);
        assert_eq!(c.scale_factor_width(), 1.0);
        assert_eq!(c.min_crop_width(), 40.0);
    }
}
