//! Crop window state owned by the overlay layer.
//!
//! [`CropOverlay`] keeps the crop rectangle in view pixels together with
//! everything needed to move it: the image footprint, the view size, the size
//! constraints and the gesture in progress. It never calls back into the view
//! engine. Touch methods report whether the window changed and the caller
//! decides what follows (auto-zoom, repaint).

use super::decorations::{self, BackgroundRegions, LineSegment, OverlayStyle};
use super::{is_large_window, CropWindowConstraints, CropWindowMoveHandler, HitTester, MoveLimits};
use crate::geometry::{calculate_bounds, CalculatedBounds, Quad, Rect};
use crate::options::{CropOptions, CropShape, Guidelines, OptionsError};

/// Aspect ratio drift tolerated before the window is re-fitted, in view pixels.
const RATIO_FIX_TOLERANCE: f64 = 0.1;

/// The crop window and its interaction state.
#[derive(Debug, Clone, PartialEq)]
pub struct CropOverlay {
    rect: Rect,
    /// Image footprint in view space.
    bounds_points: Quad,
    view_width: f64,
    view_height: f64,
    constraints: CropWindowConstraints,
    hit_tester: HitTester,
    snap_radius: f64,
    guidelines: Guidelines,
    fix_aspect_ratio: bool,
    aspect_ratio_x: u32,
    aspect_ratio_y: u32,
    padding_ratio: f64,
    /// Initial window in image pixels, applied by `init_crop_window`.
    initial_crop_rect: Option<Rect>,
    multi_touch_enabled: bool,
    style: OverlayStyle,
    move_handler: Option<CropWindowMoveHandler>,
    initialized: bool,
}

impl CropOverlay {
    /// Create an overlay with no image attached. `options` must be validated.
    pub fn new(options: &CropOptions) -> Self {
        Self {
            rect: Rect::EMPTY,
            bounds_points: Quad::default(),
            view_width: 0.0,
            view_height: 0.0,
            constraints: CropWindowConstraints::from_options(options),
            hit_tester: HitTester::new(options.crop_shape, options.touch_radius),
            snap_radius: options.snap_radius,
            guidelines: options.guidelines,
            fix_aspect_ratio: options.fix_aspect_ratio,
            aspect_ratio_x: options.aspect_ratio_x,
            aspect_ratio_y: options.aspect_ratio_y,
            padding_ratio: options.initial_crop_window_padding_ratio,
            initial_crop_rect: options.initial_crop_rect,
            multi_touch_enabled: options.multi_touch_enabled,
            style: OverlayStyle::from_options(options),
            move_handler: None,
            initialized: false,
        }
    }

    /// Replace every option-derived value, keeping the window, the footprint
    /// and the view-dependent limits.
    pub fn set_initial_attribute_values(&mut self, options: &CropOptions) {
        let limits = (
            self.view_width,
            self.view_height,
            self.constraints.scale_factor_width(),
            self.constraints.scale_factor_height(),
        );
        let (rect, bounds, initialized) = (self.rect, self.bounds_points, self.initialized);
        *self = Self::new(options);
        self.constraints
            .set_crop_window_limits(limits.0, limits.1, limits.2, limits.3);
        self.rect = rect;
        self.bounds_points = bounds;
        self.view_width = limits.0;
        self.view_height = limits.1;
        self.initialized = initialized;
    }

    pub fn crop_window_rect(&self) -> Rect {
        self.rect
    }

    pub fn bounds_points(&self) -> &Quad {
        &self.bounds_points
    }

    pub fn constraints(&self) -> &CropWindowConstraints {
        &self.constraints
    }

    pub fn crop_shape(&self) -> CropShape {
        self.hit_tester.shape
    }

    pub fn guidelines(&self) -> Guidelines {
        self.guidelines
    }

    pub fn is_fix_aspect_ratio(&self) -> bool {
        self.fix_aspect_ratio
    }

    pub fn aspect_ratio_x(&self) -> u32 {
        self.aspect_ratio_x
    }

    pub fn aspect_ratio_y(&self) -> u32 {
        self.aspect_ratio_y
    }

    /// Target width / height of the window.
    pub fn target_aspect_ratio(&self) -> f64 {
        f64::from(self.aspect_ratio_x) / f64::from(self.aspect_ratio_y)
    }

    pub fn initial_crop_rect(&self) -> Option<Rect> {
        self.initial_crop_rect
    }

    pub fn is_multi_touch_enabled(&self) -> bool {
        self.multi_touch_enabled
    }

    pub fn style(&self) -> &OverlayStyle {
        &self.style
    }

    /// True while a handle is grabbed.
    pub fn is_dragging(&self) -> bool {
        self.move_handler.is_some()
    }

    /// True once a default window has been laid out for the current image.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Clamp rectangle for `rect` over the current footprint.
    pub fn calculate_bounds(&self, rect: &Rect) -> CalculatedBounds {
        calculate_bounds(&self.bounds_points, rect)
    }

    /// True if the image is rotated by a non-straight angle.
    pub fn is_non_straight_angle_rotated(&self) -> bool {
        self.bounds_points.is_non_straight()
    }

    /// Update the image footprint and view size.
    ///
    /// A changed footprint re-initializes the window if it is still empty.
    pub fn set_bounds(&mut self, points: Quad, view_width: f64, view_height: f64) {
        if points != self.bounds_points {
            self.bounds_points = points;
            self.view_width = view_width;
            self.view_height = view_height;
            if self.rect.width() == 0.0 || self.rect.height() == 0.0 {
                self.init_crop_window();
            }
        }
    }

    pub fn set_crop_window_limits(
        &mut self,
        max_width: f64,
        max_height: f64,
        scale_factor_width: f64,
        scale_factor_height: f64,
    ) {
        self.constraints.set_crop_window_limits(
            max_width,
            max_height,
            scale_factor_width,
            scale_factor_height,
        );
    }

    pub fn set_min_crop_result_size(&mut self, width: f64, height: f64) {
        self.constraints.set_min_crop_result_size(width, height);
    }

    pub fn set_max_crop_result_size(&mut self, width: f64, height: f64) {
        self.constraints.set_max_crop_result_size(width, height);
    }

    /// Store `rect` as is. No clamping, no gesture reset.
    pub fn set_crop_rectangle_raw(&mut self, rect: Rect) {
        self.rect = rect;
    }

    /// Store `rect`, abort any gesture and bring the window back within the
    /// size, bounds and ratio rules. An empty `rect` lays out a fresh default
    /// window instead.
    pub fn set_crop_rectangle_and_reset(&mut self, rect: Rect) {
        self.move_handler = None;
        self.rect = rect;
        if rect.width() <= 0.0 || rect.height() <= 0.0 {
            self.init_crop_window();
        } else {
            self.fix_crop_window_rect_by_rules();
        }
    }

    /// Drop the current window and lay out the default one.
    pub fn reset_crop_overlay(&mut self) {
        if self.initialized {
            self.set_crop_rectangle_and_reset(Rect::EMPTY);
        }
    }

    /// Re-apply the window rules to the current rectangle.
    pub fn fix_current_crop_window_rect(&mut self) {
        self.fix_crop_window_rect_by_rules();
    }

    pub fn set_crop_shape(&mut self, shape: CropShape) {
        self.hit_tester.shape = shape;
    }

    pub fn set_guidelines(&mut self, guidelines: Guidelines) {
        self.guidelines = guidelines;
    }

    pub fn set_snap_radius(&mut self, radius: f64) {
        self.snap_radius = radius;
    }

    pub fn set_multi_touch_enabled(&mut self, enabled: bool) {
        self.multi_touch_enabled = enabled;
    }

    /// Lock or unlock the aspect ratio. Re-lays out the window on change.
    pub fn set_fixed_aspect_ratio(&mut self, fixed: bool) {
        if self.fix_aspect_ratio != fixed {
            self.fix_aspect_ratio = fixed;
            self.reinit_if_initialized();
        }
    }

    /// Lock the window to `x`:`y`.
    ///
    /// # Errors
    ///
    /// Returns `OptionsError::AspectRatio` if either component is zero.
    pub fn set_aspect_ratio(&mut self, x: u32, y: u32) -> Result<(), OptionsError> {
        if x == 0 || y == 0 {
            return Err(OptionsError::AspectRatio);
        }
        let changed =
            !self.fix_aspect_ratio || self.aspect_ratio_x != x || self.aspect_ratio_y != y;
        self.aspect_ratio_x = x;
        self.aspect_ratio_y = y;
        self.fix_aspect_ratio = true;
        if changed {
            self.reinit_if_initialized();
        }
        Ok(())
    }

    /// Free the aspect ratio and reset the stored ratio to 1:1.
    pub fn clear_aspect_ratio(&mut self) {
        self.aspect_ratio_x = 1;
        self.aspect_ratio_y = 1;
        self.set_fixed_aspect_ratio(false);
    }

    /// Set the window to place on the next layout, in image pixels.
    pub fn set_initial_crop_rect(&mut self, rect: Option<Rect>) {
        self.initial_crop_rect = rect;
        self.reinit_if_initialized();
    }

    fn reinit_if_initialized(&mut self) {
        if self.initialized {
            self.init_crop_window();
        }
    }

    /// Lay out the default window for the current footprint and view.
    pub fn init_crop_window(&mut self) {
        let left_limit = self.bounds_points.left().max(0.0);
        let top_limit = self.bounds_points.top().max(0.0);
        let right_limit = self.bounds_points.right().min(self.view_width);
        let bottom_limit = self.bounds_points.bottom().min(self.view_height);

        if right_limit <= left_limit || bottom_limit <= top_limit {
            return;
        }

        self.initialized = true;
        let horizontal_padding = self.padding_ratio * (right_limit - left_limit);
        let vertical_padding = self.padding_ratio * (bottom_limit - top_limit);
        let mut rect = Rect::EMPTY;

        match self.initial_crop_rect {
            Some(init) if init.width() > 0.0 && init.height() > 0.0 => {
                let sfw = self.constraints.scale_factor_width();
                let sfh = self.constraints.scale_factor_height();
                rect.left = left_limit + init.left / sfw;
                rect.top = top_limit + init.top / sfh;
                rect.right = rect.left + init.width() / sfw;
                rect.bottom = rect.top + init.height() / sfh;

                rect.left = rect.left.max(left_limit);
                rect.top = rect.top.max(top_limit);
                rect.right = rect.right.min(right_limit);
                rect.bottom = rect.bottom.min(bottom_limit);
            }
            _ if self.fix_aspect_ratio => {
                let target = self.target_aspect_ratio();
                let image_ratio = (right_limit - left_limit) / (bottom_limit - top_limit);
                if image_ratio > target {
                    rect.top = top_limit + vertical_padding;
                    rect.bottom = bottom_limit - vertical_padding;
                    let half_width =
                        self.constraints.min_crop_width().max(rect.height() * target) / 2.0;
                    let center_x = self.view_width / 2.0;
                    rect.left = center_x - half_width;
                    rect.right = center_x + half_width;
                } else {
                    rect.left = left_limit + horizontal_padding;
                    rect.right = right_limit - horizontal_padding;
                    let half_height =
                        self.constraints.min_crop_height().max(rect.width() / target) / 2.0;
                    let center_y = self.view_height / 2.0;
                    rect.top = center_y - half_height;
                    rect.bottom = center_y + half_height;
                }
            }
            _ => {
                rect = Rect::new(
                    left_limit + horizontal_padding,
                    top_limit + vertical_padding,
                    right_limit - horizontal_padding,
                    bottom_limit - vertical_padding,
                );
            }
        }

        self.rect = rect;
        self.fix_crop_window_rect_by_rules();
    }

    /// Grow or shrink the window about its center to the size limits, clamp
    /// it into the footprint and the view, then restore the aspect ratio.
    pub fn fix_crop_window_rect_by_rules(&mut self) {
        let mut rect = self.rect;

        let min_w = self.constraints.min_crop_width();
        let min_h = self.constraints.min_crop_height();
        let max_w = self.constraints.max_crop_width();
        let max_h = self.constraints.max_crop_height();

        if rect.width() < min_w {
            let adj = (min_w - rect.width()) / 2.0;
            rect.left -= adj;
            rect.right += adj;
        }
        if rect.height() < min_h {
            let adj = (min_h - rect.height()) / 2.0;
            rect.top -= adj;
            rect.bottom += adj;
        }
        if rect.width() > max_w {
            let adj = (rect.width() - max_w) / 2.0;
            rect.left += adj;
            rect.right -= adj;
        }
        if rect.height() > max_h {
            let adj = (rect.height() - max_h) / 2.0;
            rect.top += adj;
            rect.bottom -= adj;
        }

        let bounds = self.calculate_bounds(&rect).rect;
        if bounds.width() > 0.0 && bounds.height() > 0.0 {
            let left_limit = bounds.left.max(0.0);
            let top_limit = bounds.top.max(0.0);
            let right_limit = bounds.right.min(self.view_width);
            let bottom_limit = bounds.bottom.min(self.view_height);
            if rect.left < left_limit {
                rect.left = left_limit;
            }
            if rect.top < top_limit {
                rect.top = top_limit;
            }
            if rect.right > right_limit {
                rect.right = right_limit;
            }
            if rect.bottom > bottom_limit {
                rect.bottom = bottom_limit;
            }
        }

        if self.fix_aspect_ratio {
            let ratio = self.target_aspect_ratio();
            if (rect.width() - rect.height() * ratio).abs() > RATIO_FIX_TOLERANCE {
                if rect.width() > rect.height() * ratio {
                    let adj = (rect.height() * ratio - rect.width()).abs() / 2.0;
                    rect.left += adj;
                    rect.right -= adj;
                } else {
                    let adj = (rect.width() / ratio - rect.height()).abs() / 2.0;
                    rect.top += adj;
                    rect.bottom -= adj;
                }
            }
        }

        self.rect = rect;
    }

    /// Start a gesture at `(x, y)`.
    ///
    /// # Returns
    ///
    /// `true` if a handle was grabbed.
    pub fn on_action_down(&mut self, x: f64, y: f64) -> bool {
        self.move_handler = self
            .hit_tester
            .hit_test(&self.rect, x, y)
            .map(|handle| CropWindowMoveHandler::new(handle, &self.rect, &self.constraints, x, y));
        self.move_handler.is_some()
    }

    /// Continue the gesture. Returns `true` if the window was moved.
    pub fn on_action_move(&mut self, x: f64, y: f64) -> bool {
        let calculated = calculate_bounds(&self.bounds_points, &self.rect);
        let limits = MoveLimits {
            bounds: calculated.rect,
            view_width: self.view_width,
            view_height: self.view_height,
            snap_margin: if calculated.non_straight {
                0.0
            } else {
                self.snap_radius
            },
            aspect_ratio: self.fix_aspect_ratio.then(|| self.target_aspect_ratio()),
        };
        match self.move_handler.as_mut() {
            Some(handler) => {
                handler.move_to(&mut self.rect, x, y, &limits);
                true
            }
            None => false,
        }
    }

    /// End the gesture. Returns `true` if one was in progress.
    pub fn on_action_up(&mut self) -> bool {
        self.move_handler.take().is_some()
    }

    /// Two-finger resize: the window becomes the span box around the focus.
    ///
    /// Ignored unless multi-touch is enabled and the new window starts at or
    /// after the view origin with its far edges within the maximum window
    /// size. An accepted window is then held to the size, bounds and ratio
    /// rules. Returns `true` if applied.
    pub fn apply_pinch(&mut self, focus_x: f64, focus_y: f64, span_x: f64, span_y: f64) -> bool {
        if !self.multi_touch_enabled {
            return false;
        }
        let dx = span_x / 2.0;
        let dy = span_y / 2.0;
        let candidate = Rect::new(focus_x - dx, focus_y - dy, focus_x + dx, focus_y + dy);

        let valid = candidate.left < candidate.right
            && candidate.top <= candidate.bottom
            && candidate.left >= 0.0
            && candidate.right <= self.constraints.max_crop_width()
            && candidate.top >= 0.0
            && candidate.bottom <= self.constraints.max_crop_height();
        if valid {
            self.rect = candidate;
            self.fix_crop_window_rect_by_rules();
        }
        valid
    }

    /// Whether the guidelines should be painted right now.
    pub fn guidelines_visible(&self) -> bool {
        let wanted = match self.guidelines {
            Guidelines::On => true,
            Guidelines::OnTouch => self.is_dragging(),
            Guidelines::Off => false,
        };
        wanted && is_large_window(&self.rect)
    }

    /// Rule of thirds lines, empty when hidden.
    pub fn guideline_segments(&self) -> Vec<LineSegment> {
        if !self.guidelines_visible() {
            return Vec::new();
        }
        decorations::guideline_segments(&self.rect, self.crop_shape(), self.style.border_line_thickness)
            .to_vec()
    }

    pub fn background_regions(&self) -> BackgroundRegions {
        decorations::background_regions(
            &self.rect,
            &self.bounds_points,
            self.view_width,
            self.view_height,
            self.crop_shape(),
        )
    }

    pub fn border_rect(&self) -> Rect {
        decorations::border_rect(&self.rect, self.style.border_line_thickness)
    }

    pub fn corner_segments(&self) -> [LineSegment; 8] {
        decorations::corner_segments(&self.rect, self.crop_shape(), &self.style)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::AffineTransform2D;

    fn overlay_on_square(options: &CropOptions) -> CropOverlay {
        let mut overlay = CropOverlay::new(options);
        overlay.set_crop_window_limits(1000.0, 1000.0, 0.5, 0.5);
        overlay.set_bounds(Quad::from_size(1000.0, 1000.0), 1000.0, 1000.0);
        overlay
    }

    #[test]
    fn test_default_window_uses_padding() {
        let overlay = overlay_on_square(&CropOptions::default());
        assert!(overlay.is_initialized());
        assert_eq!(overlay.crop_window_rect(), Rect::new(100.0, 100.0, 900.0, 900.0));
    }

    #[test]
    fn test_empty_footprint_does_not_initialize() {
        let mut overlay = CropOverlay::new(&CropOptions::default());
        overlay.set_bounds(Quad::new([5.0; 8]), 1000.0, 1000.0);
        assert!(!overlay.is_initialized());
        assert!(overlay.crop_window_rect().is_empty());
    }

    #[test]
    fn test_fixed_ratio_window_is_centered() {
        let options = CropOptions {
            fix_aspect_ratio: true,
            aspect_ratio_x: 16,
            aspect_ratio_y: 9,
            ..CropOptions::default()
        };
        let overlay = overlay_on_square(&options);
        assert!(overlay
            .crop_window_rect()
            .approx_eq(&Rect::new(100.0, 275.0, 900.0, 725.0), 1e-9));
    }

    #[test]
    fn test_initial_rect_maps_from_image_pixels() {
        let options = CropOptions {
            initial_crop_rect: Some(Rect::new(50.0, 50.0, 250.0, 150.0)),
            ..CropOptions::default()
        };
        let overlay = overlay_on_square(&options);
        assert_eq!(overlay.crop_window_rect(), Rect::new(100.0, 100.0, 500.0, 300.0));
    }

    #[test]
    fn test_reset_grows_to_min_size() {
        let mut overlay = overlay_on_square(&CropOptions::default());
        // min window 42 vs result 40 / 0.5 = 80
        overlay.set_crop_rectangle_and_reset(Rect::new(500.0, 500.0, 510.0, 510.0));
        assert_eq!(overlay.crop_window_rect(), Rect::new(465.0, 465.0, 545.0, 545.0));
    }

    #[test]
    fn test_raw_set_has_no_side_effects() {
        let mut overlay = overlay_on_square(&CropOptions::default());
        overlay.on_action_down(900.0, 900.0);
        overlay.set_crop_rectangle_raw(Rect::new(500.0, 500.0, 510.0, 510.0));
        assert_eq!(overlay.crop_window_rect(), Rect::new(500.0, 500.0, 510.0, 510.0));
        assert!(overlay.is_dragging());
    }

    #[test]
    fn test_drag_corner_and_snap() {
        let mut overlay = overlay_on_square(&CropOptions::default());
        assert!(overlay.on_action_down(900.0, 900.0));
        assert!(overlay.on_action_move(950.0, 960.0));
        assert_eq!(overlay.crop_window_rect(), Rect::new(100.0, 100.0, 950.0, 960.0));

        assert!(overlay.on_action_move(998.0, 999.0));
        assert_eq!(overlay.crop_window_rect(), Rect::new(100.0, 100.0, 1000.0, 1000.0));

        assert!(overlay.on_action_up());
        assert!(!overlay.is_dragging());
        assert!(!overlay.on_action_up());
    }

    #[test]
    fn test_touch_outside_window_is_ignored() {
        let mut overlay = overlay_on_square(&CropOptions::default());
        assert!(!overlay.on_action_down(10.0, 10.0));
        assert!(!overlay.on_action_move(500.0, 500.0));
        assert_eq!(overlay.crop_window_rect(), Rect::new(100.0, 100.0, 900.0, 900.0));
    }

    #[test]
    fn test_pinch() {
        let mut overlay = overlay_on_square(&CropOptions::default());
        assert!(!overlay.apply_pinch(500.0, 500.0, 400.0, 300.0));

        overlay.set_multi_touch_enabled(true);
        assert!(overlay.apply_pinch(500.0, 500.0, 400.0, 300.0));
        assert_eq!(overlay.crop_window_rect(), Rect::new(300.0, 350.0, 700.0, 650.0));

        // would leave the view
        assert!(!overlay.apply_pinch(100.0, 100.0, 400.0, 400.0));
        assert_eq!(overlay.crop_window_rect(), Rect::new(300.0, 350.0, 700.0, 650.0));
    }

    #[test]
    fn test_pinch_keeps_min_size() {
        let mut overlay = overlay_on_square(&CropOptions::default());
        overlay.set_multi_touch_enabled(true);
        // min window is 40 / 0.5 = 80
        assert!(overlay.apply_pinch(500.0, 500.0, 10.0, 10.0));
        assert_eq!(overlay.crop_window_rect(), Rect::new(460.0, 460.0, 540.0, 540.0));
        let min_width = overlay.constraints().min_crop_width();
        assert!(overlay.crop_window_rect().width() >= min_width);
    }

    #[test]
    fn test_aspect_ratio_setters() {
        let mut overlay = overlay_on_square(&CropOptions::default());
        assert_eq!(overlay.set_aspect_ratio(0, 3), Err(OptionsError::AspectRatio));

        overlay.set_aspect_ratio(16, 9).unwrap();
        assert!(overlay.is_fix_aspect_ratio());
        assert!(overlay
            .crop_window_rect()
            .approx_eq(&Rect::new(100.0, 275.0, 900.0, 725.0), 1e-9));

        overlay.clear_aspect_ratio();
        assert!(!overlay.is_fix_aspect_ratio());
        assert_eq!(overlay.crop_window_rect(), Rect::new(100.0, 100.0, 900.0, 900.0));
    }

    #[test]
    fn test_rotated_footprint_clamps_window() {
        let mut m = AffineTransform2D::new();
        m.post_translate(250.0, 250.0);
        m.post_rotate(45.0, 500.0, 500.0);
        let footprint = m.map_quad(&Quad::from_size(500.0, 500.0));

        let mut overlay = CropOverlay::new(&CropOptions::default());
        overlay.set_bounds(footprint, 1000.0, 1000.0);
        let half = 125.0 * 2f64.sqrt();
        let expected = Rect::new(500.0 - half, 500.0 - half, 500.0 + half, 500.0 + half);
        assert!(overlay.is_non_straight_angle_rotated());
        assert!(overlay.crop_window_rect().approx_eq(&expected, 1e-6));
    }

    #[test]
    fn test_guidelines_visibility() {
        let mut overlay = overlay_on_square(&CropOptions::default());
        assert!(!overlay.guidelines_visible());
        assert!(overlay.guideline_segments().is_empty());

        overlay.on_action_down(500.0, 500.0);
        assert!(overlay.guidelines_visible());
        assert_eq!(overlay.guideline_segments().len(), 4);

        overlay.set_guidelines(Guidelines::Off);
        assert!(!overlay.guidelines_visible());

        overlay.set_guidelines(Guidelines::On);
        overlay.on_action_up();
        assert!(overlay.guidelines_visible());
        overlay.set_crop_rectangle_raw(Rect::new(0.0, 0.0, 90.0, 300.0));
        assert!(!overlay.guidelines_visible());
    }

    #[test]
    fn test_option_refresh_keeps_window() {
        let mut overlay = overlay_on_square(&CropOptions::default());
        let options = CropOptions {
            crop_shape: CropShape::Oval,
            ..CropOptions::default()
        };
        overlay.set_initial_attribute_values(&options);
        assert_eq!(overlay.crop_shape(), CropShape::Oval);
        assert_eq!(overlay.crop_window_rect(), Rect::new(100.0, 100.0, 900.0, 900.0));
        assert_eq!(overlay.constraints().scale_factor_width(), 0.5);
    }
}
