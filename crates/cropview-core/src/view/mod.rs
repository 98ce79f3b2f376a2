//! The crop view engine.
//!
//! [`CropImageView`] owns the transform that places the bitmap in the view
//! and the [`CropOverlay`] drawn on top of it. Hosts feed it layout, image
//! and touch events and read back geometry; it never draws and never blocks.
//!
//! # Display Transform
//!
//! Rebuilt from scratch whenever the view size, rotation, flip or zoom
//! changes, in this order:
//!
//! 1. Translate the bitmap center to the view center
//! 2. Rotate about the image center (skipped at 0 degrees)
//! 3. Scale about the image center according to the [`ScaleType`]
//! 4. Scale by the zoom, negated on flipped axes
//! 5. Translate by the pan offset, expressed in zoomed image units
//!
//! The crop window rides along: it is mapped to image space with the old
//! transform and back to view space with the new one.
//!
//! # Auto-zoom
//!
//! When a gesture ends, a window narrower than 50% of the view in both
//! dimensions zooms in until it covers about 64%. A window wider than 65% in
//! either dimension zooms out to about 51%. The gap between the bands keeps
//! the zoom from oscillating.

mod state;

pub use state::{CropViewState, SourceCrop, TouchPhase};

use serde::{Deserialize, Serialize};

use crate::geometry::{AffineTransform2D, PixelRect, Quad, Rect, TransformError};
use crate::options::{CropOptions, CropShape, Guidelines, OptionsError, ScaleType};
use crate::window::{BackgroundRegions, CropOverlay, LineSegment};

/// Zoom in when the window is narrower than this share of the view.
const ZOOM_IN_BELOW: f64 = 0.5;
/// Zoom out when the window is wider than this share of the view.
const ZOOM_OUT_ABOVE: f64 = 0.65;
/// Coverage targeted when zooming in.
const ZOOM_IN_TARGET: f64 = 0.64;
/// Coverage targeted when zooming out.
const ZOOM_OUT_TARGET: f64 = 0.51;

/// Side of the square sampled to measure the view-to-source scale.
const SCALE_SAMPLE: f64 = 100.0;

/// Dimensions of the bitmap currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadedImage {
    /// Width of the decoded bitmap.
    pub width: u32,
    /// Height of the decoded bitmap.
    pub height: u32,
    /// How much smaller the decoded bitmap is than the source, at least 1.
    pub sample_size: u32,
}

impl LoadedImage {
    fn quad(&self) -> Quad {
        Quad::from_size(f64::from(self.width), f64::from(self.height))
    }
}

/// Interactive crop view: image transform plus crop overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct CropImageView {
    overlay: CropOverlay,
    image: Option<LoadedImage>,
    view_width: f64,
    view_height: f64,
    image_matrix: AffineTransform2D,
    /// Bitmap corners in view space.
    image_points: Quad,
    degrees_rotated: f64,
    /// Rotation the image was loaded with, restored by `reset_crop_rect`.
    initial_degrees_rotated: f64,
    flip_horizontally: bool,
    flip_vertically: bool,
    zoom: f64,
    zoom_offset_x: f64,
    zoom_offset_y: f64,
    max_zoom: f64,
    auto_zoom_enabled: bool,
    scale_type: ScaleType,
    show_crop_overlay: bool,
    allow_rotation: bool,
    allow_flipping: bool,
    rotation_step: f64,
    initial_rotation: Option<f64>,
    initial_flip: (bool, bool),
    pending_restore: Option<CropViewState>,
}

impl CropImageView {
    /// Create a view with no image and no size.
    ///
    /// # Errors
    ///
    /// Returns the first `OptionsError` found by [`CropOptions::validate`].
    pub fn new(options: &CropOptions) -> Result<Self, OptionsError> {
        options.validate()?;
        Ok(Self {
            overlay: CropOverlay::new(options),
            image: None,
            view_width: 0.0,
            view_height: 0.0,
            image_matrix: AffineTransform2D::new(),
            image_points: Quad::default(),
            degrees_rotated: 0.0,
            initial_degrees_rotated: 0.0,
            flip_horizontally: options.flip_horizontally,
            flip_vertically: options.flip_vertically,
            zoom: 1.0,
            zoom_offset_x: 0.0,
            zoom_offset_y: 0.0,
            max_zoom: options.max_zoom,
            auto_zoom_enabled: options.auto_zoom_enabled,
            scale_type: options.scale_type,
            show_crop_overlay: options.show_crop_overlay,
            allow_rotation: options.allow_rotation,
            allow_flipping: options.allow_flipping,
            rotation_step: options.rotation_degrees,
            initial_rotation: options.initial_rotation,
            initial_flip: (options.flip_horizontally, options.flip_vertically),
            pending_restore: None,
        })
    }

    pub fn overlay(&self) -> &CropOverlay {
        &self.overlay
    }

    pub fn image(&self) -> Option<LoadedImage> {
        self.image
    }

    pub fn view_size(&self) -> (f64, f64) {
        (self.view_width, self.view_height)
    }

    /// Current bitmap-to-view transform.
    pub fn image_matrix(&self) -> &AffineTransform2D {
        &self.image_matrix
    }

    /// Bitmap corners in view space, the footprint the overlay clamps to.
    pub fn image_bounds_points(&self) -> Quad {
        self.image_points
    }

    /// Crop window in view pixels.
    pub fn crop_window_rect(&self) -> Rect {
        self.overlay.crop_window_rect()
    }

    /// Clockwise rotation in degrees, within `[0, 360)`.
    pub fn rotated_degrees(&self) -> f64 {
        self.degrees_rotated
    }

    pub fn is_flipped_horizontally(&self) -> bool {
        self.flip_horizontally
    }

    pub fn is_flipped_vertically(&self) -> bool {
        self.flip_vertically
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan_offset(&self) -> (f64, f64) {
        (self.zoom_offset_x, self.zoom_offset_y)
    }

    pub fn max_zoom(&self) -> f64 {
        self.max_zoom
    }

    pub fn is_auto_zoom_enabled(&self) -> bool {
        self.auto_zoom_enabled
    }

    pub fn scale_type(&self) -> ScaleType {
        self.scale_type
    }

    /// True when the overlay should be shown: enabled and an image is loaded.
    pub fn is_crop_overlay_visible(&self) -> bool {
        self.show_crop_overlay && self.image.is_some()
    }

    // ---- lifecycle -------------------------------------------------------

    /// The view was laid out at `width` x `height`.
    ///
    /// Repeating the current size is a no-op, so layout passes that do not
    /// change the size never disturb the window.
    pub fn on_view_resized(&mut self, width: f64, height: f64) {
        if width == self.view_width && height == self.view_height {
            return;
        }
        let was_laid_out = self.view_width > 0.0 && self.view_height > 0.0;
        self.view_width = width;
        self.view_height = height;

        if self.image.is_some() && width > 0.0 && height > 0.0 {
            self.apply_image_matrix(true);
            if self.pending_restore.is_some() {
                self.apply_pending_restore();
            } else if was_laid_out {
                self.handle_crop_window_changed(false);
            }
        } else {
            self.update_image_bounds(true);
        }
    }

    /// A new bitmap is ready.
    ///
    /// # Arguments
    ///
    /// * `width`, `height` - Decoded bitmap size
    /// * `sample_size` - Downsample factor used while decoding
    /// * `initial_rotation` - Rotation read from the source, usually EXIF
    ///
    /// An empty bitmap clears the view instead.
    pub fn on_image_loaded(&mut self, width: u32, height: u32, sample_size: u32, initial_rotation: f64) {
        self.clear_image();
        if width == 0 || height == 0 {
            tracing::warn!(width, height, "ignoring empty bitmap");
            self.update_image_bounds(true);
            return;
        }

        let image = LoadedImage {
            width,
            height,
            sample_size: sample_size.max(1),
        };
        self.image = Some(image);
        self.degrees_rotated = normalize_degrees(initial_rotation);
        self.initial_degrees_rotated = self.degrees_rotated;
        tracing::debug!(
            width,
            height,
            sample_size = image.sample_size,
            rotation = self.degrees_rotated,
            "image loaded"
        );

        self.apply_image_matrix(true);
        self.overlay.reset_crop_overlay();

        if self.pending_restore.is_some() {
            self.apply_pending_restore();
        } else if let Some(rotation) = self.initial_rotation {
            self.set_rotation(rotation);
        }
    }

    /// Drop the bitmap and every transform derived from it.
    pub fn clear_image(&mut self) {
        self.image = None;
        self.degrees_rotated = 0.0;
        self.zoom = 1.0;
        self.zoom_offset_x = 0.0;
        self.zoom_offset_y = 0.0;
        self.flip_horizontally = self.initial_flip.0;
        self.flip_vertically = self.initial_flip.1;
        self.image_matrix.reset();
        self.image_points = Quad::default();
    }

    // ---- touch -----------------------------------------------------------

    /// Route a single-finger touch event to the crop window.
    ///
    /// # Returns
    ///
    /// The crop window after the event, in view pixels.
    pub fn apply_touch(&mut self, x: f64, y: f64, phase: TouchPhase) -> Rect {
        if self.is_crop_overlay_visible() {
            match phase {
                TouchPhase::Down => {
                    self.overlay.on_action_down(x, y);
                }
                TouchPhase::Move => {
                    if self.overlay.on_action_move(x, y) {
                        self.handle_crop_window_changed(true);
                    }
                }
                TouchPhase::Up | TouchPhase::Cancel => {
                    if self.overlay.on_action_up() {
                        self.handle_crop_window_changed(false);
                    }
                }
            }
        }
        self.overlay.crop_window_rect()
    }

    /// Two-finger resize around `(focus_x, focus_y)`, see [`CropOverlay::apply_pinch`].
    pub fn apply_pinch(&mut self, focus_x: f64, focus_y: f64, span_x: f64, span_y: f64) -> Rect {
        if self.is_crop_overlay_visible() {
            self.overlay.apply_pinch(focus_x, focus_y, span_x, span_y);
        }
        self.overlay.crop_window_rect()
    }

    // ---- rotation, flip, zoom ------------------------------------------

    /// Rotate to an absolute angle, keeping the window over the same content.
    pub fn set_rotation(&mut self, degrees: f64) {
        let target = normalize_degrees(degrees);
        if target != self.degrees_rotated {
            self.rotate_image(target - self.degrees_rotated);
        }
    }

    /// Rotate by `degrees` clockwise. Negative values turn counter-clockwise.
    ///
    /// The window keeps its center on the same image content and its size
    /// in image pixels. With a free aspect ratio, a turn close to a quarter
    /// swaps the window's width and height and the flip flags, so the window
    /// follows the content.
    pub fn rotate_image(&mut self, degrees: f64) {
        if self.image.is_none() {
            return;
        }
        let degrees = normalize_degrees(degrees);
        let flip_axes = !self.overlay.is_fix_aspect_ratio()
            && ((46.0..=134.0).contains(&degrees) || (216.0..=304.0).contains(&degrees));

        let rect = self.overlay.crop_window_rect();
        let (mut half_width, mut half_height) = if flip_axes {
            (rect.height() / 2.0, rect.width() / 2.0)
        } else {
            (rect.width() / 2.0, rect.height() / 2.0)
        };
        if flip_axes {
            std::mem::swap(&mut self.flip_horizontally, &mut self.flip_vertically);
        }

        // window center and a unit view vector, in image space
        let mut anchor = [rect.center_x(), rect.center_y(), 0.0, 0.0, 1.0, 0.0];
        match self.image_matrix.invert() {
            Ok(inverse) => inverse.map_points(&mut anchor),
            Err(err) => {
                tracing::warn!(%err, "cannot rotate through a degenerate transform");
                return;
            }
        }

        self.degrees_rotated = normalize_degrees(self.degrees_rotated + degrees);
        self.apply_image_matrix(true);

        // keep the window the same size on screen despite the new fit scale
        let (_, stretch) = map_anchor(&self.image_matrix, &anchor);
        self.zoom = (self.zoom / stretch).max(1.0);
        self.apply_image_matrix(true);

        let (center, change) = map_anchor(&self.image_matrix, &anchor);
        half_width *= change;
        half_height *= change;

        self.overlay.reset_crop_overlay();
        self.overlay.set_crop_rectangle_raw(Rect::new(
            center.0 - half_width,
            center.1 - half_height,
            center.0 + half_width,
            center.1 + half_height,
        ));
        self.apply_image_matrix(true);
        self.handle_crop_window_changed(false);
        self.overlay.fix_current_crop_window_rect();

        tracing::debug!(rotation = self.degrees_rotated, zoom = self.zoom, "image rotated");
    }

    /// Rotate clockwise by the configured step, if rotation is allowed.
    pub fn rotate_clockwise(&mut self) {
        if self.allow_rotation {
            self.rotate_image(self.rotation_step);
        }
    }

    /// Rotate counter-clockwise by the configured step, if rotation is allowed.
    pub fn rotate_counter_clockwise(&mut self) {
        if self.allow_rotation {
            self.rotate_image(-self.rotation_step);
        }
    }

    /// Mirror the image left to right, if flipping is allowed.
    pub fn flip_image_horizontally(&mut self) {
        if self.allow_flipping {
            self.set_flipped_horizontally(!self.flip_horizontally);
        }
    }

    /// Mirror the image top to bottom, if flipping is allowed.
    pub fn flip_image_vertically(&mut self) {
        if self.allow_flipping {
            self.set_flipped_vertically(!self.flip_vertically);
        }
    }

    pub fn set_flipped_horizontally(&mut self, flipped: bool) {
        self.set_flip(flipped, self.flip_vertically);
    }

    pub fn set_flipped_vertically(&mut self, flipped: bool) {
        self.set_flip(self.flip_horizontally, flipped);
    }

    /// Set both flip flags at once.
    pub fn set_flip(&mut self, horizontally: bool, vertically: bool) {
        if (horizontally, vertically) != (self.flip_horizontally, self.flip_vertically) {
            self.flip_horizontally = horizontally;
            self.flip_vertically = vertically;
            self.apply_image_matrix(true);
            tracing::debug!(horizontally, vertically, "flip changed");
        }
    }

    /// Set the zoom, clamped to `[1, max_zoom]`.
    ///
    /// A non-finite value would collapse the transform and is ignored.
    pub fn set_zoom(&mut self, zoom: f64) {
        if zoom.is_nan() {
            tracing::warn!("ignoring NaN zoom");
            return;
        }
        let zoom = zoom.clamp(1.0, self.max_zoom);
        if zoom != self.zoom {
            self.zoom = zoom;
            self.apply_image_matrix(true);
        }
    }

    /// Set the auto-zoom ceiling.
    ///
    /// # Errors
    ///
    /// Returns `OptionsError::MaxZoom` when `max_zoom` is below 1 or not finite.
    pub fn set_max_zoom(&mut self, max_zoom: f64) -> Result<(), OptionsError> {
        if max_zoom < 1.0 || !max_zoom.is_finite() {
            return Err(OptionsError::MaxZoom);
        }
        if max_zoom != self.max_zoom {
            self.max_zoom = max_zoom;
            if self.zoom > max_zoom {
                self.zoom = max_zoom;
                self.apply_image_matrix(true);
            }
            self.handle_crop_window_changed(false);
        }
        Ok(())
    }

    pub fn set_auto_zoom_enabled(&mut self, enabled: bool) {
        if self.auto_zoom_enabled != enabled {
            self.auto_zoom_enabled = enabled;
            self.handle_crop_window_changed(false);
        }
    }

    /// Change the fit policy. Resets zoom and pan and lays out a fresh window.
    pub fn set_scale_type(&mut self, scale_type: ScaleType) {
        if self.scale_type != scale_type {
            self.scale_type = scale_type;
            self.zoom = 1.0;
            self.zoom_offset_x = 0.0;
            self.zoom_offset_y = 0.0;
            self.apply_image_matrix(true);
            self.overlay.reset_crop_overlay();
        }
    }

    // ---- overlay settings ------------------------------------------------

    pub fn set_crop_shape(&mut self, shape: CropShape) {
        self.overlay.set_crop_shape(shape);
    }

    pub fn set_guidelines(&mut self, guidelines: Guidelines) {
        self.overlay.set_guidelines(guidelines);
    }

    pub fn set_multi_touch_enabled(&mut self, enabled: bool) {
        self.overlay.set_multi_touch_enabled(enabled);
    }

    pub fn set_snap_radius(&mut self, radius: f64) {
        self.overlay.set_snap_radius(radius);
    }

    pub fn set_show_crop_overlay(&mut self, show: bool) {
        self.show_crop_overlay = show;
    }

    pub fn set_fixed_aspect_ratio(&mut self, fixed: bool) {
        self.overlay.set_fixed_aspect_ratio(fixed);
    }

    /// Lock the window to `x`:`y`.
    ///
    /// # Errors
    ///
    /// Returns `OptionsError::AspectRatio` if either component is zero.
    pub fn set_aspect_ratio(&mut self, x: u32, y: u32) -> Result<(), OptionsError> {
        self.overlay.set_aspect_ratio(x, y)
    }

    pub fn clear_aspect_ratio(&mut self) {
        self.overlay.clear_aspect_ratio();
    }

    pub fn set_min_crop_result_size(&mut self, width: u32, height: u32) {
        self.overlay
            .set_min_crop_result_size(f64::from(width), f64::from(height));
    }

    pub fn set_max_crop_result_size(&mut self, width: u32, height: u32) {
        self.overlay
            .set_max_crop_result_size(f64::from(width), f64::from(height));
    }

    /// Replace the overlay options without touching the current window.
    ///
    /// # Errors
    ///
    /// Returns the first `OptionsError` found by [`CropOptions::validate`].
    pub fn set_options(&mut self, options: &CropOptions) -> Result<(), OptionsError> {
        options.validate()?;
        self.overlay.set_initial_attribute_values(options);
        self.show_crop_overlay = options.show_crop_overlay;
        self.allow_rotation = options.allow_rotation;
        self.allow_flipping = options.allow_flipping;
        self.rotation_step = options.rotation_degrees;
        self.initial_rotation = options.initial_rotation;
        self.set_auto_zoom_enabled(options.auto_zoom_enabled);
        self.set_max_zoom(options.max_zoom)?;
        self.set_scale_type(options.scale_type);
        Ok(())
    }

    // ---- crop geometry ---------------------------------------------------

    /// Crop window corners mapped back to full resolution source pixels.
    ///
    /// The result is a true quadrilateral when the image is rotated by a
    /// non-straight angle.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::Degenerate` if the display transform has no inverse.
    pub fn crop_points(&self) -> Result<Quad, TransformError> {
        let inverse = self.image_matrix.invert()?;
        let window = Quad::from_rect(&self.overlay.crop_window_rect());
        let sample_size = self.image.map_or(1, |image| image.sample_size);
        Ok(inverse.map_quad(&window).scaled(f64::from(sample_size)))
    }

    /// Snapshot of the crop in source space for a cropping backend.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::Degenerate` if the display transform has no inverse.
    pub fn current_crop_rectangle_in_source_space(&self) -> Result<SourceCrop, TransformError> {
        Ok(SourceCrop {
            points: self.crop_points()?,
            rotation: self.degrees_rotated,
            flip_horizontally: self.flip_horizontally,
            flip_vertically: self.flip_vertically,
            sample_size: self.image.map_or(1, |image| image.sample_size),
            fix_aspect_ratio: self.overlay.is_fix_aspect_ratio(),
            aspect_ratio_x: self.overlay.aspect_ratio_x(),
            aspect_ratio_y: self.overlay.aspect_ratio_y(),
        })
    }

    /// Crop window as a whole-pixel rectangle of the source image.
    ///
    /// For a non-straight rotation this is the bounding box of the rotated
    /// window. `None` without an image or with a degenerate transform.
    pub fn crop_rect(&self) -> Option<PixelRect> {
        let image = self.image?;
        let points = self
            .crop_points()
            .inspect_err(|err| tracing::debug!(%err, "no crop rect"))
            .ok()?;
        Some(PixelRect::from_points(
            &points,
            image.width * image.sample_size,
            image.height * image.sample_size,
            self.overlay.is_fix_aspect_ratio(),
            self.overlay.aspect_ratio_x(),
            self.overlay.aspect_ratio_y(),
        ))
    }

    /// The full source image, the largest possible crop.
    pub fn whole_image_rect(&self) -> Option<PixelRect> {
        self.image.map(|image| {
            PixelRect::new(0, 0, image.width * image.sample_size, image.height * image.sample_size)
        })
    }

    /// Place the crop window over `rect`, in source pixels, or back to the
    /// default window when `None`.
    pub fn set_crop_rect(&mut self, rect: Option<Rect>) {
        self.overlay.set_initial_crop_rect(rect);
    }

    /// Back to the freshly loaded state: zoom 1, no pan, load rotation, no
    /// flips, default window.
    pub fn reset_crop_rect(&mut self) {
        self.zoom = 1.0;
        self.zoom_offset_x = 0.0;
        self.zoom_offset_y = 0.0;
        self.degrees_rotated = self.initial_degrees_rotated;
        self.flip_horizontally = false;
        self.flip_vertically = false;
        self.apply_image_matrix(false);
        self.overlay.reset_crop_overlay();
    }

    // ---- overlay render geometry ----------------------------------------

    pub fn guideline_segments(&self) -> Vec<LineSegment> {
        self.overlay.guideline_segments()
    }

    pub fn background_regions(&self) -> BackgroundRegions {
        self.overlay.background_regions()
    }

    pub fn border_rect(&self) -> Rect {
        self.overlay.border_rect()
    }

    pub fn corner_segments(&self) -> [LineSegment; 8] {
        self.overlay.corner_segments()
    }

    // ---- save / restore ------------------------------------------------

    /// Capture the view state with the window in image pixels.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::Degenerate` if the display transform has no inverse.
    pub fn save_state(&self) -> Result<CropViewState, TransformError> {
        let image_rect = self
            .image_matrix
            .invert()?
            .map_rect(&self.overlay.crop_window_rect());
        Ok(CropViewState {
            crop_left: image_rect.left,
            crop_top: image_rect.top,
            crop_right: image_rect.right,
            crop_bottom: image_rect.bottom,
            rotation: self.degrees_rotated,
            flip_horizontally: self.flip_horizontally,
            flip_vertically: self.flip_vertically,
            zoom: self.zoom,
            crop_shape: self.overlay.crop_shape(),
            auto_zoom_enabled: self.auto_zoom_enabled,
            max_zoom: self.max_zoom,
        })
    }

    /// Restore a saved state.
    ///
    /// Settings apply at once. The window and transform need both an image
    /// and a view size, so they are applied now if both are present and
    /// otherwise on the next `on_view_resized` or `on_image_loaded`.
    pub fn restore_state(&mut self, state: CropViewState) {
        self.overlay.set_crop_shape(state.crop_shape);
        self.auto_zoom_enabled = state.auto_zoom_enabled;
        if state.max_zoom >= 1.0 && state.max_zoom.is_finite() {
            self.max_zoom = state.max_zoom;
        }
        self.pending_restore = Some(state);
        if self.image.is_some() && self.view_width > 0.0 && self.view_height > 0.0 {
            self.apply_pending_restore();
        }
    }

    fn apply_pending_restore(&mut self) {
        let Some(state) = self.pending_restore.take() else {
            return;
        };
        self.degrees_rotated = normalize_degrees(state.rotation);
        self.flip_horizontally = state.flip_horizontally;
        self.flip_vertically = state.flip_vertically;
        self.zoom = if state.zoom.is_nan() {
            1.0
        } else {
            state.zoom.clamp(1.0, self.max_zoom)
        };
        self.apply_image_matrix(true);

        let image_rect = state.crop_rect();
        if image_rect.width() > 0.0 || image_rect.height() > 0.0 {
            let rect = self.image_matrix.map_rect(&image_rect);
            self.overlay.set_crop_rectangle_raw(rect);
            // pan so the restored window is centered
            self.apply_image_matrix(true);
            self.handle_crop_window_changed(false);
            self.overlay.fix_current_crop_window_rect();
        }
        tracing::debug!(rotation = self.degrees_rotated, zoom = self.zoom, "view state restored");
    }

    // ---- transform engine ----------------------------------------------

    /// React to a crop window change.
    ///
    /// While dragging, the image only slides if the window left the view.
    /// On release, the auto-zoom bands are applied and, over a tilted image,
    /// the window is held to the rules again.
    fn handle_crop_window_changed(&mut self, in_progress: bool) {
        let (width, height) = (self.view_width, self.view_height);
        if self.image.is_none() || width <= 0.0 || height <= 0.0 {
            return;
        }
        let rect = self.overlay.crop_window_rect();

        if in_progress {
            if rect.left < 0.0 || rect.top < 0.0 || rect.right > width || rect.bottom > height {
                self.apply_image_matrix(false);
            }
            return;
        }
        if self.auto_zoom_enabled || self.zoom > 1.0 {
            self.apply_auto_zoom(&rect);
        }
        // a release over a tilted image pulls the window back into the footprint
        if self.overlay.is_non_straight_angle_rotated() {
            self.overlay.fix_current_crop_window_rect();
        }
    }

    /// Keep the released window at 50% to 65% of the view by zooming.
    fn apply_auto_zoom(&mut self, rect: &Rect) {
        let (width, height) = (self.view_width, self.view_height);
        let mut new_zoom = 0.0;
        if self.zoom < self.max_zoom
            && rect.width() < width * ZOOM_IN_BELOW
            && rect.height() < height * ZOOM_IN_BELOW
        {
            new_zoom = self.max_zoom.min(
                (width / (rect.width() / self.zoom / ZOOM_IN_TARGET))
                    .min(height / (rect.height() / self.zoom / ZOOM_IN_TARGET)),
            );
        }
        if self.zoom > 1.0
            && (rect.width() > width * ZOOM_OUT_ABOVE || rect.height() > height * ZOOM_OUT_ABOVE)
        {
            new_zoom = 1f64.max(
                (width / (rect.width() / self.zoom / ZOOM_OUT_TARGET))
                    .min(height / (rect.height() / self.zoom / ZOOM_OUT_TARGET)),
            );
        }
        if !self.auto_zoom_enabled {
            new_zoom = 1.0;
        }

        if new_zoom > 0.0 && new_zoom != self.zoom {
            tracing::debug!(from = self.zoom, to = new_zoom, "auto-zoom applied");
            self.zoom = new_zoom;
            self.apply_image_matrix(true);
        }
    }

    /// Rebuild the display transform and carry the crop window along.
    ///
    /// With `center` the pan is recomputed to center the window; otherwise
    /// the current pan is only corrected to keep the window in view.
    fn apply_image_matrix(&mut self, center: bool) {
        let Some(image) = self.image else {
            return;
        };
        let (width, height) = (self.view_width, self.view_height);
        if width <= 0.0 || height <= 0.0 {
            return;
        }

        // carry the window by its image-space center and a unit edge so a
        // non-straight rotation cannot grow it to its bounding box
        let window = self.overlay.crop_window_rect();
        let mut anchor = [window.center_x(), window.center_y(), 0.0, 0.0, 1.0, 0.0];
        let carried = match self.image_matrix.invert() {
            Ok(inverse) => {
                inverse.map_points(&mut anchor);
                true
            }
            Err(err) => {
                tracing::warn!(%err, "resetting degenerate transform");
                false
            }
        };

        let bitmap = image.quad();
        let mut m = AffineTransform2D::new();
        m.post_translate(
            (width - f64::from(image.width)) / 2.0,
            (height - f64::from(image.height)) / 2.0,
        );
        let mut points = m.map_quad(&bitmap);

        if self.degrees_rotated != 0.0 {
            m.post_rotate(self.degrees_rotated, points.center_x(), points.center_y());
            points = m.map_quad(&bitmap);
        }

        if let Some(scale) = self.fit_scale(&points) {
            m.post_scale(scale, scale, points.center_x(), points.center_y());
            points = m.map_quad(&bitmap);
        }

        let scale_x = if self.flip_horizontally { -self.zoom } else { self.zoom };
        let scale_y = if self.flip_vertically { -self.zoom } else { self.zoom };
        m.post_scale(scale_x, scale_y, points.center_x(), points.center_y());
        points = m.map_quad(&bitmap);
        let mut crop = if carried {
            let ((cx, cy), stretch) = map_anchor(&m, &anchor);
            let half_w = window.width() / 2.0 * stretch;
            let half_h = window.height() / 2.0 * stretch;
            Rect::new(cx - half_w, cy - half_h, cx + half_w, cy + half_h)
        } else {
            window
        };

        if center {
            self.zoom_offset_x = if width > points.width() {
                0.0
            } else {
                (width / 2.0 - crop.center_x())
                    .min(-points.left())
                    .max(width - points.right())
                    / scale_x
            };
            self.zoom_offset_y = if height > points.height() {
                0.0
            } else {
                (height / 2.0 - crop.center_y())
                    .min(-points.top())
                    .max(height - points.bottom())
                    / scale_y
            };
        } else {
            self.zoom_offset_x = (self.zoom_offset_x * scale_x)
                .max(-crop.left)
                .min(-crop.right + width)
                / scale_x;
            self.zoom_offset_y = (self.zoom_offset_y * scale_y)
                .max(-crop.top)
                .min(-crop.bottom + height)
                / scale_y;
        }

        let (dx, dy) = (self.zoom_offset_x * scale_x, self.zoom_offset_y * scale_y);
        m.post_translate(dx, dy);
        crop.offset(dx, dy);

        self.image_matrix = m;
        self.image_points = m.map_quad(&bitmap);
        self.overlay.set_crop_rectangle_raw(crop);
        self.update_image_bounds(false);
    }

    /// Step 3 scale factor for the rotated bitmap box `points`, if any.
    fn fit_scale(&self, points: &Quad) -> Option<f64> {
        let fit = (self.view_width / points.width()).min(self.view_height / points.height());
        match self.scale_type {
            ScaleType::FitCenter => Some(fit),
            ScaleType::CenterInside if fit < 1.0 => Some(fit),
            ScaleType::CenterCrop => {
                Some((self.view_width / points.width()).max(self.view_height / points.height()))
            }
            _ if fit > 1.0 && self.auto_zoom_enabled => Some(fit),
            _ => None,
        }
    }

    /// Push the footprint and the view-to-source scale to the overlay.
    fn update_image_bounds(&mut self, clear: bool) {
        match self.image {
            Some(image) if !clear => {
                let sampled = self
                    .image_matrix
                    .map_quad(&Quad::from_size(SCALE_SAMPLE, SCALE_SAMPLE));
                let sample = f64::from(image.sample_size);
                self.overlay.set_crop_window_limits(
                    self.view_width,
                    self.view_height,
                    SCALE_SAMPLE * sample / sampled.width(),
                    SCALE_SAMPLE * sample / sampled.height(),
                );
                self.overlay
                    .set_bounds(self.image_points, self.view_width, self.view_height);
            }
            _ => {
                self.overlay
                    .set_bounds(Quad::default(), self.view_width, self.view_height);
            }
        }
    }
}

fn normalize_degrees(degrees: f64) -> f64 {
    let normalized = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if normalized >= 360.0 {
        0.0
    } else {
        normalized
    }
}

/// Map a `[cx, cy, x0, y0, x1, y1]` anchor and return the mapped center and
/// the length of the mapped `(x0, y0) -> (x1, y1)` vector.
fn map_anchor(m: &AffineTransform2D, anchor: &[f64; 6]) -> ((f64, f64), f64) {
    let mut mapped = *anchor;
    m.map_points(&mut mapped);
    let length = (mapped[4] - mapped[2]).hypot(mapped[5] - mapped[3]);
    ((mapped[0], mapped[1]), length)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_straight_rotation_round_trip(
            quarter in 0u32..4,
            w in 100u32..1200,
            h in 100u32..1200,
            fx in 0.05f64..0.45,
            fy in 0.05f64..0.45,
        ) {
            let mut view = CropImageView::new(&CropOptions::default()).unwrap();
            view.on_view_resized(900.0, 700.0);
            view.on_image_loaded(w, h, 1, 0.0);
            view.set_rotation(f64::from(quarter) * 90.0);

            let bounds = view.image_bounds_points().bounding_rect();
            let rect = Rect::new(
                bounds.left + bounds.width() * fx,
                bounds.top + bounds.height() * fy,
                bounds.right - bounds.width() * fx,
                bounds.bottom - bounds.height() * fy,
            );
            let m = *view.image_matrix();
            let inverse = m.invert().unwrap();
            let back = m.map_rect(&inverse.map_rect(&rect));
            prop_assert!(back.approx_eq(&rect, 1e-3));
        }

        #[test]
        fn prop_tilted_drags_keep_window_valid(
            degrees in (1u32..360).prop_filter("straight", |d| d % 90 != 0),
            w in 300u32..800,
            h in 300u32..800,
            start in 0usize..8,
            moves in proptest::collection::vec((-150.0f64..150.0, -150.0f64..150.0), 1..8),
        ) {
            let mut view = CropImageView::new(&CropOptions::default()).unwrap();
            view.on_view_resized(1000.0, 1000.0);
            view.on_image_loaded(w, h, 1, 0.0);
            view.set_rotation(f64::from(degrees));
            super::tests::assert_window_valid(&view);

            let rect = view.crop_window_rect();
            let grips = [
                (rect.left, rect.top), (rect.center_x(), rect.top), (rect.right, rect.top),
                (rect.right, rect.center_y()), (rect.right, rect.bottom), (rect.center_x(), rect.bottom),
                (rect.left, rect.bottom), (rect.left, rect.center_y()),
            ];
            let (gx, gy) = grips[start];
            view.apply_touch(gx, gy, TouchPhase::Down);
            super::tests::assert_window_valid(&view);

            let mut last = (gx, gy);
            for (dx, dy) in moves {
                last = ((gx + dx).clamp(0.0, 1000.0), (gy + dy).clamp(0.0, 1000.0));
                view.apply_touch(last.0, last.1, TouchPhase::Move);
                super::tests::assert_window_valid(&view);
            }
            view.apply_touch(last.0, last.1, TouchPhase::Up);
            super::tests::assert_window_valid(&view);
            prop_assert!(view.crop_window_rect().width() <= 1000.0 + 1e-6);
        }

        #[test]
        fn prop_window_size_limits_hold(
            moves in proptest::collection::vec((-200.0f64..1200.0, -200.0f64..1200.0), 1..12),
            start in 0usize..9,
        ) {
            let mut view = CropImageView::new(&CropOptions::default()).unwrap();
            view.on_view_resized(1000.0, 1000.0);
            view.on_image_loaded(600, 400, 1, 0.0);

            let rect = view.crop_window_rect();
            let grips = [
                (rect.left, rect.top), (rect.center_x(), rect.top), (rect.right, rect.top),
                (rect.right, rect.center_y()), (rect.right, rect.bottom), (rect.center_x(), rect.bottom),
                (rect.left, rect.bottom), (rect.left, rect.center_y()), (rect.center_x(), rect.center_y()),
            ];
            let (gx, gy) = grips[start];
            view.apply_touch(gx, gy, TouchPhase::Down);
            let constraints = *view.overlay().constraints();
            for (x, y) in moves {
                let r = view.apply_touch(x, y, TouchPhase::Move);
                prop_assert!(r.width() >= constraints.min_crop_width() - 1e-6);
                prop_assert!(r.height() >= constraints.min_crop_height() - 1e-6);
                prop_assert!(r.width() <= constraints.max_crop_width() + 1e-6);
                prop_assert!(r.height() <= constraints.max_crop_height() + 1e-6);
            }
        }
    }
}
