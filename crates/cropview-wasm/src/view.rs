//! `JsCropView`: the crop view engine for a canvas host.
//!
//! The host draws; the engine answers geometry. A typical frame:
//!
//! ```typescript
//! const view = new JsCropView({ guidelines: "on", fix_aspect_ratio: true });
//! view.on_view_resized(canvas.width, canvas.height);
//! view.on_image_loaded(bitmap.width, bitmap.height, 1, 0);
//!
//! canvas.onpointermove = (e) => view.apply_touch(e.offsetX, e.offsetY, 1);
//!
//! ctx.setTransform(...view.image_matrix());
//! ctx.drawImage(bitmap, 0, 0);
//! ctx.resetTransform();
//! const [l, t, r, b] = view.crop_window_rect();
//! ```

use cropview_core::bitmap::{self, OutputRequest};
use cropview_core::geometry::Rect;
use cropview_core::options::CropOptions;
use cropview_core::view::{CropImageView, CropViewState};
use cropview_core::window::LineSegment;
use wasm_bindgen::prelude::*;

use crate::types::{phase_from_u8, shape_from_u8, JsDecodedImage};

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn rect_values(rect: &Rect) -> Vec<f64> {
    vec![rect.left, rect.top, rect.right, rect.bottom]
}

fn flatten(segments: &[LineSegment]) -> Vec<f64> {
    segments.iter().flat_map(|segment| segment.to_array()).collect()
}

/// The crop view engine for JavaScript.
#[wasm_bindgen]
pub struct JsCropView {
    inner: CropImageView,
    options: CropOptions,
}

#[wasm_bindgen]
impl JsCropView {
    /// Create a view from a partial options object; missing fields take
    /// their defaults. Pass `undefined` for all defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the object does not deserialize or fails validation.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<JsCropView, JsValue> {
        let options: CropOptions = if options.is_undefined() || options.is_null() {
            CropOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options).map_err(js_error)?
        };
        Self::with_options(options).map_err(js_error)
    }

    pub fn set_options(&mut self, options: JsValue) -> Result<(), JsValue> {
        let options: CropOptions = serde_wasm_bindgen::from_value(options).map_err(js_error)?;
        self.inner.set_options(&options).map_err(js_error)?;
        self.options = options;
        Ok(())
    }

    // ---- lifecycle -------------------------------------------------------

    pub fn on_view_resized(&mut self, width: f64, height: f64) {
        self.inner.on_view_resized(width, height);
    }

    /// Place a bitmap of `width` x `height`, decoded at `sample_size`, with
    /// a clockwise load rotation in degrees.
    pub fn on_image_loaded(&mut self, width: u32, height: u32, sample_size: u32, rotation: f64) {
        self.inner.on_image_loaded(width, height, sample_size, rotation);
    }

    pub fn clear_image(&mut self) {
        self.inner.clear_image();
    }

    // ---- interaction -----------------------------------------------------

    /// Feed a pointer event; `phase` is 0 down, 1 move, 2 up, 3 cancel.
    ///
    /// # Returns
    ///
    /// The crop window as `[left, top, right, bottom]`.
    pub fn apply_touch(&mut self, x: f64, y: f64, phase: u8) -> Vec<f64> {
        rect_values(&self.inner.apply_touch(x, y, phase_from_u8(phase)))
    }

    pub fn apply_pinch(&mut self, focus_x: f64, focus_y: f64, span_x: f64, span_y: f64) -> Vec<f64> {
        rect_values(&self.inner.apply_pinch(focus_x, focus_y, span_x, span_y))
    }

    pub fn set_rotation(&mut self, degrees: f64) {
        self.inner.set_rotation(degrees);
    }

    pub fn rotate_image(&mut self, degrees: f64) {
        self.inner.rotate_image(degrees);
    }

    pub fn rotate_clockwise(&mut self) {
        self.inner.rotate_clockwise();
    }

    pub fn rotate_counter_clockwise(&mut self) {
        self.inner.rotate_counter_clockwise();
    }

    pub fn flip_image_horizontally(&mut self) {
        self.inner.flip_image_horizontally();
    }

    pub fn flip_image_vertically(&mut self) {
        self.inner.flip_image_vertically();
    }

    pub fn set_flip(&mut self, horizontally: bool, vertically: bool) {
        self.inner.set_flip(horizontally, vertically);
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.inner.set_zoom(zoom);
    }

    pub fn set_max_zoom(&mut self, max_zoom: f64) -> Result<(), JsValue> {
        self.inner.set_max_zoom(max_zoom).map_err(js_error)
    }

    pub fn set_auto_zoom_enabled(&mut self, enabled: bool) {
        self.inner.set_auto_zoom_enabled(enabled);
    }

    pub fn set_multi_touch_enabled(&mut self, enabled: bool) {
        self.inner.set_multi_touch_enabled(enabled);
    }

    /// 0 = Rectangle, 1 = Oval.
    pub fn set_crop_shape(&mut self, shape: u8) {
        self.inner.set_crop_shape(shape_from_u8(shape));
    }

    pub fn set_fixed_aspect_ratio(&mut self, fixed: bool) {
        self.inner.set_fixed_aspect_ratio(fixed);
    }

    pub fn set_aspect_ratio(&mut self, x: u32, y: u32) -> Result<(), JsValue> {
        self.inner.set_aspect_ratio(x, y).map_err(js_error)
    }

    pub fn clear_aspect_ratio(&mut self) {
        self.inner.clear_aspect_ratio();
    }

    /// Place the window over a rectangle in source pixels.
    pub fn set_crop_rect(&mut self, left: f64, top: f64, right: f64, bottom: f64) {
        self.inner.set_crop_rect(Some(Rect::new(left, top, right, bottom)));
    }

    pub fn reset_crop_rect(&mut self) {
        self.inner.reset_crop_rect();
    }

    // ---- geometry --------------------------------------------------------

    #[wasm_bindgen(getter)]
    pub fn zoom(&self) -> f64 {
        self.inner.zoom()
    }

    #[wasm_bindgen(getter)]
    pub fn rotated_degrees(&self) -> f64 {
        self.inner.rotated_degrees()
    }

    #[wasm_bindgen(getter)]
    pub fn flipped_horizontally(&self) -> bool {
        self.inner.is_flipped_horizontally()
    }

    #[wasm_bindgen(getter)]
    pub fn flipped_vertically(&self) -> bool {
        self.inner.is_flipped_vertically()
    }

    /// The display transform as canvas `setTransform(a, b, c, d, e, f)` values.
    pub fn image_matrix(&self) -> Vec<f64> {
        self.inner.image_matrix().to_canvas().to_vec()
    }

    pub fn crop_window_rect(&self) -> Vec<f64> {
        rect_values(&self.inner.crop_window_rect())
    }

    /// Crop window corners in source pixels, TL TR BR BL.
    ///
    /// # Errors
    ///
    /// Returns an error if the display transform cannot be inverted.
    pub fn crop_points(&self) -> Result<Vec<f64>, JsValue> {
        Ok(self.inner.crop_points().map_err(js_error)?.points.to_vec())
    }

    /// `[left, top, right, bottom]` in whole source pixels, or `undefined`
    /// without an image.
    pub fn crop_rect(&self) -> Option<Vec<u32>> {
        self.inner
            .crop_rect()
            .map(|rect| vec![rect.left, rect.top, rect.right, rect.bottom])
    }

    /// Flattened `[x0, y0, x1, y1, ...]` guideline segments, empty while hidden.
    pub fn guideline_segments(&self) -> Vec<f64> {
        flatten(&self.inner.guideline_segments())
    }

    pub fn corner_segments(&self) -> Vec<f64> {
        flatten(&self.inner.corner_segments())
    }

    pub fn border_rect(&self) -> Vec<f64> {
        rect_values(&self.inner.border_rect())
    }

    /// Regions to dim around the window, as a tagged object.
    pub fn background_regions(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.inner.background_regions()).map_err(js_error)
    }

    // ---- results and state -----------------------------------------------

    /// Crop the bitmap passed to `on_image_loaded`, honoring the output
    /// request options.
    ///
    /// # Errors
    ///
    /// Returns an error if the display transform cannot be inverted.
    pub fn crop_bitmap(&self, image: &JsDecodedImage) -> Result<JsDecodedImage, JsValue> {
        let crop = self
            .inner
            .current_crop_rectangle_in_source_space()
            .map_err(js_error)?;
        let output = OutputRequest::from_options(&self.options);
        Ok(JsDecodedImage::from_decoded(bitmap::crop_bitmap(
            &image.to_decoded(),
            &crop,
            &output,
        )))
    }

    pub fn save_state(&self) -> Result<JsValue, JsValue> {
        let state = self.inner.save_state().map_err(js_error)?;
        serde_wasm_bindgen::to_value(&state).map_err(js_error)
    }

    pub fn restore_state(&mut self, state: JsValue) -> Result<(), JsValue> {
        let state: CropViewState = serde_wasm_bindgen::from_value(state).map_err(js_error)?;
        self.inner.restore_state(state);
        Ok(())
    }
}

impl JsCropView {
    pub(crate) fn with_options(options: CropOptions) -> Result<Self, cropview_core::OptionsError> {
        Ok(Self {
            inner: CropImageView::new(&options)?,
            options,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laid_out() -> JsCropView {
        let mut view = JsCropView::with_options(CropOptions::default()).unwrap();
        view.on_view_resized(1000.0, 1000.0);
        view.on_image_loaded(500, 500, 1, 0.0);
        view
    }

    #[test]
    fn test_rejects_invalid_options() {
        let mut options = CropOptions::default();
        options.max_zoom = 0.5;
        assert!(JsCropView::with_options(options).is_err());
    }

    #[test]
    fn test_initial_geometry() {
        let view = laid_out();
        assert_eq!(view.crop_window_rect(), vec![100.0, 100.0, 900.0, 900.0]);
        assert_eq!(view.image_matrix(), vec![2.0, 0.0, 0.0, 2.0, 0.0, 0.0]);
        assert_eq!(view.crop_rect(), Some(vec![50, 50, 450, 450]));
        let points = view.crop_points().unwrap();
        assert_eq!(points.len(), 8);
        assert!((points[0] - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_touch_moves_window() {
        let mut view = laid_out();
        view.apply_touch(500.0, 500.0, 0);
        let rect = view.apply_touch(520.0, 510.0, 1);
        assert_eq!(rect, vec![120.0, 110.0, 920.0, 910.0]);
        view.apply_touch(520.0, 510.0, 2);
    }

    #[test]
    fn test_guidelines_flattened() {
        let mut view = laid_out();
        view.apply_touch(100.0, 100.0, 0);
        assert_eq!(view.guideline_segments().len(), 16);
        assert_eq!(view.corner_segments().len(), 32);
    }

    #[test]
    fn test_crop_bitmap() {
        let view = laid_out();
        let image = JsDecodedImage::new(500, 500, vec![200; 500 * 500 * 3]);
        let cropped = view.crop_bitmap(&image).unwrap();
        assert_eq!((cropped.width(), cropped.height()), (400, 400));
    }

    #[test]
    fn test_rotation_controls() {
        let mut view = laid_out();
        view.rotate_clockwise();
        assert_eq!(view.rotated_degrees(), 90.0);
        view.set_flip(true, false);
        assert!(view.flipped_horizontally());
        assert!(!view.flipped_vertically());
    }
}
