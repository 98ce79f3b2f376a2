//! Render geometry for the crop overlay.
//!
//! Nothing here draws. Each function returns the shapes a host needs to
//! paint the dimmed background, the border, the corner marks and the rule
//! of thirds guidelines for a given crop window.

use serde::{Deserialize, Serialize};

use crate::geometry::{Quad, Rect};
use crate::options::{CropOptions, CropShape};

/// A straight line from `(x0, y0)` to `(x1, y1)` in view pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl LineSegment {
    pub const fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self { x0, y0, x1, y1 }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.x0, self.y0, self.x1, self.y1]
    }
}

/// Stroke sizes of the overlay, in view pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OverlayStyle {
    pub border_line_thickness: f64,
    pub border_corner_thickness: f64,
    pub border_corner_offset: f64,
    pub border_corner_length: f64,
    pub guidelines_thickness: f64,
}

impl OverlayStyle {
    pub fn from_options(options: &CropOptions) -> Self {
        Self {
            border_line_thickness: options.border_line_thickness,
            border_corner_thickness: options.border_corner_thickness,
            border_corner_offset: options.border_corner_offset,
            border_corner_length: options.border_corner_length,
            guidelines_thickness: options.guidelines_thickness,
        }
    }
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self::from_options(&CropOptions::default())
    }
}

/// Area to dim around the crop window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackgroundRegions {
    /// Four rectangles above, below, left and right of the window.
    Rects { rects: [Rect; 4] },
    /// Fill `area` clipped to `footprint`, leaving out the window drawn with `shape`.
    Clipped {
        area: Rect,
        footprint: Quad,
        window: Rect,
        shape: CropShape,
    },
}

/// Dimmed regions for `window` over an image whose view footprint is `footprint`.
///
/// The footprint bounding box is clamped to the view first. A straight
/// rectangular window gets four plain rectangles; a rotated footprint or an
/// oval window needs clipping, which is left to the host.
pub fn background_regions(
    window: &Rect,
    footprint: &Quad,
    view_width: f64,
    view_height: f64,
    shape: CropShape,
) -> BackgroundRegions {
    let left = footprint.left().max(0.0);
    let top = footprint.top().max(0.0);
    let right = footprint.right().min(view_width);
    let bottom = footprint.bottom().min(view_height);

    if shape == CropShape::Rectangle && !footprint.is_non_straight() {
        BackgroundRegions::Rects {
            rects: [
                Rect::new(left, top, right, window.top),
                Rect::new(left, window.bottom, right, bottom),
                Rect::new(left, window.top, window.left, window.bottom),
                Rect::new(window.right, window.top, right, window.bottom),
            ],
        }
    } else {
        BackgroundRegions::Clipped {
            area: Rect::new(left, top, right, bottom),
            footprint: *footprint,
            window: *window,
            shape,
        }
    }
}

/// Rectangle the border stroke is centered on.
pub fn border_rect(window: &Rect, line_thickness: f64) -> Rect {
    window.inset_by(line_thickness / 2.0, line_thickness / 2.0)
}

/// Two vertical then two horizontal lines splitting the window in thirds.
///
/// For an oval the lines stop at the ellipse so they stay inside the
/// visible crop area.
pub fn guideline_segments(window: &Rect, shape: CropShape, line_thickness: f64) -> [LineSegment; 4] {
    let sw = line_thickness;
    let rect = window.inset_by(sw, sw);
    let third_w = rect.width() / 3.0;
    let third_h = rect.height() / 3.0;

    let x1 = rect.left + third_w;
    let x2 = rect.right - third_w;
    let y1 = rect.top + third_h;
    let y2 = rect.bottom - third_h;

    match shape {
        CropShape::Rectangle => [
            LineSegment::new(x1, rect.top, x1, rect.bottom),
            LineSegment::new(x2, rect.top, x2, rect.bottom),
            LineSegment::new(rect.left, y1, rect.right, y1),
            LineSegment::new(rect.left, y2, rect.right, y2),
        ],
        CropShape::Oval => {
            // semi-axes of the ellipse inside the stroke
            let w = rect.width() / 2.0 - sw;
            let h = rect.height() / 2.0 - sw;
            let yv = h * ((w - third_w) / w).acos().sin();
            let xv = w * ((h - third_h) / h).asin().cos();
            [
                LineSegment::new(x1, rect.top + h - yv, x1, rect.bottom - h + yv),
                LineSegment::new(x2, rect.top + h - yv, x2, rect.bottom - h + yv),
                LineSegment::new(rect.left + w - xv, y1, rect.right - w + xv, y1),
                LineSegment::new(rect.left + w - xv, y2, rect.right - w + xv, y2),
            ]
        }
    }
}

/// The eight short strokes marking the window corners, two per corner in
/// the order top-left, top-right, bottom-left, bottom-right.
///
/// Rectangular windows push the marks outwards by `border_corner_offset`.
pub fn corner_segments(window: &Rect, shape: CropShape, style: &OverlayStyle) -> [LineSegment; 8] {
    let line_width = style.border_line_thickness;
    let corner_width = style.border_corner_thickness;
    let length = style.border_corner_length;

    let offset_from_border = match shape {
        CropShape::Rectangle => style.border_corner_offset,
        CropShape::Oval => 0.0,
    };
    let inset = corner_width / 2.0 + offset_from_border;
    let r = window.inset_by(inset, inset);
    let off = (corner_width - line_width) / 2.0;
    let ext = corner_width / 2.0 + off;

    [
        LineSegment::new(r.left - off, r.top - ext, r.left - off, r.top + length),
        LineSegment::new(r.left - ext, r.top - off, r.left + length, r.top - off),
        LineSegment::new(r.right + off, r.top - ext, r.right + off, r.top + length),
        LineSegment::new(r.right + ext, r.top - off, r.right - length, r.top - off),
        LineSegment::new(r.left - off, r.bottom + ext, r.left - off, r.bottom - length),
        LineSegment::new(r.left - ext, r.bottom + off, r.left + length, r.bottom + off),
        LineSegment::new(r.right + off, r.bottom + ext, r.right + off, r.bottom - length),
        LineSegment::new(r.right + ext, r.bottom + off, r.right - length, r.bottom + off),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rectangle_guidelines_split_in_thirds() {
        let lines = guideline_segments(&Rect::new(0.0, 0.0, 300.0, 600.0), CropShape::Rectangle, 0.0);
        assert_eq!(lines[0], LineSegment::new(100.0, 0.0, 100.0, 600.0));
        assert_eq!(lines[1], LineSegment::new(200.0, 0.0, 200.0, 600.0));
        assert_eq!(lines[2], LineSegment::new(0.0, 200.0, 300.0, 200.0));
        assert_eq!(lines[3], LineSegment::new(0.0, 400.0, 300.0, 400.0));
    }

    #[test]
    fn test_guidelines_respect_border_width() {
        let lines = guideline_segments(&Rect::new(0.0, 0.0, 306.0, 306.0), CropShape::Rectangle, 3.0);
        assert_eq!(lines[0].x0, 103.0);
        assert_eq!(lines[0].y0, 3.0);
        assert_eq!(lines[0].y1, 303.0);
    }

    #[test]
    fn test_oval_guidelines_end_on_the_ellipse() {
        let lines = guideline_segments(&Rect::new(0.0, 0.0, 600.0, 600.0), CropShape::Oval, 0.0);
        for line in lines {
            for (x, y) in [(line.x0, line.y0), (line.x1, line.y1)] {
                let d = ((x - 300.0) / 300.0).powi(2) + ((y - 300.0) / 300.0).powi(2);
                assert!((d - 1.0).abs() < 1e-9, "({x}, {y}) off the ellipse");
            }
        }
        assert!(lines[0].y0 > 0.0);
        assert!(lines[0].y1 < 600.0);
    }

    #[test]
    fn test_border_rect_is_inset_by_half_stroke() {
        let r = border_rect(&Rect::new(100.0, 100.0, 400.0, 300.0), 4.0);
        assert_eq!(r, Rect::new(102.0, 102.0, 398.0, 298.0));
    }

    #[test]
    fn test_corner_segments_rectangle() {
        let style = OverlayStyle {
            border_line_thickness: 3.0,
            border_corner_thickness: 2.0,
            border_corner_offset: 5.0,
            border_corner_length: 14.0,
            guidelines_thickness: 1.0,
        };
        let segs = corner_segments(&Rect::new(100.0, 100.0, 400.0, 400.0), CropShape::Rectangle, &style);
        // inset 6, offset -0.5, extension 0.5
        assert_eq!(segs[0], LineSegment::new(106.5, 105.5, 106.5, 120.0));
        assert_eq!(segs[1], LineSegment::new(105.5, 106.5, 120.0, 106.5));
        assert_eq!(segs[7], LineSegment::new(394.5, 393.5, 380.0, 393.5));
    }

    #[test]
    fn test_straight_background_is_four_rects() {
        let footprint = Quad::from_size(1000.0, 800.0);
        let window = Rect::new(100.0, 100.0, 900.0, 700.0);
        match background_regions(&window, &footprint, 1000.0, 800.0, CropShape::Rectangle) {
            BackgroundRegions::Rects { rects } => {
                assert_eq!(rects[0], Rect::new(0.0, 0.0, 1000.0, 100.0));
                assert_eq!(rects[1], Rect::new(0.0, 700.0, 1000.0, 800.0));
                assert_eq!(rects[2], Rect::new(0.0, 100.0, 100.0, 700.0));
                assert_eq!(rects[3], Rect::new(900.0, 100.0, 1000.0, 700.0));
            }
            other => panic!("expected rects, got {other:?}"),
        }
    }

    #[test]
    fn test_background_clipped_for_oval_and_rotation() {
        let footprint = Quad::new([-10.0, 0.0, 500.0, -20.0, 520.0, 500.0, 0.0, 520.0]);
        let window = Rect::new(100.0, 100.0, 300.0, 300.0);
        match background_regions(&window, &footprint, 400.0, 400.0, CropShape::Rectangle) {
            BackgroundRegions::Clipped { area, .. } => {
                assert_eq!(area, Rect::new(0.0, 0.0, 400.0, 400.0));
            }
            other => panic!("expected clip, got {other:?}"),
        }

        let straight = Quad::from_size(400.0, 400.0);
        assert!(matches!(
            background_regions(&window, &straight, 400.0, 400.0, CropShape::Oval),
            BackgroundRegions::Clipped { shape: CropShape::Oval, .. }
        ));
    }
}
