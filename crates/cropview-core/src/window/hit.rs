//! Map a touch point to the crop window handle it grabs.

use super::MoveHandle;
use crate::geometry::Rect;
use crate::options::CropShape;

/// Windows smaller than this in either dimension are "small": the center
/// handle wins over the edges and guidelines are hidden.
pub const GUIDELINES_MIN_SIZE: f64 = 100.0;

/// True if the window is large enough to show guidelines.
pub fn is_large_window(rect: &Rect) -> bool {
    !(rect.width() < GUIDELINES_MIN_SIZE || rect.height() < GUIDELINES_MIN_SIZE)
}

/// Resolves which handle, if any, a touch at `(x, y)` lands on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitTester {
    pub shape: CropShape,
    pub touch_radius: f64,
}

impl HitTester {
    pub fn new(shape: CropShape, touch_radius: f64) -> Self {
        Self {
            shape,
            touch_radius,
        }
    }

    /// Determine the handle under `(x, y)` for the crop window `rect`.
    ///
    /// # Returns
    ///
    /// `None` when the touch misses the window. Oval windows always
    /// return a handle.
    pub fn hit_test(&self, rect: &Rect, x: f64, y: f64) -> Option<MoveHandle> {
        match self.shape {
            CropShape::Oval => Some(oval_handle(rect, x, y)),
            CropShape::Rectangle => rectangle_handle(rect, x, y, self.touch_radius),
        }
    }
}

fn rectangle_handle(rect: &Rect, x: f64, y: f64, radius: f64) -> Option<MoveHandle> {
    let focus_center = !is_large_window(rect);

    if in_corner_zone(x, y, rect.left, rect.top, radius) {
        Some(MoveHandle::TopLeft)
    } else if in_corner_zone(x, y, rect.right, rect.top, radius) {
        Some(MoveHandle::TopRight)
    } else if in_corner_zone(x, y, rect.left, rect.bottom, radius) {
        Some(MoveHandle::BottomLeft)
    } else if in_corner_zone(x, y, rect.right, rect.bottom, radius) {
        Some(MoveHandle::BottomRight)
    } else if focus_center && rect.contains(x, y) {
        Some(MoveHandle::Center)
    } else if in_horizontal_zone(x, y, rect.left, rect.right, rect.top, radius) {
        Some(MoveHandle::Top)
    } else if in_horizontal_zone(x, y, rect.left, rect.right, rect.bottom, radius) {
        Some(MoveHandle::Bottom)
    } else if in_vertical_zone(x, y, rect.left, rect.top, rect.bottom, radius) {
        Some(MoveHandle::Left)
    } else if in_vertical_zone(x, y, rect.right, rect.top, rect.bottom, radius) {
        Some(MoveHandle::Right)
    } else if rect.contains(x, y) {
        Some(MoveHandle::Center)
    } else {
        None
    }
}

/// 6x6 grid over the bounding box; the outer ring of cells maps to the
/// corner and edge handles, the inner 4x4 block to the center.
fn oval_handle(rect: &Rect, x: f64, y: f64) -> MoveHandle {
    let cell_w = rect.width() / 6.0;
    let left_center = rect.left + cell_w;
    let right_center = rect.left + 5.0 * cell_w;

    let cell_h = rect.height() / 6.0;
    let top_center = rect.top + cell_h;
    let bottom_center = rect.top + 5.0 * cell_h;

    let column = if x < left_center {
        0
    } else if x < right_center {
        1
    } else {
        2
    };
    let row = if y < top_center {
        0
    } else if y < bottom_center {
        1
    } else {
        2
    };

    match (column, row) {
        (0, 0) => MoveHandle::TopLeft,
        (0, 1) => MoveHandle::Left,
        (0, _) => MoveHandle::BottomLeft,
        (1, 0) => MoveHandle::Top,
        (1, 1) => MoveHandle::Center,
        (1, _) => MoveHandle::Bottom,
        (_, 0) => MoveHandle::TopRight,
        (_, 1) => MoveHandle::Right,
        _ => MoveHandle::BottomRight,
    }
}

#[inline]
fn in_corner_zone(x: f64, y: f64, hx: f64, hy: f64, radius: f64) -> bool {
    (x - hx).abs() <= radius && (y - hy).abs() <= radius
}

#[inline]
fn in_horizontal_zone(x: f64, y: f64, x_start: f64, x_end: f64, hy: f64, radius: f64) -> bool {
    x > x_start && x < x_end && (y - hy).abs() <= radius
}

#[inline]
fn in_vertical_zone(x: f64, y: f64, hx: f64, y_start: f64, y_end: f64, radius: f64) -> bool {
    (x - hx).abs() <= radius && y > y_start && y < y_end
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rect_tester() -> HitTester {
        HitTester::new(CropShape::Rectangle, 24.0)
    }

    #[test]
    fn test_corners_take_precedence() {
        let rect = Rect::new(100.0, 100.0, 500.0, 400.0);
        let t = rect_tester();
        assert_eq!(t.hit_test(&rect, 110.0, 95.0), Some(MoveHandle::TopLeft));
        assert_eq!(t.hit_test(&rect, 490.0, 120.0), Some(MoveHandle::TopRight));
        assert_eq!(t.hit_test(&rect, 80.0, 410.0), Some(MoveHandle::BottomLeft));
        assert_eq!(t.hit_test(&rect, 520.0, 420.0), Some(MoveHandle::BottomRight));
    }

    #[test]
    fn test_edges_on_large_window() {
        let rect = Rect::new(100.0, 100.0, 500.0, 400.0);
        let t = rect_tester();
        assert_eq!(t.hit_test(&rect, 300.0, 110.0), Some(MoveHandle::Top));
        assert_eq!(t.hit_test(&rect, 300.0, 390.0), Some(MoveHandle::Bottom));
        assert_eq!(t.hit_test(&rect, 90.0, 250.0), Some(MoveHandle::Left));
        assert_eq!(t.hit_test(&rect, 510.0, 250.0), Some(MoveHandle::Right));
        assert_eq!(t.hit_test(&rect, 300.0, 250.0), Some(MoveHandle::Center));
    }

    #[test]
    fn test_small_window_prefers_center_over_edges() {
        let rect = Rect::new(100.0, 100.0, 180.0, 180.0);
        let t = rect_tester();
        // inside, near the top edge, but not in a corner zone
        assert_eq!(t.hit_test(&rect, 140.0, 110.0), Some(MoveHandle::Center));
        // outside the window the top edge zone still applies
        assert_eq!(t.hit_test(&rect, 140.0, 90.0), Some(MoveHandle::Top));
    }

    #[test]
    fn test_miss() {
        let rect = Rect::new(100.0, 100.0, 500.0, 400.0);
        assert_eq!(rect_tester().hit_test(&rect, 700.0, 700.0), None);
        assert_eq!(rect_tester().hit_test(&rect, 300.0, 50.0), None);
    }

    #[test]
    fn test_oval_grid() {
        let rect = Rect::new(0.0, 0.0, 600.0, 600.0);
        let t = HitTester::new(CropShape::Oval, 24.0);
        assert_eq!(t.hit_test(&rect, 50.0, 50.0), Some(MoveHandle::TopLeft));
        assert_eq!(t.hit_test(&rect, 300.0, 50.0), Some(MoveHandle::Top));
        assert_eq!(t.hit_test(&rect, 550.0, 50.0), Some(MoveHandle::TopRight));
        assert_eq!(t.hit_test(&rect, 50.0, 300.0), Some(MoveHandle::Left));
        assert_eq!(t.hit_test(&rect, 300.0, 300.0), Some(MoveHandle::Center));
        assert_eq!(t.hit_test(&rect, 550.0, 300.0), Some(MoveHandle::Right));
        assert_eq!(t.hit_test(&rect, 50.0, 550.0), Some(MoveHandle::BottomLeft));
        assert_eq!(t.hit_test(&rect, 300.0, 550.0), Some(MoveHandle::Bottom));
        assert_eq!(t.hit_test(&rect, 550.0, 550.0), Some(MoveHandle::BottomRight));
        // far outside still resolves to a handle
        assert_eq!(t.hit_test(&rect, -500.0, -500.0), Some(MoveHandle::TopLeft));
    }

    #[test]
    fn test_large_window_threshold() {
        assert!(is_large_window(&Rect::new(0.0, 0.0, 100.0, 100.0)));
        assert!(!is_large_window(&Rect::new(0.0, 0.0, 99.0, 300.0)));
    }
}
