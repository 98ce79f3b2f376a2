//! Clamping bounds for a crop window over a possibly rotated image footprint.
//!
//! # Algorithm
//!
//! For a straight rotation the footprint is its own bounding box. Otherwise
//! the footprint is a true quadrilateral and the clamp rectangle is found by
//! intersecting the diagonals of the crop window with the quadrilateral's
//! edges:
//!
//! 1. Pick the corner with the smallest y as the reference corner `p0`, its
//!    neighbour along one edge as `p3` and the opposite corner as `p2`.
//! 2. Express the two edge directions as `y = a0*x + b` and `y = a1*x + b`
//!    with `a1 = -1/a0` (the footprint is a rotated rectangle).
//! 3. Intersect both crop window diagonals with all four edge lines and keep
//!    the tightest left and right values that still lie on the correct side
//!    of the crop window.
//! 4. Derive top and bottom from the edge lines evaluated at those left and
//!    right values.
//!
//! The result is conservative: every corner of the returned rectangle lies
//! inside the footprint.

use super::{Quad, Rect};

/// Output of [`calculate_bounds`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalculatedBounds {
    /// Axis-aligned rectangle the crop window must stay inside.
    pub rect: Rect,
    /// True if the footprint is rotated by a non-straight angle.
    pub non_straight: bool,
}

/// Compute the rectangle a crop window may occupy inside `footprint`.
///
/// # Arguments
///
/// * `footprint` - Image corners in view space
/// * `crop` - The current crop window, used to orient the diagonal rays
///
/// # Returns
///
/// The clamp rectangle, with `non_straight` set when the quadrilateral path
/// was taken. For straight rotations the rectangle is the bounding box.
pub fn calculate_bounds(footprint: &Quad, crop: &Rect) -> CalculatedBounds {
    let mut left = footprint.left();
    let mut top = footprint.top();
    let mut right = footprint.right();
    let mut bottom = footprint.bottom();

    if !footprint.is_non_straight() {
        return CalculatedBounds {
            rect: Rect::new(left, top, right, bottom),
            non_straight: false,
        };
    }

    let p = &footprint.points;
    let (mut x0, mut y0, mut x2, mut y2, mut x3, mut y3) = (p[0], p[1], p[4], p[5], p[6], p[7]);
    if p[7] < p[1] {
        if p[1] < p[3] {
            (x0, y0, x2, y2, x3, y3) = (p[6], p[7], p[2], p[3], p[4], p[5]);
        } else {
            (x0, y0, x2, y2, x3, y3) = (p[4], p[5], p[0], p[1], p[2], p[3]);
        }
    } else if p[1] > p[3] {
        (x0, y0, x2, y2, x3, y3) = (p[2], p[3], p[6], p[7], p[0], p[1]);
    }

    // Edge lines: (a0, b0) and (a0, b2) are parallel, as are (a1, b1) and (a1, b3).
    let a0 = (y3 - y0) / (x3 - x0);
    let a1 = -1.0 / a0;
    let b0 = y0 - a0 * x0;
    let b1 = y0 - a1 * x0;
    let b2 = y2 - a0 * x2;
    let b3 = y2 - a1 * x2;

    // Crop window diagonals through its top-left and top-right corners.
    let c0 = (crop.center_y() - crop.top) / (crop.center_x() - crop.left);
    let c1 = -c0;
    let d0 = crop.top - c0 * crop.left;
    let d1 = crop.top - c1 * crop.right;

    let left_of_crop = |x: f64| x < crop.right;
    let right_of_crop = |x: f64| x > crop.left;

    for x in [
        (d0 - b0) / (a0 - c0),
        (d0 - b1) / (a1 - c0),
        (d1 - b3) / (a1 - c1),
    ] {
        if left_of_crop(x) {
            left = left.max(x);
        }
    }
    for x in [
        (d1 - b1) / (a1 - c1),
        (d1 - b2) / (a0 - c1),
        (d0 - b2) / (a0 - c0),
    ] {
        if right_of_crop(x) {
            right = right.min(x);
        }
    }

    top = top.max((a0 * left + b0).max(a1 * right + b1));
    bottom = bottom.min((a1 * left + b3).min(a0 * right + b2));

    CalculatedBounds {
        rect: Rect::new(left, top, right, bottom),
        non_straight: true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::AffineTransform2D;

    /// Footprint of a `w` x `h` image rotated about the center of a square view.
    fn rotated_footprint(w: f64, h: f64, view: f64, degrees: f64) -> Quad {
        let mut m = AffineTransform2D::new();
        m.post_translate((view - w) / 2.0, (view - h) / 2.0);
        m.post_rotate(degrees, view / 2.0, view / 2.0);
        m.map_quad(&Quad::from_size(w, h))
    }

    /// Convex containment test with a small tolerance.
    pub(super) fn quad_contains(q: &Quad, x: f64, y: f64) -> bool {
        let p = &q.points;
        let mut sign = 0.0f64;
        for i in 0..4 {
            let (ax, ay) = (p[2 * i], p[2 * i + 1]);
            let (bx, by) = (p[(2 * i + 2) % 8], p[(2 * i + 3) % 8]);
            let len = ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt();
            let cross = ((bx - ax) * (y - ay) - (by - ay) * (x - ax)) / len;
            if cross.abs() < 1e-6 {
                continue;
            }
            if sign == 0.0 {
                sign = cross.signum();
            } else if sign != cross.signum() {
                return false;
            }
        }
        true
    }

    #[test]
    fn test_straight_returns_bounding_box() {
        let q = Quad::from_rect(&Rect::new(10.0, 20.0, 110.0, 220.0));
        let b = calculate_bounds(&q, &Rect::new(30.0, 40.0, 60.0, 80.0));
        assert!(!b.non_straight);
        assert_eq!(b.rect, Rect::new(10.0, 20.0, 110.0, 220.0));
    }

    #[test]
    fn test_quarter_turn_takes_straight_path() {
        let q = rotated_footprint(400.0, 200.0, 1000.0, 90.0);
        let b = calculate_bounds(&q, &Rect::new(450.0, 450.0, 550.0, 550.0));
        assert!(!b.non_straight);
        assert!(b.rect.approx_eq(&Rect::new(400.0, 300.0, 600.0, 700.0), 1e-9));
    }

    #[test]
    fn test_diamond_bounds_are_inscribed() {
        let q = rotated_footprint(500.0, 500.0, 1000.0, 45.0);
        let crop = Rect::new(400.0, 400.0, 600.0, 600.0);
        let b = calculate_bounds(&q, &crop);
        assert!(b.non_straight);

        let bbox = q.bounding_rect();
        assert!(b.rect.width() < bbox.width());
        assert!(b.rect.height() < bbox.height());
        let c = b.rect.corners();
        for i in 0..4 {
            assert!(quad_contains(&q, c[2 * i], c[2 * i + 1]));
        }
    }

    #[test]
    fn test_square_crop_on_diamond_is_centered() {
        // a square crop centered on a diamond touches all four edges at their midpoints
        let q = rotated_footprint(500.0, 500.0, 1000.0, 45.0);
        let b = calculate_bounds(&q, &Rect::new(450.0, 450.0, 550.0, 550.0));
        let side = 250.0 * 2f64.sqrt();
        assert!((b.rect.center_x() - 500.0).abs() < 1e-6);
        assert!((b.rect.center_y() - 500.0).abs() < 1e-6);
        assert!((b.rect.width() - side).abs() < 1e-6);
        assert!((b.rect.height() - side).abs() < 1e-6);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::geometry::AffineTransform2D;
    use proptest::prelude::*;

    fn footprint(w: f64, h: f64, degrees: f64) -> Quad {
        let view = 1000.0;
        let mut m = AffineTransform2D::new();
        m.post_translate((view - w) / 2.0, (view - h) / 2.0);
        m.post_rotate(degrees, view / 2.0, view / 2.0);
        m.map_quad(&Quad::from_size(w, h))
    }

    fn non_straight_angle() -> impl Strategy<Value = f64> {
        (0u32..360).prop_filter("straight", |d| d % 90 != 0).prop_map(f64::from)
    }

    proptest! {
        #[test]
        fn prop_bounds_inside_footprint(
            degrees in non_straight_angle(),
            w in 300.0f64..800.0,
            h in 300.0f64..800.0,
            half_w in 10.0f64..60.0,
            half_h in 10.0f64..60.0,
            dx in -20.0f64..20.0,
            dy in -20.0f64..20.0,
        ) {
            // crop window stays within the footprint's inscribed circle
            let q = footprint(w, h, degrees);
            let crop = Rect::new(
                500.0 + dx - half_w,
                500.0 + dy - half_h,
                500.0 + dx + half_w,
                500.0 + dy + half_h,
            );
            let b = calculate_bounds(&q, &crop);
            prop_assert!(b.non_straight);
            prop_assert!(!b.rect.is_empty());

            let bbox = q.bounding_rect();
            prop_assert!(bbox.contains_rect(&b.rect, 1e-6));
            prop_assert!(b.rect.width() < bbox.width() || b.rect.height() < bbox.height());

            let c = b.rect.corners();
            for i in 0..4 {
                prop_assert!(super::tests::quad_contains(&q, c[2 * i], c[2 * i + 1]));
            }
        }
    }
}
