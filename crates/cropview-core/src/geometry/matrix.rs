//! 2D affine transform with post-multiplied composition.
//!
//! The matrix is stored row-major as a 3x3 homogeneous matrix:
//!
//! ```text
//! | m[0] m[1] m[2] |     x' = m[0]*x + m[1]*y + m[2]
//! | m[3] m[4] m[5] |     y' = m[3]*x + m[4]*y + m[5]
//! |  0    0    1   |
//! ```
//!
//! Every `post_*` operation applies *after* the transform already composed,
//! so a sequence of calls reads in the order the point travels.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Quad, Rect};

/// Determinants with a smaller magnitude are treated as singular.
const DEGENERATE_EPSILON: f64 = 1e-12;

/// Errors raised by transform operations.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum TransformError {
    /// The matrix collapses the plane (zero or near-zero scale) and has no inverse.
    #[error("Degenerate transform: determinant {determinant} is not invertible")]
    Degenerate { determinant: f64 },
}

/// 2D affine transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform2D {
    m: [f64; 9],
}

impl Default for AffineTransform2D {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl AffineTransform2D {
    pub const IDENTITY: AffineTransform2D = AffineTransform2D {
        m: [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
    };

    pub fn new() -> Self {
        Self::IDENTITY
    }

    /// Build a transform from the six affine coefficients `[sx, kx, tx, ky, sy, ty]`.
    pub fn from_affine(values: [f64; 6]) -> Self {
        let [sx, kx, tx, ky, sy, ty] = values;
        Self {
            m: [sx, kx, tx, ky, sy, ty, 0.0, 0.0, 1.0],
        }
    }

    /// Reset to the identity transform.
    pub fn reset(&mut self) {
        *self = Self::IDENTITY;
    }

    /// The 9 matrix values, row-major.
    pub fn values(&self) -> [f64; 9] {
        self.m
    }

    /// Coefficients in canvas `setTransform(a, b, c, d, e, f)` order.
    pub fn to_canvas(&self) -> [f64; 6] {
        [self.m[0], self.m[3], self.m[1], self.m[4], self.m[2], self.m[5]]
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    pub fn determinant(&self) -> f64 {
        self.m[0] * self.m[4] - self.m[1] * self.m[3]
    }

    /// Compose `other` after this transform (`self = other * self`).
    pub fn post_concat(&mut self, other: &AffineTransform2D) {
        self.m = multiply(&other.m, &self.m);
    }

    pub fn post_translate(&mut self, dx: f64, dy: f64) {
        self.m[2] += dx;
        self.m[5] += dy;
    }

    /// Rotate by `degrees` clockwise about the pivot `(px, py)`.
    ///
    /// Quarter turns use exact sine and cosine values so straight rotations
    /// keep axis-aligned edges exactly aligned.
    pub fn post_rotate(&mut self, degrees: f64, px: f64, py: f64) {
        let (sin, cos) = sin_cos_degrees(degrees);
        let op = AffineTransform2D::from_affine([
            cos,
            -sin,
            px - cos * px + sin * py,
            sin,
            cos,
            py - sin * px - cos * py,
        ]);
        self.post_concat(&op);
    }

    /// Scale by `(sx, sy)` about the pivot `(px, py)`.
    pub fn post_scale(&mut self, sx: f64, sy: f64, px: f64, py: f64) {
        let op = AffineTransform2D::from_affine([sx, 0.0, px - sx * px, 0.0, sy, py - sy * py]);
        self.post_concat(&op);
    }

    /// Compute the inverse transform.
    ///
    /// # Errors
    ///
    /// Returns `TransformError::Degenerate` when the determinant is ~0.
    pub fn invert(&self) -> Result<AffineTransform2D, TransformError> {
        let det = self.determinant();
        if det.abs() < DEGENERATE_EPSILON || !det.is_finite() {
            return Err(TransformError::Degenerate { determinant: det });
        }
        let [a, b, c, d, e, f, ..] = self.m;
        let inv = 1.0 / det;
        Ok(AffineTransform2D::from_affine([
            e * inv,
            -b * inv,
            (b * f - e * c) * inv,
            -d * inv,
            a * inv,
            (d * c - a * f) * inv,
        ]))
    }

    #[inline]
    pub fn map_point(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.m[0] * x + self.m[1] * y + self.m[2],
            self.m[3] * x + self.m[4] * y + self.m[5],
        )
    }

    /// Transform a flat `[x0, y0, x1, y1, ...]` sequence in place.
    ///
    /// A trailing odd value is left untouched.
    pub fn map_points(&self, points: &mut [f64]) {
        for pair in points.chunks_exact_mut(2) {
            let (x, y) = self.map_point(pair[0], pair[1]);
            pair[0] = x;
            pair[1] = y;
        }
    }

    pub fn map_quad(&self, quad: &Quad) -> Quad {
        let mut points = quad.points;
        self.map_points(&mut points);
        Quad::new(points)
    }

    /// Map the four corners of `rect` and return their enclosing box.
    pub fn map_rect(&self, rect: &Rect) -> Rect {
        self.map_quad(&Quad::from_rect(rect)).bounding_rect()
    }
}

fn multiply(a: &[f64; 9], b: &[f64; 9]) -> [f64; 9] {
    let mut out = [0.0; 9];
    for row in 0..3 {
        for col in 0..3 {
            out[row * 3 + col] = (0..3).map(|k| a[row * 3 + k] * b[k * 3 + col]).sum();
        }
    }
    out
}

/// Sine and cosine of an angle in degrees, exact at multiples of 90.
fn sin_cos_degrees(degrees: f64) -> (f64, f64) {
    let normalized = degrees.rem_euclid(360.0);
    if normalized == 0.0 {
        (0.0, 1.0)
    } else if normalized == 90.0 {
        (1.0, 0.0)
    } else if normalized == 180.0 {
        (0.0, -1.0)
    } else if normalized == 270.0 {
        (-1.0, 0.0)
    } else {
        normalized.to_radians().sin_cos()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: (f64, f64), b: (f64, f64)) {
        assert!(
            (a.0 - b.0).abs() < 1e-9 && (a.1 - b.1).abs() < 1e-9,
            "{:?} != {:?}",
            a,
            b
        );
    }

    #[test]
    fn test_identity_maps_to_self() {
        let m = AffineTransform2D::new();
        assert!(m.is_identity());
        assert_eq!(m.map_point(3.0, -4.0), (3.0, -4.0));
    }

    #[test]
    fn test_post_translate() {
        let mut m = AffineTransform2D::new();
        m.post_translate(5.0, -2.0);
        assert_eq!(m.map_point(10.0, 5.0), (15.0, 3.0));
    }

    #[test]
    fn test_post_rotate_quarter_turn_is_exact() {
        let mut m = AffineTransform2D::new();
        m.post_rotate(90.0, 0.0, 0.0);
        // Clockwise on screen: +x axis turns into +y axis
        assert_eq!(m.map_point(1.0, 0.0), (0.0, 1.0));
        assert_eq!(m.map_point(0.0, 1.0), (-1.0, 0.0));
    }

    #[test]
    fn test_post_rotate_about_pivot() {
        let mut m = AffineTransform2D::new();
        m.post_rotate(180.0, 50.0, 50.0);
        assert_eq!(m.map_point(0.0, 0.0), (100.0, 100.0));
    }

    #[test]
    fn test_post_scale_about_pivot() {
        let mut m = AffineTransform2D::new();
        m.post_scale(2.0, 3.0, 10.0, 10.0);
        assert_eq!(m.map_point(10.0, 10.0), (10.0, 10.0));
        assert_eq!(m.map_point(11.0, 11.0), (12.0, 13.0));
    }

    #[test]
    fn test_composition_order() {
        // translate first, then scale about the origin
        let mut m = AffineTransform2D::new();
        m.post_translate(1.0, 0.0);
        m.post_scale(2.0, 2.0, 0.0, 0.0);
        assert_eq!(m.map_point(0.0, 0.0), (2.0, 0.0));
    }

    #[test]
    fn test_invert_roundtrip() {
        let mut m = AffineTransform2D::new();
        m.post_translate(12.0, -7.0);
        m.post_rotate(33.0, 40.0, 20.0);
        m.post_scale(-1.5, 2.5, 3.0, 4.0);
        let inv = m.invert().unwrap();
        let (x, y) = m.map_point(17.0, 23.0);
        assert_close(inv.map_point(x, y), (17.0, 23.0));
    }

    #[test]
    fn test_invert_degenerate() {
        let mut m = AffineTransform2D::new();
        m.post_scale(0.0, 1.0, 0.0, 0.0);
        assert!(matches!(
            m.invert(),
            Err(TransformError::Degenerate { .. })
        ));
    }

    #[test]
    fn test_map_rect_returns_enclosing_box() {
        let mut m = AffineTransform2D::new();
        m.post_rotate(45.0, 0.0, 0.0);
        let r = m.map_rect(&Rect::new(0.0, 0.0, 10.0, 10.0));
        let half_diag = 10.0 / 2f64.sqrt();
        assert!((r.left + half_diag).abs() < 1e-9);
        assert!((r.right - half_diag).abs() < 1e-9);
        assert!(r.top.abs() < 1e-9);
        assert!((r.bottom - 2.0 * half_diag).abs() < 1e-9);
    }

    #[test]
    fn test_map_points_ignores_trailing_value() {
        let mut m = AffineTransform2D::new();
        m.post_translate(1.0, 1.0);
        let mut pts = [0.0, 0.0, 5.0];
        m.map_points(&mut pts);
        assert_eq!(pts, [1.0, 1.0, 5.0]);
    }

    #[test]
    fn test_to_canvas_order() {
        let m = AffineTransform2D::from_affine([1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(m.to_canvas(), [1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_inverse_undoes_transform(
            deg in 0.0f64..360.0,
            zoom in 0.1f64..8.0,
            tx in -500.0f64..500.0,
            ty in -500.0f64..500.0,
            x in -1000.0f64..1000.0,
            y in -1000.0f64..1000.0,
        ) {
            let mut m = AffineTransform2D::new();
            m.post_translate(tx, ty);
            m.post_rotate(deg, 100.0, 50.0);
            m.post_scale(zoom, -zoom, 20.0, 30.0);
            let inv = m.invert().unwrap();
            let (mx, my) = m.map_point(x, y);
            let (bx, by) = inv.map_point(mx, my);
            prop_assert!((bx - x).abs() < 1e-6);
            prop_assert!((by - y).abs() < 1e-6);
        }
    }
}
