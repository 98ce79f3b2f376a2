//! Plane geometry primitives shared by the crop window and the view engine.
//!
//! # Coordinate System
//!
//! - Origin is the top-left corner, x grows right, y grows down
//! - View-space values are in view pixels, image-space values are in bitmap pixels
//! - Rotation angles are in degrees, positive = clockwise on screen
//!
//! # Quadrilateral Corner Order
//!
//! A [`Quad`] always stores its corners as top-left, top-right, bottom-right,
//! bottom-left of the *unrotated* shape, so after a rotation the order follows
//! the image content rather than the screen.

mod bounds;
mod matrix;

pub use bounds::{calculate_bounds, CalculatedBounds};
pub use matrix::{AffineTransform2D, TransformError};

use serde::{Deserialize, Serialize};

/// Tolerance used to decide that two coordinates of a quadrilateral are aligned.
pub const ALIGNMENT_EPSILON: f64 = 1e-4;

/// Axis-aligned rectangle with floating point edges.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Rect {
    /// The empty rectangle at the origin.
    pub const EMPTY: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Build a rectangle from an origin and a size.
    pub fn from_size(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self::new(left, top, left + width, top + height)
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    #[inline]
    pub fn center_x(&self) -> f64 {
        (self.left + self.right) / 2.0
    }

    #[inline]
    pub fn center_y(&self) -> f64 {
        (self.top + self.bottom) / 2.0
    }

    /// True when the rectangle has no area.
    pub fn is_empty(&self) -> bool {
        !(self.left < self.right && self.top < self.bottom)
    }

    /// Move the rectangle by `(dx, dy)`.
    pub fn offset(&mut self, dx: f64, dy: f64) {
        self.left += dx;
        self.right += dx;
        self.top += dy;
        self.bottom += dy;
    }

    /// Shrink the rectangle by `dx` on the left and right and `dy` on the top and bottom.
    ///
    /// Negative values grow the rectangle.
    pub fn inset(&mut self, dx: f64, dy: f64) {
        self.left += dx;
        self.right -= dx;
        self.top += dy;
        self.bottom -= dy;
    }

    /// Copy of this rectangle shrunk by `(dx, dy)`.
    pub fn inset_by(&self, dx: f64, dy: f64) -> Rect {
        let mut r = *self;
        r.inset(dx, dy);
        r
    }

    /// Strict containment test, points on an edge are outside.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x > self.left && x < self.right && y > self.top && y < self.bottom
    }

    /// True if `other` lies inside this rectangle, edges included.
    pub fn contains_rect(&self, other: &Rect, epsilon: f64) -> bool {
        other.left >= self.left - epsilon
            && other.top >= self.top - epsilon
            && other.right <= self.right + epsilon
            && other.bottom <= self.bottom + epsilon
    }

    /// Rectangle with the edges swapped where needed so `right >= left` and `bottom >= top`.
    pub fn sorted(&self) -> Rect {
        Rect::new(
            self.left.min(self.right),
            self.top.min(self.bottom),
            self.left.max(self.right),
            self.top.max(self.bottom),
        )
    }

    /// Corners in top-left, top-right, bottom-right, bottom-left order.
    pub fn corners(&self) -> [f64; 8] {
        [
            self.left,
            self.top,
            self.right,
            self.top,
            self.right,
            self.bottom,
            self.left,
            self.bottom,
        ]
    }

    /// Edges as `[left, top, right, bottom]`.
    pub fn to_array(&self) -> [f64; 4] {
        [self.left, self.top, self.right, self.bottom]
    }

    /// Compare two rectangles edge by edge with an absolute tolerance.
    pub fn approx_eq(&self, other: &Rect, epsilon: f64) -> bool {
        (self.left - other.left).abs() <= epsilon
            && (self.top - other.top).abs() <= epsilon
            && (self.right - other.right).abs() <= epsilon
            && (self.bottom - other.bottom).abs() <= epsilon
    }
}

/// Four corner points stored as 8 floats `[x0, y0, x1, y1, x2, y2, x3, y3]`.
///
/// Used for the image footprint in view space and for crop regions in source
/// space. The axis-aligned helpers return the enclosing bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Quad {
    pub points: [f64; 8],
}

impl Quad {
    pub const fn new(points: [f64; 8]) -> Self {
        Self { points }
    }

    /// Corners of `rect` as a quadrilateral.
    pub fn from_rect(rect: &Rect) -> Self {
        Self::new(rect.corners())
    }

    /// Corners of a `width` x `height` image placed at the origin.
    pub fn from_size(width: f64, height: f64) -> Self {
        Self::from_rect(&Rect::new(0.0, 0.0, width, height))
    }

    pub fn left(&self) -> f64 {
        self.xs().fold(f64::INFINITY, f64::min)
    }

    pub fn top(&self) -> f64 {
        self.ys().fold(f64::INFINITY, f64::min)
    }

    pub fn right(&self) -> f64 {
        self.xs().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn bottom(&self) -> f64 {
        self.ys().fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn width(&self) -> f64 {
        self.right() - self.left()
    }

    pub fn height(&self) -> f64 {
        self.bottom() - self.top()
    }

    pub fn center_x(&self) -> f64 {
        (self.right() + self.left()) / 2.0
    }

    pub fn center_y(&self) -> f64 {
        (self.bottom() + self.top()) / 2.0
    }

    /// Axis-aligned bounding box of the four corners.
    pub fn bounding_rect(&self) -> Rect {
        Rect::new(self.left(), self.top(), self.right(), self.bottom())
    }

    /// True when the quadrilateral is rotated by an angle that is not a
    /// multiple of 90 degrees.
    ///
    /// At a straight angle the first and last corners share either their x
    /// or their y coordinate, so only 4 of the 8 values are distinct.
    pub fn is_non_straight(&self) -> bool {
        let p = &self.points;
        (p[0] - p[6]).abs() > ALIGNMENT_EPSILON && (p[1] - p[7]).abs() > ALIGNMENT_EPSILON
    }

    /// Scale every coordinate by `factor`.
    pub fn scaled(&self, factor: f64) -> Quad {
        let mut points = self.points;
        for v in points.iter_mut() {
            *v *= factor;
        }
        Quad::new(points)
    }

    fn xs(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().step_by(2).copied()
    }

    fn ys(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().skip(1).step_by(2).copied()
    }
}

/// Integer rectangle in source image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl PixelRect {
    pub const fn new(left: u32, top: u32, right: u32, bottom: u32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn width(&self) -> u32 {
        self.right.saturating_sub(self.left)
    }

    pub fn height(&self) -> u32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Rounded bounding box of `points`, clamped to a `width` x `height` image.
    ///
    /// With a fixed 1:1 ratio the longer side is trimmed so the result is a
    /// true square despite rounding.
    pub fn from_points(
        points: &Quad,
        width: u32,
        height: u32,
        fix_aspect_ratio: bool,
        aspect_ratio_x: u32,
        aspect_ratio_y: u32,
    ) -> Self {
        let round = |v: f64| v.round().max(0.0) as u32;
        let mut rect = Self::new(
            round(points.left().max(0.0)),
            round(points.top().max(0.0)),
            round(points.right().min(f64::from(width))),
            round(points.bottom().min(f64::from(height))),
        );
        rect.right = rect.right.max(rect.left);
        rect.bottom = rect.bottom.max(rect.top);

        if fix_aspect_ratio && aspect_ratio_x == aspect_ratio_y && rect.width() != rect.height() {
            if rect.height() > rect.width() {
                rect.bottom -= rect.height() - rect.width();
            } else {
                rect.right -= rect.width() - rect.height();
            }
        }
        rect
    }
}
