//! Drag state machine for one crop window gesture.
//!
//! A [`CropWindowMoveHandler`] is created on touch down with the grabbed
//! handle and lives until touch up. Each move resolves the new window from
//! the adjusted pointer position:
//!
//! - `Center` translates the window, with soft resistance at the walls
//! - edges and corners resize, clamped to the size limits and the bounds
//! - with a fixed aspect ratio the primary edge is clamped first and the
//!   secondary edge is derived from it
//!
//! The handler never fails. Out-of-range input is always clamped.

use serde::{Deserialize, Serialize};

use super::CropWindowConstraints;
use crate::geometry::Rect;

/// Damping applied to movement past a wall, roughly 5% resistance.
pub const RESISTANCE_FACTOR: f64 = 1.05;

/// Share of the damped overshoot fed back into the touch offset.
const OVERSHOOT_FEEDBACK: f64 = 1.1;

/// One of the nine drag targets on the crop window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveHandle {
    TopLeft,
    Top,
    TopRight,
    Right,
    BottomRight,
    Bottom,
    BottomLeft,
    Left,
    Center,
}

impl MoveHandle {
    pub const ALL: [MoveHandle; 9] = [
        MoveHandle::TopLeft,
        MoveHandle::Top,
        MoveHandle::TopRight,
        MoveHandle::Right,
        MoveHandle::BottomRight,
        MoveHandle::Bottom,
        MoveHandle::BottomLeft,
        MoveHandle::Left,
        MoveHandle::Center,
    ];

    /// The exact point of the handle on `rect`. Edge handles only fix one axis,
    /// the other coordinate is `None`.
    fn anchor(self, rect: &Rect) -> (Option<f64>, Option<f64>) {
        match self {
            MoveHandle::TopLeft => (Some(rect.left), Some(rect.top)),
            MoveHandle::TopRight => (Some(rect.right), Some(rect.top)),
            MoveHandle::BottomLeft => (Some(rect.left), Some(rect.bottom)),
            MoveHandle::BottomRight => (Some(rect.right), Some(rect.bottom)),
            MoveHandle::Left => (Some(rect.left), None),
            MoveHandle::Right => (Some(rect.right), None),
            MoveHandle::Top => (None, Some(rect.top)),
            MoveHandle::Bottom => (None, Some(rect.bottom)),
            MoveHandle::Center => (Some(rect.center_x()), Some(rect.center_y())),
        }
    }
}

/// Environment of a single move: everything that is not the window itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveLimits {
    /// Rectangle the window must stay inside (image bounds, possibly quadrilateral-derived).
    pub bounds: Rect,
    pub view_width: f64,
    pub view_height: f64,
    /// Magnetic snap distance to the bounds, 0 disables snapping.
    pub snap_margin: f64,
    /// Target width / height, when the aspect ratio is fixed.
    pub aspect_ratio: Option<f64>,
}

/// Which edges follow along when a ratio-locked edge is moved.
#[derive(Debug, Clone, Copy)]
struct Followers {
    first: bool,
    second: bool,
}

const NONE: Followers = Followers {
    first: false,
    second: false,
};
const FIRST: Followers = Followers {
    first: true,
    second: false,
};
const SECOND: Followers = Followers {
    first: false,
    second: true,
};
const BOTH: Followers = Followers {
    first: true,
    second: true,
};

/// Per-gesture crop window mutator.
#[derive(Debug, Clone, PartialEq)]
pub struct CropWindowMoveHandler {
    handle: MoveHandle,
    min_width: f64,
    min_height: f64,
    max_width: f64,
    max_height: f64,
    /// Handle position minus touch position, corrected while resisting.
    touch_offset: (f64, f64),
}

impl CropWindowMoveHandler {
    /// Start a gesture on `handle` with the finger at `(touch_x, touch_y)`.
    ///
    /// Size limits are captured now and stay fixed for the whole gesture.
    pub fn new(
        handle: MoveHandle,
        rect: &Rect,
        constraints: &CropWindowConstraints,
        touch_x: f64,
        touch_y: f64,
    ) -> Self {
        let (ax, ay) = handle.anchor(rect);
        Self {
            handle,
            min_width: constraints.min_crop_width(),
            min_height: constraints.min_crop_height(),
            max_width: constraints.max_crop_width(),
            max_height: constraints.max_crop_height(),
            touch_offset: (
                ax.map_or(0.0, |x| x - touch_x),
                ay.map_or(0.0, |y| y - touch_y),
            ),
        }
    }

    pub fn handle(&self) -> MoveHandle {
        self.handle
    }

    pub fn touch_offset(&self) -> (f64, f64) {
        self.touch_offset
    }

    /// Apply a pointer move to `rect`.
    pub fn move_to(&mut self, rect: &mut Rect, x: f64, y: f64, limits: &MoveLimits) {
        let adj_x = x + self.touch_offset.0;
        let adj_y = y + self.touch_offset.1;

        match (self.handle, limits.aspect_ratio) {
            (MoveHandle::Center, _) => self.move_center(rect, adj_x, adj_y, limits),
            (_, Some(ratio)) if ratio > 0.0 => {
                self.move_with_fixed_ratio(rect, adj_x, adj_y, limits, ratio)
            }
            _ => self.move_with_free_ratio(rect, adj_x, adj_y, limits),
        }
    }

    fn move_center(&mut self, rect: &mut Rect, x: f64, y: f64, limits: &MoveLimits) {
        let bounds = &limits.bounds;
        let mut dx = x - rect.center_x();
        let mut dy = y - rect.center_y();

        if rect.left + dx < 0.0
            || rect.right + dx > limits.view_width
            || rect.left + dx < bounds.left
            || rect.right + dx > bounds.right
        {
            dx /= RESISTANCE_FACTOR;
            self.touch_offset.0 -= dx / 2.0;
        }
        if rect.top + dy < 0.0
            || rect.bottom + dy > limits.view_height
            || rect.top + dy < bounds.top
            || rect.bottom + dy > bounds.bottom
        {
            dy /= RESISTANCE_FACTOR;
            self.touch_offset.1 -= dy / 2.0;
        }

        rect.offset(dx, dy);
        snap_edges_to_bounds(rect, bounds, limits.snap_margin);
    }

    fn move_with_free_ratio(&mut self, rect: &mut Rect, x: f64, y: f64, limits: &MoveLimits) {
        match self.handle {
            MoveHandle::TopLeft => {
                self.adjust_top(rect, y, limits, 0.0, NONE);
                self.adjust_left(rect, x, limits, 0.0, NONE);
            }
            MoveHandle::TopRight => {
                self.adjust_top(rect, y, limits, 0.0, NONE);
                self.adjust_right(rect, x, limits, 0.0, NONE);
            }
            MoveHandle::BottomLeft => {
                self.adjust_bottom(rect, y, limits, 0.0, NONE);
                self.adjust_left(rect, x, limits, 0.0, NONE);
            }
            MoveHandle::BottomRight => {
                self.adjust_bottom(rect, y, limits, 0.0, NONE);
                self.adjust_right(rect, x, limits, 0.0, NONE);
            }
            MoveHandle::Left => self.adjust_left(rect, x, limits, 0.0, NONE),
            MoveHandle::Top => self.adjust_top(rect, y, limits, 0.0, NONE),
            MoveHandle::Right => self.adjust_right(rect, x, limits, 0.0, NONE),
            MoveHandle::Bottom => self.adjust_bottom(rect, y, limits, 0.0, NONE),
            MoveHandle::Center => {}
        }
    }

    /// Corners pick their primary edge by comparing the ratio of the
    /// rectangle spanned by the touch point against the target.
    fn move_with_fixed_ratio(
        &mut self,
        rect: &mut Rect,
        x: f64,
        y: f64,
        limits: &MoveLimits,
        ratio: f64,
    ) {
        match self.handle {
            MoveHandle::TopLeft => {
                if aspect(x, y, rect.right, rect.bottom) < ratio {
                    self.adjust_top(rect, y, limits, ratio, FIRST);
                    rect.left = rect.right - rect.height() * ratio;
                } else {
                    self.adjust_left(rect, x, limits, ratio, FIRST);
                    rect.top = rect.bottom - rect.width() / ratio;
                }
            }
            MoveHandle::TopRight => {
                if aspect(rect.left, y, x, rect.bottom) < ratio {
                    self.adjust_top(rect, y, limits, ratio, SECOND);
                    rect.right = rect.left + rect.height() * ratio;
                } else {
                    self.adjust_right(rect, x, limits, ratio, FIRST);
                    rect.top = rect.bottom - rect.width() / ratio;
                }
            }
            MoveHandle::BottomLeft => {
                if aspect(x, rect.top, rect.right, y) < ratio {
                    self.adjust_bottom(rect, y, limits, ratio, FIRST);
                    rect.left = rect.right - rect.height() * ratio;
                } else {
                    self.adjust_left(rect, x, limits, ratio, SECOND);
                    rect.bottom = rect.top + rect.width() / ratio;
                }
            }
            MoveHandle::BottomRight => {
                if aspect(rect.left, rect.top, x, y) < ratio {
                    self.adjust_bottom(rect, y, limits, ratio, SECOND);
                    rect.right = rect.left + rect.height() * ratio;
                } else {
                    self.adjust_right(rect, x, limits, ratio, SECOND);
                    rect.bottom = rect.top + rect.width() / ratio;
                }
            }
            MoveHandle::Left => {
                self.adjust_left(rect, x, limits, ratio, BOTH);
                fit_height_to_ratio(rect, &limits.bounds, ratio);
            }
            MoveHandle::Top => {
                self.adjust_top(rect, y, limits, ratio, BOTH);
                fit_width_to_ratio(rect, &limits.bounds, ratio);
            }
            MoveHandle::Right => {
                self.adjust_right(rect, x, limits, ratio, BOTH);
                fit_height_to_ratio(rect, &limits.bounds, ratio);
            }
            MoveHandle::Bottom => {
                self.adjust_bottom(rect, y, limits, ratio, BOTH);
                fit_width_to_ratio(rect, &limits.bounds, ratio);
            }
            MoveHandle::Center => {}
        }
    }

    /// Move the left edge. `follow.first` / `follow.second` say whether the
    /// top / bottom edge is derived from this one under a fixed ratio.
    fn adjust_left(
        &mut self,
        rect: &mut Rect,
        left: f64,
        limits: &MoveLimits,
        ratio: f64,
        follow: Followers,
    ) {
        let bounds = &limits.bounds;
        let snap = limits.snap_margin;
        let mut new_left = left;

        if new_left < 0.0 {
            new_left /= RESISTANCE_FACTOR;
            self.touch_offset.0 -= new_left / OVERSHOOT_FEEDBACK;
        }
        if new_left < bounds.left {
            self.touch_offset.0 -= (new_left - bounds.left) / 2.0;
        }
        if new_left - bounds.left < snap {
            new_left = bounds.left;
        }

        if rect.right - new_left < self.min_width {
            new_left = rect.right - self.min_width;
        }
        if rect.right - new_left > self.max_width {
            new_left = rect.right - self.max_width;
        }
        if new_left - bounds.left < snap && rect.right - bounds.left <= self.max_width {
            new_left = bounds.left;
        }

        if ratio > 0.0 {
            let mut new_height = (rect.right - new_left) / ratio;

            if new_height < self.min_height {
                new_left = bounds.left.max(rect.right - self.min_height * ratio);
                new_height = (rect.right - new_left) / ratio;
            }
            if new_height > self.max_height {
                new_left = bounds.left.max(rect.right - self.max_height * ratio);
                new_height = (rect.right - new_left) / ratio;
            }

            if follow.first && follow.second {
                new_left = new_left.max(bounds.left.max(rect.right - bounds.height() * ratio));
            } else {
                if follow.first && rect.bottom - new_height < bounds.top {
                    new_left = bounds.left.max(rect.right - (rect.bottom - bounds.top) * ratio);
                    new_height = (rect.right - new_left) / ratio;
                }
                if follow.second && rect.top + new_height > bounds.bottom {
                    new_left = new_left
                        .max(bounds.left.max(rect.right - (bounds.bottom - rect.top) * ratio));
                }
            }
        }

        rect.left = new_left;
    }

    fn adjust_right(
        &mut self,
        rect: &mut Rect,
        right: f64,
        limits: &MoveLimits,
        ratio: f64,
        follow: Followers,
    ) {
        let bounds = &limits.bounds;
        let snap = limits.snap_margin;
        let view_width = limits.view_width;
        let mut new_right = right;

        if new_right > view_width {
            new_right = view_width + (new_right - view_width) / RESISTANCE_FACTOR;
            self.touch_offset.0 -= (new_right - view_width) / OVERSHOOT_FEEDBACK;
        }
        if new_right > bounds.right {
            self.touch_offset.0 -= (new_right - bounds.right) / 2.0;
        }
        if bounds.right - new_right < snap {
            new_right = bounds.right;
        }

        if new_right - rect.left < self.min_width {
            new_right = rect.left + self.min_width;
        }
        if new_right - rect.left > self.max_width {
            new_right = rect.left + self.max_width;
        }
        if bounds.right - new_right < snap && bounds.right - rect.left <= self.max_width {
            new_right = bounds.right;
        }

        if ratio > 0.0 {
            let mut new_height = (new_right - rect.left) / ratio;

            if new_height < self.min_height {
                new_right = bounds.right.min(rect.left + self.min_height * ratio);
                new_height = (new_right - rect.left) / ratio;
            }
            if new_height > self.max_height {
                new_right = bounds.right.min(rect.left + self.max_height * ratio);
                new_height = (new_right - rect.left) / ratio;
            }

            if follow.first && follow.second {
                new_right = new_right.min(bounds.right.min(rect.left + bounds.height() * ratio));
            } else {
                if follow.first && rect.bottom - new_height < bounds.top {
                    new_right = bounds.right.min(rect.left + (rect.bottom - bounds.top) * ratio);
                    new_height = (new_right - rect.left) / ratio;
                }
                if follow.second && rect.top + new_height > bounds.bottom {
                    new_right = new_right
                        .min(bounds.right.min(rect.left + (bounds.bottom - rect.top) * ratio));
                }
            }
        }

        rect.right = new_right;
    }

    /// Move the top edge. `follow.first` / `follow.second` say whether the
    /// left / right edge is derived from this one under a fixed ratio.
    fn adjust_top(
        &mut self,
        rect: &mut Rect,
        top: f64,
        limits: &MoveLimits,
        ratio: f64,
        follow: Followers,
    ) {
        let bounds = &limits.bounds;
        let snap = limits.snap_margin;
        let mut new_top = top;

        if new_top < 0.0 {
            new_top /= RESISTANCE_FACTOR;
            self.touch_offset.1 -= new_top / OVERSHOOT_FEEDBACK;
        }
        if new_top < bounds.top {
            self.touch_offset.1 -= (new_top - bounds.top) / 2.0;
        }
        if new_top - bounds.top < snap {
            new_top = bounds.top;
        }

        if rect.bottom - new_top < self.min_height {
            new_top = rect.bottom - self.min_height;
        }
        if rect.bottom - new_top > self.max_height {
            new_top = rect.bottom - self.max_height;
        }
        if new_top - bounds.top < snap && rect.bottom - bounds.top <= self.max_height {
            new_top = bounds.top;
        }

        if ratio > 0.0 {
            let mut new_width = (rect.bottom - new_top) * ratio;

            if new_width < self.min_width {
                new_top = bounds.top.max(rect.bottom - self.min_width / ratio);
                new_width = (rect.bottom - new_top) * ratio;
            }
            if new_width > self.max_width {
                new_top = bounds.top.max(rect.bottom - self.max_width / ratio);
                new_width = (rect.bottom - new_top) * ratio;
            }

            if follow.first && follow.second {
                new_top = new_top.max(bounds.top.max(rect.bottom - bounds.width() / ratio));
            } else {
                if follow.first && rect.right - new_width < bounds.left {
                    new_top = bounds.top.max(rect.bottom - (rect.right - bounds.left) / ratio);
                    new_width = (rect.bottom - new_top) * ratio;
                }
                if follow.second && rect.left + new_width > bounds.right {
                    new_top = new_top
                        .max(bounds.top.max(rect.bottom - (bounds.right - rect.left) / ratio));
                }
            }
        }

        rect.top = new_top;
    }

    fn adjust_bottom(
        &mut self,
        rect: &mut Rect,
        bottom: f64,
        limits: &MoveLimits,
        ratio: f64,
        follow: Followers,
    ) {
        let bounds = &limits.bounds;
        let snap = limits.snap_margin;
        let view_height = limits.view_height;
        let mut new_bottom = bottom;

        if new_bottom > view_height {
            new_bottom = view_height + (new_bottom - view_height) / RESISTANCE_FACTOR;
            self.touch_offset.1 -= (new_bottom - view_height) / OVERSHOOT_FEEDBACK;
        }
        if new_bottom > bounds.bottom {
            self.touch_offset.1 -= (new_bottom - bounds.bottom) / 2.0;
        }
        if bounds.bottom - new_bottom < snap {
            new_bottom = bounds.bottom;
        }

        if new_bottom - rect.top < self.min_height {
            new_bottom = rect.top + self.min_height;
        }
        if new_bottom - rect.top > self.max_height {
            new_bottom = rect.top + self.max_height;
        }
        if bounds.bottom - new_bottom < snap && bounds.bottom - rect.top <= self.max_height {
            new_bottom = bounds.bottom;
        }

        if ratio > 0.0 {
            let mut new_width = (new_bottom - rect.top) * ratio;

            if new_width < self.min_width {
                new_bottom = bounds.bottom.min(rect.top + self.min_width / ratio);
                new_width = (new_bottom - rect.top) * ratio;
            }
            if new_width > self.max_width {
                new_bottom = bounds.bottom.min(rect.top + self.max_width / ratio);
                new_width = (new_bottom - rect.top) * ratio;
            }

            if follow.first && follow.second {
                new_bottom = new_bottom.min(bounds.bottom.min(rect.top + bounds.width() / ratio));
            } else {
                if follow.first && rect.right - new_width < bounds.left {
                    new_bottom = bounds.bottom.min(rect.top + (rect.right - bounds.left) / ratio);
                    new_width = (new_bottom - rect.top) * ratio;
                }
                if follow.second && rect.left + new_width > bounds.right {
                    new_bottom = new_bottom
                        .min(bounds.bottom.min(rect.top + (bounds.right - rect.left) / ratio));
                }
            }
        }

        rect.bottom = new_bottom;
    }
}

#[inline]
fn aspect(left: f64, top: f64, right: f64, bottom: f64) -> f64 {
    (right - left) / (bottom - top)
}

/// Pull edges within `margin` of the bounds onto the bounds by translating.
fn snap_edges_to_bounds(rect: &mut Rect, bounds: &Rect, margin: f64) {
    if rect.left < bounds.left + margin {
        rect.offset(bounds.left - rect.left, 0.0);
    }
    if rect.top < bounds.top + margin {
        rect.offset(0.0, bounds.top - rect.top);
    }
    if rect.right > bounds.right - margin {
        rect.offset(bounds.right - rect.right, 0.0);
    }
    if rect.bottom > bounds.bottom - margin {
        rect.offset(0.0, bounds.bottom - rect.bottom);
    }
}

/// Recenter the width on the ratio implied by the height, then shift back inside the bounds.
fn fit_width_to_ratio(rect: &mut Rect, bounds: &Rect, ratio: f64) {
    rect.inset((rect.width() - rect.height() * ratio) / 2.0, 0.0);
    if rect.left < bounds.left {
        rect.offset(bounds.left - rect.left, 0.0);
    }
    if rect.right > bounds.right {
        rect.offset(bounds.right - rect.right, 0.0);
    }
}

/// Recenter the height on the ratio implied by the width, then shift back inside the bounds.
fn fit_height_to_ratio(rect: &mut Rect, bounds: &Rect, ratio: f64) {
    rect.inset(0.0, (rect.height() - rect.width() / ratio) / 2.0);
    if rect.top < bounds.top {
        rect.offset(0.0, bounds.top - rect.top);
    }
    if rect.bottom > bounds.bottom {
        rect.offset(0.0, bounds.bottom - rect.bottom);
    }
}
