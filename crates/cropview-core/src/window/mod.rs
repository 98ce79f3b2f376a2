//! The crop window: size limits, hit testing, drag handling and overlay state.
//!
//! # Flow
//!
//! A touch down goes through [`HitTester`] to pick a [`MoveHandle`], which
//! starts a [`CropWindowMoveHandler`]. Every move mutates the window inside
//! the limits of [`CropWindowConstraints`] and the bounds derived from the
//! image footprint. [`CropOverlay`] owns all of that state.

mod constraints;
pub mod decorations;
mod hit;
mod move_handler;
mod overlay;

pub use constraints::CropWindowConstraints;
pub use decorations::{BackgroundRegions, LineSegment, OverlayStyle};
pub use hit::{is_large_window, HitTester, GUIDELINES_MIN_SIZE};
pub use move_handler::{CropWindowMoveHandler, MoveHandle, MoveLimits, RESISTANCE_FACTOR};
pub use overlay::CropOverlay;
