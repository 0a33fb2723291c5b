//! Stimulus geometry.
//!
//! A stimulus is described by base vertices in its own unit space plus a
//! position, size, orientation and flips. [`StimTransform`] applies those and
//! hands the result to the unit registry to obtain pixel vertices.

mod shapes;
mod transform;

pub use shapes::{point_in_polygon, rect_vertices, regular_polygon};
pub use transform::{size_from_pixels, StimTransform};
