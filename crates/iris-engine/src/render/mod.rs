//! GPU rendering of stimuli.
//!
//! Convention:
//! - CPU geometry is in physical pixels, origin at the surface centre, +Y up
//!   (the output of the unit registry).
//! - The vertex shader converts to NDC using a viewport uniform.

mod ctx;
mod polygon;

pub use ctx::{RenderCtx, RenderTarget};
pub use polygon::{triangulate_fan, PolygonRenderer, PolygonVertex};
