//! Coordinate types shared by the unit converters, stimuli and renderer.
//!
//! Canonical pixel space:
//! - Physical pixels of the drawable surface
//! - Origin at the surface centre
//! - +X right, +Y up
//!
//! The renderer converts to NDC in its vertex shader using the surface size.

mod size;
mod vec2;

pub use size::SurfaceSize;
pub use vec2::Vec2;
