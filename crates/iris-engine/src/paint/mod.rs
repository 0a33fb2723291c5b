//! Colors for the stimulus renderer.

mod color;

pub use color::Color;
