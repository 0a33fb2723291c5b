//! Unit spaces and their conversion to pixels.
//!
//! Stimuli are authored in one of several unit spaces (pixels, centimetres,
//! degrees of visual angle, window-relative units). Before drawing, vertices
//! and position are mapped to absolute pixels through a [`UnitRegistry`]:
//! built-in spaces dispatch statically, custom spaces through registered
//! [`UnitConverter`] strategies.
//!
//! The standalone functions in [`convert`] expose the physical conversions
//! (cm/deg/pix in both directions) for analysis code.

pub mod convert;
mod error;
mod registry;
mod space;

pub use error::UnitError;
pub use registry::{UnitConverter, UnitRegistry};
pub use space::UnitSpace;
