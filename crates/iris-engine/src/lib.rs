//! Iris engine crate.
//!
//! Stimulus-presentation core for visual psychophysics: unit conversion
//! between pixels, centimetres, degrees of visual angle and window-relative
//! units, plus display frame timing (refresh-rate measurement, dropped-frame
//! detection). The window/GPU runtime presents stimuli placed through those
//! conversions.

pub mod coords;
pub mod monitor;
pub mod units;
pub mod stim;
pub mod time;

pub mod core;
pub mod device;
pub mod logging;
pub mod paint;
pub mod render;
pub mod window;
