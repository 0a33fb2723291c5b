//! Physical monitor model.
//!
//! A `MonitorCalibration` describes one physical display: its visible width,
//! the viewing distance of the observer and its pixel resolution. Every
//! physical-unit conversion reads from it; nothing in the engine guesses a
//! missing value.

mod calibration;

pub use calibration::{CalibrationError, CalibrationField, MonitorCalibration, DEG_TAN};
