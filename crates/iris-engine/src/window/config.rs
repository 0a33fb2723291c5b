use thiserror::Error;

use crate::monitor::{CalibrationError, MonitorCalibration};
use crate::paint::Color;
use crate::time::{RefreshParams, TimingError};
use crate::units::UnitSpace;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("window size must be non-zero, got {width}x{height}")]
    ZeroSize { width: u32, height: u32 },

    #[error("invalid refresh measurement parameters")]
    Refresh(#[source] TimingError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),
}

/// Configuration of the stimulus window.
///
/// Defaults:
/// - 800x600 windowed on screen 0, titled "iris"
/// - `norm` units, an uncalibrated monitor named "testMonitor"
/// - swaps wait for vertical blank, refresh rate measured at startup
/// - interval recording off, first 5 dropped frames reported
/// - mid-grey background
#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    /// Physical pixels; ignored when fullscreen.
    pub size: [u32; 2],
    pub fullscreen: bool,
    /// Index into the available monitors, used for fullscreen placement.
    pub screen: usize,

    /// Unit space stimuli use unless they say otherwise.
    pub units: UnitSpace,
    pub monitor: MonitorCalibration,

    /// Present with FIFO (vsync) instead of immediately.
    pub wait_blanking: bool,
    /// Measure the refresh rate on the first frame.
    pub check_timing: bool,
    pub refresh: RefreshParams,
    pub record_frame_intervals: bool,
    pub report_dropped: u32,

    /// Background colour used when clearing.
    pub color: Color,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: "iris".to_string(),
            size: [800, 600],
            fullscreen: false,
            screen: 0,
            units: UnitSpace::Norm,
            monitor: MonitorCalibration::new("testMonitor"),
            wait_blanking: true,
            check_timing: true,
            refresh: RefreshParams::default(),
            record_frame_intervals: false,
            report_dropped: 5,
            color: Color::GREY,
        }
    }
}

impl WindowConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let [width, height] = self.size;
        if width == 0 || height == 0 {
            return Err(ConfigError::ZeroSize { width, height });
        }
        self.refresh.validate().map_err(ConfigError::Refresh)?;
        self.monitor.validate()?;
        Ok(())
    }

    /// Present mode implied by `wait_blanking`.
    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.wait_blanking {
            wgpu::PresentMode::Fifo
        } else {
            wgpu::PresentMode::Immediate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = WindowConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.units, UnitSpace::Norm);
        assert_eq!(cfg.present_mode(), wgpu::PresentMode::Fifo);
    }

    #[test]
    fn rejects_zero_size() {
        let cfg = WindowConfig {
            size: [0, 600],
            ..Default::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::ZeroSize { width: 0, height: 600 })
        ));
    }

    #[test]
    fn rejects_bad_refresh_params() {
        let cfg = WindowConfig {
            refresh: RefreshParams {
                n_identical: 200,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::Refresh(_))));
    }

    #[test]
    fn blanking_off_presents_immediately() {
        let cfg = WindowConfig {
            wait_blanking: false,
            ..Default::default()
        };
        assert_eq!(cfg.present_mode(), wgpu::PresentMode::Immediate);
    }
}
