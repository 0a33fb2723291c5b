//! Headless presentation loop: stimuli placed through the unit registry,
//! swaps timed on a scripted surface.

use std::time::Duration;

use ndarray::{Array2, ArrayView2};

use iris_engine::coords::{SurfaceSize, Vec2};
use iris_engine::monitor::MonitorCalibration;
use iris_engine::stim::StimTransform;
use iris_engine::time::sim::ScriptedSurface;
use iris_engine::time::{RefreshParams, RefreshRateEstimate, TimedSurface};
use iris_engine::units::{convert, UnitError, UnitRegistry, UnitSpace};

const SURFACE: SurfaceSize = SurfaceSize::new(1024.0, 768.0);

fn monitor() -> MonitorCalibration {
    MonitorCalibration::new("lab")
        .with_width_cm(40.0)
        .and_then(|m| m.with_distance_cm(57.0))
        .and_then(|m| m.with_size_pix([1024, 768]))
        .unwrap()
}

fn polar(
    vertices: ArrayView2<'_, f64>,
    pos: Vec2,
    monitor: &MonitorCalibration,
    _surface: SurfaceSize,
) -> Result<Array2<f64>, UnitError> {
    let (sin, cos) = pos.y.to_radians().sin_cos();
    let centre = Vec2::new(pos.x * cos, pos.x * sin).to_array();
    convert::deg_to_pix(&(&vertices + &centre), monitor, false)
}

#[test]
fn calibrated_loop_places_stimuli_and_counts_drops() {
    let mut registry = UnitRegistry::new();
    registry.register_fn("polar", polar).unwrap();
    let mon = monitor();

    // 100 Hz display with one late frame after calibration.
    let mut display = ScriptedSurface::steady(Duration::from_millis(10));
    display.extend_ms(std::iter::repeat(10.0).take(20));
    display.extend_ms([10.0, 10.0, 35.0, 10.0]);
    let mut surface = TimedSurface::new(display);

    let estimate = surface.calibrate(RefreshParams::default()).unwrap();
    assert!((estimate.hz().unwrap() - 100.0).abs() < 0.5);
    surface.set_recording(true);

    let mut deg = StimTransform::rect(UnitSpace::Deg).with_pos([2.0, 0.0]);
    let mut via_polar = StimTransform::rect(UnitSpace::Custom("polar".into())).with_pos([2.0, 0.0]);

    for _ in 0..5 {
        let a = deg.vertices_pix(&registry, &mon, SURFACE).unwrap().clone();
        let b = via_polar.vertices_pix(&registry, &mon, SURFACE).unwrap();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9);
        }
        surface.flip().unwrap();
    }

    // Grace swap plus four recorded intervals, one of them late.
    assert_eq!(surface.timer().intervals().len(), 4);
    assert_eq!(surface.timer().dropped_frames(), 1);
}

#[test]
fn uncooperative_display_degrades_to_assumed_rate() {
    let jitter = (0..300).map(|i| 5.0 + (i * 7 % 16) as f64);
    let mut surface = TimedSurface::new(ScriptedSurface::from_ms(jitter, 12.0));

    let estimate = surface.calibrate(RefreshParams::default()).unwrap();
    assert_eq!(estimate, RefreshRateEstimate::Unmeasurable);
    assert_eq!(surface.monitor_frame_period(), Duration::ZERO);

    // Dropped-frame detection still works against 60 Hz.
    let threshold = surface.timer().refresh_threshold().as_secs_f64();
    assert!((threshold - 1.2 / 60.0).abs() < 1e-9);
}

#[test]
fn missing_calibration_fails_only_the_affected_stimulus() {
    let registry = UnitRegistry::new();
    let bare = MonitorCalibration::new("bare");

    let mut in_deg = StimTransform::rect(UnitSpace::Deg);
    let mut in_norm = StimTransform::rect(UnitSpace::Norm).with_size([0.5, 0.5]);

    assert!(matches!(
        in_deg.vertices_pix(&registry, &bare, SURFACE),
        Err(UnitError::CalibrationMissing { .. })
    ));
    let norm = in_norm.vertices_pix(&registry, &bare, SURFACE).unwrap();
    assert!((norm[[2, 0]] - 128.0).abs() < 1e-9);
    assert!((norm[[2, 1]] - 96.0).abs() < 1e-9);
}
