//! Iris studio: a small demonstration experiment.
//!
//! Opens the stimulus window, measures the refresh rate, then shows a fixation
//! point, a rotating target placed in flat-corrected degrees and a marker in a
//! custom polar unit space. Escape ends the run early; frame intervals are
//! saved to `lastFrameIntervals.log` on exit.
//!
//! Environment:
//! - `IRIS_MONITOR`: path to a monitor calibration JSON file
//! - `IRIS_FRAMES`: number of frames to present (default 600)

use std::path::Path;

use anyhow::{Context, Result};
use ndarray::{Array2, ArrayView2};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

use iris_engine::coords::{SurfaceSize, Vec2};
use iris_engine::core::{AppControl, Experiment, FrameCtx};
use iris_engine::device::GpuInit;
use iris_engine::logging::{init_logging, LoggingConfig};
use iris_engine::monitor::MonitorCalibration;
use iris_engine::paint::Color;
use iris_engine::stim::StimTransform;
use iris_engine::units::{convert, UnitError, UnitRegistry, UnitSpace};
use iris_engine::window::{Runtime, WindowConfig};

const DEFAULT_FRAMES: u64 = 600;

/// Degrees per second.
const SPIN_RATE: f64 = 90.0;

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let monitor = load_monitor()?;
    log::info!("monitor `{}`", monitor.name());

    let frames = match std::env::var("IRIS_FRAMES") {
        Ok(v) => v.parse().with_context(|| format!("IRIS_FRAMES is not a number: {v}"))?,
        Err(_) => DEFAULT_FRAMES,
    };

    let config = WindowConfig {
        title: "iris studio".to_string(),
        size: [1024, 768],
        units: UnitSpace::Deg,
        monitor,
        record_frame_intervals: true,
        color: Color::from_signed_rgb(-0.2, -0.2, -0.2),
        ..Default::default()
    };

    Runtime::run(config, GpuInit::default(), Demo::new(frames))
}

fn load_monitor() -> Result<MonitorCalibration> {
    match std::env::var("IRIS_MONITOR") {
        Ok(path) => {
            let src = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read monitor calibration {path}"))?;
            MonitorCalibration::from_json(&src)
                .with_context(|| format!("failed to load monitor calibration {path}"))
        }
        Err(_) => Ok(MonitorCalibration::new("testMonitor")
            .with_width_cm(40.0)?
            .with_distance_cm(57.0)?
            .with_size_pix([1024, 768])?),
    }
}

/// Polar placement: `pos` is (eccentricity, polar angle) in degrees,
/// vertices are degrees around that point.
fn polar_to_pix(
    vertices: ArrayView2<'_, f64>,
    pos: Vec2,
    monitor: &MonitorCalibration,
    _surface: SurfaceSize,
) -> Result<Array2<f64>, UnitError> {
    let (sin, cos) = pos.y.to_radians().sin_cos();
    let centre = Vec2::new(pos.x * cos, pos.x * sin);
    let degrees = &vertices + &centre.to_array();
    convert::deg_to_pix(&degrees, monitor, false)
}

struct Demo {
    fixation: StimTransform,
    target: StimTransform,
    marker: StimTransform,

    frames: u64,
    remaining: u64,
    quit: bool,
}

impl Demo {
    fn new(frames: u64) -> Self {
        Self {
            fixation: StimTransform::rect(UnitSpace::Deg).with_size([0.3, 0.3]),
            target: StimTransform::polygon(5, UnitSpace::DegFlatPos)
                .with_pos([12.0, 6.0])
                .with_size([3.0, 3.0]),
            marker: StimTransform::polygon(32, UnitSpace::Custom("polar".into()))
                .with_pos([8.0, 225.0])
                .with_size([1.0, 1.0]),
            frames,
            remaining: frames,
            quit: false,
        }
    }

    fn finish(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let fps = ctx.surface.fps();
        let timer = ctx.surface.timer();
        let (dropped, reported) = (timer.dropped_frames(), timer.reported_drops());
        log::info!(
            "presented {} frames, {fps:.1} fps, {dropped} dropped ({reported} reported)",
            self.frames - self.remaining
        );
        if let Err(e) = ctx.surface.save_intervals(Some(Path::new("lastFrameIntervals.log")), true) {
            log::error!("{e:#}");
        }
        AppControl::Exit
    }
}

impl Experiment for Demo {
    fn register_units(&mut self, registry: &mut UnitRegistry) -> Result<(), UnitError> {
        registry.register_fn("polar", polar_to_pix)
    }

    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        if let WindowEvent::KeyboardInput { event, .. } = event {
            if event.state == ElementState::Pressed
                && event.physical_key == PhysicalKey::Code(KeyCode::Escape)
            {
                self.quit = true;
            }
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if self.quit || self.remaining == 0 {
            return self.finish(ctx);
        }
        if self.remaining == self.frames {
            ctx.surface.log_on_flip(log::Level::Info, "target onset");
        }
        self.remaining -= 1;

        let ori = self.target.ori() + SPIN_RATE * ctx.time.dt;
        self.target.set_ori(ori % 360.0);

        ctx.draw_or_log(&mut self.target, Color::from_signed_rgb(1.0, -0.4, -0.4));
        ctx.draw_or_log(&mut self.marker, Color::from_signed_rgb(-0.4, 0.6, 1.0));
        ctx.draw_or_log(&mut self.fixation, Color::WHITE);

        ctx.flip()
    }
}
