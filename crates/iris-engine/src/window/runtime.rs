use std::collections::HashMap;

use anyhow::{Context, Result};
use ouroboros::self_referencing;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Fullscreen, Window, WindowId};

use crate::core::{AppControl, Experiment, FrameCtx};
use crate::device::{Gpu, GpuInit};
use crate::time::{FrameClock, FrameTime, SwapSurface, TimedSurface, TimingError};
use crate::units::UnitRegistry;

use super::config::WindowConfig;
use super::manager::SurfaceManager;
use super::surface::WindowSurface;

/// Runtime context passed to the experiment.
///
/// Commands are buffered and applied after the current callback returns.
#[derive(Default)]
pub struct RuntimeCtx {
    commands: Vec<Command>,
}

impl RuntimeCtx {
    pub fn close_window(&mut self, id: WindowId) {
        self.commands.push(Command::CloseWindow(id));
    }

    pub fn exit(&mut self) {
        self.commands.push(Command::Exit);
    }
}

enum Command {
    CloseWindow(WindowId),
    Exit,
}

/// Entry point for the runtime.
pub struct Runtime;

impl Runtime {
    /// Opens the stimulus window and drives `experiment` until it exits.
    pub fn run<E>(config: WindowConfig, gpu_init: GpuInit, mut experiment: E) -> Result<()>
    where
        E: 'static + Experiment,
    {
        config.validate().context("invalid window configuration")?;
        if let Err(e) = config.units.check_calibration(&config.monitor) {
            log::warn!("stimuli in the default `{}` units will not be drawn: {e}", config.units);
        }

        let mut registry = UnitRegistry::new();
        experiment
            .register_units(&mut registry)
            .context("failed to register custom unit spaces")?;

        let event_loop = EventLoop::new().context("failed to create winit EventLoop")?;
        let mut state = AppState::new(config, gpu_init, registry, experiment);

        event_loop
            .run_app(&mut state)
            .context("winit event loop terminated with error")?;

        Ok(())
    }
}

#[self_referencing]
struct WindowEntry {
    clock: FrameClock,
    calibrated: bool,

    window: Window,

    #[borrows(window)]
    #[covariant]
    surface: TimedSurface<WindowSurface<'this>>,
}

struct AppState<E>
where
    E: Experiment + 'static,
{
    config: WindowConfig,
    gpu_init: GpuInit,
    registry: UnitRegistry,
    experiment: E,

    windows: HashMap<WindowId, WindowEntry>,
    manager: SurfaceManager<WindowId>,
    exit_requested: bool,
}

impl<E> AppState<E>
where
    E: Experiment + 'static,
{
    fn new(config: WindowConfig, gpu_init: GpuInit, registry: UnitRegistry, experiment: E) -> Self {
        Self {
            config,
            gpu_init,
            registry,
            experiment,
            windows: HashMap::new(),
            manager: SurfaceManager::new(),
            exit_requested: false,
        }
    }

    fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Only the active surface is driven; the others keep their last frame.
    fn request_active_redraw(&self) {
        let entry = self.manager.active().and_then(|id| self.windows.get(&id));
        if let Some(entry) = entry {
            entry.with_window(|w| w.request_redraw());
        }
    }

    fn create_window_entry(&mut self, event_loop: &ActiveEventLoop) -> Result<WindowId> {
        let config = &self.config;
        let [width, height] = config.size;
        let mut attrs = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(width, height));

        if config.fullscreen {
            let handle = event_loop.available_monitors().nth(config.screen);
            if handle.is_none() {
                log::warn!("screen {} not found, using the primary monitor", config.screen);
            }
            attrs = attrs.with_fullscreen(Some(Fullscreen::Borderless(handle)));
        }

        let window = event_loop
            .create_window(attrs)
            .context("failed to create window")?;

        let id = window.id();
        let gpu_init = GpuInit {
            present_mode: config.present_mode(),
            ..self.gpu_init.clone()
        };
        let background = config.color;

        let entry = WindowEntry::try_new(FrameClock::new(), false, window, |w| {
            pollster::block_on(Gpu::new(w, gpu_init))
                .map(|gpu| TimedSurface::new(WindowSurface::new(gpu, background)))
        })
        .context("GPU initialization failed for window")?;

        let size = entry.with_surface(|s| s.surface().size());
        if let Some([mw, mh]) = config.monitor.size_pix() {
            if config.fullscreen && (mw as f64 != size.width || mh as f64 != size.height) {
                log::warn!(
                    "monitor `{}` is calibrated for {mw}x{mh} but the window is {}x{}",
                    config.monitor.name(),
                    size.width,
                    size.height
                );
            }
        }

        self.windows.insert(id, entry);
        self.manager.register(id);
        Ok(id)
    }

    fn destroy_window_entry(&mut self, id: WindowId) {
        self.windows.remove(&id);
        self.manager.remove(id);
    }

    fn apply_commands(&mut self, event_loop: &ActiveEventLoop, mut ctx: RuntimeCtx) {
        for cmd in ctx.commands.drain(..) {
            match cmd {
                Command::CloseWindow(id) => self.destroy_window_entry(id),
                Command::Exit => self.request_exit(),
            }
        }

        if self.manager.is_empty() {
            self.request_exit();
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }

    /// Drives one frame of `window_id`. Returns the experiment's verdict.
    fn redraw(&mut self, window_id: WindowId, runtime_ctx: &mut RuntimeCtx) -> AppControl {
        let (experiment, windows) = (&mut self.experiment, &mut self.windows);
        let (config, registry) = (&self.config, &self.registry);

        if !self.manager.is_active(window_id) {
            return AppControl::Continue;
        }
        let Some(entry) = windows.get_mut(&window_id) else {
            return AppControl::Continue;
        };

        entry.with_mut(|fields| {
            if !*fields.calibrated {
                *fields.calibrated = true;
                if let Err(e) = prepare_timing(fields.surface, config) {
                    log::error!("frame timing setup failed: {e:#}");
                    if e.is_fatal() {
                        return AppControl::Exit;
                    }
                }
                fields.clock.reset();
            }

            let ft: FrameTime = fields.clock.tick();
            let mut ctx = FrameCtx {
                window_id,
                window: fields.window,
                surface: fields.surface,
                registry,
                monitor: &config.monitor,
                units: &config.units,
                time: ft,
                runtime: runtime_ctx,
            };
            experiment.on_frame(&mut ctx)
        })
    }
}

/// Applies startup timing settings and, with `check_timing`, measures the
/// refresh rate (falling back to 60 Hz).
///
/// Recording is configured whatever the measurement outcome; the error is
/// returned afterwards.
fn prepare_timing<S: SwapSurface>(surface: &mut TimedSurface<S>, config: &WindowConfig) -> Result<(), TimingError> {
    surface.timer_mut().set_report_dropped(config.report_dropped);
    let outcome = if config.check_timing {
        surface.calibrate(config.refresh).map(|_| ())
    } else {
        Ok(())
    };
    if outcome.is_err() || !config.check_timing {
        surface.timer_mut().set_refresh_rate(None);
    }
    surface.set_recording(config.record_frame_intervals);
    outcome
}

impl<E> ApplicationHandler for AppState<E>
where
    E: Experiment + 'static,
{
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if !self.manager.is_empty() {
            return;
        }

        if let Err(e) = self.create_window_entry(event_loop) {
            log::error!("failed to create stimulus window: {e:#}");
            self.request_exit();
            event_loop.exit();
            return;
        }

        self.request_active_redraw();
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        // Continuous redraw; pacing comes from the swap itself.
        event_loop.set_control_flow(ControlFlow::Wait);
        self.request_active_redraw();
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if self.exit_requested {
            event_loop.exit();
            return;
        }

        if !self.manager.contains(window_id) {
            return;
        }

        if self.experiment.on_window_event(window_id, &event) == AppControl::Exit {
            self.request_exit();
            event_loop.exit();
            return;
        }

        match &event {
            WindowEvent::CloseRequested => {
                self.destroy_window_entry(window_id);
                if self.manager.is_empty() {
                    self.request_exit();
                    event_loop.exit();
                }
            }

            WindowEvent::Focused(true) => {
                self.manager.activate(window_id);
            }

            WindowEvent::Resized(new_size) => {
                if let Some(entry) = self.windows.get_mut(&window_id) {
                    entry.with_surface_mut(|s| s.surface_mut().gpu_mut().resize(*new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(entry) = self.windows.get_mut(&window_id) {
                    let new_size = entry.with_window(|w| w.inner_size());
                    entry.with_surface_mut(|s| s.surface_mut().gpu_mut().resize(new_size));
                    entry.with_window(|w| w.request_redraw());
                }
            }

            WindowEvent::RedrawRequested => {
                let mut runtime_ctx = RuntimeCtx::default();
                if self.redraw(window_id, &mut runtime_ctx) == AppControl::Exit {
                    runtime_ctx.exit();
                }
                self.apply_commands(event_loop, runtime_ctx);
            }

            _ => {}
        }

        if self.exit_requested {
            event_loop.exit();
        }
    }
}
