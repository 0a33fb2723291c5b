use std::time::Duration;

use winit::window::{Window, WindowId};

use crate::coords::SurfaceSize;
use crate::monitor::MonitorCalibration;
use crate::paint::Color;
use crate::stim::StimTransform;
use crate::time::{FrameTime, TimedSurface};
use crate::units::{UnitError, UnitRegistry, UnitSpace};
use crate::window::{RuntimeCtx, WindowSurface};

use super::app::AppControl;

/// Per-frame context passed to `Experiment::on_frame`.
///
/// Lifetimes:
/// - `'a` is the duration of the callback invocation
/// - `'w` is the window-borrow lifetime carried by the GPU surface
pub struct FrameCtx<'a, 'w> {
    pub window_id: WindowId,
    pub window: &'a Window,
    pub surface: &'a mut TimedSurface<WindowSurface<'w>>,
    pub registry: &'a UnitRegistry,
    pub monitor: &'a MonitorCalibration,
    /// Window default unit space.
    pub units: &'a UnitSpace,
    pub time: FrameTime,
    pub runtime: &'a mut RuntimeCtx,
}

impl<'a, 'w> FrameCtx<'a, 'w> {
    /// Drawable size in pixels.
    pub fn size(&self) -> SurfaceSize {
        self.surface.surface().size()
    }

    /// Converts `stim` to pixels and queues it for the next flip.
    ///
    /// On error nothing is queued; other stimuli are unaffected.
    pub fn draw(&mut self, stim: &mut StimTransform, color: Color) -> Result<(), UnitError> {
        let size = self.size();
        let verts = stim.vertices_pix(self.registry, self.monitor, size)?;
        self.surface.surface_mut().push_polygon(verts.view(), color);
        Ok(())
    }

    /// Like [`draw`](Self::draw) but logs conversion failures instead of returning them.
    pub fn draw_or_log(&mut self, stim: &mut StimTransform, color: Color) {
        if let Err(e) = self.draw(stim, color) {
            log::error!("stimulus in `{}` units not drawn: {e}", stim.units());
        }
    }

    /// Presents the queued stimuli and clears the queue.
    pub fn flip(&mut self) -> AppControl {
        self.flip_with(true)
    }

    /// Presents the queued stimuli. Fatal swap errors end the run; transient
    /// ones skip the frame.
    pub fn flip_with(&mut self, clear_buffer: bool) -> AppControl {
        match self.surface.flip_with(clear_buffer) {
            Ok(_) => AppControl::Continue,
            Err(e) if e.is_fatal() => {
                log::error!("swap failed: {e}");
                AppControl::Exit
            }
            Err(e) => {
                log::debug!("frame skipped: {e}");
                AppControl::Continue
            }
        }
    }

    /// Calibrated refresh period; zero when the rate is unknown.
    pub fn frame_period(&self) -> Duration {
        self.surface.monitor_frame_period()
    }
}
