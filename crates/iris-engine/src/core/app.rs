use winit::event::WindowEvent;
use winit::window::WindowId;

use crate::units::{UnitError, UnitRegistry};

use super::ctx::FrameCtx;

/// Control directive returned by experiment callbacks.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum AppControl {
    Continue,
    Exit,
}

/// Contract implemented by experiments driven by the runtime.
pub trait Experiment {
    /// Called once before the window opens.
    fn register_units(&mut self, registry: &mut UnitRegistry) -> Result<(), UnitError> {
        let _ = registry;
        Ok(())
    }

    /// Called for window events.
    fn on_window_event(&mut self, window_id: WindowId, event: &WindowEvent) -> AppControl {
        let _ = (window_id, event);
        AppControl::Continue
    }

    /// Called once per redraw, after startup timing calibration.
    ///
    /// Nothing reaches the screen unless the experiment flips.
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl;
}
