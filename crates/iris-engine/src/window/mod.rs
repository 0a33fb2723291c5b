//! Window + runtime loop.
//!
//! Owns the `winit` EventLoop and the stimulus window, and wires them to the
//! GPU layer and frame timing.

mod config;
mod manager;
mod runtime;
mod surface;

pub use config::{ConfigError, WindowConfig};
pub use manager::SurfaceManager;
pub use runtime::{Runtime, RuntimeCtx};
pub use surface::WindowSurface;
