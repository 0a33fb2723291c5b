//! Core experiment-facing contracts.
//!
//! This module defines the interface between the runtime (platform loop) and
//! experiments: the callback trait and the per-frame context.

mod app;
mod ctx;

pub use app::{AppControl, Experiment};
pub use ctx::FrameCtx;
