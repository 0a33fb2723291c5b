//! Display timing.
//!
//! - `FrameClock`: monotonic clock and per-frame delta for the render loop
//! - `FrameTimer`: per-swap bookkeeping (interval recording, dropped frames, fps)
//! - `RefreshEstimator`: state machine that detects a stable refresh interval
//! - `TimedSurface`: couples a [`SwapSurface`] with a `FrameTimer` and drives
//!   active measurements (refresh rate, ms-per-frame statistics)
//!
//! Everything here is single-threaded; the only blocking point is the swap
//! itself, which waits for vertical blank when the surface is synced.

mod estimator;
mod frame_clock;
mod recorder;
mod sample;
pub mod sim;
mod stats;
mod surface;

pub use estimator::{EstimatorState, RefreshEstimator, RefreshParams};
pub use frame_clock::{FrameClock, FrameTime};
pub use recorder::{FrameTimer, DEFAULT_REFRESH_HZ, DROP_TOLERANCE};
pub use sample::{FrameIntervalSample, RefreshRateEstimate};
pub use stats::FrameTimeStats;
pub use surface::{FlipRecord, SwapError, SwapSurface, TimedSurface, TimingError};
