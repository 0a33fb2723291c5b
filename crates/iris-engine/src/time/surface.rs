use std::fmt;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;

use super::estimator::{RefreshEstimator, RefreshParams};
use super::recorder::{FrameTimer, DEFAULT_REFRESH_HZ};
use super::sample::{FrameIntervalSample, RefreshRateEstimate};
use super::stats::FrameTimeStats;

/// Frames flipped before `ms_per_frame` starts timing.
const WAKE_FLIPS: usize = 5;
/// Minimum frames timed by `ms_per_frame`.
const MIN_STAT_FRAMES: usize = 60;

#[derive(Debug, Error)]
pub enum SwapError {
    /// The surface must be reconfigured; the frame was not shown.
    #[error("surface lost or outdated")]
    Lost,

    #[error("timed out waiting for the next surface texture")]
    Timeout,

    #[error("swap failed: {0}")]
    Fatal(String),
}

impl SwapError {
    /// Whether the surface can no longer present.
    #[inline]
    pub fn is_fatal(&self) -> bool {
        matches!(self, SwapError::Fatal(_))
    }
}

#[derive(Debug, Error)]
pub enum TimingError {
    #[error("invalid timing parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Swap(#[from] SwapError),
}

impl TimingError {
    /// Whether the surface can no longer present.
    pub fn is_fatal(&self) -> bool {
        matches!(self, TimingError::Swap(e) if e.is_fatal())
    }
}

/// A presentable surface with a monotonic clock.
///
/// `swap_buffers` returns once the frame has been handed to the display;
/// with blanking enabled this blocks until the next vertical blank.
pub trait SwapSurface {
    fn swap_buffers(&mut self, clear_buffer: bool) -> Result<(), SwapError>;

    /// Time since the surface clock origin.
    fn now(&self) -> Duration;

    /// Whether swaps are synchronized to the vertical blank.
    fn waits_for_blanking(&self) -> bool {
        true
    }
}

/// One completed flip.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FlipRecord {
    /// Swap completion time on the surface clock.
    pub timestamp: Duration,
    /// Interval since the previous swap; `None` unless recording.
    pub sample: Option<FrameIntervalSample>,
}

type FlipCallback = Box<dyn FnOnce(Duration)>;

/// A [`SwapSurface`] with frame-timing bookkeeping attached.
///
/// Every swap goes through [`flip`](Self::flip) so the [`FrameTimer`] sees it.
/// Work queued with [`call_on_flip`](Self::call_on_flip) and
/// [`log_on_flip`](Self::log_on_flip) runs once, right after the next
/// successful flip, with that flip's timestamp.
pub struct TimedSurface<S> {
    surface: S,
    timer: FrameTimer,
    refresh: Option<RefreshRateEstimate>,
    on_flip: Vec<FlipCallback>,
    flip_logs: Vec<(log::Level, String)>,
}

impl<S: fmt::Debug> fmt::Debug for TimedSurface<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimedSurface")
            .field("surface", &self.surface)
            .field("timer", &self.timer)
            .field("refresh", &self.refresh)
            .field("on_flip", &self.on_flip.len())
            .field("flip_logs", &self.flip_logs)
            .finish()
    }
}

impl<S: SwapSurface> TimedSurface<S> {
    pub fn new(surface: S) -> Self {
        let timer = FrameTimer::new(surface.now());
        Self {
            surface,
            timer,
            refresh: None,
            on_flip: Vec::new(),
            flip_logs: Vec::new(),
        }
    }

    #[inline]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    #[inline]
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[inline]
    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    #[inline]
    pub fn timer_mut(&mut self) -> &mut FrameTimer {
        &mut self.timer
    }

    pub fn into_inner(self) -> S {
        self.surface
    }

    // ── flipping ──────────────────────────────────────────────────────────

    /// Presents and clears the back buffer.
    pub fn flip(&mut self) -> Result<FlipRecord, TimingError> {
        self.flip_with(true)
    }

    /// Presents the back buffer and records the swap.
    ///
    /// Queued flip callbacks run first, then queued flip messages are
    /// logged. On error both queues are kept for the next flip.
    pub fn flip_with(&mut self, clear_buffer: bool) -> Result<FlipRecord, TimingError> {
        self.surface.swap_buffers(clear_buffer)?;
        let timestamp = self.surface.now();
        let sample = self.timer.on_swap(timestamp);

        for callback in self.on_flip.drain(..) {
            callback(timestamp);
        }
        for (level, msg) in self.flip_logs.drain(..) {
            log::log!(level, "{msg} (flip at {:.6}s)", timestamp.as_secs_f64());
        }

        Ok(FlipRecord { timestamp, sample })
    }

    /// Runs `callback` with the flip timestamp right after the next flip.
    pub fn call_on_flip(&mut self, callback: impl FnOnce(Duration) + 'static) {
        self.on_flip.push(Box::new(callback));
    }

    /// Logs `msg` at `level`, tagged with the flip timestamp, after the next flip.
    pub fn log_on_flip(&mut self, level: log::Level, msg: impl Into<String>) {
        self.flip_logs.push((level, msg.into()));
    }

    /// Callbacks and messages waiting for the next flip.
    pub fn pending_on_flip(&self) -> usize {
        self.on_flip.len() + self.flip_logs.len()
    }

    /// Presents the same frame `flips` times; only the last flip clears.
    pub fn multi_flip(&mut self, flips: usize, clear_buffer: bool) -> Result<(), TimingError> {
        if flips == 0 {
            return Err(TimingError::InvalidParameter(
                "multi_flip needs at least one flip".into(),
            ));
        }
        if flips > 1 && !self.surface.waits_for_blanking() {
            log::warn!("multi_flip without blanking: frames will not be held for {flips} refreshes");
        }
        for i in 1..=flips {
            self.flip_with(clear_buffer && i == flips)?;
        }
        Ok(())
    }

    pub fn set_recording(&mut self, on: bool) {
        let now = self.surface.now();
        self.timer.set_recording(on, now);
    }

    // ── refresh rate ──────────────────────────────────────────────────────

    /// Actively measures the refresh rate.
    ///
    /// Performs up to `n_warm_up + n_max_frames` swaps. Interval recording is
    /// suspended during the run and restored afterwards with the recorded
    /// intervals cleared.
    pub fn measure_refresh_rate(&mut self, params: RefreshParams) -> Result<RefreshRateEstimate, TimingError> {
        let mut estimator = RefreshEstimator::new(params)?;

        let was_recording = self.timer.is_recording();
        self.set_recording(false);

        let outcome = self.run_estimator(&mut estimator);

        let now = self.surface.now();
        self.timer.clear_intervals(now);
        self.timer.set_recording(was_recording, now);
        outcome?;

        let estimate = estimator
            .estimate()
            .unwrap_or(RefreshRateEstimate::Unmeasurable);
        match &estimate {
            RefreshRateEstimate::Measured { hz, window } => {
                log::info!("measured refresh rate {hz:.3} Hz ({} stable frames)", window.len());
            }
            RefreshRateEstimate::Unmeasurable => {
                log::warn!(
                    "refresh rate did not stabilize within {} frames (std dev >= {} ms)",
                    params.n_max_frames,
                    params.threshold_ms
                );
            }
        }
        Ok(estimate)
    }

    /// Swaps until the estimator is terminal. Frames that were not presented
    /// are skipped, up to `n_max_frames` of them; only fatal errors abort.
    fn run_estimator(&mut self, estimator: &mut RefreshEstimator) -> Result<(), TimingError> {
        let max_skipped = estimator.params().n_max_frames;
        let mut skipped = 0;

        estimator.start(self.surface.now());
        while !estimator.state().is_terminal() {
            match self.surface.swap_buffers(true) {
                Ok(()) => {
                    let now = self.surface.now();
                    self.timer.on_swap(now);
                    estimator.on_swap(now);
                }
                Err(e) if e.is_fatal() || skipped >= max_skipped => return Err(e.into()),
                Err(e) => {
                    skipped += 1;
                    log::debug!("refresh measurement skipped a frame: {e}");
                    estimator.rebase(self.surface.now());
                }
            }
        }
        Ok(())
    }

    /// Measures the refresh rate and applies it to dropped-frame detection,
    /// falling back to 60 Hz when unmeasurable.
    pub fn calibrate(&mut self, params: RefreshParams) -> Result<RefreshRateEstimate, TimingError> {
        let estimate = self.measure_refresh_rate(params)?;
        if !estimate.is_measured() {
            log::warn!("assuming {DEFAULT_REFRESH_HZ} Hz for dropped-frame detection");
        }
        self.timer.set_refresh_rate(estimate.hz());
        self.refresh = Some(estimate.clone());
        Ok(estimate)
    }

    /// Last calibrated refresh rate.
    pub fn refresh_rate(&self) -> Option<f64> {
        self.refresh.as_ref().and_then(RefreshRateEstimate::hz)
    }

    /// Calibrated frame period; zero until calibrated.
    pub fn monitor_frame_period(&self) -> Duration {
        self.timer.refresh_period().unwrap_or(Duration::ZERO)
    }

    /// Frames per second since the previous call.
    pub fn fps(&mut self) -> f64 {
        let now = self.surface.now();
        self.timer.frame_rate_since(now)
    }

    /// Flips at least 60 frames and summarizes their durations.
    pub fn ms_per_frame(&mut self, n_frames: usize) -> Result<FrameTimeStats, TimingError> {
        for _ in 0..WAKE_FLIPS {
            self.flip()?;
        }

        let n = n_frames.max(MIN_STAT_FRAMES);
        let mut frames = Vec::with_capacity(n);
        let mut prev = self.surface.now();
        for _ in 0..n {
            self.flip()?;
            let now = self.surface.now();
            frames.push(now.saturating_sub(prev).as_secs_f64());
            prev = now;
        }
        Ok(FrameTimeStats::from_secs(&frames))
    }

    /// See [`FrameTimer::save_intervals`].
    pub fn save_intervals(&mut self, path: Option<&Path>, clear: bool) -> anyhow::Result<()> {
        let now = self.surface.now();
        self.timer.save_intervals(path, clear, now)
    }
}
