use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous frame tick, in seconds.
    pub dt: f64,

    /// Monotonic timestamp of the tick, relative to the clock origin.
    pub now: Duration,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Monotonic clock for one surface.
///
/// Timestamps are reported as `Duration` since the clock origin so timing
/// code can be fed from a simulated source in tests. `tick()` additionally
/// produces a clamped delta for animation code; interval statistics always
/// use the raw timestamps.
#[derive(Debug, Clone)]
pub struct FrameClock {
    origin: Instant,
    last: Duration,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    /// Creates a new clock with default clamps.
    ///
    /// Clamp rationale:
    /// - minimum prevents zero-dt behavior from tight loops on some platforms
    /// - maximum keeps animations bounded after long stalls (e.g. a blocking
    ///   refresh-rate measurement)
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        Self {
            origin: Instant::now(),
            last: Duration::ZERO,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Time since the clock origin.
    #[inline]
    pub fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    /// Resets the delta baseline without moving the origin.
    ///
    /// Useful after surface reconfigure events or when resuming from suspension.
    pub fn reset(&mut self) {
        self.last = self.now();
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        let now = self.now();
        let dt = now
            .saturating_sub(self.last)
            .clamp(self.dt_min, self.dt_max);

        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f64(),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);

        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
