use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};

use super::sample::FrameIntervalSample;

/// Rate assumed when the refresh rate has not been measured.
pub const DEFAULT_REFRESH_HZ: f64 = 60.0;

/// An interval longer than `DROP_TOLERANCE × period` counts as a dropped frame.
pub const DROP_TOLERANCE: f64 = 1.2;

/// File written by [`FrameTimer::save_intervals`] when no path is given.
pub const DEFAULT_INTERVALS_FILE: &str = "lastFrameIntervals.log";

/// Per-swap bookkeeping for one surface.
///
/// While recording, every swap appends a [`FrameIntervalSample`] and intervals
/// above the refresh threshold are counted as dropped frames. Enabling
/// recording after it was off discards the next interval, because the
/// previous swap timestamp is stale.
///
/// All timestamps are `Duration`s on the owning surface's clock.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    recording: bool,
    just_turned_on: bool,
    last_swap: Duration,
    intervals: Vec<FrameIntervalSample>,

    refresh_period: Option<Duration>,
    threshold: Duration,
    dropped: u32,
    report_dropped: u32,
    reported: u32,

    frames: u64,
    fps_origin: Duration,
}

impl FrameTimer {
    /// Creates an idle timer (not recording, uncalibrated).
    pub fn new(now: Duration) -> Self {
        Self {
            recording: false,
            just_turned_on: false,
            last_swap: now,
            intervals: Vec::new(),
            refresh_period: None,
            threshold: Duration::from_secs_f64(DROP_TOLERANCE / DEFAULT_REFRESH_HZ),
            dropped: 0,
            report_dropped: 5,
            reported: 0,
            frames: 0,
            fps_origin: now,
        }
    }

    /// Number of dropped frames that are logged individually.
    pub fn set_report_dropped(&mut self, n: u32) {
        self.report_dropped = n;
    }

    // ── recording ─────────────────────────────────────────────────────────

    #[inline]
    pub fn is_recording(&self) -> bool {
        self.recording
    }

    /// Turns interval recording on or off. Also restarts the fps counter.
    pub fn set_recording(&mut self, on: bool, now: Duration) {
        self.just_turned_on = !self.recording && on;
        self.recording = on;
        self.reset_fps(now);
    }

    /// Bookkeeping for one completed swap at `now`.
    ///
    /// Returns the recorded sample, or `None` when not recording or when this
    /// swap falls in the grace period after recording was enabled.
    pub fn on_swap(&mut self, now: Duration) -> Option<FrameIntervalSample> {
        self.frames += 1;
        if !self.recording {
            return None;
        }

        let interval = now.saturating_sub(self.last_swap);
        self.last_swap = now;

        if self.just_turned_on {
            self.just_turned_on = false;
            return None;
        }

        let sample = FrameIntervalSample {
            interval,
            timestamp: now,
        };
        self.intervals.push(sample);

        if interval > self.threshold {
            self.dropped += 1;
            if self.reported < self.report_dropped {
                self.reported += 1;
                log::warn!(
                    "t of last frame was {:.2}ms (=1/{:.0})",
                    interval.as_secs_f64() * 1000.0,
                    1.0 / interval.as_secs_f64()
                );
                if self.reported == self.report_dropped {
                    log::warn!("multiple dropped frames have occurred; further drops will not be logged");
                }
            }
        }

        Some(sample)
    }

    pub fn intervals(&self) -> &[FrameIntervalSample] {
        &self.intervals
    }

    /// Discards recorded intervals and restarts the fps counter.
    pub fn clear_intervals(&mut self, now: Duration) {
        self.intervals.clear();
        self.reset_fps(now);
    }

    // ── dropped frames ────────────────────────────────────────────────────

    /// Applies a measured refresh rate; `None` falls back to 60 Hz.
    ///
    /// Rates whose period or threshold cannot be represented as a `Duration`
    /// are treated like `None`.
    pub fn set_refresh_rate(&mut self, hz: Option<f64>) {
        let calibrated = hz.filter(|hz| *hz > 0.0 && hz.is_finite()).and_then(|hz| {
            let period = Duration::try_from_secs_f64(1.0 / hz).ok()?;
            let threshold = Duration::try_from_secs_f64(period.as_secs_f64() * DROP_TOLERANCE).ok()?;
            Some((period, threshold))
        });
        if hz.is_some() && calibrated.is_none() {
            log::warn!("ignoring unusable refresh rate {hz:?}; assuming {DEFAULT_REFRESH_HZ} Hz");
        }

        match calibrated {
            Some((period, threshold)) => {
                self.refresh_period = Some(period);
                self.threshold = threshold;
            }
            None => {
                self.refresh_period = None;
                self.threshold = Duration::from_secs_f64(DROP_TOLERANCE / DEFAULT_REFRESH_HZ);
            }
        }
    }

    /// Measured refresh period, if calibrated.
    pub fn refresh_period(&self) -> Option<Duration> {
        self.refresh_period
    }

    /// Intervals above this are counted as dropped frames.
    pub fn refresh_threshold(&self) -> Duration {
        self.threshold
    }

    /// Dropped frames since the timer was created.
    pub fn dropped_frames(&self) -> u32 {
        self.dropped
    }

    /// Dropped frames that were logged individually; at most the
    /// `set_report_dropped` limit.
    pub fn reported_drops(&self) -> u32 {
        self.reported
    }

    // ── fps ───────────────────────────────────────────────────────────────

    /// Frames per second since the previous call (or since recording was
    /// toggled). Restarts the counter.
    pub fn frame_rate_since(&mut self, now: Duration) -> f64 {
        let elapsed = now.saturating_sub(self.fps_origin).as_secs_f64();
        let fps = if elapsed > 0.0 {
            self.frames as f64 / elapsed
        } else {
            0.0
        };
        self.reset_fps(now);
        fps
    }

    fn reset_fps(&mut self, now: Duration) {
        self.frames = 0;
        self.fps_origin = now;
    }

    // ── export ────────────────────────────────────────────────────────────

    /// Writes the recorded intervals (seconds) as one comma-separated line.
    pub fn write_intervals<W: Write>(&self, writer: W) -> Result<(), csv::Error> {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_writer(writer);
        if !self.intervals.is_empty() {
            wtr.write_record(self.intervals.iter().map(|s| s.secs().to_string()))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// Saves the intervals to `path` (default `lastFrameIntervals.log`).
    ///
    /// Nothing is written when no intervals were recorded. With `clear`, the
    /// intervals are discarded afterwards.
    pub fn save_intervals(&mut self, path: Option<&Path>, clear: bool, now: Duration) -> Result<()> {
        let path = path.unwrap_or_else(|| Path::new(DEFAULT_INTERVALS_FILE));
        if !self.intervals.is_empty() {
            let file = File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            self.write_intervals(file)
                .with_context(|| format!("failed to write frame intervals to {}", path.display()))?;
            log::info!("saved {} frame intervals to {}", self.intervals.len(), path.display());
        }
        if clear {
            self.clear_intervals(now);
        }
        Ok(())
    }
}
