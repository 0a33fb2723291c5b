//! Headless [`SwapSurface`] driven by a scripted clock.
//!
//! Each swap advances the virtual clock by the next scripted interval, or by
//! the fallback interval once the script runs out. Used to exercise timing
//! logic without a display.

use std::collections::VecDeque;
use std::time::Duration;

use super::surface::{SwapError, SwapSurface};

#[derive(Debug, Clone)]
pub struct ScriptedSurface {
    now: Duration,
    script: VecDeque<Duration>,
    fallback: Duration,
    swaps: usize,
    clears: usize,
    blanking: bool,
    fail_at: Option<usize>,
    lose_at: Vec<usize>,
    attempts: usize,
}

impl ScriptedSurface {
    /// A surface that swaps every `period` forever.
    pub fn steady(period: Duration) -> Self {
        Self {
            now: Duration::ZERO,
            script: VecDeque::new(),
            fallback: period,
            swaps: 0,
            clears: 0,
            blanking: true,
            fail_at: None,
            lose_at: Vec::new(),
            attempts: 0,
        }
    }

    /// Scripted intervals in milliseconds, then `fallback_ms` forever.
    pub fn from_ms(intervals_ms: impl IntoIterator<Item = f64>, fallback_ms: f64) -> Self {
        let mut s = Self::steady(ms(fallback_ms));
        s.extend_ms(intervals_ms);
        s
    }

    pub fn extend_ms(&mut self, intervals_ms: impl IntoIterator<Item = f64>) {
        self.script.extend(intervals_ms.into_iter().map(ms));
    }

    /// Makes swap number `n` (1-based) fail with [`SwapError::Fatal`].
    pub fn fail_at(mut self, n: usize) -> Self {
        self.fail_at = Some(n);
        self
    }

    /// Makes swap attempt `n` (1-based, failed attempts included) report
    /// [`SwapError::Lost`]. The clock still advances by one step.
    pub fn lose_at(mut self, n: usize) -> Self {
        self.lose_at.push(n);
        self
    }

    pub fn set_waits_for_blanking(&mut self, on: bool) {
        self.blanking = on;
    }

    /// Swaps performed so far, failed ones excluded.
    pub fn swaps(&self) -> usize {
        self.swaps
    }

    /// Every call to `swap_buffers`, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Swaps that requested a buffer clear.
    pub fn clears(&self) -> usize {
        self.clears
    }
}

impl SwapSurface for ScriptedSurface {
    fn swap_buffers(&mut self, clear_buffer: bool) -> Result<(), SwapError> {
        self.attempts += 1;
        if self.fail_at == Some(self.swaps + 1) {
            return Err(SwapError::Fatal("scripted failure".into()));
        }
        let step = self.script.pop_front().unwrap_or(self.fallback);
        self.now += step;
        if self.lose_at.contains(&self.attempts) {
            return Err(SwapError::Lost);
        }
        self.swaps += 1;
        if clear_buffer {
            self.clears += 1;
        }
        Ok(())
    }

    fn now(&self) -> Duration {
        self.now
    }

    fn waits_for_blanking(&self) -> bool {
        self.blanking
    }
}

fn ms(v: f64) -> Duration {
    Duration::from_secs_f64(v / 1000.0)
}
