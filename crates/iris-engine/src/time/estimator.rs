use std::collections::VecDeque;
use std::time::Duration;

use super::sample::{FrameIntervalSample, RefreshRateEstimate};
use super::stats::{mean, std_dev};
use super::surface::TimingError;

/// Parameters of one refresh-rate measurement.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RefreshParams {
    /// Trailing samples that must agree before the estimate is accepted.
    pub n_identical: usize,
    /// Sampling swaps allowed before giving up.
    pub n_max_frames: usize,
    /// Unrecorded swaps before sampling starts.
    pub n_warm_up: usize,
    /// Standard deviation (ms) below which the window counts as stable.
    pub threshold_ms: f64,
}

impl Default for RefreshParams {
    fn default() -> Self {
        Self {
            n_identical: 10,
            n_max_frames: 100,
            n_warm_up: 10,
            threshold_ms: 1.0,
        }
    }
}

impl RefreshParams {
    pub fn validate(&self) -> Result<(), TimingError> {
        if self.n_identical == 0 {
            return Err(TimingError::InvalidParameter(
                "n_identical must be at least 1".into(),
            ));
        }
        if self.n_identical > self.n_max_frames {
            return Err(TimingError::InvalidParameter(format!(
                "n_identical ({}) exceeds n_max_frames ({})",
                self.n_identical, self.n_max_frames
            )));
        }
        if !(self.threshold_ms.is_finite() && self.threshold_ms > 0.0) {
            return Err(TimingError::InvalidParameter(format!(
                "threshold_ms must be positive, got {}",
                self.threshold_ms
            )));
        }
        Ok(())
    }

    /// Swaps performed when the measurement never converges.
    pub fn swap_budget(&self) -> usize {
        self.n_warm_up + self.n_max_frames
    }
}

/// Progress of a [`RefreshEstimator`].
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum EstimatorState {
    Idle,
    WarmingUp { remaining: usize },
    Sampling { swaps: usize },
    Converged { hz: f64 },
    Unmeasurable,
}

impl EstimatorState {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            EstimatorState::Converged { .. } | EstimatorState::Unmeasurable
        )
    }
}

/// Detects a stable refresh interval from swap completion times.
///
/// The estimator never swaps by itself; the caller performs the swaps and
/// feeds their completion times to [`on_swap`](Self::on_swap) until the state
/// is terminal. One estimator serves one run.
#[derive(Debug, Clone)]
pub struct RefreshEstimator {
    params: RefreshParams,
    state: EstimatorState,
    last_swap: Duration,
    window: VecDeque<FrameIntervalSample>,
}

impl RefreshEstimator {
    pub fn new(params: RefreshParams) -> Result<Self, TimingError> {
        params.validate()?;
        Ok(Self {
            params,
            state: EstimatorState::Idle,
            last_swap: Duration::ZERO,
            window: VecDeque::with_capacity(params.n_identical),
        })
    }

    #[inline]
    pub fn params(&self) -> &RefreshParams {
        &self.params
    }

    #[inline]
    pub fn state(&self) -> EstimatorState {
        self.state
    }

    /// Idle → WarmingUp. `now` is the baseline for the first interval when
    /// no warm-up swaps are requested.
    pub fn start(&mut self, now: Duration) {
        if self.state != EstimatorState::Idle {
            return;
        }
        self.last_swap = now;
        self.state = match self.params.n_warm_up {
            0 => EstimatorState::Sampling { swaps: 0 },
            n => EstimatorState::WarmingUp { remaining: n },
        };
    }

    /// Advances the state machine by one completed swap.
    pub fn on_swap(&mut self, now: Duration) -> EstimatorState {
        match self.state {
            EstimatorState::WarmingUp { remaining } => {
                self.last_swap = now;
                self.state = if remaining <= 1 {
                    EstimatorState::Sampling { swaps: 0 }
                } else {
                    EstimatorState::WarmingUp {
                        remaining: remaining - 1,
                    }
                };
            }
            EstimatorState::Sampling { swaps } => {
                let interval = now.saturating_sub(self.last_swap);
                self.last_swap = now;

                if self.window.len() == self.params.n_identical {
                    self.window.pop_front();
                }
                self.window.push_back(FrameIntervalSample {
                    interval,
                    timestamp: now,
                });

                let swaps = swaps + 1;
                self.state = if let Some(hz) = self.stable_rate() {
                    EstimatorState::Converged { hz }
                } else if swaps >= self.params.n_max_frames {
                    EstimatorState::Unmeasurable
                } else {
                    EstimatorState::Sampling { swaps }
                };
            }
            EstimatorState::Idle
            | EstimatorState::Converged { .. }
            | EstimatorState::Unmeasurable => {}
        }
        self.state
    }

    /// Re-anchors the next interval at `now` after a swap that did not
    /// present. The state does not advance.
    pub fn rebase(&mut self, now: Duration) {
        if matches!(
            self.state,
            EstimatorState::WarmingUp { .. } | EstimatorState::Sampling { .. }
        ) {
            self.last_swap = now;
        }
    }

    fn stable_rate(&self) -> Option<f64> {
        if self.window.len() < self.params.n_identical {
            return None;
        }
        let secs: Vec<f64> = self.window.iter().map(FrameIntervalSample::secs).collect();
        let period = mean(&secs);
        if period <= 0.0 {
            return None;
        }
        (std_dev(&secs) * 1000.0 < self.params.threshold_ms).then(|| 1.0 / period)
    }

    /// The result once the run is terminal.
    pub fn estimate(&self) -> Option<RefreshRateEstimate> {
        match self.state {
            EstimatorState::Converged { hz } => Some(RefreshRateEstimate::Measured {
                hz,
                window: self.window.iter().copied().collect(),
            }),
            EstimatorState::Unmeasurable => Some(RefreshRateEstimate::Unmeasurable),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: f64) -> Duration {
        Duration::from_secs_f64(v / 1000.0)
    }

    fn run(est: &mut RefreshEstimator, intervals_ms: impl IntoIterator<Item = f64>) -> usize {
        let mut now = Duration::ZERO;
        est.start(now);
        let mut swaps = 0;
        for i in intervals_ms {
            if est.state().is_terminal() {
                break;
            }
            now += ms(i);
            est.on_swap(now);
            swaps += 1;
        }
        swaps
    }

    // ── params ────────────────────────────────────────────────────────────

    #[test]
    fn defaults() {
        let p = RefreshParams::default();
        assert_eq!((p.n_identical, p.n_max_frames, p.n_warm_up), (10, 100, 10));
        assert_eq!(p.threshold_ms, 1.0);
        assert_eq!(p.swap_budget(), 110);
    }

    #[test]
    fn rejects_window_larger_than_budget() {
        let p = RefreshParams {
            n_identical: 20,
            n_max_frames: 10,
            ..Default::default()
        };
        assert!(matches!(
            RefreshEstimator::new(p),
            Err(TimingError::InvalidParameter(_))
        ));
    }

    #[test]
    fn rejects_degenerate_params() {
        for p in [
            RefreshParams { n_identical: 0, ..Default::default() },
            RefreshParams { threshold_ms: 0.0, ..Default::default() },
            RefreshParams { threshold_ms: f64::NAN, ..Default::default() },
        ] {
            assert!(p.validate().is_err(), "{p:?}");
        }
    }

    // ── state machine ─────────────────────────────────────────────────────

    #[test]
    fn walks_through_warm_up_then_samples() {
        let p = RefreshParams { n_warm_up: 2, ..Default::default() };
        let mut est = RefreshEstimator::new(p).unwrap();
        assert_eq!(est.state(), EstimatorState::Idle);

        est.start(Duration::ZERO);
        assert_eq!(est.state(), EstimatorState::WarmingUp { remaining: 2 });
        assert_eq!(est.on_swap(ms(50.0)), EstimatorState::WarmingUp { remaining: 1 });
        assert_eq!(est.on_swap(ms(60.0)), EstimatorState::Sampling { swaps: 0 });
        assert_eq!(est.on_swap(ms(70.0)), EstimatorState::Sampling { swaps: 1 });
        assert!(est.estimate().is_none());
    }

    #[test]
    fn converges_on_steady_source() {
        let mut est = RefreshEstimator::new(RefreshParams::default()).unwrap();
        let swaps = run(&mut est, std::iter::repeat(10.0).take(500));
        assert_eq!(swaps, 20);

        let EstimatorState::Converged { hz } = est.state() else {
            panic!("expected convergence, got {:?}", est.state());
        };
        assert!((hz - 100.0).abs() < 0.5);
        match est.estimate() {
            Some(RefreshRateEstimate::Measured { window, .. }) => assert_eq!(window.len(), 10),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn warm_up_gaps_do_not_count() {
        let mut est = RefreshEstimator::new(RefreshParams::default()).unwrap();
        let mut intervals = vec![100.0; 10];
        intervals.extend(std::iter::repeat(16.0).take(20));
        run(&mut est, intervals);
        assert!(matches!(est.state(), EstimatorState::Converged { .. }));
    }

    #[test]
    fn gives_up_after_budget() {
        let p = RefreshParams { n_warm_up: 0, n_max_frames: 30, ..Default::default() };
        let mut est = RefreshEstimator::new(p).unwrap();
        let alternating = (0..).map(|i| if i % 2 == 0 { 5.0 } else { 20.0 });
        let swaps = run(&mut est, alternating.take(1000));
        assert_eq!(swaps, 30);
        assert_eq!(est.estimate(), Some(RefreshRateEstimate::Unmeasurable));
    }

    #[test]
    fn terminal_states_ignore_swaps() {
        let p = RefreshParams { n_warm_up: 0, n_identical: 2, n_max_frames: 2, ..Default::default() };
        let mut est = RefreshEstimator::new(p).unwrap();
        run(&mut est, [10.0, 10.0]);
        let done = est.state();
        assert!(done.is_terminal());
        assert_eq!(est.on_swap(ms(999.0)), done);
    }

    #[test]
    fn rebase_hides_gap_without_advancing() {
        let p = RefreshParams { n_warm_up: 0, n_identical: 3, n_max_frames: 10, ..Default::default() };
        let mut est = RefreshEstimator::new(p).unwrap();
        est.start(Duration::ZERO);
        est.on_swap(ms(10.0));
        est.on_swap(ms(20.0));

        est.rebase(ms(30.0));
        assert_eq!(est.state(), EstimatorState::Sampling { swaps: 2 });

        assert!(est.on_swap(ms(40.0)).is_terminal());
        assert!((est.estimate().unwrap().hz().unwrap() - 100.0).abs() < 1e-6);
    }

    #[test]
    fn start_is_noop_after_run() {
        let p = RefreshParams { n_warm_up: 0, n_identical: 1, n_max_frames: 1, ..Default::default() };
        let mut est = RefreshEstimator::new(p).unwrap();
        run(&mut est, [10.0]);
        est.start(Duration::ZERO);
        assert!(est.state().is_terminal());
    }
}
