use std::time::Duration;

/// Interval between two consecutive swap completions.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FrameIntervalSample {
    pub interval: Duration,
    /// Completion time of the second swap, relative to the surface clock origin.
    pub timestamp: Duration,
}

impl FrameIntervalSample {
    #[inline]
    pub fn secs(&self) -> f64 {
        self.interval.as_secs_f64()
    }
}

/// Outcome of one refresh-rate measurement.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshRateEstimate {
    /// A stable refresh rate was found.
    Measured {
        hz: f64,
        /// The trailing samples that satisfied the convergence criterion.
        window: Vec<FrameIntervalSample>,
    },
    /// No stable window appeared within the frame budget.
    ///
    /// Expected on systems without vsync or under heavy load; callers fall
    /// back to an assumed rate.
    Unmeasurable,
}

impl RefreshRateEstimate {
    pub fn hz(&self) -> Option<f64> {
        match self {
            RefreshRateEstimate::Measured { hz, .. } => Some(*hz),
            RefreshRateEstimate::Unmeasurable => None,
        }
    }

    pub fn period(&self) -> Option<Duration> {
        self.hz()
            .and_then(|hz| Duration::try_from_secs_f64(1.0 / hz).ok())
    }

    #[inline]
    pub fn is_measured(&self) -> bool {
        matches!(self, RefreshRateEstimate::Measured { .. })
    }
}
