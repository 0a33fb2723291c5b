/// Summary of frame durations, in milliseconds.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameTimeStats {
    pub mean_ms: f64,
    pub std_ms: f64,
    /// Mean of the frame times around the median; a robust refresh period.
    pub median_ms: f64,
}

/// Number of sorted frame times averaged around the median.
pub(crate) const MEDIAN_SPAN: usize = 12;

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
pub(crate) fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

impl FrameTimeStats {
    /// Builds the summary from frame durations in seconds.
    pub(crate) fn from_secs(frame_secs: &[f64]) -> Self {
        let mut sorted = frame_secs.to_vec();
        sorted.sort_by(f64::total_cmp);

        let n = sorted.len();
        let span = MEDIAN_SPAN.min(n);
        let start = (n - span) / 2;
        let median = mean(&sorted[start..start + span]);

        Self {
            mean_ms: mean(frame_secs) * 1000.0,
            std_ms: std_dev(frame_secs) * 1000.0,
            median_ms: median * 1000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn std_dev_is_population() {
        let v = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((std_dev(&v) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn empty_inputs_are_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(std_dev(&[]), 0.0);
    }

    #[test]
    fn median_ignores_outliers() {
        let mut frames = vec![0.010; 59];
        frames[3] = 0.050;
        frames[40] = 0.001;
        let s = FrameTimeStats::from_secs(&frames);
        assert!((s.median_ms - 10.0).abs() < 1e-9);
        assert!(s.mean_ms > 10.0);
        assert!(s.std_ms > 0.0);
    }

    #[test]
    fn short_inputs_use_all_values() {
        let s = FrameTimeStats::from_secs(&[0.010, 0.020]);
        assert!((s.median_ms - 15.0).abs() < 1e-9);
    }
}
