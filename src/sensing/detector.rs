use super::source::MotionSample;

/// Acceleration magnitude (including gravity) a sample must exceed to count as
/// a step peak. Roughly one g plus margin.
pub const STEP_THRESHOLD: f64 = 11.0;

/// Minimum spacing between two registered steps.
pub const STEP_DEBOUNCE_MS: u64 = 400;

/// Threshold-and-debounce peak detector. Approximate by nature.
#[derive(Debug, Clone)]
pub struct StepDetector {
    threshold: f64,
    debounce_ms: u64,
    steps: u32,
    last_step_at_ms: Option<u64>,
}

impl Default for StepDetector {
    fn default() -> Self {
        Self::new(STEP_THRESHOLD, STEP_DEBOUNCE_MS)
    }
}

impl StepDetector {
    pub fn new(threshold: f64, debounce_ms: u64) -> Self {
        Self {
            threshold,
            debounce_ms,
            steps: 0,
            last_step_at_ms: None,
        }
    }

    /// Feeds one sample; returns the new cumulative count when it registers a step.
    pub fn observe(&mut self, sample: &MotionSample) -> Option<u32> {
        if sample.magnitude() <= self.threshold {
            return None;
        }

        let debounced = self
            .last_step_at_ms
            .is_some_and(|last| sample.timestamp_ms.saturating_sub(last) < self.debounce_ms);
        if debounced {
            return None;
        }

        self.steps += 1;
        self.last_step_at_ms = Some(sample.timestamp_ms);
        Some(self.steps)
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    pub fn reset(&mut self) {
        self.steps = 0;
        self.last_step_at_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peak(at_ms: u64) -> MotionSample {
        MotionSample::new(3.0, 4.0, 11.0, at_ms)
    }

    #[test]
    fn test_first_peak_counts() {
        let mut detector = StepDetector::default();
        assert_eq!(detector.observe(&peak(0)), Some(1));
    }

    #[test]
    fn test_peaks_closer_than_debounce_count_once() {
        let mut detector = StepDetector::default();
        assert_eq!(detector.observe(&peak(1_000)), Some(1));
        assert_eq!(detector.observe(&peak(1_250)), None);
        assert_eq!(detector.observe(&peak(1_399)), None);
        assert_eq!(detector.steps(), 1);
    }

    #[test]
    fn test_peaks_500ms_apart_both_count() {
        let mut detector = StepDetector::default();
        assert_eq!(detector.observe(&peak(1_000)), Some(1));
        assert_eq!(detector.observe(&peak(1_500)), Some(2));
    }

    #[test]
    fn test_rejected_peak_does_not_move_debounce_window() {
        let mut detector = StepDetector::default();
        detector.observe(&peak(0));
        assert_eq!(detector.observe(&peak(300)), None);
        // Measured from the registered step at 0, not the rejected one at 300.
        assert_eq!(detector.observe(&peak(400)), Some(2));
    }

    #[test]
    fn test_resting_device_never_steps() {
        let mut detector = StepDetector::default();
        for at in (0..5_000).step_by(20) {
            assert_eq!(detector.observe(&MotionSample::new(0.1, 0.2, 9.81, at)), None);
        }
        // Exactly at the threshold is not above it.
        assert_eq!(detector.observe(&MotionSample::new(0.0, 0.0, 11.0, 9_000)), None);
    }

    #[test]
    fn test_reset_clears_count_and_window() {
        let mut detector = StepDetector::default();
        detector.observe(&peak(100));
        detector.reset();
        assert_eq!(detector.steps(), 0);
        assert_eq!(detector.observe(&peak(120)), Some(1));
    }
}
