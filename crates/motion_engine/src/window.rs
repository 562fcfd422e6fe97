//! Sliding-window motion analysis.

use std::collections::VecDeque;

/// Sliding time window over `(timestamp, is_motion)` samples
///
/// A push at `t` evicts everything at or before `t - window` from the oldest
/// end, then admits the new sample.
#[derive(Debug, Clone)]
pub struct MotionWindow {
    samples: VecDeque<(i64, bool)>,
    window: i64,
    sum: u64,
}

impl MotionWindow {
    /// Create an empty window of `window` timestamp units
    pub fn new(window: i64) -> Self {
        Self {
            samples: VecDeque::new(),
            window,
            sum: 0,
        }
    }

    /// Admit one sample, evicting expired ones first
    pub fn push(&mut self, timestamp: i64, is_motion: bool) {
        let cutoff = timestamp.saturating_sub(self.window);
        while let Some(&(ts, motion)) = self.samples.front() {
            if ts > cutoff {
                break;
            }
            self.samples.pop_front();
            if motion {
                self.sum -= 1;
            }
        }

        self.samples.push_back((timestamp, is_motion));
        if is_motion {
            self.sum += 1;
        }
    }

    /// Motion-flagged samples in the window
    #[inline]
    pub fn sum(&self) -> u64 {
        self.sum
    }

    /// All samples in the window
    #[inline]
    pub fn count(&self) -> u64 {
        self.samples.len() as u64
    }

    /// `100 * sum / count`, truncated; `None` for an empty window
    #[inline]
    pub fn percentage(&self) -> Option<u64> {
        let count = self.count();
        (count > 0).then(|| 100 * self.sum / count)
    }

    /// Whether the motion percentage meets `threshold_percent`
    ///
    /// An empty window never triggers.
    #[inline]
    pub fn meets(&self, threshold_percent: u8) -> bool {
        self.percentage()
            .is_some_and(|pct| pct >= u64::from(threshold_percent))
    }

    /// Drain all samples, keeping the configured window length
    pub fn reset(&mut self) {
        self.samples.clear();
        self.sum = 0;
    }

    /// Reconfigure the window length; applies from the next push
    pub fn set_window(&mut self, window: i64) {
        self.window = window;
    }

    /// Configured window length
    pub fn window(&self) -> i64 {
        self.window
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_scenario() {
        let mut window = MotionWindow::new(10);
        for t in 0..5 {
            window.push(t, false);
            assert!(!window.meets(50));
        }

        window.push(5, true);
        assert_eq!((window.sum(), window.count()), (1, 6));
        assert_eq!(window.percentage(), Some(16));
        assert!(!window.meets(50));

        for t in 6..=8 {
            window.push(t, true);
        }
        assert_eq!((window.sum(), window.count()), (4, 9));
        assert_eq!(window.percentage(), Some(44));
        assert!(!window.meets(50));

        window.push(9, true);
        assert_eq!((window.sum(), window.count()), (5, 10));
        assert_eq!(window.percentage(), Some(50));
        assert!(window.meets(50));
    }

    #[test]
    fn test_boundary_sample_is_evicted() {
        let mut window = MotionWindow::new(10);
        window.push(0, true);
        window.push(9, false);
        assert_eq!(window.count(), 2);

        // 10 - 10 = 0: the sample at exactly the trailing edge goes
        window.push(10, false);
        assert_eq!(window.count(), 2);
        assert_eq!(window.sum(), 0);
    }

    #[test]
    fn test_empty_window() {
        let window = MotionWindow::new(10);
        assert_eq!(window.percentage(), None);
        assert!(!window.meets(0));
    }

    #[test]
    fn test_reset_keeps_window() {
        let mut window = MotionWindow::new(7);
        window.push(1, true);
        window.push(2, true);
        window.reset();
        assert_eq!(window.count(), 0);
        assert_eq!(window.sum(), 0);
        assert_eq!(window.window(), 7);
    }

    #[test]
    fn test_set_window_applies_on_next_push() {
        let mut window = MotionWindow::new(100);
        for t in 0..10 {
            window.push(t, t % 2 == 0);
        }
        window.set_window(3);
        assert_eq!(window.count(), 10);

        window.push(10, true);
        // keeps 8, 9, 10
        assert_eq!(window.count(), 3);
        assert_eq!(window.sum(), 2);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let run = || {
            let mut window = MotionWindow::new(5);
            let mut results = Vec::new();
            for t in 0..20 {
                window.push(t, t % 3 == 0);
                results.push(window.meets(34));
            }
            results
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_zero_threshold_triggers_on_any_sample() {
        let mut window = MotionWindow::new(5);
        window.push(0, false);
        assert!(window.meets(0));
    }
}
