/// Keeps a source's progress on its own 0–100 scale and never lets it go back.
///
/// Estimates get revised as pages reveal more jobs, which would otherwise make
/// the bar jump backwards.
#[derive(Debug, Default, Clone)]
pub struct ProgressTracker {
    last: f64,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> f64 {
        self.last
    }

    /// Records an estimate and returns the value to report.
    ///
    /// Estimates are held below 100 until [`finish`](Self::finish).
    pub fn advance(&mut self, estimate: f64) -> f64 {
        if estimate.is_finite() {
            self.last = self.last.max(estimate.clamp(0.0, 99.0));
        }
        self.last
    }

    pub fn finish(&mut self) -> f64 {
        self.last = 100.0;
        self.last
    }
}

/// `done / (done + remaining)` on a 0–100 scale.
pub fn percent(done: usize, remaining: usize) -> f64 {
    let total = done + remaining;
    if total == 0 {
        0.0
    } else {
        done as f64 / total as f64 * 100.0
    }
}

/// The slice of the overall 0–100 scale owned by one source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressRange {
    pub start: f64,
    pub end: f64,
}

impl ProgressRange {
    /// Equal slots, one per source, in run order.
    pub fn for_slot(index: usize, count: usize) -> Self {
        let count = count.max(1) as f64;
        let width = 100.0 / count;
        Self {
            start: width * index as f64,
            end: width * (index as f64 + 1.0),
        }
    }

    pub fn rescale(&self, local: f64) -> f64 {
        let local = local.clamp(0.0, 100.0);
        self.start + (self.end - self.start) * local / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracker_never_decreases() {
        let mut tracker = ProgressTracker::new();
        assert_eq!(tracker.advance(40.0), 40.0);
        assert_eq!(tracker.advance(25.0), 40.0);
        assert_eq!(tracker.advance(f64::NAN), 40.0);
        assert_eq!(tracker.advance(150.0), 99.0);
        assert_eq!(tracker.finish(), 100.0);
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(0, 0), 0.0);
        assert_eq!(percent(1, 3), 25.0);
        assert_eq!(percent(4, 0), 100.0);
    }

    #[test]
    fn test_two_slots_split_the_scale() {
        let first = ProgressRange::for_slot(0, 2);
        let second = ProgressRange::for_slot(1, 2);
        assert_eq!(first.rescale(0.0), 0.0);
        assert_eq!(first.rescale(100.0), 50.0);
        assert_eq!(second.rescale(0.0), 50.0);
        assert_eq!(second.rescale(50.0), 75.0);
        assert_eq!(second.rescale(100.0), 100.0);
    }

    #[test]
    fn test_single_slot_spans_everything() {
        let only = ProgressRange::for_slot(0, 1);
        assert_eq!(only.rescale(0.0), 0.0);
        assert_eq!(only.rescale(100.0), 100.0);
    }
}
