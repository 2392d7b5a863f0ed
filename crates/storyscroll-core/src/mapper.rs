//! Discretization of continuous progress into step indices

/// Index transition emitted by the mapper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepChange {
    pub from: usize,
    pub to: usize,
}

impl StepChange {
    pub fn is_forward(&self) -> bool {
        self.to > self.from
    }

    /// Number of steps crossed in one update
    pub fn distance(&self) -> usize {
        self.from.abs_diff(self.to)
    }
}

/// `min(step_count - 1, floor(progress * step_count))`
///
/// Out-of-range progress is clamped; NaN maps to the first step.
pub fn index_for_progress(progress: f64, step_count: usize) -> usize {
    if step_count == 0 || progress.is_nan() {
        return 0;
    }
    let p = progress.clamp(0.0, 1.0);
    ((p * step_count as f64).floor() as usize).min(step_count - 1)
}

/// Rounded percentage shown next to the progress indicator
pub fn display_percent(progress: f64) -> u8 {
    if progress.is_nan() {
        return 0;
    }
    (progress.clamp(0.0, 1.0) * 100.0).round() as u8
}

#[derive(Debug, Clone)]
pub struct StepIndexMapper {
    step_count: usize,
    current: usize,
}

impl StepIndexMapper {
    pub fn new(step_count: usize) -> Self {
        Self {
            step_count: step_count.max(1),
            current: 0,
        }
    }

    /// Map progress to an index, reporting a change only when the index moves
    pub fn on_progress(&mut self, progress: f64) -> Option<StepChange> {
        let next = index_for_progress(progress, self.step_count);
        if next == self.current {
            return None;
        }
        let change = StepChange {
            from: self.current,
            to: next,
        };
        self.current = next;
        Some(change)
    }

    /// Position inside the current step's share of the region, in [0, 1]
    pub fn step_local_progress(&self, progress: f64) -> f64 {
        if progress.is_nan() {
            return 0.0;
        }
        let scaled = progress.clamp(0.0, 1.0) * self.step_count as f64;
        (scaled - index_for_progress(progress, self.step_count) as f64).clamp(0.0, 1.0)
    }

    /// Progress at which `index` becomes the current step
    pub fn step_start(&self, index: usize) -> f64 {
        index.min(self.step_count - 1) as f64 / self.step_count as f64
    }

    #[inline]
    pub fn current(&self) -> usize {
        self.current
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discrete_mapping_four_steps() {
        assert_eq!(index_for_progress(0.0, 4), 0);
        assert_eq!(index_for_progress(0.26, 4), 1);
        assert_eq!(index_for_progress(0.99, 4), 3);
        assert_eq!(index_for_progress(1.0, 4), 3);
    }

    #[test]
    fn test_mapping_is_monotonic() {
        let mut prev = 0;
        for i in 0..=1000 {
            let idx = index_for_progress(i as f64 / 1000.0, 7);
            assert!(idx >= prev);
            assert!(idx < 7);
            prev = idx;
        }
    }

    #[test]
    fn test_out_of_range_progress() {
        assert_eq!(index_for_progress(-0.5, 3), 0);
        assert_eq!(index_for_progress(1.5, 3), 2);
        assert_eq!(index_for_progress(f64::NAN, 3), 0);
    }

    #[test]
    fn test_no_event_for_same_index() {
        let mut mapper = StepIndexMapper::new(4);
        assert_eq!(mapper.on_progress(0.1), None);
        assert_eq!(mapper.on_progress(0.2), None);
        assert_eq!(
            mapper.on_progress(0.3),
            Some(StepChange { from: 0, to: 1 })
        );
        assert_eq!(mapper.on_progress(0.3), None);
        assert_eq!(mapper.on_progress(0.49), None);
        assert_eq!(mapper.current(), 1);
    }

    #[test]
    fn test_fast_scroll_jumps_directly() {
        let mut mapper = StepIndexMapper::new(5);
        let change = mapper.on_progress(0.95).unwrap();
        assert_eq!(change, StepChange { from: 0, to: 4 });
        assert_eq!(change.distance(), 4);
        assert!(change.is_forward());

        let back = mapper.on_progress(0.0).unwrap();
        assert_eq!(back, StepChange { from: 4, to: 0 });
        assert!(!back.is_forward());
    }

    #[test]
    fn test_step_local_progress() {
        let mapper = StepIndexMapper::new(4);
        assert!((mapper.step_local_progress(0.125) - 0.5).abs() < 1e-9);
        assert!((mapper.step_local_progress(0.375) - 0.5).abs() < 1e-9);
        assert_eq!(mapper.step_local_progress(1.0), 1.0);
        assert_eq!(mapper.step_local_progress(0.0), 0.0);
    }

    #[test]
    fn test_display_percent_uses_same_progress() {
        assert_eq!(display_percent(0.0), 0);
        assert_eq!(display_percent(0.254), 25);
        assert_eq!(display_percent(0.255), 26);
        assert_eq!(display_percent(1.0), 100);
        assert_eq!(display_percent(3.0), 100);
    }

    #[test]
    fn test_step_start() {
        let mapper = StepIndexMapper::new(4);
        assert_eq!(mapper.step_start(0), 0.0);
        assert_eq!(mapper.step_start(2), 0.5);
        assert_eq!(mapper.step_start(9), 0.75);
        assert_eq!(index_for_progress(mapper.step_start(3), 4), 3);
    }
}
