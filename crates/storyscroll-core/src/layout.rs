//! Pinned-region measurement and scroll extent computation

use crate::{Error, Result};

/// Raw layout numbers reported by the host, in scroll units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurements {
    /// Scroll offset at which the pinned element's top meets the viewport top
    pub pin_start: f64,
    /// Height of the pinned element
    pub pinned_height: f64,
    /// Height of the viewport
    pub viewport_height: f64,
}

impl Measurements {
    pub fn new(pin_start: f64, pinned_height: f64, viewport_height: f64) -> Self {
        Self {
            pin_start,
            pinned_height,
            viewport_height,
        }
    }

    fn is_usable(&self) -> bool {
        self.pin_start.is_finite()
            && self.pinned_height.is_finite()
            && self.pinned_height >= 0.0
            && self.viewport_height.is_finite()
            && self.viewport_height > 0.0
    }
}

/// Measuring surface provided by the host
pub trait Viewport {
    /// Current measurements, or `None` while the pinned element is not laid out
    fn measure(&self) -> Option<Measurements>;

    /// Whether the host reports size changes of the pinned element itself.
    /// Without it, only window resizes trigger a remeasure.
    fn observes_content_size(&self) -> bool {
        false
    }
}

impl Viewport for Measurements {
    fn measure(&self) -> Option<Measurements> {
        Some(*self)
    }
}

impl Viewport for Option<Measurements> {
    fn measure(&self) -> Option<Measurements> {
        *self
    }
}

/// Scroll distance needed to traverse every step
///
/// One viewport per step beyond the first, minus the pinned element's own
/// height, floored at `min_extent_ratio` of a viewport and never negative.
pub fn compute_extent(step_count: usize, m: &Measurements, min_extent_ratio: f64) -> f64 {
    let per_step = step_count.saturating_sub(1) as f64 * m.viewport_height - m.pinned_height;
    let floor = (m.viewport_height * min_extent_ratio).round();
    per_step.max(floor).max(0.0)
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MeasureOutcome {
    /// Same measurements as last time; nothing downstream needs updating
    Unchanged,
    Changed { pin_start: f64, extent: f64 },
}

#[derive(Debug, Clone)]
pub struct LayoutMetrics {
    step_count: usize,
    min_extent_ratio: f64,
    last: Option<Measurements>,
    extent: Option<f64>,
}

impl LayoutMetrics {
    pub fn new(step_count: usize, min_extent_ratio: f64) -> Self {
        Self {
            step_count,
            min_extent_ratio,
            last: None,
            extent: None,
        }
    }

    /// Take a new measurement and recompute the extent
    ///
    /// Unusable measurements are reported as `MeasurementUnavailable` and leave
    /// the previous state untouched so the next trigger can retry.
    pub fn remeasure(&mut self, measured: Option<Measurements>) -> Result<MeasureOutcome> {
        let m = measured.ok_or(Error::MeasurementUnavailable("pinned element is not laid out"))?;
        if !m.is_usable() {
            return Err(Error::MeasurementUnavailable(
                "pinned element reported non-finite or empty dimensions",
            ));
        }

        if self.last == Some(m) {
            return Ok(MeasureOutcome::Unchanged);
        }

        let extent = compute_extent(self.step_count, &m, self.min_extent_ratio);
        let previous_start = self.last.map(|last| last.pin_start);
        self.last = Some(m);
        // A different measurement can still produce the same region
        if previous_start == Some(m.pin_start) && self.extent == Some(extent) {
            return Ok(MeasureOutcome::Unchanged);
        }

        tracing::debug!(
            pinned_height = m.pinned_height,
            viewport_height = m.viewport_height,
            extent,
            "remeasured pinned region"
        );
        self.extent = Some(extent);
        Ok(MeasureOutcome::Changed {
            pin_start: m.pin_start,
            extent,
        })
    }

    pub fn extent(&self) -> Option<f64> {
        self.extent
    }

    pub fn measurements(&self) -> Option<Measurements> {
        self.last
    }

    pub fn step_count(&self) -> usize {
        self.step_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extent_one_viewport_per_extra_step() {
        let m = Measurements::new(0.0, 200.0, 800.0);
        // (4 - 1) * 800 - 200
        assert_eq!(compute_extent(4, &m, 0.35), 2200.0);
    }

    #[test]
    fn test_extent_floor_for_few_steps() {
        let m = Measurements::new(0.0, 600.0, 800.0);
        // 1 * 800 - 600 = 200 < round(800 * 0.35) = 280
        assert_eq!(compute_extent(2, &m, 0.35), 280.0);
        // A single step still gets a scrollable region
        assert_eq!(compute_extent(1, &m, 0.35), 280.0);
    }

    #[test]
    fn test_extent_never_negative() {
        let m = Measurements::new(0.0, 5000.0, 800.0);
        assert_eq!(compute_extent(2, &m, 0.0), 0.0);
    }

    #[test]
    fn test_extent_floor_rounds() {
        let m = Measurements::new(0.0, 1000.0, 101.0);
        // 101 * 0.35 = 35.35
        assert_eq!(compute_extent(1, &m, 0.35), 35.0);
    }

    #[test]
    fn test_remeasure_is_idempotent() {
        let mut layout = LayoutMetrics::new(3, 0.35);
        let m = Measurements::new(100.0, 300.0, 800.0);

        let first = layout.remeasure(Some(m)).unwrap();
        assert_eq!(
            first,
            MeasureOutcome::Changed {
                pin_start: 100.0,
                extent: 1300.0
            }
        );
        assert_eq!(layout.remeasure(Some(m)).unwrap(), MeasureOutcome::Unchanged);
        assert_eq!(layout.extent(), Some(1300.0));
    }

    #[test]
    fn test_same_extent_from_new_measurement_is_unchanged() {
        let mut layout = LayoutMetrics::new(2, 0.35);
        layout.remeasure(Some(Measurements::new(0.0, 600.0, 800.0))).unwrap();
        assert_eq!(layout.extent(), Some(280.0));

        // Still clamped to round(800 * 0.35)
        let taller = Measurements::new(0.0, 700.0, 800.0);
        assert_eq!(layout.remeasure(Some(taller)).unwrap(), MeasureOutcome::Unchanged);
        assert_eq!(layout.measurements(), Some(taller));
        assert_eq!(layout.extent(), Some(280.0));

        let moved = Measurements::new(40.0, 700.0, 800.0);
        assert_eq!(
            layout.remeasure(Some(moved)).unwrap(),
            MeasureOutcome::Changed {
                pin_start: 40.0,
                extent: 280.0
            }
        );
    }

    #[test]
    fn test_unavailable_measurement_keeps_previous_state() {
        let mut layout = LayoutMetrics::new(3, 0.35);
        assert!(matches!(
            layout.remeasure(None),
            Err(Error::MeasurementUnavailable(_))
        ));
        assert_eq!(layout.extent(), None);

        let m = Measurements::new(0.0, 300.0, 800.0);
        layout.remeasure(Some(m)).unwrap();
        let zero_viewport = Measurements::new(0.0, 300.0, 0.0);
        assert!(matches!(
            layout.remeasure(Some(zero_viewport)),
            Err(Error::MeasurementUnavailable(_))
        ));
        assert_eq!(layout.measurements(), Some(m));
    }

    #[test]
    fn test_viewport_impls() {
        let m = Measurements::new(0.0, 1.0, 2.0);
        assert_eq!(m.measure(), Some(m));
        assert_eq!(None::<Measurements>.measure(), None);
        assert!(!m.observes_content_size());
    }
}
