//! Mapping from raw scroll offset to normalized progress over the pinned extent

/// Where the scroll position sits relative to the pinned window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinState {
    /// Above the region; the element scrolls normally and progress is 0
    Before,
    /// Inside `[pin_start, pin_start + extent]`; the element is held in place
    Pinned,
    /// Past the region; the element scrolls normally and progress is 1
    After,
}

#[derive(Debug, Clone)]
pub struct ScrollRegion {
    pin_start: f64,
    extent: f64,
    raw_offset: f64,
    progress: f64,
}

/// `clamp((raw - pin_start) / extent, 0, 1)`, a step function when the extent is zero
fn progress_for(raw_offset: f64, pin_start: f64, extent: f64) -> f64 {
    if extent <= 0.0 {
        return if raw_offset >= pin_start { 1.0 } else { 0.0 };
    }
    ((raw_offset - pin_start) / extent).clamp(0.0, 1.0)
}

impl ScrollRegion {
    /// Create a region with the scroll position at its start and progress 0
    pub fn new(pin_start: f64, extent: f64) -> Self {
        Self {
            pin_start,
            extent: extent.max(0.0),
            raw_offset: pin_start,
            progress: 0.0,
        }
    }

    /// Feed a raw scroll offset and return the resulting progress
    ///
    /// Non-finite offsets are ignored.
    pub fn on_scroll_update(&mut self, raw_offset: f64) -> f64 {
        if raw_offset.is_finite() {
            self.raw_offset = raw_offset;
            self.progress = progress_for(raw_offset, self.pin_start, self.extent);
        }
        self.progress
    }

    /// Move the region's boundaries while keeping the current progress
    ///
    /// Returns the raw offset consistent with the preserved progress; the host
    /// should scroll there so the pinned content does not jump.
    pub fn rebound(&mut self, pin_start: f64, extent: f64) -> f64 {
        self.pin_start = pin_start;
        self.extent = extent.max(0.0);
        self.raw_offset = self.offset_for_progress(self.progress);
        self.raw_offset
    }

    /// Progress a raw offset would produce, without moving the region
    pub fn progress_at(&self, raw_offset: f64) -> f64 {
        progress_for(raw_offset, self.pin_start, self.extent)
    }

    /// Raw offset at which the region reaches `progress`
    pub fn offset_for_progress(&self, progress: f64) -> f64 {
        let p = if progress.is_nan() { 0.0 } else { progress.clamp(0.0, 1.0) };
        self.pin_start + p * self.extent
    }

    pub fn pin_state(&self) -> PinState {
        if self.raw_offset < self.pin_start {
            PinState::Before
        } else if self.raw_offset > self.pin_end() {
            PinState::After
        } else {
            PinState::Pinned
        }
    }

    #[inline]
    pub fn progress(&self) -> f64 {
        self.progress
    }

    #[inline]
    pub fn raw_offset(&self) -> f64 {
        self.raw_offset
    }

    pub fn pin_start(&self) -> f64 {
        self.pin_start
    }

    pub fn pin_end(&self) -> f64 {
        self.pin_start + self.extent
    }

    pub fn extent(&self) -> f64 {
        self.extent
    }
}
