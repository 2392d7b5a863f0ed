//! Cancelable animation handles
//!
//! A handle owns the timing of one in-flight transition. It is advanced by the
//! host's frame tick and never schedules anything by itself, so dropping or
//! canceling it leaves nothing behind.

use std::fmt;
use std::time::{Duration, Instant};

use super::timing::{is_complete, progress};
use crate::config::EasingType;

/// Identifier of an animation handle, unique per allocator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnimationId(u64);

impl fmt::Display for AnimationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "anim#{}", self.0)
    }
}

/// Monotonic id source for animation handles
#[derive(Debug, Default)]
pub struct AnimationIds {
    next: u64,
}

impl AnimationIds {
    pub fn next_id(&mut self) -> AnimationId {
        self.next += 1;
        AnimationId(self.next)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    Running,
    Finished,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct AnimationHandle {
    id: AnimationId,
    start: Instant,
    duration: Duration,
    easing: EasingType,
    state: HandleState,
}

impl AnimationHandle {
    /// Start a new running animation at `now`
    pub fn start(id: AnimationId, now: Instant, duration: Duration, easing: EasingType) -> Self {
        Self {
            id,
            start: now,
            duration,
            easing,
            state: HandleState::Running,
        }
    }

    #[inline]
    pub fn id(&self) -> AnimationId {
        self.id
    }

    #[inline]
    pub fn state(&self) -> HandleState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == HandleState::Running
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Time since the handle started, as seen from `now`
    pub fn elapsed(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.start)
    }

    /// Eased progress at `now` without changing state
    ///
    /// A finished handle samples as 1.0, a canceled one as 0.0.
    pub fn sample(&self, now: Instant) -> f64 {
        match self.state {
            HandleState::Running => self.easing.apply(progress(self.start, self.duration, now)),
            HandleState::Finished => 1.0,
            HandleState::Cancelled => 0.0,
        }
    }

    /// Advance to `now`, finishing the handle once its duration has elapsed
    ///
    /// Returns the eased progress after advancing.
    pub fn advance(&mut self, now: Instant) -> f64 {
        if self.state == HandleState::Running && is_complete(self.start, self.duration, now) {
            self.state = HandleState::Finished;
        }
        self.sample(now)
    }

    /// Jump straight to the end of the animation
    pub fn finish(&mut self) {
        if self.state == HandleState::Running {
            self.state = HandleState::Finished;
        }
    }

    /// Cancel the animation. Safe to call any number of times, from any state.
    ///
    /// Returns true only when this call stopped a running animation.
    pub fn cancel(&mut self) -> bool {
        if self.state == HandleState::Running {
            self.state = HandleState::Cancelled;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(now: Instant) -> AnimationHandle {
        let mut ids = AnimationIds::default();
        AnimationHandle::start(ids.next_id(), now, Duration::from_millis(200), EasingType::Linear)
    }

    #[test]
    fn test_ids_are_unique() {
        let mut ids = AnimationIds::default();
        let a = ids.next_id();
        let b = ids.next_id();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn test_advance_finishes() {
        let t0 = Instant::now();
        let mut h = handle(t0);
        assert!((h.advance(t0 + Duration::from_millis(50)) - 0.25).abs() < 1e-9);
        assert!(h.is_running());
        assert_eq!(h.advance(t0 + Duration::from_millis(200)), 1.0);
        assert_eq!(h.state(), HandleState::Finished);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let t0 = Instant::now();
        let mut h = handle(t0);
        assert!(h.cancel());
        assert!(!h.cancel());
        assert_eq!(h.state(), HandleState::Cancelled);
        // A canceled handle never comes back to life
        assert_eq!(h.advance(t0 + Duration::from_secs(1)), 0.0);
        assert_eq!(h.state(), HandleState::Cancelled);
    }

    #[test]
    fn test_cancel_after_finish_is_noop() {
        let t0 = Instant::now();
        let mut h = handle(t0);
        h.finish();
        assert!(!h.cancel());
        assert_eq!(h.state(), HandleState::Finished);
    }
}
