//! Fade-and-slide reveal of the step text
//!
//! The text block has a fixed number of elements (heading, body, step counter).
//! Each one fades in and slides from `reveal_offset` to 0, starting
//! `reveal_stagger` after the previous one. A new step change cancels the
//! running reveal and starts over.

use std::time::{Duration, Instant};

use crate::config::{EasingType, MotionConfig};
use crate::motion::timing::lerp;
use crate::motion::{AnimationHandle, AnimationId, AnimationIds};

/// Heading, body, step counter
pub const TEXT_ELEMENTS: usize = 3;

/// Visual state of one text element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealFrame {
    pub opacity: f64,
    /// Distance below the resting position
    pub offset_y: f64,
}

impl RevealFrame {
    pub const REST: Self = Self {
        opacity: 1.0,
        offset_y: 0.0,
    };

    fn hidden(offset: f64) -> Self {
        Self {
            opacity: 0.0,
            offset_y: offset,
        }
    }

    pub fn is_rest(&self) -> bool {
        *self == Self::REST
    }
}

pub struct RevealAnimator {
    handle: Option<AnimationHandle>,
    ids: AnimationIds,
    step: usize,
    duration: Duration,
    stagger: Duration,
    easing: EasingType,
    offset_from: f64,
    frames: Vec<RevealFrame>,
    reduced_motion: bool,
}

impl RevealAnimator {
    pub fn new(motion: &MotionConfig) -> Self {
        Self::with_elements(motion, TEXT_ELEMENTS)
    }

    pub fn with_elements(motion: &MotionConfig, element_count: usize) -> Self {
        Self {
            handle: None,
            ids: AnimationIds::default(),
            step: 0,
            duration: motion.reveal_duration(),
            stagger: motion.reveal_stagger(),
            easing: motion.reveal_easing,
            offset_from: motion.reveal_offset,
            frames: vec![RevealFrame::REST; element_count.max(1)],
            reduced_motion: motion.reduced_motion,
        }
    }

    /// Restart the reveal for `step`
    pub fn on_step_change(&mut self, step: usize, now: Instant) {
        self.cancel();
        self.step = step;
        if self.reduced_motion {
            self.settle();
            return;
        }

        let stagger_total = self.stagger * (self.frames.len() as u32 - 1);
        let handle = AnimationHandle::start(
            self.ids.next_id(),
            now,
            self.duration + stagger_total,
            EasingType::Linear,
        );
        tracing::trace!(id = %handle.id(), step, "text reveal started");
        self.handle = Some(handle);
        let hidden = RevealFrame::hidden(self.offset_from);
        self.frames.iter_mut().for_each(|frame| *frame = hidden);
        self.tick(now);
    }

    /// Advance to `now`. Returns true while the reveal is still running.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(handle) = self.handle.as_mut() else {
            return false;
        };
        if !handle.is_running() {
            return false;
        }
        handle.advance(now);
        let elapsed = handle.elapsed(now);
        let running = handle.is_running();

        if !running {
            self.frames.iter_mut().for_each(|frame| *frame = RevealFrame::REST);
            return false;
        }

        for (i, frame) in self.frames.iter_mut().enumerate() {
            let delay = self.stagger * i as u32;
            let local = if self.duration.is_zero() {
                if elapsed >= delay { 1.0 } else { 0.0 }
            } else {
                elapsed.saturating_sub(delay).as_secs_f64() / self.duration.as_secs_f64()
            };
            let eased = self.easing.apply(local.clamp(0.0, 1.0));
            *frame = RevealFrame {
                opacity: eased,
                offset_y: lerp(self.offset_from, 0.0, eased),
            };
        }
        true
    }

    /// Stop the running reveal where it is. Returns true if one was running.
    pub fn cancel(&mut self) -> bool {
        self.handle.as_mut().is_some_and(AnimationHandle::cancel)
    }

    /// Stop any reveal and put every element at rest
    pub fn settle(&mut self) {
        self.cancel();
        self.frames.iter_mut().for_each(|frame| *frame = RevealFrame::REST);
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        self.reduced_motion = reduced;
        if reduced {
            self.settle();
        }
    }

    pub fn frame(&self, element: usize) -> RevealFrame {
        self.frames.get(element).copied().unwrap_or(RevealFrame::REST)
    }

    pub fn frames(&self) -> &[RevealFrame] {
        &self.frames
    }

    pub fn is_animating(&self) -> bool {
        self.handle.as_ref().is_some_and(AnimationHandle::is_running)
    }

    pub fn live_animation(&self) -> Option<AnimationId> {
        self.handle
            .as_ref()
            .filter(|handle| handle.is_running())
            .map(AnimationHandle::id)
    }

    /// Step whose text is being revealed
    pub fn step(&self) -> usize {
        self.step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn animator(reduced_motion: bool) -> RevealAnimator {
        RevealAnimator::new(&MotionConfig {
            reveal_duration_ms: 400,
            reveal_stagger_ms: 120,
            reveal_easing: EasingType::Linear,
            reveal_offset: 20.0,
            reduced_motion,
            ..Default::default()
        })
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_starts_at_rest() {
        let reveal = animator(false);
        assert!(reveal.frames().iter().all(RevealFrame::is_rest));
        assert!(!reveal.is_animating());
        assert_eq!(reveal.frames().len(), TEXT_ELEMENTS);
    }

    #[test]
    fn test_staggered_reveal() {
        let t0 = Instant::now();
        let mut reveal = animator(false);
        reveal.on_step_change(1, t0);
        assert_eq!(reveal.frame(0), RevealFrame::hidden(20.0));

        assert!(reveal.tick(t0 + ms(200)));
        assert!((reveal.frame(0).opacity - 0.5).abs() < 1e-9);
        assert!((reveal.frame(0).offset_y - 10.0).abs() < 1e-9);
        assert!((reveal.frame(1).opacity - 0.2).abs() < 1e-9);
        assert_eq!(reveal.frame(2).opacity, 0.0);

        // duration + 2 * stagger
        assert!(!reveal.tick(t0 + ms(640)));
        assert!(reveal.frames().iter().all(RevealFrame::is_rest));
        assert!(reveal.live_animation().is_none());
    }

    #[test]
    fn test_new_step_cancels_and_restarts() {
        let t0 = Instant::now();
        let mut reveal = animator(false);
        reveal.on_step_change(1, t0);
        reveal.tick(t0 + ms(300));
        let first = reveal.live_animation().unwrap();

        reveal.on_step_change(2, t0 + ms(310));
        let second = reveal.live_animation().unwrap();
        assert_ne!(first, second);
        assert_eq!(reveal.step(), 2);
        assert_eq!(reveal.frame(0).opacity, 0.0);
    }

    #[test]
    fn test_reduced_motion_is_at_rest() {
        let t0 = Instant::now();
        let mut reveal = animator(true);
        reveal.on_step_change(3, t0);
        assert!(!reveal.is_animating());
        assert!(reveal.frames().iter().all(RevealFrame::is_rest));
    }

    #[test]
    fn test_enabling_reduced_motion_settles() {
        let t0 = Instant::now();
        let mut reveal = animator(false);
        reveal.on_step_change(1, t0);
        reveal.set_reduced_motion(true);
        assert!(!reveal.is_animating());
        assert!(reveal.frames().iter().all(RevealFrame::is_rest));
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let t0 = Instant::now();
        let mut reveal = animator(false);
        assert!(!reveal.cancel());
        reveal.on_step_change(1, t0);
        assert!(reveal.cancel());
        assert!(!reveal.cancel());
        assert!(!reveal.tick(t0 + ms(100)));
    }
}
