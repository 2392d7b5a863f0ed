//! Animation primitives shared by the crossfade buffer and the text reveal
//!
//! - `easing` - pure easing curves mapping [0, 1] to [0, 1]
//! - `timing` - elapsed-time progress and interpolation helpers
//! - `handle` - cancelable, clock-driven animation handles
//!
//! Nothing here reads the wall clock: every sampling call takes the frame's
//! `now`, so the host's frame tick is the only clock.

pub mod easing;
pub mod handle;
pub mod timing;

pub use crate::config::EasingType;
pub use handle::{AnimationHandle, AnimationId, AnimationIds, HandleState};
