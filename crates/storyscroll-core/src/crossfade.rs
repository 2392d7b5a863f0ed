//! Double-buffered image crossfade
//!
//! Two slots alternate between "active" (fully opaque) and "standby" (fully
//! transparent, drawn on top). A step change loads the new asset into the
//! standby slot and fades it in over the active one; when the fade finishes the
//! roles swap. Every slot mutation goes through the state machine below.

use std::sync::Arc;
use std::time::{Duration, Instant};

use image::DynamicImage;

use crate::asset::{AssetCompletion, AssetPipeline, LoadOutcome, LoadRequest, LoadTicket};
use crate::config::{EasingType, MotionConfig};
use crate::motion::timing::lerp;
use crate::motion::{AnimationHandle, AnimationId, AnimationIds};
use crate::story::AssetHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SlotId {
    A,
    B,
}

impl SlotId {
    pub fn other(self) -> Self {
        match self {
            SlotId::A => SlotId::B,
            SlotId::B => SlotId::A,
        }
    }

    fn index(self) -> usize {
        match self {
            SlotId::A => 0,
            SlotId::B => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Pending,
    Loaded,
    Failed,
}

/// One of the two alternating visual slots
#[derive(Debug, Clone)]
pub struct BufferSlot {
    asset: Option<AssetHandle>,
    image: Option<Arc<DynamicImage>>,
    opacity: f64,
    scale: f64,
    z_order: u8,
    load_state: LoadState,
    ticket: Option<LoadTicket>,
}

impl BufferSlot {
    fn new(opacity: f64, z_order: u8) -> Self {
        Self {
            asset: None,
            image: None,
            opacity,
            scale: 1.0,
            z_order,
            load_state: LoadState::Pending,
            ticket: None,
        }
    }

    pub fn asset(&self) -> Option<&AssetHandle> {
        self.asset.as_ref()
    }

    /// Decoded image, present once the slot's asset has loaded
    pub fn image(&self) -> Option<&Arc<DynamicImage>> {
        self.image.as_ref()
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// 1 for the active slot, 2 for standby (drawn on top)
    pub fn z_order(&self) -> u8 {
        self.z_order
    }

    pub fn load_state(&self) -> LoadState {
        self.load_state
    }

    fn assign(&mut self, asset: AssetHandle) {
        self.asset = Some(asset);
        self.image = None;
        self.load_state = LoadState::Pending;
        self.ticket = None;
    }

    fn holds(&self, asset: &AssetHandle) -> bool {
        self.asset.as_ref() == Some(asset)
    }

    fn set_pose(&mut self, opacity: f64, scale: f64) {
        self.opacity = opacity.clamp(0.0, 1.0);
        self.scale = scale;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossfadePhase {
    Idle,
    /// Waiting for the standby slot's asset
    Loading,
    Transitioning,
}

#[derive(Debug)]
enum Machine {
    Idle,
    Loading,
    Transitioning(AnimationHandle),
}

#[derive(Debug, Clone, PartialEq)]
pub enum CrossfadeEvent {
    /// The buffer reached rest showing `asset`; `fallback` when it got there by a snap after a failed load
    Settled { asset: AssetHandle, fallback: bool },
    AssetFailed { asset: AssetHandle, reason: String },
}

pub struct CrossfadeBuffer {
    slots: [BufferSlot; 2],
    active: SlotId,
    machine: Machine,
    target: Option<AssetHandle>,
    pipeline: AssetPipeline,
    ids: AnimationIds,
    duration: Duration,
    easing: EasingType,
    scale_from: f64,
    reduced_motion: bool,
    disposed: bool,
}

impl CrossfadeBuffer {
    pub fn new(pipeline: AssetPipeline, motion: &MotionConfig) -> Self {
        Self {
            slots: [BufferSlot::new(1.0, 1), BufferSlot::new(0.0, 2)],
            active: SlotId::A,
            machine: Machine::Idle,
            target: None,
            pipeline,
            ids: AnimationIds::default(),
            duration: motion.crossfade_duration(),
            easing: motion.crossfade_easing,
            scale_from: motion.crossfade_scale_from,
            reduced_motion: motion.reduced_motion,
            disposed: false,
        }
    }

    /// Assign the first two assets: `first` active and visible, `second` on standby
    pub fn preload(&mut self, first: &AssetHandle, second: &AssetHandle) -> Vec<CrossfadeEvent> {
        if self.disposed {
            return Vec::new();
        }
        self.cancel_transition();
        self.active = SlotId::A;
        self.target = Some(first.clone());
        self.machine = Machine::Idle;
        self.snap_to_rest();

        let mut events = Vec::new();
        for (slot, asset) in [(SlotId::A, first), (SlotId::B, second)] {
            if let Some(ticket) = self.slots[slot.index()].ticket.take() {
                self.pipeline.cancel(ticket);
            }
            self.slots[slot.index()].assign(asset.clone());
            events.extend(self.request_into(slot));
        }
        events
    }

    /// Converge toward `asset`, superseding whatever transition is in progress
    pub fn show(&mut self, asset: &AssetHandle, now: Instant) -> Vec<CrossfadeEvent> {
        if self.disposed || self.target.as_ref() == Some(asset) {
            return Vec::new();
        }
        self.target = Some(asset.clone());
        self.cancel_transition();
        self.snap_to_rest();

        if self.slots[self.active.index()].holds(asset) {
            self.machine = Machine::Idle;
            return vec![CrossfadeEvent::Settled {
                asset: asset.clone(),
                fallback: false,
            }];
        }

        let standby = self.active.other();
        self.machine = Machine::Loading;
        let slot = &self.slots[standby.index()];
        if slot.holds(asset) {
            let (state, in_flight) = (slot.load_state, slot.ticket.is_some());
            match state {
                LoadState::Loaded => return self.begin_transition(now),
                LoadState::Pending if in_flight => return Vec::new(),
                LoadState::Failed => return self.fall_back_and_retry(),
                // Never requested
                LoadState::Pending => {}
            }
        }

        let slot = &mut self.slots[standby.index()];
        if let Some(ticket) = slot.ticket.take() {
            self.pipeline.cancel(ticket);
        }
        slot.assign(asset.clone());
        let mut events = self.request_into(standby);
        events.extend(self.resolve_standby(now));
        events
    }

    /// Apply every load that has completed, without waiting
    pub fn poll_loads(&mut self, now: Instant) -> Vec<CrossfadeEvent> {
        let mut events = Vec::new();
        if self.disposed {
            return events;
        }
        while let Some(completion) = self.pipeline.try_next() {
            events.extend(self.on_completion(completion, now));
        }
        events
    }

    /// Wait for the next load to complete and apply it, along with any others already done
    ///
    /// `now` is the instant the completion is applied at; a transition it starts begins there.
    pub async fn wait_for_load(&mut self, now: Instant) -> Vec<CrossfadeEvent> {
        if self.disposed {
            return Vec::new();
        }
        let mut events = match self.pipeline.next().await {
            Some(completion) => self.on_completion(completion, now),
            None => Vec::new(),
        };
        events.extend(self.poll_loads(now));
        events
    }

    /// Advance a running transition to `now`
    pub fn tick(&mut self, now: Instant) -> Vec<CrossfadeEvent> {
        let (t, finished) = match &mut self.machine {
            Machine::Transitioning(handle) => {
                let t = handle.advance(now);
                (t, !handle.is_running())
            }
            _ => return Vec::new(),
        };
        if finished {
            return self.complete(false);
        }
        self.apply_frame(t);
        Vec::new()
    }

    /// Turning reduced motion on finishes a running transition at once
    pub fn set_reduced_motion(&mut self, reduced: bool) -> Vec<CrossfadeEvent> {
        self.reduced_motion = reduced;
        if !reduced || self.disposed {
            return Vec::new();
        }
        match &mut self.machine {
            Machine::Transitioning(handle) => {
                handle.finish();
                self.complete(false)
            }
            _ => Vec::new(),
        }
    }

    /// Cancel the running transition and every pending load. Later calls are no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.cancel_transition();
        self.machine = Machine::Idle;
        for slot in &mut self.slots {
            slot.ticket = None;
        }
        self.pipeline.shutdown();
        self.disposed = true;
        tracing::debug!("crossfade buffer disposed");
    }

    pub fn phase(&self) -> CrossfadePhase {
        match self.machine {
            Machine::Idle => CrossfadePhase::Idle,
            Machine::Loading => CrossfadePhase::Loading,
            Machine::Transitioning(_) => CrossfadePhase::Transitioning,
        }
    }

    /// Handle of the running transition, if any
    pub fn live_animation(&self) -> Option<AnimationId> {
        match &self.machine {
            Machine::Transitioning(handle) if handle.is_running() => Some(handle.id()),
            _ => None,
        }
    }

    pub fn pending_loads(&self) -> Vec<LoadTicket> {
        self.pipeline.pending()
    }

    pub fn slot(&self, id: SlotId) -> &BufferSlot {
        &self.slots[id.index()]
    }

    pub fn active_slot(&self) -> SlotId {
        self.active
    }

    /// Asset the buffer is converging to
    pub fn target(&self) -> Option<&AssetHandle> {
        self.target.as_ref()
    }

    /// Exactly one slot fully opaque, the other fully transparent, nothing running
    pub fn is_at_rest(&self) -> bool {
        let active = &self.slots[self.active.index()];
        let standby = &self.slots[self.active.other().index()];
        !matches!(self.machine, Machine::Transitioning(_))
            && active.opacity == 1.0
            && standby.opacity == 0.0
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn request_into(&mut self, slot: SlotId) -> Vec<CrossfadeEvent> {
        let Some(asset) = self.slots[slot.index()].asset.clone() else {
            return Vec::new();
        };
        match self.pipeline.request(&asset) {
            LoadRequest::Ready(outcome) => self.apply_outcome(slot, outcome).into_iter().collect(),
            LoadRequest::Pending(ticket) => {
                self.slots[slot.index()].ticket = Some(ticket);
                Vec::new()
            }
        }
    }

    fn apply_outcome(&mut self, slot: SlotId, outcome: LoadOutcome) -> Option<CrossfadeEvent> {
        let slot = &mut self.slots[slot.index()];
        slot.ticket = None;
        match outcome {
            LoadOutcome::Loaded(image) => {
                slot.image = Some(image);
                slot.load_state = LoadState::Loaded;
                None
            }
            LoadOutcome::Failed(reason) => {
                slot.image = None;
                slot.load_state = LoadState::Failed;
                let asset = slot.asset.clone()?;
                tracing::warn!(%asset, "Asset failed to load: {}", reason);
                Some(CrossfadeEvent::AssetFailed { asset, reason })
            }
        }
    }

    fn on_completion(&mut self, completion: AssetCompletion, now: Instant) -> Vec<CrossfadeEvent> {
        let Some(slot) = [SlotId::A, SlotId::B]
            .into_iter()
            .find(|id| self.slots[id.index()].ticket == Some(completion.ticket))
        else {
            return Vec::new();
        };
        let mut events: Vec<CrossfadeEvent> =
            self.apply_outcome(slot, completion.outcome).into_iter().collect();
        if slot != self.active {
            events.extend(self.resolve_standby(now));
        }
        events
    }

    /// Move out of `Loading` once the standby slot's load has an outcome
    fn resolve_standby(&mut self, now: Instant) -> Vec<CrossfadeEvent> {
        if !matches!(self.machine, Machine::Loading) {
            return Vec::new();
        }
        let standby = &self.slots[self.active.other().index()];
        if self.target.as_ref().map_or(true, |target| !standby.holds(target)) {
            return Vec::new();
        }
        let state = standby.load_state;
        match state {
            LoadState::Loaded => self.begin_transition(now),
            LoadState::Failed => self.complete(true),
            LoadState::Pending => Vec::new(),
        }
    }

    /// Show a standby asset that is already known to have failed
    ///
    /// The fallback is shown at once; the load is retried in the background on
    /// the now active slot without holding the machine in `Loading`.
    fn fall_back_and_retry(&mut self) -> Vec<CrossfadeEvent> {
        let mut events = self.complete(true);
        events.extend(self.request_into(self.active));
        events
    }

    fn begin_transition(&mut self, now: Instant) -> Vec<CrossfadeEvent> {
        if self.reduced_motion || self.duration.is_zero() {
            return self.complete(false);
        }
        let handle = AnimationHandle::start(self.ids.next_id(), now, self.duration, self.easing);
        tracing::trace!(id = %handle.id(), "crossfade started");
        self.machine = Machine::Transitioning(handle);
        self.apply_frame(0.0);
        Vec::new()
    }

    fn apply_frame(&mut self, t: f64) {
        let scale = lerp(self.scale_from, 1.0, t);
        self.slots[self.active.other().index()].set_pose(t, scale);
        self.slots[self.active.index()].set_pose(1.0 - t, 1.0);
    }

    /// Swap roles with the standby slot fully shown and return to `Idle`
    fn complete(&mut self, fallback: bool) -> Vec<CrossfadeEvent> {
        self.machine = Machine::Idle;
        self.active = self.active.other();
        self.snap_to_rest();
        match self.slots[self.active.index()].asset.clone() {
            Some(asset) => vec![CrossfadeEvent::Settled { asset, fallback }],
            None => Vec::new(),
        }
    }

    fn cancel_transition(&mut self) {
        if let Machine::Transitioning(handle) = &mut self.machine {
            if handle.cancel() {
                tracing::trace!(id = %handle.id(), "crossfade canceled");
            }
        }
    }

    fn snap_to_rest(&mut self) {
        let active = self.active;
        let standby = &mut self.slots[active.other().index()];
        standby.set_pose(0.0, 1.0);
        standby.z_order = 2;
        let current = &mut self.slots[active.index()];
        current.set_pose(1.0, 1.0);
        current.z_order = 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::ScriptedLoader;

    fn buffer(loader: ScriptedLoader, reduced_motion: bool) -> CrossfadeBuffer {
        let motion = MotionConfig {
            crossfade_duration_ms: 400,
            crossfade_easing: EasingType::Linear,
            reduced_motion,
            ..Default::default()
        };
        CrossfadeBuffer::new(
            AssetPipeline::new(Arc::new(loader), Duration::from_secs(1)),
            &motion,
        )
    }

    fn all_cached() -> ScriptedLoader {
        ScriptedLoader::new()
            .cached("a.png")
            .cached("b.png")
            .cached("c.png")
    }

    fn handle(s: &str) -> AssetHandle {
        AssetHandle::new(s)
    }

    #[test]
    fn test_preload_rest_pose() {
        let mut buf = buffer(all_cached(), false);
        assert!(buf.preload(&handle("a.png"), &handle("b.png")).is_empty());

        let a = buf.slot(SlotId::A);
        let b = buf.slot(SlotId::B);
        assert_eq!(buf.active_slot(), SlotId::A);
        assert_eq!((a.opacity(), a.z_order()), (1.0, 1));
        assert_eq!((b.opacity(), b.z_order()), (0.0, 2));
        assert_eq!(a.load_state(), LoadState::Loaded);
        assert_eq!(b.asset(), Some(&handle("b.png")));
        assert!(buf.is_at_rest());
    }

    #[test]
    fn test_cached_asset_transitions_and_swaps() {
        let t0 = Instant::now();
        let mut buf = buffer(all_cached(), false);
        buf.preload(&handle("a.png"), &handle("b.png"));

        assert!(buf.show(&handle("b.png"), t0).is_empty());
        assert_eq!(buf.phase(), CrossfadePhase::Transitioning);
        assert!(buf.live_animation().is_some());

        buf.tick(t0 + Duration::from_millis(100));
        let a = buf.slot(SlotId::A);
        let b = buf.slot(SlotId::B);
        assert!((b.opacity() - 0.25).abs() < 1e-9);
        assert!((a.opacity() - 0.75).abs() < 1e-9);
        assert!(b.scale() > 1.0 && b.scale() < 1.02);

        let events = buf.tick(t0 + Duration::from_millis(400));
        assert_eq!(
            events,
            vec![CrossfadeEvent::Settled {
                asset: handle("b.png"),
                fallback: false
            }]
        );
        assert_eq!(buf.active_slot(), SlotId::B);
        assert_eq!(buf.slot(SlotId::B).z_order(), 1);
        assert!(buf.is_at_rest());
        assert!(buf.live_animation().is_none());
    }

    #[test]
    fn test_supersession_converges_to_latest() {
        let t0 = Instant::now();
        let mut buf = buffer(all_cached(), false);
        buf.preload(&handle("a.png"), &handle("b.png"));

        buf.show(&handle("b.png"), t0);
        buf.tick(t0 + Duration::from_millis(200));
        let first = buf.live_animation().unwrap();

        buf.show(&handle("c.png"), t0 + Duration::from_millis(210));
        let second = buf.live_animation().unwrap();
        assert_ne!(first, second);

        // B never reached full opacity; its slot now holds C starting from transparent
        let standby = buf.slot(SlotId::B);
        assert_eq!(standby.asset(), Some(&handle("c.png")));
        assert_eq!(standby.opacity(), 0.0);
        assert_eq!(buf.slot(SlotId::A).opacity(), 1.0);

        let events = buf.tick(t0 + Duration::from_millis(610));
        assert!(matches!(&events[..], [CrossfadeEvent::Settled { asset, .. }] if asset.as_str() == "c.png"));
        assert!(buf.is_at_rest());
        assert!(buf.live_animation().is_none());
    }

    #[test]
    fn test_repeat_request_is_noop() {
        let t0 = Instant::now();
        let mut buf = buffer(all_cached(), false);
        buf.preload(&handle("a.png"), &handle("b.png"));
        assert!(buf.show(&handle("a.png"), t0).is_empty());
        assert_eq!(buf.phase(), CrossfadePhase::Idle);

        buf.show(&handle("b.png"), t0);
        let id = buf.live_animation();
        assert!(buf.show(&handle("b.png"), t0 + Duration::from_millis(50)).is_empty());
        assert_eq!(buf.live_animation(), id);
    }

    #[test]
    fn test_return_to_active_asset_settles() {
        let t0 = Instant::now();
        let mut buf = buffer(all_cached(), false);
        buf.preload(&handle("a.png"), &handle("b.png"));
        buf.show(&handle("b.png"), t0);
        buf.tick(t0 + Duration::from_millis(100));

        let events = buf.show(&handle("a.png"), t0 + Duration::from_millis(120));
        assert_eq!(
            events,
            vec![CrossfadeEvent::Settled {
                asset: handle("a.png"),
                fallback: false
            }]
        );
        assert_eq!(buf.active_slot(), SlotId::A);
        assert!(buf.is_at_rest());
    }

    #[test]
    fn test_reduced_motion_snaps() {
        let t0 = Instant::now();
        let mut buf = buffer(all_cached(), true);
        buf.preload(&handle("a.png"), &handle("b.png"));
        let events = buf.show(&handle("c.png"), t0);
        assert_eq!(events.len(), 1);
        assert_eq!(buf.phase(), CrossfadePhase::Idle);
        assert_eq!(buf.slot(buf.active_slot()).asset(), Some(&handle("c.png")));
        assert!(buf.live_animation().is_none());
        assert!(buf.is_at_rest());
    }

    #[test]
    fn test_enabling_reduced_motion_finishes_transition() {
        let t0 = Instant::now();
        let mut buf = buffer(all_cached(), false);
        buf.preload(&handle("a.png"), &handle("b.png"));
        buf.show(&handle("b.png"), t0);
        buf.tick(t0 + Duration::from_millis(100));

        let events = buf.set_reduced_motion(true);
        assert_eq!(events.len(), 1);
        assert_eq!(buf.active_slot(), SlotId::B);
        assert!(buf.is_at_rest());
    }

    #[test]
    fn test_failure_without_runtime_falls_back_immediately() {
        let t0 = Instant::now();
        let mut buf = buffer(ScriptedLoader::new().cached("a.png").cached("b.png"), false);
        buf.preload(&handle("a.png"), &handle("b.png"));

        let events = buf.show(&handle("missing.png"), t0);
        assert!(matches!(events[0], CrossfadeEvent::AssetFailed { .. }));
        assert!(matches!(events[1], CrossfadeEvent::Settled { fallback: true, .. }));
        assert_eq!(buf.phase(), CrossfadePhase::Idle);
        let shown = buf.slot(buf.active_slot());
        assert_eq!(shown.load_state(), LoadState::Failed);
        assert_eq!(shown.opacity(), 1.0);
        assert!(buf.is_at_rest());
    }

    #[tokio::test]
    async fn test_async_failure_falls_back() {
        let t0 = Instant::now();
        let loader = ScriptedLoader::new().cached("a.png").cached("b.png").failing("bad.png");
        let mut buf = buffer(loader, false);
        buf.preload(&handle("a.png"), &handle("b.png"));

        assert!(buf.show(&handle("bad.png"), t0).is_empty());
        assert_eq!(buf.phase(), CrossfadePhase::Loading);

        let events = buf.wait_for_load(t0).await;
        assert!(matches!(&events[0], CrossfadeEvent::AssetFailed { asset, .. } if asset.as_str() == "bad.png"));
        assert!(matches!(events[1], CrossfadeEvent::Settled { fallback: true, .. }));
        assert_eq!(buf.active_slot(), SlotId::B);
        assert!(buf.is_at_rest());
    }

    #[tokio::test(start_paused = true)]
    async fn test_known_failure_falls_back_without_waiting() {
        let t0 = Instant::now();
        let loader = ScriptedLoader::new()
            .cached("a.png")
            .delayed("b.png", Duration::from_millis(300))
            .failing("b.png");
        let mut buf = buffer(loader, false);
        buf.preload(&handle("a.png"), &handle("b.png"));

        let events = buf.wait_for_load(t0).await;
        assert!(matches!(&events[..], [CrossfadeEvent::AssetFailed { .. }]));
        assert_eq!(buf.slot(SlotId::B).load_state(), LoadState::Failed);

        let events = buf.show(&handle("b.png"), t0);
        assert_eq!(
            events,
            vec![CrossfadeEvent::Settled {
                asset: handle("b.png"),
                fallback: true
            }]
        );
        assert_eq!(buf.phase(), CrossfadePhase::Idle);
        assert_eq!(buf.active_slot(), SlotId::B);
        assert_eq!(buf.slot(SlotId::B).opacity(), 1.0);
        assert!(buf.is_at_rest());

        // The retry runs behind the fallback and never moves the buffer
        assert_eq!(buf.pending_loads().len(), 1);
        let events = buf.wait_for_load(t0).await;
        assert!(matches!(&events[..], [CrossfadeEvent::AssetFailed { .. }]));
        assert!(buf.is_at_rest());
        assert_eq!(buf.phase(), CrossfadePhase::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_superseded_load_is_canceled() {
        let t0 = Instant::now();
        let loader = ScriptedLoader::new()
            .cached("a.png")
            .cached("b.png")
            .delayed("slow.png", Duration::from_millis(300))
            .delayed("fast.png", Duration::from_millis(10));
        let mut buf = buffer(loader, false);
        buf.preload(&handle("a.png"), &handle("b.png"));

        buf.show(&handle("slow.png"), t0);
        assert_eq!(buf.pending_loads().len(), 1);
        buf.show(&handle("fast.png"), t0);
        assert_eq!(buf.pending_loads().len(), 1);

        buf.wait_for_load(t0).await;
        assert_eq!(buf.phase(), CrossfadePhase::Transitioning);
        assert_eq!(buf.slot(SlotId::B).asset(), Some(&handle("fast.png")));

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert!(buf.poll_loads(t0).is_empty());
        assert!(buf.pending_loads().is_empty());
        assert_eq!(buf.slot(SlotId::B).asset(), Some(&handle("fast.png")));
    }

    #[tokio::test]
    async fn test_dispose_stops_everything() {
        let t0 = Instant::now();
        let loader = ScriptedLoader::new().cached("a.png").cached("b.png");
        let mut buf = buffer(loader, false);
        buf.preload(&handle("a.png"), &handle("b.png"));
        buf.show(&handle("remote.png"), t0);
        assert_eq!(buf.pending_loads().len(), 1);

        buf.dispose();
        assert!(buf.pending_loads().is_empty());
        assert!(buf.live_animation().is_none());
        assert!(buf.show(&handle("c.png"), t0).is_empty());
        assert!(buf.wait_for_load(t0).await.is_empty());
        assert_eq!(buf.target(), Some(&handle("remote.png")));
    }
}
