//! Composition root: wires layout, region, mapper, crossfade and reveal together
//!
//! The engine is driven from a single host loop through `&mut self`. Every
//! binding, listener, animation handle and pending asset load it creates is
//! tracked in its ownership record and released by `unmount`.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::asset::{AssetLoader, AssetPipeline, LoadTicket};
use crate::config::AppConfig;
use crate::crossfade::{CrossfadeBuffer, CrossfadeEvent};
use crate::layout::{LayoutMetrics, MeasureOutcome, Viewport};
use crate::mapper::{display_percent, index_for_progress, StepChange, StepIndexMapper};
use crate::motion::AnimationId;
use crate::region::{PinState, ScrollRegion};
use crate::reveal::RevealAnimator;
use crate::story::{AssetHandle, Step, Story};
use crate::{Error, Result};

/// Input from the host
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostEvent {
    /// Raw document scroll offset
    Scroll(f64),
    /// Window size changed
    Resize,
    /// The pinned element's own size changed
    ContentResize,
    ReducedMotion(bool),
    /// Animation frame
    Frame,
}

/// Output delivered to subscribers
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    Progress { progress: f64, percent: u8 },
    StepChanged(StepChange),
    /// New extent to reserve, and the raw offset the host should scroll to so progress is preserved
    ExtentChanged { extent: f64, scroll_to: f64 },
    CrossfadeSettled { asset: AssetHandle, fallback: bool },
    AssetFailed { asset: AssetHandle, reason: String },
}

impl From<CrossfadeEvent> for EngineEvent {
    fn from(event: CrossfadeEvent) -> Self {
        match event {
            CrossfadeEvent::Settled { asset, fallback } => {
                EngineEvent::CrossfadeSettled { asset, fallback }
            }
            CrossfadeEvent::AssetFailed { asset, reason } => {
                EngineEvent::AssetFailed { asset, reason }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Constructed,
    Mounted,
    Unmounted,
}

/// Host event subscriptions the engine holds while mounted
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Binding {
    Scroll,
    Resize,
    ContentResize,
    MotionPreference,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// One entry of the ownership record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Binding(Binding),
    Listener(ListenerId),
    Animation(AnimationId),
    AssetLoad(LoadTicket),
}

type Listener = Box<dyn FnMut(&EngineEvent)>;

pub struct ScrollEngine {
    story: Story,
    layout: LayoutMetrics,
    region: Option<ScrollRegion>,
    mapper: StepIndexMapper,
    crossfade: CrossfadeBuffer,
    reveal: RevealAnimator,
    bindings: BTreeSet<Binding>,
    listeners: Vec<(ListenerId, Listener)>,
    next_listener: u64,
    pending_offset: Option<f64>,
    last_progress: f64,
    reduced_motion: bool,
    highlight_span: f64,
    lifecycle: Lifecycle,
}

impl ScrollEngine {
    /// Build an engine for `story`. Fails on configuration values it cannot work with.
    pub fn new(story: Story, config: &AppConfig, loader: Arc<dyn AssetLoader>) -> Result<Self> {
        config.validate()?;
        if story.is_empty() {
            return Err(Error::InvalidConfiguration(
                "a story needs at least one step".to_string(),
            ));
        }

        let pipeline = AssetPipeline::new(loader, config.assets.load_timeout());
        Ok(Self {
            layout: LayoutMetrics::new(story.len(), config.layout.min_extent_ratio),
            region: None,
            mapper: StepIndexMapper::new(story.len()),
            crossfade: CrossfadeBuffer::new(pipeline, &config.motion),
            reveal: RevealAnimator::new(&config.motion),
            bindings: BTreeSet::new(),
            listeners: Vec::new(),
            next_listener: 0,
            pending_offset: None,
            last_progress: 0.0,
            reduced_motion: config.motion.reduced_motion,
            highlight_span: config.motion.highlight_span,
            lifecycle: Lifecycle::Constructed,
            story,
        })
    }

    /// Attach to the host and take the first measurement
    ///
    /// Mounting again while mounted only remeasures. An unmounted engine cannot be mounted again.
    pub fn mount(&mut self, viewport: &dyn Viewport, now: Instant) -> Result<()> {
        match self.lifecycle {
            Lifecycle::Unmounted => return Err(Error::Unmounted),
            Lifecycle::Mounted => {
                self.remeasure(viewport, now);
                return Ok(());
            }
            Lifecycle::Constructed => {}
        }

        self.lifecycle = Lifecycle::Mounted;
        self.bindings
            .extend([Binding::Scroll, Binding::Resize, Binding::MotionPreference]);
        if viewport.observes_content_size() {
            self.bindings.insert(Binding::ContentResize);
        }

        let (first, second) = self.story.initial_assets();
        let (first, second) = (first.clone(), second.clone());
        let events = self.crossfade.preload(&first, &second);
        self.emit_all(events);
        self.reveal.set_reduced_motion(self.reduced_motion);
        self.reveal.settle();

        tracing::info!(
            steps = self.story.len(),
            reduced_motion = self.reduced_motion,
            "scroll engine mounted"
        );
        self.remeasure(viewport, now);
        Ok(())
    }

    /// Dispatch a host event
    pub fn handle(&mut self, event: HostEvent, viewport: &dyn Viewport, now: Instant) {
        match event {
            HostEvent::Scroll(offset) => self.on_scroll(offset, now),
            HostEvent::Resize => self.on_resize(viewport, now),
            HostEvent::ContentResize => self.on_content_resize(viewport, now),
            HostEvent::ReducedMotion(reduced) => self.set_reduced_motion(reduced),
            HostEvent::Frame => self.on_frame(now),
        }
    }

    pub fn on_scroll(&mut self, raw_offset: f64, now: Instant) {
        if !self.accepts(Binding::Scroll) {
            return;
        }
        match self.region.as_mut() {
            Some(region) => {
                region.on_scroll_update(raw_offset);
                self.apply_progress(now);
            }
            // Held until the first successful measurement creates the region
            None if raw_offset.is_finite() => self.pending_offset = Some(raw_offset),
            None => {}
        }
    }

    pub fn on_resize(&mut self, viewport: &dyn Viewport, now: Instant) {
        if self.accepts(Binding::Resize) {
            self.remeasure(viewport, now);
        }
    }

    /// Size change of the pinned element; ignored unless the viewport observes content size
    pub fn on_content_resize(&mut self, viewport: &dyn Viewport, now: Instant) {
        if self.accepts(Binding::ContentResize) {
            self.remeasure(viewport, now);
        }
    }

    /// Drain finished asset loads and advance running transitions
    pub fn on_frame(&mut self, now: Instant) {
        if self.lifecycle != Lifecycle::Mounted {
            return;
        }
        let mut events = self.crossfade.poll_loads(now);
        events.extend(self.crossfade.tick(now));
        self.emit_all(events);
        self.reveal.tick(now);
    }

    pub fn set_reduced_motion(&mut self, reduced: bool) {
        if self.lifecycle == Lifecycle::Unmounted {
            return;
        }
        if self.lifecycle == Lifecycle::Mounted && !self.bindings.contains(&Binding::MotionPreference) {
            return;
        }
        if reduced != self.reduced_motion {
            tracing::debug!(reduced, "motion preference changed");
        }
        self.reduced_motion = reduced;
        let events = self.crossfade.set_reduced_motion(reduced);
        self.emit_all(events);
        self.reveal.set_reduced_motion(reduced);
    }

    /// Wait for the next asset load to finish and apply it
    pub async fn wait_for_assets(&mut self, now: Instant) {
        if self.lifecycle != Lifecycle::Mounted {
            return;
        }
        let events = self.crossfade.wait_for_load(now).await;
        if self.lifecycle == Lifecycle::Mounted {
            self.emit_all(events);
        }
    }

    /// Register an output listener
    ///
    /// A listener added after unmount is dropped right away and never called.
    pub fn subscribe(&mut self, listener: impl FnMut(&EngineEvent) + 'static) -> ListenerId {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        if self.lifecycle != Lifecycle::Unmounted {
            self.listeners.push((id, Box::new(listener)));
        }
        id
    }

    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener, _)| *listener != id);
        self.listeners.len() != before
    }

    /// Everything this engine currently owns and must release on teardown
    pub fn disposal_list(&self) -> Vec<Resource> {
        let mut resources: Vec<Resource> =
            self.bindings.iter().copied().map(Resource::Binding).collect();
        resources.extend(self.listeners.iter().map(|(id, _)| Resource::Listener(*id)));
        resources.extend(self.crossfade.live_animation().map(Resource::Animation));
        resources.extend(self.reveal.live_animation().map(Resource::Animation));
        resources.extend(self.crossfade.pending_loads().into_iter().map(Resource::AssetLoad));
        resources
    }

    /// Release every owned resource. Afterwards no input changes state or reaches a listener.
    pub fn unmount(&mut self) {
        if self.lifecycle == Lifecycle::Unmounted {
            return;
        }
        let resources = self.disposal_list();
        for resource in &resources {
            match *resource {
                Resource::Binding(binding) => {
                    self.bindings.remove(&binding);
                }
                Resource::Listener(id) => {
                    self.unsubscribe(id);
                }
                Resource::Animation(id) => {
                    if self.reveal.live_animation() == Some(id) {
                        self.reveal.cancel();
                    }
                }
                // Crossfade animations and loads are released with the buffer
                Resource::AssetLoad(_) => {}
            }
        }
        self.crossfade.dispose();
        self.pending_offset = None;
        self.lifecycle = Lifecycle::Unmounted;
        tracing::info!(released = resources.len(), "scroll engine unmounted");
    }

    fn accepts(&self, binding: Binding) -> bool {
        self.lifecycle == Lifecycle::Mounted && self.bindings.contains(&binding)
    }

    fn remeasure(&mut self, viewport: &dyn Viewport, now: Instant) {
        let (pin_start, extent) = match self.layout.remeasure(viewport.measure()) {
            Ok(MeasureOutcome::Changed { pin_start, extent }) => (pin_start, extent),
            Ok(MeasureOutcome::Unchanged) => return,
            Err(e) => {
                tracing::debug!("{}, retrying on next trigger", e);
                return;
            }
        };

        let scroll_to = match self.region.as_mut() {
            Some(region) => region.rebound(pin_start, extent),
            None => {
                let mut region = ScrollRegion::new(pin_start, extent);
                if let Some(offset) = self.pending_offset.take() {
                    region.on_scroll_update(offset);
                }
                let offset = region.raw_offset();
                self.region = Some(region);
                offset
            }
        };

        self.emit(EngineEvent::ExtentChanged { extent, scroll_to });
        self.apply_progress(now);
    }

    fn apply_progress(&mut self, now: Instant) {
        let Some(progress) = self.region.as_ref().map(ScrollRegion::progress) else {
            return;
        };
        if progress != self.last_progress {
            self.last_progress = progress;
            self.emit(EngineEvent::Progress {
                progress,
                percent: display_percent(progress),
            });
        }
        if let Some(change) = self.mapper.on_progress(progress) {
            tracing::debug!(from = change.from, to = change.to, "step changed");
            self.emit(EngineEvent::StepChanged(change));
            self.enter_step(change.to, now);
        }
    }

    fn enter_step(&mut self, index: usize, now: Instant) {
        if let Some(asset) = self.story.get(index).map(|step| step.asset().clone()) {
            let events = self.crossfade.show(&asset, now);
            self.emit_all(events);
        }
        self.reveal.on_step_change(index, now);
    }

    fn emit(&mut self, event: EngineEvent) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
    }

    fn emit_all(&mut self, events: Vec<CrossfadeEvent>) {
        for event in events {
            self.emit(event.into());
        }
    }

    /// Latest progress in [0, 1]
    pub fn progress(&self) -> f64 {
        self.region.as_ref().map_or(0.0, ScrollRegion::progress)
    }

    /// Rounded percentage of the same progress value that selects the step
    pub fn display_percent(&self) -> u8 {
        display_percent(self.progress())
    }

    pub fn current_index(&self) -> usize {
        self.mapper.current()
    }

    pub fn current_step(&self) -> &Step {
        self.story
            .get(self.mapper.current())
            .unwrap_or_else(|| self.story.first())
    }

    /// Scroll distance the host has to reserve for the pinned region, once measured
    pub fn extent(&self) -> Option<f64> {
        self.layout.extent()
    }

    pub fn pin_state(&self) -> Option<PinState> {
        self.region.as_ref().map(ScrollRegion::pin_state)
    }

    /// Fill fraction of the current step's highlights
    pub fn highlight_fill(&self) -> f64 {
        if self.reduced_motion {
            return 1.0;
        }
        (self.mapper.step_local_progress(self.progress()) / self.highlight_span).clamp(0.0, 1.0)
    }

    /// Smallest whole raw offset at which step `index` is current
    pub fn offset_for_step(&self, index: usize) -> Option<f64> {
        let region = self.region.as_ref()?;
        let steps = self.story.len();
        let index = index.min(steps - 1);
        let mut offset = region
            .offset_for_progress(self.mapper.step_start(index))
            .ceil();
        while index_for_progress(region.progress_at(offset), steps) < index
            && offset < region.pin_end()
        {
            offset += 1.0;
        }
        Some(offset)
    }

    /// Whether the host should keep sending frames
    pub fn needs_frame(&self) -> bool {
        self.lifecycle == Lifecycle::Mounted
            && (!self.crossfade.is_at_rest()
                || !self.crossfade.pending_loads().is_empty()
                || self.reveal.is_animating())
    }

    pub fn crossfade(&self) -> &CrossfadeBuffer {
        &self.crossfade
    }

    pub fn reveal(&self) -> &RevealAnimator {
        &self.reveal
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_mounted(&self) -> bool {
        self.lifecycle == Lifecycle::Mounted
    }
}
