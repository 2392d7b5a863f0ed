use std::cell::RefCell;
use std::rc::Rc;
use std::time::Instant;

use anyhow::Result;

use storyscroll_core::{AppConfig, EngineEvent, ScrollEngine};

use crate::input::Action;
use crate::theme::Theme;
use crate::viewport::TerminalViewport;
use crate::widgets::ImageFitCache;

/// Terminal host state around one mounted engine
pub struct App {
    pub engine: ScrollEngine,
    pub viewport: TerminalViewport,
    pub theme: Theme,
    /// Simulated document scroll position, in rows
    pub scroll_offset: u32,
    pub scroll_lines: u16,
    pub status_message: Option<String>,
    /// First key of a multi-key sequence (gg)
    pub pending_key: Option<char>,
    pub should_quit: bool,
    pub fit_cache: ImageFitCache,
    events: Rc<RefCell<Vec<EngineEvent>>>,
}

impl App {
    /// Mount `engine` on a terminal of `width` x `height`
    pub fn new(
        mut engine: ScrollEngine,
        config: &AppConfig,
        theme: Theme,
        width: u16,
        height: u16,
        now: Instant,
    ) -> Result<Self> {
        let viewport = TerminalViewport::new(engine.story(), width, height);
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        engine.subscribe(move |event| sink.borrow_mut().push(event.clone()));
        engine.mount(&viewport, now)?;

        let mut app = Self {
            engine,
            viewport,
            theme,
            scroll_offset: 0,
            scroll_lines: config.ui.scroll_lines.max(1),
            status_message: None,
            pending_key: None,
            should_quit: false,
            fit_cache: ImageFitCache::default(),
            events,
        };
        app.drain_engine_events();
        Ok(app)
    }

    /// Bottom of the document: the end of the pinned region
    pub fn max_offset(&self) -> u32 {
        self.engine.extent().map_or(0, |extent| extent.ceil() as u32)
    }

    pub fn scroll_to(&mut self, offset: u32, now: Instant) {
        let offset = offset.min(self.max_offset());
        if offset == self.scroll_offset {
            return;
        }
        self.scroll_offset = offset;
        self.engine.on_scroll(offset as f64, now);
        self.drain_engine_events();
    }

    pub fn scroll_by(&mut self, delta: i64, now: Instant) {
        let target = (self.scroll_offset as i64 + delta).max(0);
        self.scroll_to(u32::try_from(target).unwrap_or(u32::MAX), now);
    }

    fn page(&self) -> i64 {
        self.viewport.body_height().max(1) as i64
    }

    fn half_page(&self) -> i64 {
        (self.viewport.body_height() / 2).max(1) as i64
    }

    /// Scroll to where the next step begins
    pub fn next_step(&mut self, now: Instant) {
        let last = self.engine.story().len() - 1;
        let next = (self.engine.current_index() + 1).min(last);
        if let Some(offset) = self.engine.offset_for_step(next) {
            self.scroll_to(offset as u32, now);
        }
    }

    /// Scroll to where the previous step begins
    pub fn prev_step(&mut self, now: Instant) {
        let prev = self.engine.current_index().saturating_sub(1);
        if let Some(offset) = self.engine.offset_for_step(prev) {
            self.scroll_to(offset as u32, now);
        }
    }

    pub fn toggle_reduced_motion(&mut self) {
        let reduced = !self.engine.reduced_motion();
        self.engine.set_reduced_motion(reduced);
        self.status_message = Some(if reduced {
            "Reduced motion on".to_string()
        } else {
            "Reduced motion off".to_string()
        });
        self.drain_engine_events();
    }

    /// Terminal size changed
    ///
    /// A height change is a window resize. A width-only change reflows the text
    /// card, which is a size change of the pinned content.
    pub fn on_resize(&mut self, width: u16, height: u16, now: Instant) {
        let height_changed = height != self.viewport.height();
        let content_changed = self.viewport.resize(self.engine.story(), width, height);
        if height_changed {
            self.engine.on_resize(&self.viewport, now);
        } else if content_changed {
            self.engine.on_content_resize(&self.viewport, now);
        }
        self.drain_engine_events();
    }

    /// Apply finished asset loads and advance transitions
    pub fn on_frame(&mut self, now: Instant) {
        self.engine.on_frame(now);
        self.drain_engine_events();
    }

    pub fn needs_frame(&self) -> bool {
        self.engine.needs_frame()
    }

    pub fn apply(&mut self, action: Action, now: Instant) {
        // Clear pending key on any action except PendingG
        if action != Action::PendingG {
            self.pending_key = None;
        }

        let line = self.scroll_lines as i64;
        match action {
            Action::Quit => self.should_quit = true,
            Action::ScrollDown => self.scroll_by(line, now),
            Action::ScrollUp => self.scroll_by(-line, now),
            Action::ScrollHalfPageDown => self.scroll_by(self.half_page(), now),
            Action::ScrollHalfPageUp => self.scroll_by(-self.half_page(), now),
            Action::ScrollPageDown => self.scroll_by(self.page(), now),
            Action::ScrollPageUp => self.scroll_by(-self.page(), now),
            Action::JumpToTop => self.scroll_to(0, now),
            Action::JumpToBottom => self.scroll_to(self.max_offset(), now),
            Action::PendingG => self.pending_key = Some('g'),
            Action::NextStep => self.next_step(now),
            Action::PrevStep => self.prev_step(now),
            Action::ToggleReducedMotion => self.toggle_reduced_motion(),
            Action::None => {}
        }
    }

    /// Release everything the engine holds
    pub fn shutdown(&mut self) {
        self.engine.unmount();
        self.fit_cache.clear();
    }

    fn drain_engine_events(&mut self) {
        let events: Vec<EngineEvent> = self.events.borrow_mut().drain(..).collect();
        for event in events {
            match event {
                EngineEvent::ExtentChanged { extent, scroll_to } => {
                    tracing::debug!(extent, scroll_to, "pinned extent changed");
                    self.scroll_offset = scroll_to.round().max(0.0) as u32;
                }
                EngineEvent::StepChanged(change) => {
                    tracing::debug!(from = change.from, to = change.to, "showing step");
                    self.status_message = None;
                }
                EngineEvent::AssetFailed { asset, reason } => {
                    self.status_message = Some(format!("Failed to load {}: {}", asset, reason));
                }
                EngineEvent::Progress { .. } | EngineEvent::CrossfadeSettled { .. } => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use image::DynamicImage;

    use super::*;
    use storyscroll_core::{AssetHandle, AssetLoader, StepSpec, Story};

    /// Every asset is an in-memory pixel
    struct PixelLoader;

    #[async_trait]
    impl AssetLoader for PixelLoader {
        fn cached(&self, _asset: &AssetHandle) -> Option<Arc<DynamicImage>> {
            Some(Arc::new(DynamicImage::new_rgba8(2, 2)))
        }

        async fn load(&self, _asset: &AssetHandle) -> storyscroll_core::Result<Arc<DynamicImage>> {
            Ok(Arc::new(DynamicImage::new_rgba8(2, 2)))
        }
    }

    fn app(height: u16) -> App {
        let specs = (1..=4)
            .map(|i| StepSpec {
                title: format!("Step {i}"),
                description: "Short body.".to_string(),
                asset: Some(format!("{i}.png")),
                ..Default::default()
            })
            .collect();
        let story = Story::new(specs).unwrap();
        let config = AppConfig::default();
        let engine = ScrollEngine::new(story, &config, Arc::new(PixelLoader)).unwrap();
        App::new(engine, &config, Theme::default(), 100, height, Instant::now()).unwrap()
    }

    #[test]
    fn test_mount_reserves_extent() {
        let app = app(42);
        // 3 body heights of 40 rows minus the 7-row card
        assert_eq!(app.engine.extent(), Some(113.0));
        assert_eq!(app.max_offset(), 113);
        assert_eq!(app.scroll_offset, 0);
    }

    #[test]
    fn test_scroll_is_clamped() {
        let now = Instant::now();
        let mut app = app(42);
        app.apply(Action::ScrollUp, now);
        assert_eq!(app.scroll_offset, 0);
        app.apply(Action::JumpToBottom, now);
        assert_eq!(app.scroll_offset, 113);
        app.apply(Action::ScrollPageDown, now);
        assert_eq!(app.scroll_offset, 113);
        assert_eq!(app.engine.current_index(), 3);
        assert_eq!(app.engine.display_percent(), 100);
    }

    #[test]
    fn test_step_navigation() {
        let now = Instant::now();
        let mut app = app(42);
        app.apply(Action::NextStep, now);
        assert_eq!(app.engine.current_index(), 1);
        app.apply(Action::NextStep, now);
        assert_eq!(app.engine.current_index(), 2);
        app.apply(Action::PrevStep, now);
        assert_eq!(app.engine.current_index(), 1);
    }

    #[test]
    fn test_gg_jumps_to_top() {
        let now = Instant::now();
        let mut app = app(42);
        app.apply(Action::JumpToBottom, now);
        app.apply(Action::PendingG, now);
        assert_eq!(app.pending_key, Some('g'));
        app.apply(Action::JumpToTop, now);
        assert_eq!(app.pending_key, None);
        assert_eq!(app.scroll_offset, 0);
        assert_eq!(app.engine.current_index(), 0);
    }

    #[test]
    fn test_resize_corrects_scroll_offset() {
        let now = Instant::now();
        let mut app = app(42);
        app.scroll_to(60, now);
        let progress = app.engine.progress();

        app.on_resize(100, 62, now);
        // 3 * 60 - 7
        assert_eq!(app.max_offset(), 173);
        assert_eq!(app.scroll_offset, (progress * 173.0).round() as u32);
        assert_eq!(app.engine.progress(), progress);
    }

    #[test]
    fn test_toggle_reduced_motion() {
        let now = Instant::now();
        let mut app = app(42);
        app.toggle_reduced_motion();
        assert!(app.engine.reduced_motion());
        app.apply(Action::NextStep, now);
        assert!(!app.needs_frame());
        assert_eq!(app.status_message, None);
    }

    #[test]
    fn test_shutdown_unmounts() {
        let mut app = app(42);
        app.shutdown();
        assert!(!app.engine.is_mounted());
        app.scroll_to(50, Instant::now());
        assert_eq!(app.engine.current_index(), 0);
    }
}
