use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout, Rect},
    Frame, Terminal,
};

use storyscroll_core::{AppConfig, ScrollEngine, StandardAssetLoader, Story};
use storyscroll_tui::{
    event::{AppEvent, EventHandler},
    input::{handle_key_event, handle_mouse_event},
    viewport::body_columns,
    widgets::{CrossfadeViewWidget, ProgressBarWidget, StatusBarWidget, StepTextWidget},
    App, Theme,
};

pub async fn run(mut config: AppConfig, story_path: &Path, reduced_motion: bool) -> Result<()> {
    if reduced_motion {
        config.motion.reduced_motion = true;
    }

    let story = Story::load(story_path)
        .with_context(|| format!("Failed to load story {}", story_path.display()))?;
    tracing::info!(path = %story_path.display(), steps = story.len(), "opening story");

    let loader = Arc::new(StandardAssetLoader::new(&config)?);
    let engine = ScrollEngine::new(story, &config, loader)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    let title = match engine.story().title() {
        Some(title) => format!("storyscroll - {}", title),
        None => "storyscroll".to_string(),
    };
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture, SetTitle(title))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // The UI loop blocks on terminal input; asset loads keep running on the other workers
    let result = tokio::task::block_in_place(|| run_app(&mut terminal, engine, &config));

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    engine: ScrollEngine,
    config: &AppConfig,
) -> Result<()> {
    let size = terminal.size()?;
    let mut app = App::new(
        engine,
        config,
        Theme::default(),
        size.width,
        size.height,
        Instant::now(),
    )?;

    let event_handler = EventHandler::new(config.ui.tick_rate_ms, config.ui.animation_fps);

    // Main loop
    loop {
        // Finished loads and running transitions
        app.on_frame(Instant::now());

        terminal.draw(|frame| draw(frame, &mut app))?;

        // Poll faster while a transition is running
        let event = if app.needs_frame() {
            event_handler.next_animation()?
        } else {
            event_handler.next()?
        };

        let now = Instant::now();
        if let Some(event) = event {
            match event {
                AppEvent::Key(key) => {
                    let action = handle_key_event(key, app.pending_key);
                    app.apply(action, now);
                }
                AppEvent::Mouse(mouse) => app.apply(handle_mouse_event(mouse), now),
                AppEvent::Resize(width, height) => app.on_resize(width, height, now),
                AppEvent::Tick => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    app.shutdown();
    tracing::info!("story closed");
    Ok(())
}

fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();

    // Progress bar + pinned section + status bar
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(size);

    let columns = body_columns(rows[1]);
    let text_column = columns[1];
    let card = Rect {
        height: app.viewport.pinned_height().min(text_column.height),
        ..text_column
    };

    ProgressBarWidget::render(frame, rows[0], app);
    CrossfadeViewWidget::render(frame, columns[0], app);
    StepTextWidget::render(frame, card, app);
    StatusBarWidget::render(frame, rows[2], app);
}
