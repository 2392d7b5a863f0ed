use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::Gauge,
    Frame,
};

use crate::app::App;

pub struct ProgressBarWidget;

impl ProgressBarWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let engine = &app.engine;
        let label = format!(
            "{}%  ·  {}",
            engine.display_percent(),
            engine.story().title().unwrap_or("storyscroll")
        );

        let gauge = Gauge::default()
            .gauge_style(
                Style::default()
                    .fg(app.theme.progress)
                    .bg(app.theme.bg1)
                    .add_modifier(Modifier::BOLD),
            )
            .ratio(engine.progress().clamp(0.0, 1.0))
            .label(label)
            .use_unicode(true);

        frame.render_widget(gauge, area);
    }
}
