use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use storyscroll_core::crossfade::CrossfadePhase;

use crate::app::App;

pub struct StatusBarWidget;

impl StatusBarWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let engine = &app.engine;
        let motion_str = if engine.reduced_motion() {
            "REDUCED"
        } else {
            "MOTION"
        };
        let phase_str = match engine.crossfade().phase() {
            CrossfadePhase::Idle => "",
            CrossfadePhase::Loading => " | loading",
            CrossfadePhase::Transitioning => " | fading",
        };

        let (status_text, status_fg) = match &app.status_message {
            Some(msg) => (format!(" {}", msg), app.theme.error),
            None => (
                format!(
                    " {} | Step {}/{} | {}%{}",
                    motion_str,
                    engine.current_index() + 1,
                    engine.story().len(),
                    engine.display_percent(),
                    phase_str
                ),
                app.theme.fg0,
            ),
        };

        let help_hint = " q:quit j/k:scroll n/p:step m:motion ";
        let padding_len = (area.width as usize)
            .saturating_sub(status_text.width() + help_hint.width());

        let line = Line::from(vec![
            Span::styled(status_text, Style::default().fg(status_fg).bg(app.theme.bg2)),
            Span::styled(" ".repeat(padding_len), Style::default().bg(app.theme.bg2)),
            Span::styled(
                help_hint,
                Style::default().fg(app.theme.grey2).bg(app.theme.bg2),
            ),
        ]);

        frame.render_widget(Paragraph::new(line), area);
    }
}
