use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::theme::fade;
use crate::viewport::wrapped_height;

/// Reveal offset units per terminal row
const UNITS_PER_ROW: f64 = 10.0;

pub struct StepTextWidget;

impl StepTextWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = &app.theme;
        let engine = &app.engine;
        let bg = theme.bg0;

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.grey1))
            .style(Style::default().bg(bg));
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.width == 0 || inner.height == 0 {
            return;
        }

        let step = engine.current_step();
        let reveal = engine.reveal();
        let fill = engine.highlight_fill();

        // Heading
        let heading_frame = reveal.frame(0);
        let heading = vec![Line::from(Span::styled(
            step.title().to_string(),
            Style::default()
                .fg(fade(theme.accent, bg, heading_frame.opacity))
                .add_modifier(Modifier::BOLD),
        ))];

        // Body with highlight fill
        let body_frame = reveal.frame(1);
        let base = Style::default().fg(fade(theme.fg0, bg, body_frame.opacity));
        let filled = Style::default()
            .fg(bg)
            .bg(fade(theme.highlight, bg, body_frame.opacity));
        let pending = Style::default()
            .fg(fade(theme.highlight, bg, body_frame.opacity))
            .add_modifier(Modifier::UNDERLINED);
        let body: Vec<Line> = step
            .description()
            .lines()
            .map(|line| Line::from(highlight_spans(line, step.highlights(), fill, base, filled, pending)))
            .collect();

        // Step counter
        let counter_frame = reveal.frame(2);
        let counter = vec![Line::from(Span::styled(
            format!("Step {} of {}", step.index() + 1, engine.story().len()),
            Style::default().fg(fade(theme.grey2, bg, counter_frame.opacity)),
        ))];

        let elements = [
            (heading, wrapped_height(step.title(), inner.width), heading_frame.offset_y),
            (body, wrapped_height(step.description(), inner.width), body_frame.offset_y),
            (counter, 1, counter_frame.offset_y),
        ];

        let bottom = inner.y + inner.height;
        let mut y = inner.y;
        for (lines, height, offset_y) in elements {
            let top = y.saturating_add(offset_rows(offset_y));
            if top < bottom {
                let rect = Rect {
                    x: inner.x,
                    y: top,
                    width: inner.width,
                    height: height.min(bottom - top),
                };
                frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), rect);
            }
            y = y.saturating_add(height).saturating_add(1);
        }
    }
}

/// Rows an element is pushed down by its reveal offset
fn offset_rows(offset_y: f64) -> u16 {
    (offset_y.max(0.0) / UNITS_PER_ROW).round() as u16
}

/// Split `text` into spans, marking each highlighted phrase
///
/// The first `fill` fraction of every phrase's characters gets `filled`, the
/// rest `pending`. Overlapping phrases keep the one that starts first.
pub fn highlight_spans(
    text: &str,
    highlights: &[String],
    fill: f64,
    base: Style,
    filled: Style,
    pending: Style,
) -> Vec<Span<'static>> {
    let mut ranges: Vec<(usize, usize)> = highlights
        .iter()
        .filter(|phrase| !phrase.is_empty())
        .flat_map(|phrase| {
            text.match_indices(phrase.as_str())
                .map(|(start, found)| (start, start + found.len()))
        })
        .collect();
    ranges.sort_unstable();

    let mut spans = Vec::new();
    let mut cursor = 0;
    for (start, end) in ranges {
        if start < cursor {
            continue;
        }
        if start > cursor {
            spans.push(Span::styled(text[cursor..start].to_string(), base));
        }

        let phrase = &text[start..end];
        let filled_chars = (phrase.chars().count() as f64 * fill.clamp(0.0, 1.0)).round() as usize;
        let split = phrase
            .char_indices()
            .nth(filled_chars)
            .map_or(phrase.len(), |(i, _)| i);
        if split > 0 {
            spans.push(Span::styled(phrase[..split].to_string(), filled));
        }
        if split < phrase.len() {
            spans.push(Span::styled(phrase[split..].to_string(), pending));
        }
        cursor = end;
    }
    if cursor < text.len() || spans.is_empty() {
        spans.push(Span::styled(text[cursor..].to_string(), base));
    }
    spans
}
