//! Terminal measurements fed to the engine
//!
//! The pinned section is the whole body area: the crossfade image on the left
//! and the step text card on the right. Its height is the tallest text card at
//! the current width, capped by the body height.

use std::rc::Rc;

use ratatui::layout::{Constraint, Layout, Rect};
use unicode_width::UnicodeWidthStr;

use storyscroll_core::{Measurements, Story, Viewport};

/// Progress bar on top, status bar at the bottom
pub const CHROME_ROWS: u16 = 2;

/// Split the body into image and text columns
pub fn body_columns(area: Rect) -> Rc<[Rect]> {
    Layout::horizontal([Constraint::Ratio(3, 5), Constraint::Ratio(2, 5)]).split(area)
}

/// Rows a text occupies when word wrapped at `width` columns
///
/// Words move to the next row whole, the way `Paragraph` wraps them; a word
/// wider than a row is broken across rows.
pub fn wrapped_height(text: &str, width: u16) -> u16 {
    if width == 0 {
        return 1;
    }
    let width = width as usize;
    let rows = text
        .lines()
        .fold(0usize, |rows, line| rows.saturating_add(line_rows(line, width)));
    u16::try_from(rows.max(1)).unwrap_or(u16::MAX)
}

fn line_rows(line: &str, width: usize) -> usize {
    let mut rows = 1usize;
    let mut used = 0;
    for word in line.split_whitespace() {
        let mut cols = word.width();
        if used > 0 {
            if used + 1 + cols <= width {
                used += 1 + cols;
                continue;
            }
            rows = rows.saturating_add(1);
        }
        let spill = cols.saturating_sub(1) / width;
        rows = rows.saturating_add(spill);
        cols -= spill * width;
        used = cols;
    }
    rows
}

/// Rows the text card needs for one step: borders, heading, gap, body, gap, counter
pub fn card_height(title: &str, description: &str, inner_width: u16) -> u16 {
    [
        2,
        wrapped_height(title, inner_width),
        1,
        wrapped_height(description, inner_width),
        1,
        1,
    ]
    .into_iter()
    .fold(0u16, u16::saturating_add)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalViewport {
    width: u16,
    height: u16,
    card_height: u16,
}

impl TerminalViewport {
    pub fn new(story: &Story, width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            card_height: Self::tallest_card(story, width),
        }
    }

    /// Apply a terminal resize. Returns true when the pinned section changed height.
    pub fn resize(&mut self, story: &Story, width: u16, height: u16) -> bool {
        let before = self.pinned_height();
        self.width = width;
        self.height = height;
        self.card_height = Self::tallest_card(story, width);
        self.pinned_height() != before
    }

    fn tallest_card(story: &Story, width: u16) -> u16 {
        let text_width = body_columns(Rect::new(0, 0, width, 1))[1].width;
        let inner = text_width.saturating_sub(2);
        story
            .iter()
            .map(|step| card_height(step.title(), step.description(), inner))
            .max()
            .unwrap_or(0)
    }

    /// Rows available to the document
    pub fn body_height(&self) -> u16 {
        self.height.saturating_sub(CHROME_ROWS)
    }

    pub fn pinned_height(&self) -> u16 {
        self.card_height.min(self.body_height())
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }
}

impl Viewport for TerminalViewport {
    fn measure(&self) -> Option<Measurements> {
        if self.width == 0 || self.body_height() == 0 {
            return None;
        }
        Some(Measurements::new(
            0.0,
            self.pinned_height() as f64,
            self.body_height() as f64,
        ))
    }

    fn observes_content_size(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storyscroll_core::StepSpec;

    fn story() -> Story {
        Story::new(vec![
            StepSpec {
                title: "Short".to_string(),
                description: "One line.".to_string(),
                asset: Some("a.png".to_string()),
                ..Default::default()
            },
            StepSpec {
                title: "Longer step".to_string(),
                description: "word ".repeat(40),
                asset: Some("b.png".to_string()),
                ..Default::default()
            },
        ])
        .unwrap()
    }

    #[test]
    fn test_wrapped_height() {
        assert_eq!(wrapped_height("", 10), 1);
        assert_eq!(wrapped_height("abcdefghij", 10), 1);
        assert_eq!(wrapped_height("abcdefghijk", 10), 2);
        assert_eq!(wrapped_height("a\n\nb", 10), 3);
        assert_eq!(wrapped_height("abc", 0), 1);
    }

    #[test]
    fn test_wrapped_height_breaks_on_words() {
        // Ten columns of text, but no word fits after "ab"
        assert_eq!(wrapped_height("ab cdef gh", 5), 3);
        assert_eq!(wrapped_height("ab cd", 5), 1);
        assert_eq!(wrapped_height("abcdefghijkl mn", 5), 3);
    }

    #[test]
    fn test_wrapped_height_saturates() {
        let text = "a ".repeat(70_000);
        assert_eq!(wrapped_height(&text, 1), u16::MAX);
        let card = card_height("title", &text, 1);
        assert_eq!(card, u16::MAX);
    }

    #[test]
    fn test_measure_uses_body_rows() {
        let viewport = TerminalViewport::new(&story(), 100, 42);
        let m = viewport.measure().unwrap();
        assert_eq!(m.viewport_height, 40.0);
        assert_eq!(m.pin_start, 0.0);
        assert!(m.pinned_height > 0.0 && m.pinned_height <= 40.0);
        assert!(viewport.observes_content_size());
    }

    #[test]
    fn test_tiny_terminal_is_unmeasurable() {
        assert!(TerminalViewport::new(&story(), 80, 2).measure().is_none());
        assert!(TerminalViewport::new(&story(), 0, 30).measure().is_none());
    }

    #[test]
    fn test_narrower_terminal_grows_card() {
        let story = story();
        let mut viewport = TerminalViewport::new(&story, 200, 60);
        let wide = viewport.pinned_height();
        assert!(viewport.resize(&story, 60, 60));
        assert!(viewport.pinned_height() > wide);
        assert!(!viewport.resize(&story, 60, 60));
    }
}
