use ratatui::style::Color;

/// Colors used by the terminal host
#[derive(Debug, Clone)]
pub struct Theme {
    // Background colors
    pub bg0: Color,
    pub bg1: Color,
    pub bg2: Color,

    // Foreground colors
    pub fg0: Color,
    pub grey1: Color,
    pub grey2: Color,

    // Semantic colors
    pub accent: Color,
    pub highlight: Color,
    pub progress: Color,
    pub error: Color,
}

impl Default for Theme {
    fn default() -> Self {
        // Gruvbox Material dark
        Self {
            bg0: Color::Rgb(0x28, 0x28, 0x28),
            bg1: Color::Rgb(0x32, 0x30, 0x2f),
            bg2: Color::Rgb(0x45, 0x40, 0x3d),
            fg0: Color::Rgb(0xd4, 0xbe, 0x98),
            grey1: Color::Rgb(0x92, 0x83, 0x74),
            grey2: Color::Rgb(0xa8, 0x99, 0x84),
            accent: Color::Rgb(0x89, 0xb4, 0x82),
            highlight: Color::Rgb(0xd8, 0xa6, 0x57),
            progress: Color::Rgb(0x7d, 0xae, 0xa3),
            error: Color::Rgb(0xea, 0x69, 0x62),
        }
    }
}

impl Theme {
    /// RGB components of the main background
    pub fn background_rgb(&self) -> [u8; 3] {
        match self.bg0 {
            Color::Rgb(r, g, b) => [r, g, b],
            _ => [0, 0, 0],
        }
    }
}

/// Mix `color` into `background` at `opacity`
///
/// Terminals have no alpha channel, so a fading element is drawn in a color
/// between its own and the background's. Non-RGB colors switch at half opacity.
pub fn fade(color: Color, background: Color, opacity: f64) -> Color {
    let t = opacity.clamp(0.0, 1.0);
    match (color, background) {
        (Color::Rgb(r1, g1, b1), Color::Rgb(r2, g2, b2)) => {
            let mix = |a: u8, b: u8| (b as f64 + (a as f64 - b as f64) * t).round() as u8;
            Color::Rgb(mix(r1, r2), mix(g1, g2), mix(b1, b2))
        }
        _ if t >= 0.5 => color,
        _ => background,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fade_endpoints() {
        let fg = Color::Rgb(200, 100, 0);
        let bg = Color::Rgb(0, 0, 0);
        assert_eq!(fade(fg, bg, 1.0), fg);
        assert_eq!(fade(fg, bg, 0.0), bg);
        assert_eq!(fade(fg, bg, 0.5), Color::Rgb(100, 50, 0));
    }

    #[test]
    fn test_fade_named_colors() {
        assert_eq!(fade(Color::White, Color::Black, 0.7), Color::White);
        assert_eq!(fade(Color::White, Color::Black, 0.2), Color::Black);
    }

    #[test]
    fn test_background_rgb() {
        assert_eq!(Theme::default().background_rgb(), [0x28, 0x28, 0x28]);
    }
}
