//! Theme colors, with optional overrides from the `[theme]` config table

use ratatui::style::Color;

use crate::config::ThemeConfig;

#[derive(Debug, Clone)]
pub struct Theme {
    pub accent: Color,           // Active borders, selected vote button
    pub dogs: Color,             // Dogs bar
    pub cats: Color,             // Cats bar
    pub success: Color,
    pub warning: Color,
    pub danger: Color,           // Error line
    pub text: Color,
    pub text_dim: Color,
    pub inactive: Color,         // Borders, unselected buttons
}

impl Default for Theme {
    fn default() -> Self {
        // Catppuccin-inspired palette
        Self {
            accent: Color::Rgb(250, 179, 135),
            dogs: Color::Rgb(250, 179, 135),
            cats: Color::Rgb(137, 180, 250),
            success: Color::Rgb(166, 218, 149),
            warning: Color::Rgb(249, 226, 175),
            danger: Color::Rgb(243, 139, 168),
            text: Color::Rgb(205, 214, 244),
            text_dim: Color::Rgb(147, 153, 178),
            inactive: Color::Rgb(88, 91, 112),
        }
    }
}

impl Theme {
    /// Defaults with any valid config overrides applied; bad values are
    /// logged and skipped
    pub fn from_config(config: &ThemeConfig) -> Self {
        let mut theme = Self::default();

        let overrides = [
            ("accent", &config.accent, &mut theme.accent),
            ("dogs", &config.dogs, &mut theme.dogs),
            ("cats", &config.cats, &mut theme.cats),
            ("error", &config.error, &mut theme.danger),
        ];

        for (name, value, slot) in overrides {
            let Some(value) = value else { continue };
            match parse_hex_color(value) {
                Some(color) => *slot = color,
                None => tracing::warn!("Ignoring invalid theme color {} = {:?}", name, value),
            }
        }

        theme
    }
}

/// Parse a hex color string (#RRGGBB or #RGB)
fn parse_hex_color(s: &str) -> Option<Color> {
    let s = s.trim().trim_start_matches('#');
    // from_str_radix alone would accept a leading '+'
    if !s.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    match s.len() {
        6 => {
            let r = u8::from_str_radix(&s[0..2], 16).ok()?;
            let g = u8::from_str_radix(&s[2..4], 16).ok()?;
            let b = u8::from_str_radix(&s[4..6], 16).ok()?;
            Some(Color::Rgb(r, g, b))
        }
        3 => {
            let r = u8::from_str_radix(&s[0..1], 16).ok()? * 17;
            let g = u8::from_str_radix(&s[1..2], 16).ok()? * 17;
            let b = u8::from_str_radix(&s[2..3], 16).ok()? * 17;
            Some(Color::Rgb(r, g, b))
        }
        _ => None,
    }
}
