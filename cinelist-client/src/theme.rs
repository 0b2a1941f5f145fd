//! Color themes.

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    pub bg_highlight: Color,
    pub primary: Color,
    pub primary_dim: Color,
    pub accent: Color,
    pub success: Color,
    pub error: Color,
    pub text: Color,
    pub text_dim: Color,
    pub border: Color,
    pub border_focus: Color,
}

impl Theme {
    /// Look up a theme by its config name, case-insensitively.
    pub fn by_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "plain" => Some(Self::plain()),
            "contrast" => Some(Self::contrast()),
            _ => None,
        }
    }

    pub fn plain() -> Self {
        Self {
            bg_highlight: Color::Rgb(221, 221, 221),
            primary: Color::Rgb(37, 99, 235),
            primary_dim: Color::Rgb(96, 125, 180),
            accent: Color::Rgb(134, 239, 172),
            success: Color::Rgb(22, 163, 74),
            error: Color::Rgb(220, 38, 38),
            text: Color::Reset,
            text_dim: Color::Rgb(107, 114, 128),
            border: Color::Rgb(156, 163, 175),
            border_focus: Color::Rgb(37, 99, 235),
        }
    }

    pub fn contrast() -> Self {
        Self {
            bg_highlight: Color::Rgb(42, 42, 42),
            primary: Color::Rgb(0, 255, 255),
            primary_dim: Color::Rgb(0, 136, 136),
            accent: Color::Rgb(255, 0, 255),
            success: Color::Rgb(0, 255, 0),
            error: Color::Rgb(255, 0, 0),
            text: Color::Rgb(255, 255, 255),
            text_dim: Color::Rgb(136, 136, 136),
            border: Color::Rgb(68, 68, 68),
            border_focus: Color::Rgb(0, 255, 255),
        }
    }

    pub fn highlighted_row(&self) -> Style {
        Style::default().bg(self.bg_highlight).fg(self.error)
    }

    /// Rows the server has not acknowledged yet.
    pub fn unsynced_row(&self) -> Style {
        Style::default()
            .fg(self.text_dim)
            .add_modifier(Modifier::ITALIC)
    }

    pub fn error_text(&self) -> Style {
        Style::default().fg(self.error)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::plain()
    }
}
