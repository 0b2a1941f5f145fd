//! Status indicator widget.

use crate::theme::Theme;
use cinelist_core::Stats;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub struct StatusIndicator {
    pub title: String,
    pub status: String,
    pub style: Style,
}

impl StatusIndicator {
    /// Item count box shown next to the search field.
    pub fn for_stats(stats: Stats, theme: &Theme) -> Self {
        Self {
            title: "Stats".to_string(),
            status: format!("Total items: {}", stats.total),
            style: Style::default().fg(theme.text).add_modifier(Modifier::BOLD),
        }
    }

    pub fn render(&self, f: &mut Frame<'_>, area: Rect) {
        let paragraph = Paragraph::new(self.status.as_str()).style(self.style).block(
            Block::default()
                .title(self.title.as_str())
                .borders(Borders::ALL),
        );
        f.render_widget(paragraph, area);
    }
}
