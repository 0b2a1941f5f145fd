//! Popup form for adding an item.

use crate::theme::Theme;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

pub fn render(f: &mut Frame<'_>, theme: &Theme, draft: &str, submitting: bool) {
    let area = centered(f.size(), 48, 5);
    f.render_widget(Clear, area);

    let (hint, hint_style) = if submitting {
        ("Adding...", Style::default().fg(theme.text_dim))
    } else {
        ("Enter to add", Style::default().fg(theme.success))
    };
    let input = if draft.is_empty() {
        Span::styled("New item label", Style::default().fg(theme.text_dim))
    } else {
        Span::styled(format!("{}▏", draft), Style::default().fg(theme.text))
    };
    let form = Paragraph::new(vec![Line::from(input), Line::from(Span::styled(hint, hint_style))])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.accent))
                .title("Add item"),
        );
    f.render_widget(form, area);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_fits_inside_small_areas() {
        let rect = centered(Rect::new(0, 0, 30, 4), 48, 5);
        assert_eq!(rect, Rect::new(0, 0, 30, 4));
        let rect = centered(Rect::new(0, 0, 80, 25), 48, 5);
        assert_eq!(rect, Rect::new(16, 10, 48, 5));
    }
}
