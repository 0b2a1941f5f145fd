//! The item list, with inline editing.

use super::{scroll_offset, ListLayout};
use crate::controller::ListController;
use crate::state::ListMode;
use crate::theme::Theme;
use ratatui::{
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub fn render<A>(f: &mut Frame<'_>, controller: &ListController<A>, theme: &Theme, layout: &ListLayout) {
    let state = controller.state();
    let visible = controller.visible();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.border))
        .title("Items");

    if visible.is_empty() {
        let empty = Paragraph::new("No items found.")
            .style(Style::default().fg(theme.text_dim))
            .block(block);
        f.render_widget(empty, layout.list);
        return;
    }

    let height = layout.list_height();
    let offset = scroll_offset(state.highlighted(), height);
    let lines: Vec<Line> = visible
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(index, item)| {
            if let ListMode::Editing { id, draft } = state.mode() {
                if *id == item.id {
                    return Line::from(vec![
                        Span::styled("✎ ", Style::default().fg(theme.primary)),
                        Span::styled(
                            format!("{}▏", draft),
                            Style::default()
                                .fg(theme.text)
                                .add_modifier(Modifier::UNDERLINED),
                        ),
                    ]);
                }
            }
            let style = if state.highlighted() == Some(index) {
                theme.highlighted_row()
            } else if controller.list().is_unsynced(&item.id) {
                theme.unsynced_row()
            } else {
                Style::default().fg(theme.text)
            };
            Line::from(Span::styled(item.label.clone(), style))
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), layout.list);
}
