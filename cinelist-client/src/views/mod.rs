//! Screen layout and rendering.

pub mod add_form;
pub mod list;

use crate::controller::ListController;
use crate::state::ListMode;
use crate::theme::Theme;
use crate::widgets::StatusIndicator;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Screen regions. Recomputed from the terminal size, so the event loop
/// can map mouse coordinates without keeping render state around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLayout {
    pub search: Rect,
    pub stats: Rect,
    pub error: Rect,
    pub list: Rect,
    pub footer: Rect,
}

impl ListLayout {
    pub fn compute(area: Rect) -> Self {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(1),
                Constraint::Min(3),
                Constraint::Length(3),
            ])
            .split(area);
        let header = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(20)])
            .split(rows[0]);

        Self {
            search: header[0],
            stats: header[1],
            error: rows[1],
            list: rows[2],
            footer: rows[3],
        }
    }

    /// Rows available for items inside the list border.
    pub fn list_height(&self) -> usize {
        usize::from(self.list.height.saturating_sub(2))
    }

    /// Index into the visible items under a terminal cell, if any.
    pub fn row_at(&self, column: u16, row: u16, offset: usize, len: usize) -> Option<usize> {
        let inner_left = self.list.x + 1;
        let inner_right = self.list.x + self.list.width.saturating_sub(1);
        let inner_top = self.list.y + 1;
        let inner_bottom = self.list.y + self.list.height.saturating_sub(1);
        if column < inner_left || column >= inner_right || row < inner_top || row >= inner_bottom {
            return None;
        }
        let index = offset + usize::from(row - inner_top);
        (index < len).then_some(index)
    }
}

/// First row to draw so the highlight stays on screen.
pub fn scroll_offset(highlighted: Option<usize>, height: usize) -> usize {
    match highlighted {
        Some(index) if height > 0 && index >= height => index + 1 - height,
        _ => 0,
    }
}

pub fn render_view<A>(f: &mut Frame<'_>, controller: &ListController<A>, theme: &Theme) {
    let layout = ListLayout::compute(f.size());
    let state = controller.state();

    render_search(f, controller, theme, layout.search);

    StatusIndicator::for_stats(controller.stats(), theme).render(f, layout.stats);

    if let Some(error) = state.error() {
        f.render_widget(
            Paragraph::new(error.to_string()).style(theme.error_text()),
            layout.error,
        );
    }

    list::render(f, controller, theme, &layout);
    render_footer(f, controller, theme, layout.footer);

    if let ListMode::Adding { draft, submitting } = state.mode() {
        add_form::render(f, theme, draft, *submitting);
    }
}

fn render_search<A>(f: &mut Frame<'_>, controller: &ListController<A>, theme: &Theme, area: Rect) {
    let state = controller.state();
    let focused = matches!(
        state.mode(),
        ListMode::Idle | ListMode::Filtering | ListMode::Navigating
    );
    let border = if focused {
        theme.border_focus
    } else {
        theme.border
    };
    let mut spans = vec![Span::raw(state.input().to_string())];
    if state.input().is_empty() {
        spans = vec![Span::styled("Search...", Style::default().fg(theme.text_dim))];
    }
    if *state.mode() == ListMode::Filtering {
        spans.push(Span::styled(" …", Style::default().fg(theme.text_dim)));
    }
    let search = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(border))
            .title("Search"),
    );
    f.render_widget(search, area);
}

fn render_footer<A>(f: &mut Frame<'_>, controller: &ListController<A>, theme: &Theme, area: Rect) {
    let help = match controller.state().mode() {
        ListMode::Editing { .. } => "Enter save • Esc cancel",
        ListMode::Adding { .. } => "Enter add • Esc close",
        ListMode::Selecting { .. } => "Selecting…",
        _ => "↑/↓ move • Enter select • F2 edit • Ctrl+N new • Ctrl+R refresh • Ctrl+Q quit",
    };
    let footer = Paragraph::new(help)
        .block(Block::default().borders(Borders::ALL))
        .style(Style::default().fg(theme.text_dim));
    f.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinelist_core::{Item, ItemSnapshot, Stats};
    use ratatui::{backend::TestBackend, Terminal};
    use std::time::Duration;

    fn screen_text(terminal: &Terminal<TestBackend>) -> String {
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|cell| cell.symbol()).collect()
    }

    fn seeded_controller() -> ListController<()> {
        let items = vec![Item::new("1", "Task 1"), Item::new("2", "Task 2")];
        let stats = Stats::of(&items);
        let mut controller = ListController::new((), Duration::from_millis(300));
        let ticket = controller.begin_refresh();
        controller.reconcile(ItemSnapshot::new(items, stats), ticket);
        controller
    }

    #[test]
    fn test_render_shows_items_and_total() {
        let controller = seeded_controller();
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|f| render_view(f, &controller, &Theme::plain()))
            .unwrap();

        let text = screen_text(&terminal);
        assert!(text.contains("Task 1"));
        assert!(text.contains("Task 2"));
        assert!(text.contains("Total items: 2"));
        assert!(text.contains("Search..."));
    }

    #[test]
    fn test_render_empty_list_message() {
        let controller: ListController<()> = ListController::new((), Duration::from_millis(300));
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal
            .draw(|f| render_view(f, &controller, &Theme::contrast()))
            .unwrap();
        assert!(screen_text(&terminal).contains("No items found."));
    }

    fn layout() -> ListLayout {
        ListLayout::compute(Rect::new(0, 0, 80, 20))
    }

    #[test]
    fn test_layout_regions_stack_vertically() {
        let layout = layout();
        assert_eq!(layout.search.y, 0);
        assert_eq!(layout.error.y, 3);
        assert_eq!(layout.list.y, 4);
        assert_eq!(layout.footer.y + layout.footer.height, 20);
        assert_eq!(layout.list_height(), usize::from(layout.list.height) - 2);
    }

    #[test]
    fn test_row_at_maps_inside_list_border_only() {
        let layout = layout();
        let first = layout.list.y + 1;
        assert_eq!(layout.row_at(5, first, 0, 3), Some(0));
        assert_eq!(layout.row_at(5, first + 2, 0, 3), Some(2));
        assert_eq!(layout.row_at(5, first + 3, 0, 3), None);
        assert_eq!(layout.row_at(5, layout.list.y, 0, 3), None);
        assert_eq!(layout.row_at(0, first, 0, 3), None);
        assert_eq!(layout.row_at(5, first, 4, 10), Some(4));
    }

    #[test]
    fn test_scroll_offset_keeps_highlight_visible() {
        assert_eq!(scroll_offset(None, 5), 0);
        assert_eq!(scroll_offset(Some(4), 5), 0);
        assert_eq!(scroll_offset(Some(5), 5), 1);
        assert_eq!(scroll_offset(Some(12), 5), 8);
        assert_eq!(scroll_offset(Some(3), 0), 0);
    }
}
