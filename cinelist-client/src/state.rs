//! Search and selection state for the item list.
//!
//! Transitions are synchronous and never talk to the server. Anything that
//! needs a round trip comes back as a [`ListCommand`] for the controller.

use crate::debounce::Debouncer;
use cinelist_core::Item;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListMode {
    /// Nothing pending and no highlight movement yet.
    Idle,
    /// Search input changed; the term updates once the debounce elapses.
    Filtering,
    /// Highlight moved by keyboard or pointer.
    Navigating,
    /// Inline edit of one item.
    Editing { id: String, draft: String },
    /// A select request is in flight.
    Selecting { id: String },
    /// The add form is open.
    Adding { draft: String, submitting: bool },
}

/// Work the controller must carry out against the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListCommand {
    Select(Item),
    Edit { id: String, label: String },
    /// The raw form text. The server decides whether it is valid.
    Add { label: String },
}

#[derive(Debug, Clone)]
pub struct ListState {
    input: String,
    term: String,
    debouncer: Debouncer<String>,
    highlighted: Option<usize>,
    mode: ListMode,
    error: Option<String>,
}

impl ListState {
    pub fn new(debounce: Duration) -> Self {
        Self {
            input: String::new(),
            term: String::new(),
            debouncer: Debouncer::new(debounce),
            highlighted: None,
            mode: ListMode::Idle,
            error: None,
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    /// The term the list is currently filtered by.
    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.highlighted
    }

    pub fn mode(&self) -> &ListMode {
        &self.mode
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    pub fn editing_id(&self) -> Option<&str> {
        match &self.mode {
            ListMode::Editing { id, .. } => Some(id),
            _ => None,
        }
    }

    pub fn is_adding(&self) -> bool {
        matches!(self.mode, ListMode::Adding { .. })
    }

    /// Next debounce deadline, if a term change is pending.
    pub fn debounce_deadline(&self) -> Option<Instant> {
        self.debouncer.deadline()
    }

    /// Items matching the active term, in list order.
    pub fn visible(&self, items: &[Item]) -> Vec<Item> {
        filter_items(items, &self.term)
    }

    // ------------------------------------------------------------------
    // Text input
    // ------------------------------------------------------------------

    /// Route a typed character to whichever text field has focus.
    pub fn push_char(&mut self, c: char, now: Instant) {
        if let Some(draft) = self.draft_mut() {
            draft.push(c);
            return;
        }
        if self.is_adding() {
            return;
        }
        let mut input = std::mem::take(&mut self.input);
        input.push(c);
        self.set_input(input, now);
    }

    pub fn pop_char(&mut self, now: Instant) {
        if let Some(draft) = self.draft_mut() {
            draft.pop();
            return;
        }
        if self.is_adding() || self.input.is_empty() {
            return;
        }
        let mut input = std::mem::take(&mut self.input);
        input.pop();
        self.set_input(input, now);
    }

    /// The focused edit or add field, unless a submission is pending.
    fn draft_mut(&mut self) -> Option<&mut String> {
        match &mut self.mode {
            ListMode::Editing { draft, .. }
            | ListMode::Adding {
                draft,
                submitting: false,
            } => Some(draft),
            _ => None,
        }
    }

    /// Replace the search input and restart the debounce timer.
    pub fn set_input(&mut self, input: String, now: Instant) {
        self.debouncer.push(input.clone(), now);
        self.input = input;
        if matches!(self.mode, ListMode::Idle | ListMode::Navigating) {
            self.mode = ListMode::Filtering;
        }
    }

    /// Apply the debounced term once its delay has passed. Returns true when
    /// the term changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(term) = self.debouncer.poll(now) else {
            return false;
        };
        self.term = term;
        self.highlighted = None;
        if self.mode == ListMode::Filtering {
            self.mode = ListMode::Idle;
        }
        true
    }

    // ------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------

    pub fn move_down(&mut self, len: usize) {
        if len == 0 || !self.can_navigate() {
            return;
        }
        self.highlighted = next_index(self.highlighted, len);
        self.mode = ListMode::Navigating;
    }

    pub fn move_up(&mut self, len: usize) {
        if len == 0 || !self.can_navigate() {
            return;
        }
        self.highlighted = prev_index(self.highlighted, len);
        self.mode = ListMode::Navigating;
    }

    /// Pointer moved over row `index`.
    pub fn hover(&mut self, index: usize, len: usize) {
        if index < len && !self.is_adding() {
            self.highlighted = Some(index);
        }
    }

    /// Drop a highlight that fell off the end of a shrunken list.
    pub fn clamp(&mut self, len: usize) {
        if self.highlighted.is_some_and(|i| i >= len) {
            self.highlighted = None;
        }
    }

    fn can_navigate(&self) -> bool {
        matches!(
            self.mode,
            ListMode::Idle | ListMode::Filtering | ListMode::Navigating
        )
    }

    // ------------------------------------------------------------------
    // Commands
    // ------------------------------------------------------------------

    /// Enter: commits an edit, submits the add form, or selects the
    /// highlighted item.
    pub fn confirm(&mut self, visible: &[Item]) -> Option<ListCommand> {
        match &self.mode {
            ListMode::Editing { .. } => self.commit_edit(),
            ListMode::Adding { .. } => self.submit_add(),
            ListMode::Selecting { .. } => None,
            _ => {
                let item = visible.get(self.highlighted?)?.clone();
                self.begin_select(&item);
                Some(ListCommand::Select(item))
            }
        }
    }

    /// Single click on row `index`. A pending inline edit of another row is
    /// committed first, as if its field lost focus.
    pub fn click(&mut self, index: usize, visible: &[Item]) -> Vec<ListCommand> {
        let Some(item) = visible.get(index) else {
            return Vec::new();
        };
        if self.is_adding() || matches!(self.mode, ListMode::Selecting { .. }) {
            return Vec::new();
        }
        if self.editing_id() == Some(item.id.as_str()) {
            return Vec::new();
        }

        let mut commands = Vec::new();
        if self.editing_id().is_some() {
            commands.extend(self.blur());
        }
        self.highlighted = Some(index);
        let item = item.clone();
        self.begin_select(&item);
        commands.push(ListCommand::Select(item));
        commands
    }

    /// Double click on row `index` opens the inline editor.
    pub fn double_click(&mut self, index: usize, visible: &[Item]) {
        if let Some(item) = visible.get(index) {
            if self.is_adding() {
                return;
            }
            self.highlighted = Some(index);
            self.start_edit(item);
        }
    }

    /// Keyboard equivalent of a double click on the highlighted row.
    pub fn edit_highlighted(&mut self, visible: &[Item]) {
        if let Some(index) = self.highlighted {
            self.double_click(index, visible);
        }
    }

    pub fn start_edit(&mut self, item: &Item) {
        self.error = None;
        self.mode = ListMode::Editing {
            id: item.id.clone(),
            draft: item.label.clone(),
        };
    }

    /// Commit the inline edit. A blank draft keeps the editor open.
    pub fn commit_edit(&mut self) -> Option<ListCommand> {
        let ListMode::Editing { id, draft } = &self.mode else {
            return None;
        };
        let label = draft.trim();
        if label.is_empty() {
            return None;
        }
        let command = ListCommand::Edit {
            id: id.clone(),
            label: label.to_string(),
        };
        self.mode = ListMode::Navigating;
        Some(command)
    }

    /// The edit field lost focus. Same as committing.
    pub fn blur(&mut self) -> Option<ListCommand> {
        self.commit_edit()
    }

    pub fn edit_failed(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        if self.editing_id().is_some() {
            self.mode = ListMode::Navigating;
        }
    }

    pub fn start_add(&mut self) {
        if matches!(self.mode, ListMode::Selecting { .. }) {
            return;
        }
        self.mode = ListMode::Adding {
            draft: String::new(),
            submitting: false,
        };
    }

    /// Submit the add form. Ignored while a previous submission is pending.
    pub fn submit_add(&mut self) -> Option<ListCommand> {
        let ListMode::Adding { draft, submitting } = &mut self.mode else {
            return None;
        };
        if *submitting {
            return None;
        }
        *submitting = true;
        self.error = None;
        Some(ListCommand::Add {
            label: draft.clone(),
        })
    }

    /// The add went through: the form resets and closes.
    pub fn add_succeeded(&mut self) {
        self.error = None;
        if self.is_adding() {
            self.mode = ListMode::Idle;
        }
    }

    /// The add was rejected: the error is shown and add mode closes.
    pub fn add_failed(&mut self, error: impl Into<String>) {
        self.error = Some(error.into());
        if self.is_adding() {
            self.mode = ListMode::Idle;
        }
    }

    pub fn begin_select(&mut self, item: &Item) {
        self.mode = ListMode::Selecting {
            id: item.id.clone(),
        };
    }

    pub fn select_finished(&mut self, error: Option<String>) {
        if let Some(error) = error {
            self.error = Some(error);
        }
        if matches!(self.mode, ListMode::Selecting { .. }) {
            self.mode = ListMode::Navigating;
        }
    }

    /// Escape: discards an edit draft or closes the add form.
    pub fn cancel(&mut self) {
        match &self.mode {
            ListMode::Editing { .. } => self.mode = ListMode::Navigating,
            ListMode::Adding {
                submitting: false, ..
            } => self.mode = ListMode::Idle,
            _ => {}
        }
    }
}

/// Case-insensitive substring filter on the trimmed term. A blank term
/// matches everything.
pub fn filter_items(items: &[Item], term: &str) -> Vec<Item> {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return items.to_vec();
    }
    items
        .iter()
        .filter(|item| item.label.to_lowercase().contains(&term))
        .cloned()
        .collect()
}

/// Circular step forward. From no highlight the first row is chosen.
pub fn next_index(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(i) if i + 1 < len => i + 1,
        Some(_) => 0,
        None => 0,
    })
}

/// Circular step backward. From no highlight the last row is chosen.
pub fn prev_index(current: Option<usize>, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(match current {
        Some(0) | None => len - 1,
        Some(i) if i < len => i - 1,
        Some(_) => len - 1,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debounce::DEFAULT_SEARCH_DEBOUNCE;

    fn items() -> Vec<Item> {
        vec![
            Item::new("1", "Task 1"),
            Item::new("2", "Task 2"),
            Item::new("3", "Groceries"),
        ]
    }

    fn state() -> ListState {
        ListState::new(DEFAULT_SEARCH_DEBOUNCE)
    }

    #[test]
    fn test_filter_is_case_insensitive_and_trimmed() {
        let filtered = filter_items(&items(), "  TASK ");
        assert_eq!(filtered.len(), 2);
        assert_eq!(filter_items(&items(), "").len(), 3);
        assert!(filter_items(&items(), "zzz").is_empty());
    }

    #[test]
    fn test_term_updates_only_after_debounce() {
        let mut state = state();
        let start = Instant::now();
        state.move_down(3);
        assert_eq!(state.highlighted(), Some(0));

        for (i, c) in "gro".chars().enumerate() {
            state.push_char(c, start + Duration::from_millis(50 * i as u64));
        }
        assert_eq!(state.mode(), &ListMode::Filtering);
        assert!(!state.tick(start + Duration::from_millis(200)));
        assert_eq!(state.term(), "");
        assert_eq!(state.highlighted(), Some(0));

        assert!(state.tick(start + Duration::from_millis(400)));
        assert_eq!(state.term(), "gro");
        assert_eq!(state.highlighted(), None);
        assert_eq!(state.mode(), &ListMode::Idle);
        assert_eq!(state.visible(&items()).len(), 1);
    }

    #[test]
    fn test_navigation_wraps_both_ways() {
        let mut state = state();
        state.move_up(3);
        assert_eq!(state.highlighted(), Some(2));
        state.move_down(3);
        assert_eq!(state.highlighted(), Some(0));
        state.move_up(3);
        assert_eq!(state.highlighted(), Some(2));
        state.move_down(0);
        assert_eq!(state.highlighted(), Some(2));
    }

    #[test]
    fn test_enter_selects_highlighted_item() {
        let mut state = state();
        let visible = items();
        assert_eq!(state.confirm(&visible), None);

        state.move_down(visible.len());
        state.move_down(visible.len());
        let command = state.confirm(&visible);
        assert_eq!(command, Some(ListCommand::Select(visible[1].clone())));
        assert_eq!(
            state.mode(),
            &ListMode::Selecting {
                id: "2".to_string()
            }
        );
        state.select_finished(None);
        assert_eq!(state.mode(), &ListMode::Navigating);
    }

    #[test]
    fn test_click_on_item_being_edited_does_not_select() {
        let mut state = state();
        let visible = items();
        state.double_click(0, &visible);
        assert_eq!(state.editing_id(), Some("1"));

        assert!(state.click(0, &visible).is_empty());
        assert_eq!(state.editing_id(), Some("1"));
    }

    #[test]
    fn test_click_elsewhere_commits_edit_then_selects() {
        let mut state = state();
        let visible = items();
        state.double_click(0, &visible);
        state.push_char('!', Instant::now());

        let commands = state.click(2, &visible);
        assert_eq!(
            commands,
            vec![
                ListCommand::Edit {
                    id: "1".to_string(),
                    label: "Task 1!".to_string()
                },
                ListCommand::Select(visible[2].clone()),
            ]
        );
        assert_eq!(state.highlighted(), Some(2));
    }

    #[test]
    fn test_edit_commit_trims_and_blank_stays_open() {
        let mut state = state();
        let visible = items();
        state.double_click(1, &visible);
        let now = Instant::now();
        for _ in 0.."Task 2".len() {
            state.pop_char(now);
        }
        assert_eq!(state.confirm(&visible), None);
        assert_eq!(state.editing_id(), Some("2"));

        for c in "  Updated ".chars() {
            state.push_char(c, now);
        }
        assert_eq!(
            state.confirm(&visible),
            Some(ListCommand::Edit {
                id: "2".to_string(),
                label: "Updated".to_string()
            })
        );
        assert_eq!(state.mode(), &ListMode::Navigating);
        assert_eq!(state.input(), "");
    }

    #[test]
    fn test_escape_discards_edit() {
        let mut state = state();
        let visible = items();
        state.double_click(0, &visible);
        state.push_char('x', Instant::now());
        state.cancel();
        assert_eq!(state.editing_id(), None);
        assert_eq!(state.mode(), &ListMode::Navigating);
    }

    #[test]
    fn test_add_mode_submit_and_failure() {
        let mut state = state();
        state.start_add();
        for c in "an error".chars() {
            state.push_char(c, Instant::now());
        }
        let command = state.submit_add();
        assert_eq!(
            command,
            Some(ListCommand::Add {
                label: "an error".to_string()
            })
        );
        assert_eq!(state.submit_add(), None);

        state.add_failed("Simulated server error");
        assert!(!state.is_adding());
        assert_eq!(state.error(), Some("Simulated server error"));
    }

    #[test]
    fn test_add_success_closes_form() {
        let mut state = state();
        state.set_error("old");
        state.start_add();
        state.push_char('x', Instant::now());
        assert!(state.submit_add().is_some());
        state.add_succeeded();
        assert_eq!(state.mode(), &ListMode::Idle);
        assert_eq!(state.error(), None);
    }

    #[test]
    fn test_hover_moves_highlight_and_clamp_drops_stale_index() {
        let mut state = state();
        state.hover(2, 3);
        assert_eq!(state.highlighted(), Some(2));
        state.hover(7, 3);
        assert_eq!(state.highlighted(), Some(2));
        state.clamp(2);
        assert_eq!(state.highlighted(), None);
    }
}
