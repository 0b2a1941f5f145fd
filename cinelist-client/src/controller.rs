//! List controller: binds key and pointer input to the list state, the
//! optimistic reducer and the server.
//!
//! Every server round trip is split in three steps so the terminal can keep
//! drawing while a request is in flight:
//!
//! 1. [`ListController::prepare`] applies the optimistic update and returns a
//!    [`PendingEffect`].
//! 2. [`PendingEffect::execute`] performs the request. It borrows only the
//!    API, so it can run on a spawned task.
//! 3. [`ListController::complete`] confirms or rolls back, and the caller
//!    follows up with a snapshot refresh that reconciles.
//!
//! Refreshes are split the same way: [`ListController::begin_refresh`] hands
//! out the ticket that [`ListController::reconcile`] later checks.
//!
//! [`ListController::run`] chains all three for callers that can block.

use crate::api_client::{ApiClientError, ItemsApi};
use crate::keys::Action;
use crate::optimistic::{MutationId, OptimisticAction, OptimisticList, RefreshTicket};
use crate::state::{ListCommand, ListState};
use cinelist_core::{normalize_label, Item, ItemSnapshot, Stats};
use std::time::{Duration, Instant};

/// Pointer input, already mapped to a row of the visible list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointer {
    Hover(usize),
    Click(usize),
    DoubleClick(usize),
}

/// What the event loop should do after an input.
#[derive(Debug, Default)]
pub struct Outcome {
    pub quit: bool,
    pub refresh: bool,
    pub effects: Vec<PendingEffect>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Request {
    Add { label: String },
    Edit { id: String, label: String },
    Select(Item),
}

/// A server request whose optimistic half has already been applied.
#[derive(Debug, Clone)]
pub struct PendingEffect {
    mutation: Option<MutationId>,
    request: Request,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectKind {
    Add,
    Edit,
    Select,
}

/// Result of a [`PendingEffect`], fed back through
/// [`ListController::complete`].
#[derive(Debug, Clone)]
pub struct EffectResult {
    mutation: Option<MutationId>,
    kind: EffectKind,
    /// The row the server stored, for adds and edits.
    outcome: Result<Option<Item>, String>,
}

impl EffectResult {
    pub fn kind(&self) -> EffectKind {
        self.kind
    }

    pub fn error(&self) -> Option<&str> {
        self.outcome.as_ref().err().map(String::as_str)
    }
}

impl PendingEffect {
    pub fn kind(&self) -> EffectKind {
        match self.request {
            Request::Add { .. } => EffectKind::Add,
            Request::Edit { .. } => EffectKind::Edit,
            Request::Select(_) => EffectKind::Select,
        }
    }

    pub async fn execute<A: ItemsApi + ?Sized>(self, api: &A) -> EffectResult {
        let kind = self.kind();
        let outcome = match &self.request {
            Request::Add { label } => api.add_item(label).await.map(Some),
            Request::Edit { id, label } => api.edit_item(id, label).await.map(Some),
            Request::Select(item) => api.select_item(item).await.map(|_| None),
        };
        if let Err(err) = &outcome {
            tracing::warn!(?kind, error = %err, "Item request failed");
        }
        EffectResult {
            mutation: self.mutation,
            kind,
            outcome: outcome.map_err(|e| e.to_string()),
        }
    }
}

pub struct ListController<A> {
    api: A,
    list: OptimisticList,
    state: ListState,
}

impl<A> ListController<A> {
    pub fn new(api: A, debounce: Duration) -> Self {
        Self {
            api,
            list: OptimisticList::default(),
            state: ListState::new(debounce),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn state(&self) -> &ListState {
        &self.state
    }

    pub fn list(&self) -> &OptimisticList {
        &self.list
    }

    /// Items after optimistic mutations and the active search term.
    pub fn visible(&self) -> Vec<Item> {
        self.state.visible(&self.list.items())
    }

    pub fn stats(&self) -> Stats {
        self.list.stats()
    }

    /// Ticket for a snapshot request about to be sent.
    pub fn begin_refresh(&mut self) -> RefreshTicket {
        self.list.begin_refresh()
    }

    /// Apply a snapshot fetched under `ticket`. Returns false when a newer
    /// snapshot was already applied.
    pub fn reconcile(&mut self, snapshot: ItemSnapshot, ticket: RefreshTicket) -> bool {
        if !self.list.reconcile(snapshot, ticket) {
            tracing::debug!(?ticket, "Ignoring out-of-order snapshot");
            return false;
        }
        let len = self.visible().len();
        self.state.clamp(len);
        true
    }

    /// Record a failed refresh.
    pub fn refresh_failed(&mut self, error: &ApiClientError) {
        tracing::warn!(error = %error, "Snapshot refresh failed");
        self.state.set_error(error.to_string());
    }

    /// Release the debounced search term. Returns true when it changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        self.state.tick(now)
    }

    pub fn handle_action(&mut self, action: Action, now: Instant) -> Outcome {
        let mut outcome = Outcome::default();
        let visible = self.visible();
        let commands = match action {
            Action::Quit => {
                outcome.quit = true;
                Vec::new()
            }
            Action::Refresh => {
                outcome.refresh = true;
                Vec::new()
            }
            Action::MoveUp => {
                self.state.move_up(visible.len());
                Vec::new()
            }
            Action::MoveDown => {
                self.state.move_down(visible.len());
                Vec::new()
            }
            Action::Confirm => self.state.confirm(&visible).into_iter().collect(),
            Action::Cancel => {
                self.state.cancel();
                Vec::new()
            }
            Action::NewItem => {
                let commands: Vec<ListCommand> = self.state.blur().into_iter().collect();
                self.state.start_add();
                commands
            }
            Action::EditItem => {
                self.state.edit_highlighted(&visible);
                Vec::new()
            }
            Action::Input(c) => {
                self.state.push_char(c, now);
                Vec::new()
            }
            Action::Backspace => {
                self.state.pop_char(now);
                Vec::new()
            }
        };
        outcome.effects = self.prepare_all(commands);
        outcome
    }

    pub fn handle_pointer(&mut self, pointer: Pointer) -> Outcome {
        let visible = self.visible();
        let commands = match pointer {
            Pointer::Hover(index) => {
                self.state.hover(index, visible.len());
                Vec::new()
            }
            Pointer::Click(index) => self.state.click(index, &visible),
            Pointer::DoubleClick(index) => {
                self.state.double_click(index, &visible);
                Vec::new()
            }
        };
        Outcome {
            effects: self.prepare_all(commands),
            ..Outcome::default()
        }
    }

    fn prepare_all(&mut self, commands: Vec<ListCommand>) -> Vec<PendingEffect> {
        commands
            .into_iter()
            .filter_map(|command| self.prepare(command))
            .collect()
    }

    /// Apply the optimistic half of `command`.
    ///
    /// Adds with a usable label appear immediately under a temporary id. An
    /// edit only applies to items the server already knows; anything else
    /// is dropped.
    pub fn prepare(&mut self, command: ListCommand) -> Option<PendingEffect> {
        match command {
            ListCommand::Add { label } => {
                let mutation = normalize_label(&label).map(|trimmed| {
                    let item = Item::new(uuid::Uuid::new_v4().to_string(), trimmed);
                    self.list.apply(OptimisticAction::Add(item))
                });
                Some(PendingEffect {
                    mutation,
                    request: Request::Add { label },
                })
            }
            ListCommand::Edit { id, label } => {
                if !self.list.base().items.iter().any(|item| item.id == id) {
                    return None;
                }
                let mutation = self.list.apply(OptimisticAction::Edit {
                    id: id.clone(),
                    label: label.clone(),
                });
                Some(PendingEffect {
                    mutation: Some(mutation),
                    request: Request::Edit { id, label },
                })
            }
            ListCommand::Select(item) => Some(PendingEffect {
                mutation: None,
                request: Request::Select(item),
            }),
        }
    }

    /// Settle a finished request: confirm or roll back its mutation and
    /// move the list state out of its waiting mode.
    pub fn complete(&mut self, result: EffectResult) {
        match (&result.outcome, result.mutation) {
            (Ok(stored), Some(mutation)) => {
                self.list.confirm(mutation, stored.clone());
            }
            (Err(error), Some(mutation)) => {
                self.list.fail(mutation, error.clone());
            }
            _ => {}
        }

        match (result.kind, result.outcome) {
            (EffectKind::Add, Ok(_)) => self.state.add_succeeded(),
            (EffectKind::Add, Err(error)) => self.state.add_failed(error),
            (EffectKind::Edit, Ok(_)) => {}
            (EffectKind::Edit, Err(error)) => self.state.edit_failed(error),
            (EffectKind::Select, outcome) => self.state.select_finished(outcome.err()),
        }

        let len = self.visible().len();
        self.state.clamp(len);
    }
}

impl<A: ItemsApi> ListController<A> {
    /// Fetch the authoritative snapshot and reconcile with it.
    pub async fn refresh(&mut self) -> Result<(), ApiClientError> {
        let ticket = self.begin_refresh();
        let snapshot = self.api.snapshot().await?;
        self.reconcile(snapshot, ticket);
        Ok(())
    }

    /// Prepare, execute, complete and refresh in one call.
    pub async fn run(&mut self, command: ListCommand) -> Result<(), ApiClientError> {
        let Some(effect) = self.prepare(command) else {
            return Ok(());
        };
        let mutates = effect.kind() != EffectKind::Select;
        let result = effect.execute(&self.api).await;
        self.complete(result);
        if mutates {
            self.refresh().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimistic::MutationPhase;
    use crate::state::ListMode;
    use async_trait::async_trait;
    use cinelist_api::{ApiError, ItemActions, SelectAck};
    use cinelist_core::SIMULATED_FAULT_MESSAGE;

    /// Serves the item routes from in-process actions over a seeded store.
    struct StoreApi {
        actions: ItemActions,
    }

    fn to_client_error(err: ApiError) -> ApiClientError {
        ApiClientError::Server {
            status: err.status_code().as_u16(),
            code: err.code,
            message: err.message,
        }
    }

    #[async_trait]
    impl ItemsApi for StoreApi {
        async fn snapshot(&self) -> Result<ItemSnapshot, ApiClientError> {
            let read = self
                .actions
                .queries()
                .snapshot()
                .await
                .map_err(|e| to_client_error(ApiError::from(e)))?;
            Ok(read.into_snapshot())
        }

        async fn add_item(&self, label: &str) -> Result<Item, ApiClientError> {
            self.actions.add(Some(label)).await.map_err(to_client_error)
        }

        async fn edit_item(&self, id: &str, label: &str) -> Result<Item, ApiClientError> {
            self.actions
                .edit(id, Some(label))
                .await
                .map_err(to_client_error)
        }

        async fn select_item(&self, item: &Item) -> Result<SelectAck, ApiClientError> {
            self.actions.select(item).await.map_err(to_client_error)
        }
    }

    fn store_api() -> StoreApi {
        StoreApi {
            actions: ItemActions::new(cinelist_test_utils::seeded_queries(), Duration::ZERO),
        }
    }

    async fn controller() -> ListController<StoreApi> {
        let mut controller = ListController::new(store_api(), Duration::from_millis(300));
        controller.refresh().await.unwrap();
        controller
    }

    fn type_text(controller: &mut ListController<StoreApi>, text: &str) {
        let now = Instant::now();
        for c in text.chars() {
            controller.handle_action(Action::Input(c), now);
        }
    }

    #[tokio::test]
    async fn test_add_flow_shows_item_before_server_confirms() {
        let mut controller = controller().await;
        controller.handle_action(Action::NewItem, Instant::now());
        type_text(&mut controller, " Task 4 ");

        let outcome = controller.handle_action(Action::Confirm, Instant::now());
        assert_eq!(outcome.effects.len(), 1);
        assert_eq!(controller.visible().len(), 4);
        assert_eq!(controller.stats().total, 4);
        assert_eq!(controller.list().phase(), MutationPhase::PendingOptimistic);

        for effect in outcome.effects {
            let result = effect.execute(controller.api()).await;
            controller.complete(result);
        }
        controller.refresh().await.unwrap();

        assert_eq!(controller.list().phase(), MutationPhase::Reconciled);
        assert_eq!(controller.list().pending_len(), 0);
        let labels: Vec<_> = controller.visible().into_iter().map(|i| i.label).collect();
        assert_eq!(labels, vec!["Task 1", "Task 2", "Task 3", "Task 4"]);
        assert_eq!(controller.state().mode(), &ListMode::Idle);
    }

    #[tokio::test]
    async fn test_failed_add_rolls_back_and_closes_form() {
        let mut controller = controller().await;
        controller.handle_action(Action::NewItem, Instant::now());
        type_text(&mut controller, "contains error word");

        controller
            .run(ListCommand::Add {
                label: "contains error word".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(controller.visible().len(), 3);
        assert_eq!(controller.stats().total, 3);
        assert!(!controller.state().is_adding());
        assert_eq!(controller.state().error(), Some(SIMULATED_FAULT_MESSAGE));
    }

    #[tokio::test]
    async fn test_blank_add_shows_validation_error_without_optimistic_item() {
        let mut controller = controller().await;
        controller.handle_action(Action::NewItem, Instant::now());
        let outcome = controller.handle_action(Action::Confirm, Instant::now());
        assert_eq!(controller.list().pending_len(), 0);

        for effect in outcome.effects {
            let result = effect.execute(controller.api()).await;
            assert_eq!(result.error(), Some("Invalid label"));
            controller.complete(result);
        }
        assert_eq!(controller.state().error(), Some("Invalid label"));
        assert!(!controller.state().is_adding());
    }

    #[tokio::test]
    async fn test_inline_edit_commits_optimistically() {
        let mut controller = controller().await;
        controller.handle_pointer(Pointer::DoubleClick(1));
        assert_eq!(controller.state().editing_id(), Some("2"));

        let now = Instant::now();
        for _ in 0.."Task 2".len() {
            controller.handle_action(Action::Backspace, now);
        }
        type_text(&mut controller, "Updated");

        let outcome = controller.handle_action(Action::Confirm, now);
        assert_eq!(controller.visible()[1].label, "Updated");
        for effect in outcome.effects {
            let result = effect.execute(controller.api()).await;
            controller.complete(result);
        }
        controller.refresh().await.unwrap();
        assert_eq!(controller.visible()[1].label, "Updated");
        assert_eq!(controller.stats().total, 3);
    }

    #[tokio::test]
    async fn test_failed_edit_restores_label_and_returns_to_read_mode() {
        let mut controller = controller().await;
        controller
            .run(ListCommand::Edit {
                id: "1".to_string(),
                label: "ERROR here".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(controller.visible()[0].label, "Task 1");
        assert_eq!(controller.list().phase(), MutationPhase::RolledBack);
        assert_eq!(controller.state().error(), Some(SIMULATED_FAULT_MESSAGE));
        assert_eq!(controller.state().editing_id(), None);
    }

    #[tokio::test]
    async fn test_edit_of_unsynced_item_is_dropped() {
        let mut controller = controller().await;
        let effect = controller.prepare(ListCommand::Edit {
            id: "not-on-server".to_string(),
            label: "x".to_string(),
        });
        assert!(effect.is_none());
        assert_eq!(controller.list().pending_len(), 0);
    }

    #[tokio::test]
    async fn test_enter_selects_and_returns_to_navigation() {
        let mut controller = controller().await;
        let now = Instant::now();
        controller.handle_action(Action::MoveDown, now);
        let outcome = controller.handle_action(Action::Confirm, now);
        assert_eq!(outcome.effects.len(), 1);
        assert_eq!(outcome.effects[0].kind(), EffectKind::Select);
        assert!(matches!(
            controller.state().mode(),
            ListMode::Selecting { .. }
        ));

        for effect in outcome.effects {
            let result = effect.execute(controller.api()).await;
            controller.complete(result);
        }
        assert_eq!(controller.state().mode(), &ListMode::Navigating);
        assert_eq!(controller.state().error(), None);
    }

    #[tokio::test]
    async fn test_search_filters_optimistic_items_after_debounce() {
        let mut controller = controller().await;
        let start = Instant::now();
        controller.handle_action(Action::Input('3'), start);
        assert_eq!(controller.visible().len(), 3);

        assert!(controller.tick(start + Duration::from_millis(300)));
        let visible = controller.visible();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].label, "Task 3");
    }

    #[tokio::test]
    async fn test_refresh_racing_an_add_keeps_one_copy() {
        let mut controller = controller().await;
        let effect = controller
            .prepare(ListCommand::Add {
                label: "Task 4".to_string(),
            })
            .unwrap();

        let early = controller.begin_refresh();
        let result = effect.execute(controller.api()).await;
        let overtaking = controller.api().snapshot().await.unwrap();
        controller.reconcile(overtaking, early);
        assert_eq!(controller.visible().len(), 4);
        assert_eq!(controller.stats().total, 4);

        controller.complete(result);
        assert_eq!(controller.visible().len(), 4);
        assert_eq!(controller.stats().total, 4);

        controller.refresh().await.unwrap();
        assert_eq!(controller.list().pending_len(), 0);
        assert_eq!(controller.visible().len(), 4);
    }

    #[tokio::test]
    async fn test_stale_refresh_after_confirm_keeps_added_item() {
        let mut controller = controller().await;
        let stale_ticket = controller.begin_refresh();
        let stale = controller.api().snapshot().await.unwrap();

        controller
            .run(ListCommand::Add {
                label: "Task 4".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(controller.visible().len(), 4);

        assert!(!controller.reconcile(stale, stale_ticket));
        assert_eq!(controller.visible().len(), 4);
        assert_eq!(controller.stats().total, 4);
    }

    #[test]
    fn test_quit_and_refresh_do_not_touch_state() {
        let mut controller = ListController::new(store_api(), Duration::from_millis(300));
        assert!(controller.handle_action(Action::Quit, Instant::now()).quit);
        assert!(controller.handle_action(Action::Refresh, Instant::now()).refresh);
        assert_eq!(controller.state().mode(), &ListMode::Idle);
    }
}
