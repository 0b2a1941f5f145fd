//! Cinelist client entry point.

use cinelist_client::api_client::{ItemsApi, RestClient};
use cinelist_client::config::ClientConfig;
use cinelist_client::controller::{EffectKind, ListController, Outcome, PendingEffect, Pointer};
use cinelist_client::error::ClientError;
use cinelist_client::events::{ClickKind, ClickTracker, ClientEvent};
use cinelist_client::keys::map_key;
use cinelist_client::theme::Theme;
use cinelist_client::views::{render_view, scroll_offset, ListLayout};
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event as CrosstermEvent, MouseButton,
        MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, layout::Rect, Terminal};
use std::io::{self, Stdout};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

type Controller = ListController<RestClient>;

#[tokio::main]
async fn main() -> Result<(), ClientError> {
    let config = ClientConfig::load()?;
    init_logging(&config)?;
    let theme = Theme::by_name(&config.theme.name).unwrap_or_default();
    let api = RestClient::new(&config)?;
    tracing::info!(base_url = %api.base_url(), "Cinelist client starting");

    let mut controller = ListController::new(api, config.search_debounce());
    let mut clicks = ClickTracker::default();

    let mut terminal = setup_terminal()?;
    let _guard = TerminalGuard {};

    let (event_tx, mut event_rx) = mpsc::channel::<ClientEvent>(256);
    spawn_input_reader(event_tx.clone());
    spawn_refresh(&mut controller, event_tx.clone());

    let mut ticker = tokio::time::interval(config.tick_interval());

    loop {
        terminal.draw(|f| render_view(f, &controller, &theme))?;

        tokio::select! {
            _ = ticker.tick() => {
                controller.tick(Instant::now());
            }
            Some(event) = event_rx.recv() => {
                let area = terminal.size()?;
                if handle_event(&mut controller, &mut clicks, area, event, &event_tx) {
                    break;
                }
            }
        }
    }

    tracing::info!("Cinelist client exiting");
    Ok(())
}

fn init_logging(config: &ClientConfig) -> Result<(), ClientError> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>, ClientError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Ok(Terminal::new(backend)?)
}

struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let mut stdout = io::stdout();
        let _ = execute!(stdout, DisableMouseCapture, LeaveAlternateScreen);
    }
}

fn spawn_input_reader(sender: mpsc::Sender<ClientEvent>) {
    std::thread::spawn(move || loop {
        if let Ok(true) = event::poll(Duration::from_millis(200)) {
            if let Ok(evt) = event::read() {
                let forwarded = match evt {
                    CrosstermEvent::Key(key) => Some(ClientEvent::Input(key)),
                    CrosstermEvent::Mouse(mouse) => Some(ClientEvent::Mouse(mouse)),
                    CrosstermEvent::Resize(width, height) => {
                        Some(ClientEvent::Resize { width, height })
                    }
                    _ => None,
                };
                if let Some(event) = forwarded {
                    if sender.blocking_send(event).is_err() {
                        break;
                    }
                }
            }
        }
    });
}

fn spawn_refresh(controller: &mut Controller, sender: mpsc::Sender<ClientEvent>) {
    let ticket = controller.begin_refresh();
    let api = controller.api().clone();
    tokio::spawn(async move {
        let result = api.snapshot().await;
        let _ = sender.send(ClientEvent::Snapshot { ticket, result }).await;
    });
}

fn spawn_effect(api: &RestClient, effect: PendingEffect, sender: mpsc::Sender<ClientEvent>) {
    let api = api.clone();
    tokio::spawn(async move {
        let result = effect.execute(&api).await;
        let _ = sender.send(ClientEvent::Effect(result)).await;
    });
}

/// Returns true when the client should exit.
fn handle_event(
    controller: &mut Controller,
    clicks: &mut ClickTracker,
    area: Rect,
    event: ClientEvent,
    sender: &mpsc::Sender<ClientEvent>,
) -> bool {
    let outcome = match event {
        ClientEvent::Input(key) => match map_key(key) {
            Some(action) => controller.handle_action(action, Instant::now()),
            None => return false,
        },
        ClientEvent::Mouse(mouse) => match pointer_for(controller, clicks, area, mouse) {
            Some(pointer) => controller.handle_pointer(pointer),
            None => return false,
        },
        ClientEvent::Effect(result) => {
            let mutated = result.kind() != EffectKind::Select;
            controller.complete(result);
            if mutated {
                spawn_refresh(controller, sender.clone());
            }
            return false;
        }
        ClientEvent::Snapshot {
            ticket,
            result: Ok(snapshot),
        } => {
            controller.reconcile(snapshot, ticket);
            return false;
        }
        ClientEvent::Snapshot { result: Err(err), .. } => {
            controller.refresh_failed(&err);
            return false;
        }
        ClientEvent::Tick | ClientEvent::Resize { .. } => return false,
    };
    dispatch(controller, outcome, sender)
}

fn dispatch(
    controller: &mut Controller,
    outcome: Outcome,
    sender: &mpsc::Sender<ClientEvent>,
) -> bool {
    if outcome.quit {
        return true;
    }
    if outcome.refresh {
        spawn_refresh(controller, sender.clone());
    }
    for effect in outcome.effects {
        spawn_effect(controller.api(), effect, sender.clone());
    }
    false
}

fn pointer_for(
    controller: &Controller,
    clicks: &mut ClickTracker,
    area: Rect,
    mouse: MouseEvent,
) -> Option<Pointer> {
    let layout = ListLayout::compute(area);
    let offset = scroll_offset(controller.state().highlighted(), layout.list_height());
    let len = controller.visible().len();
    let index = layout.row_at(mouse.column, mouse.row, offset, len)?;
    match mouse.kind {
        MouseEventKind::Moved => Some(Pointer::Hover(index)),
        MouseEventKind::Down(MouseButton::Left) => match clicks.register(index, Instant::now()) {
            ClickKind::Single => Some(Pointer::Click(index)),
            ClickKind::Double => Some(Pointer::DoubleClick(index)),
        },
        _ => None,
    }
}
