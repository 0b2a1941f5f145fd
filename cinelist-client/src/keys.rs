//! Keybinding definitions for the client.
//!
//! The search box always has focus, so printable characters are text input.
//! Commands live on control chords and the named keys.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Quit,
    MoveUp,
    MoveDown,
    Confirm,
    Cancel,
    NewItem,
    EditItem,
    Refresh,
    Input(char),
    Backspace,
}

pub fn map_key(event: KeyEvent) -> Option<Action> {
    let KeyEvent {
        code,
        modifiers,
        kind,
        ..
    } = event;

    if kind == KeyEventKind::Release {
        return None;
    }

    if modifiers.contains(KeyModifiers::CONTROL) {
        return match code {
            KeyCode::Char('c') | KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('n') => Some(Action::NewItem),
            KeyCode::Char('e') => Some(Action::EditItem),
            KeyCode::Char('r') => Some(Action::Refresh),
            _ => None,
        };
    }

    match code {
        KeyCode::Enter => Some(Action::Confirm),
        KeyCode::Esc => Some(Action::Cancel),
        KeyCode::Up => Some(Action::MoveUp),
        KeyCode::Down => Some(Action::MoveDown),
        KeyCode::F(2) => Some(Action::EditItem),
        KeyCode::Backspace => Some(Action::Backspace),
        KeyCode::Char(c) if !c.is_control() => Some(Action::Input(c)),
        _ => None,
    }
}
