use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::core::action::Action;

/// TUI-specific input events
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TuiEvent {
    /// A logical key for `Browser::handle_key`.
    Key(Action),
    /// Bracketed paste, fed to the input buffer one char at a time.
    Paste(String),
    Resize,
    /// Ctrl+C: ends the whole run, not just the current file.
    ForceQuit,
}

/// Poll for an event without blocking (returns immediately)
pub fn poll_event_immediate() -> io::Result<Option<TuiEvent>> {
    poll_event_timeout(Duration::ZERO)
}

pub fn poll_event_timeout(timeout: Duration) -> io::Result<Option<TuiEvent>> {
    if !event::poll(timeout)? {
        return Ok(None);
    }
    Ok(match event::read()? {
        Event::Key(key_event) => map_key(key_event),
        Event::Paste(data) => Some(TuiEvent::Paste(data)),
        Event::Resize(_, _) => Some(TuiEvent::Resize),
        _ => None,
    })
}

/// Translates a crossterm key into a logical key. Releases and repeats from
/// terminals that report them are dropped.
pub fn map_key(key_event: KeyEvent) -> Option<TuiEvent> {
    if key_event.kind != KeyEventKind::Press {
        return None;
    }
    log::debug!(
        "Key event: {:?} with modifiers {:?}",
        key_event.code,
        key_event.modifiers
    );
    let action = match (key_event.modifiers, key_event.code) {
        (KeyModifiers::CONTROL, KeyCode::Char('c')) => return Some(TuiEvent::ForceQuit),
        (KeyModifiers::CONTROL, KeyCode::Char('b')) => Action::PageUp,
        (KeyModifiers::CONTROL, KeyCode::Char('f')) => Action::PageDown,
        (KeyModifiers::CONTROL, _) => return None,
        (_, KeyCode::Char(c)) => Action::Char(c),
        (_, KeyCode::Backspace) => Action::Backspace,
        (_, KeyCode::Enter) => Action::Enter,
        (_, KeyCode::Esc) => Action::Escape,
        (_, KeyCode::Up) => Action::Up,
        (_, KeyCode::Down) => Action::Down,
        (_, KeyCode::Left) => Action::Left,
        (_, KeyCode::Right) => Action::Right,
        (_, KeyCode::Home) => Action::Home,
        (_, KeyCode::End) => Action::End,
        (_, KeyCode::PageUp) => Action::PageUp,
        (_, KeyCode::PageDown) => Action::PageDown,
        _ => return None,
    };
    Some(TuiEvent::Key(action))
}
