//! # TUI Adapter
//!
//! The ratatui-specific layer. Opens each file in turn, renders the UI,
//! and translates keyboard events into core `Action` values.
//!
//! This is the only module that knows about ratatui and crossterm.
//!
//! ## Redraw Strategy
//!
//! Nothing animates, so the loop sleeps up to 500ms waiting for input and
//! only redraws after an event. All queued events are drained before the
//! next draw so held-down keys don't lag behind the screen.

mod component;
mod components;
mod event;
mod ui;

use std::io::{self, stdout};
use std::path::Path;
use std::time::Duration;

use crossterm::cursor::SetCursorStyle;
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste};
use crossterm::execute;
use log::{info, warn};
use thiserror::Error;

use crate::core::action::{Action, UiState};
use crate::core::config::ResolvedConfig;
use crate::core::state::Browser;
use crate::error::BrowseError;
use crate::store::{MemStore, RedbStore};
use crate::tui::event::{TuiEvent, poll_event_immediate, poll_event_timeout};

const IDLE_POLL: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Store(#[from] BrowseError),
    #[error("terminal error: {0}")]
    Io(#[from] io::Error),
}

struct TerminalModeGuard;

impl TerminalModeGuard {
    fn new() -> io::Result<Self> {
        execute!(
            stdout(),
            EnableBracketedPaste,
            SetCursorStyle::SteadyBlock, // Non-blinking: avoids blink timer reset from redraws
        )?;
        info!("Terminal modes enabled (bracketed paste, steady block cursor)");
        Ok(Self)
    }
}

impl Drop for TerminalModeGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), DisableBracketedPaste, SetCursorStyle::DefaultUserShape);
    }
}

/// Opens one file. A locked file always fails. Any other failure fails when
/// `only_file` is set, otherwise the file gets an empty read-only session
/// that shows the error.
pub fn open_browser(
    path: &Path,
    config: &ResolvedConfig,
    only_file: bool,
) -> Result<Browser, BrowseError> {
    let name = path.display().to_string();
    let opened = RedbStore::open(path, &config.open_options())
        .and_then(|store| Browser::open(Box::new(store), name.clone()));
    let browser = match opened {
        Ok(browser) => browser,
        Err(e @ BrowseError::StoreLocked(_)) => return Err(e),
        Err(e) if only_file => return Err(e),
        Err(e) => {
            warn!("Opening {} failed, showing empty session: {}", name, e);
            Browser::unavailable(Box::new(MemStore::empty_read_only()), name, e.to_string())
        }
    };
    Ok(browser.with_config(config))
}

/// Browses every file in turn. `q` moves on to the next file, Ctrl+C ends
/// the whole run.
pub fn run(files: &[impl AsRef<Path>], config: &ResolvedConfig) -> Result<(), RunError> {
    let only_file = files.len() == 1;
    for path in files {
        let mut browser = open_browser(path.as_ref(), config, only_file)?;
        info!(
            "Browsing {} ({})",
            browser.file_name,
            if browser.is_read_only() { "read-only" } else { "read-write" }
        );
        let force_quit = browse(&mut browser)?;
        info!("Closed {}", browser.file_name);
        if force_quit {
            break;
        }
    }
    Ok(())
}

/// Runs one session to completion. Returns true on Ctrl+C.
fn browse(browser: &mut Browser) -> io::Result<bool> {
    let mut terminal = ratatui::init();
    let guard = TerminalModeGuard::new();
    if let Err(e) = &guard {
        warn!("Failed to set terminal modes: {}", e);
    }

    let result = event_loop(&mut terminal, browser);

    drop(guard);
    ratatui::restore();
    result
}

fn event_loop(terminal: &mut ratatui::DefaultTerminal, browser: &mut Browser) -> io::Result<bool> {
    let mut needs_redraw = true;
    loop {
        if needs_redraw {
            terminal.draw(|f| ui::draw_ui(f, browser))?;
            needs_redraw = false;
        }

        let Some(first_event) = poll_event_timeout(IDLE_POLL)? else {
            continue;
        };
        needs_redraw = true;

        let mut pending = Some(first_event);
        while let Some(event) = pending {
            match event {
                TuiEvent::ForceQuit => {
                    browser.handle_key(Action::Quit);
                    return Ok(true);
                }
                TuiEvent::Resize => {}
                TuiEvent::Key(action) => {
                    browser.handle_key(action);
                }
                TuiEvent::Paste(text) => paste(browser, &text),
            }
            if browser.should_quit() {
                return Ok(false);
            }
            pending = poll_event_immediate()?;
        }
    }
}

/// Pasted text goes into the input buffer. While browsing it is ignored so a
/// paste can't fire a burst of commands.
fn paste(browser: &mut Browser, text: &str) {
    if !matches!(
        browser.ui_state(),
        UiState::EditingKey | UiState::EditingValue
    ) {
        return;
    }
    for c in text.chars().filter(|c| !c.is_control()) {
        browser.handle_key(Action::Char(c));
    }
}
