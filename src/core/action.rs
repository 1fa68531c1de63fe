//! # Actions
//!
//! Every key press becomes an `Action`. The TUI adapter maps crossterm events
//! to actions; [`Browser::handle_key`] is the only place state changes.
//!
//! ```text
//! Browser + Action  →  handle_key()  →  UiState
//! ```
//!
//! Which keys mean what depends on the current [`UiState`]:
//!
//! ```text
//!             b/B p/P r e          Enter (key)      Enter (value)
//! Browsing ───────────────► EditingKey ─────► EditingValue ─────► Browsing
//!    │  ▲                        │ Esc              │ Esc
//!    │  └────────────────────────┴──────────────────┘
//!    │ D                   y
//!    └──► ConfirmingDelete ──► Browsing (deleted)
//!              any other key ► Browsing (cancelled)
//! ```

use log::{debug, info, warn};

use crate::core::edit::{self, EditOp, PendingEdit};
use crate::core::export;
use crate::core::state::Browser;
use crate::core::tree::{Node, NodeKind};
use crate::error::BrowseError;
use crate::store::KeyPath;

/// A logical key, already decoupled from the terminal library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Enter,
    Escape,
    Backspace,
    Home,
    End,
    PageUp,
    PageDown,
    Char(char),
    /// Ctrl+C: leave from any state.
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    Browsing,
    EditingKey,
    EditingValue,
    ConfirmingDelete,
}

impl Browser {
    /// Routes one key press and returns the state the next key will be read in.
    pub fn handle_key(&mut self, action: Action) -> UiState {
        self.message = None;
        if action == Action::Quit {
            self.quit = true;
            return self.ui_state;
        }
        if self.show_help {
            self.show_help = false;
            return self.ui_state;
        }
        self.ui_state = match self.ui_state {
            UiState::Browsing => self.browse(action),
            UiState::EditingKey => self.edit_key(action),
            UiState::EditingValue => self.edit_value(action),
            UiState::ConfirmingDelete => self.confirm_delete(action),
        };
        self.ui_state
    }

    fn browse(&mut self, action: Action) -> UiState {
        match action {
            Action::Up | Action::Char('k') => self.nav.move_up(&self.tree),
            Action::Down | Action::Char('j') => self.nav.move_down(&self.tree),
            Action::PageUp => self.nav.page_up(&self.tree),
            Action::PageDown => self.nav.page_down(&self.tree),
            Action::Home | Action::Char('g') => self.nav.jump_to_first_sibling(&self.tree),
            Action::End | Action::Char('G') => self.nav.jump_to_last_sibling(&self.tree),
            Action::Right | Action::Char('l') => {
                let result = self.nav.expand(&mut self.tree, self.store.as_ref());
                self.report(result);
            }
            Action::Left | Action::Char('h') => self.nav.collapse(&mut self.tree),
            Action::Enter => return self.activate(),
            Action::Char('b') => return self.start_create(NodeKind::Bucket, false),
            Action::Char('B') => return self.start_create(NodeKind::Bucket, true),
            Action::Char('p') => return self.start_create(NodeKind::Pair, false),
            Action::Char('P') => return self.start_create(NodeKind::Pair, true),
            Action::Char('r') => return self.start_rename(),
            Action::Char('e') => return self.start_edit_value(),
            Action::Char('D') => return self.start_delete(),
            Action::Char('x') => self.export(false),
            Action::Char('X') => self.export(true),
            Action::Char('R') => self.reload(),
            Action::Char('?') => self.show_help = true,
            Action::Char('q') => self.quit = true,
            _ => {}
        }
        UiState::Browsing
    }

    /// Enter while browsing: toggles a bucket, starts editing a pair's value.
    fn activate(&mut self) -> UiState {
        match self.selected().map(Node::is_bucket) {
            Some(true) => {
                let result = self.nav.toggle(&mut self.tree, self.store.as_ref());
                self.report(result);
                UiState::Browsing
            }
            Some(false) => self.start_edit_value(),
            None => UiState::Browsing,
        }
    }

    // ========================================================================
    // Starting edits
    // ========================================================================

    /// Refuses any edit up front on a read-only store.
    fn writable(&mut self) -> bool {
        if self.store.is_read_only() {
            self.message = Some(BrowseError::ReadOnlyMode.to_string());
            false
        } else {
            true
        }
    }

    /// Where a new entry goes: inside the cursor's bucket when it is expanded,
    /// otherwise next to the cursor. `up` goes one level higher.
    fn create_parent(&self, up: bool) -> KeyPath {
        let cursor = self.nav.cursor();
        if cursor.is_root() {
            return KeyPath::root();
        }
        let inside = self
            .tree
            .node(cursor)
            .is_some_and(|node| node.is_bucket() && node.expanded);
        let here = if inside {
            cursor.clone()
        } else {
            cursor.parent()
        };
        if up { here.parent() } else { here }
    }

    fn start_create(&mut self, kind: NodeKind, up: bool) -> UiState {
        if !self.writable() {
            return UiState::Browsing;
        }
        let parent = self.create_parent(up);
        debug!("Start create {:?} in {}", kind, parent);
        self.pending = Some(PendingEdit::create(parent, kind));
        UiState::EditingKey
    }

    fn start_rename(&mut self) -> UiState {
        if !self.writable() {
            return UiState::Browsing;
        }
        let cursor = self.nav.cursor().clone();
        if cursor.is_root() {
            return UiState::Browsing;
        }
        self.pending = Some(PendingEdit::rename(cursor));
        UiState::EditingKey
    }

    fn start_edit_value(&mut self) -> UiState {
        if !self.writable() {
            return UiState::Browsing;
        }
        let cursor = self.nav.cursor().clone();
        let Some(node) = self.selected() else {
            return UiState::Browsing;
        };
        let Some(value) = node.value.clone() else {
            self.message = Some(BrowseError::NotAPair(cursor).to_string());
            return UiState::Browsing;
        };
        self.pending = Some(PendingEdit::edit_value(cursor, &value));
        UiState::EditingValue
    }

    fn start_delete(&mut self) -> UiState {
        if !self.writable() {
            return UiState::Browsing;
        }
        let cursor = self.nav.cursor().clone();
        if cursor.is_root() {
            return UiState::Browsing;
        }
        self.pending = Some(PendingEdit::delete(cursor));
        UiState::ConfirmingDelete
    }

    // ========================================================================
    // Input states
    // ========================================================================

    fn edit_key(&mut self, action: Action) -> UiState {
        let Some(pending) = self.pending.as_mut() else {
            return UiState::Browsing;
        };
        match action {
            Action::Char(c) => {
                pending.key.push(c);
                UiState::EditingKey
            }
            Action::Backspace => {
                pending.key.pop();
                UiState::EditingKey
            }
            Action::Escape => self.cancel(),
            Action::Enter => {
                if matches!(
                    pending.op,
                    EditOp::Create {
                        kind: NodeKind::Pair,
                        ..
                    }
                ) {
                    UiState::EditingValue
                } else {
                    self.commit()
                }
            }
            _ => UiState::EditingKey,
        }
    }

    fn edit_value(&mut self, action: Action) -> UiState {
        let Some(pending) = self.pending.as_mut() else {
            return UiState::Browsing;
        };
        match action {
            Action::Char(c) => pending.value.push(c),
            Action::Backspace => {
                pending.value.pop();
            }
            Action::Escape => return self.cancel(),
            Action::Enter => return self.commit(),
            _ => {}
        }
        UiState::EditingValue
    }

    fn confirm_delete(&mut self, action: Action) -> UiState {
        match action {
            Action::Char('y') | Action::Char('Y') => self.commit(),
            _ => self.cancel(),
        }
    }

    fn cancel(&mut self) -> UiState {
        if let Some(pending) = self.pending.take() {
            debug!("Cancelled: {}", pending.describe());
        }
        UiState::Browsing
    }

    /// Runs the pending edit. Rejected input sends the user back to the
    /// prompt it came from with the edit intact; any other failure drops it.
    fn commit(&mut self) -> UiState {
        let Some(pending) = self.pending.take() else {
            return UiState::Browsing;
        };
        match edit::commit(self.store.as_ref(), &mut self.tree, &pending) {
            Ok(Some(path)) => {
                if let EditOp::Create { parent, .. } = &pending.op {
                    // Make the new entry visible before selecting it.
                    let mut ancestor = KeyPath::root();
                    for segment in parent.segments() {
                        ancestor = ancestor.child(segment);
                        self.tree.set_expanded(&ancestor, true);
                    }
                }
                self.nav.select(&self.tree, path);
                UiState::Browsing
            }
            Ok(None) => {
                self.nav.settle(&self.tree);
                UiState::Browsing
            }
            Err(e) if e.keeps_edit_open() => {
                warn!("Edit rejected: {}", e);
                self.message = Some(e.to_string());
                let value_rejected = matches!(pending.op, EditOp::EditValue { .. })
                    || (matches!(e, BrowseError::InvalidHex(_)) && pending.key_bytes().is_ok());
                self.pending = Some(pending);
                if value_rejected {
                    UiState::EditingValue
                } else {
                    UiState::EditingKey
                }
            }
            Err(e) => {
                warn!("Edit failed: {}", e);
                self.message = Some(e.to_string());
                self.nav.settle(&self.tree);
                UiState::Browsing
            }
        }
    }

    // ========================================================================
    // Browsing extras
    // ========================================================================

    fn report(&mut self, result: crate::error::Result<()>) {
        if let Err(e) = result {
            warn!("{}", e);
            self.message = Some(e.to_string());
        }
    }

    fn reload(&mut self) {
        match self.tree.reload(self.store.as_ref()) {
            Ok(()) => {
                info!("Reloaded {}", self.file_name);
                self.message = Some("Reloaded".to_string());
            }
            Err(e) => self.message = Some(e.to_string()),
        }
        self.nav.settle(&self.tree);
    }

    fn export(&mut self, as_json: bool) {
        let path = self.nav.cursor().clone();
        if path.is_root() && !as_json {
            return;
        }
        let result = if as_json {
            export::export_json(self.store.as_ref(), &path, &self.export_dir)
        } else {
            export::export_value(self.store.as_ref(), &path, &self.export_dir)
        };
        self.message = Some(match result {
            Ok(target) => format!("Exported to {}", target.display()),
            Err(e) => {
                warn!("Export of {} failed: {}", path, e);
                e.to_string()
            }
        });
    }
}
