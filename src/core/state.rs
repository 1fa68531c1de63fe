//! # Browser State
//!
//! Everything one browsing session owns, in one place.
//!
//! ```text
//! Browser
//! ├── store: Box<dyn Store>       // open database (exclusive)
//! ├── tree: TreeMirror            // lazily loaded copy of the hierarchy
//! ├── nav: Navigator              // cursor path + scroll offset
//! ├── pending: Option<PendingEdit> // in-flight create/rename/edit/delete
//! ├── ui_state: UiState           // which input the next key feeds
//! ├── message: Option<String>     // transient status/error line
//! ├── show_help: bool             // help overlay
//! └── file_name, no_value, export_dir
//! ```
//!
//! State only changes through [`Browser::handle_key`] in action.rs.

use std::path::PathBuf;

use crate::core::action::UiState;
use crate::core::config::ResolvedConfig;
use crate::core::edit::PendingEdit;
use crate::core::navigator::Navigator;
use crate::core::tree::{Node, TreeMirror};
use crate::core::view::{self, Rows};
use crate::error::Result;
use crate::store::Store;

pub struct Browser {
    pub(crate) store: Box<dyn Store>,
    pub tree: TreeMirror,
    pub nav: Navigator,
    pub(crate) pending: Option<PendingEdit>,
    pub(crate) ui_state: UiState,
    pub(crate) message: Option<String>,
    pub(crate) quit: bool,
    pub show_help: bool,
    pub file_name: String,
    /// Hide values in the tree pane.
    pub no_value: bool,
    pub export_dir: PathBuf,
}

impl Browser {
    /// Starts a session: loads the top-level list. Fails with
    /// `StoreUnavailable` if the store cannot be read at all.
    pub fn open(store: Box<dyn Store>, file_name: impl Into<String>) -> Result<Self> {
        let mut tree = TreeMirror::new();
        tree.load_root(store.as_ref())?;
        let mut nav = Navigator::new();
        nav.settle(&tree);
        Ok(Self {
            store,
            tree,
            nav,
            pending: None,
            ui_state: UiState::Browsing,
            message: None,
            quit: false,
            show_help: false,
            file_name: file_name.into(),
            no_value: false,
            export_dir: PathBuf::from("."),
        })
    }

    /// A session on an empty read-only store, showing why the file did not open.
    pub fn unavailable(
        store: Box<dyn Store>,
        file_name: impl Into<String>,
        reason: String,
    ) -> Self {
        let mut browser = Self {
            store,
            tree: TreeMirror::new(),
            nav: Navigator::new(),
            pending: None,
            ui_state: UiState::Browsing,
            message: Some(reason),
            quit: false,
            show_help: false,
            file_name: file_name.into(),
            no_value: false,
            export_dir: PathBuf::from("."),
        };
        if let Err(e) = browser.tree.load_root(browser.store.as_ref()) {
            browser.message = Some(e.to_string());
        }
        browser
    }

    /// Applies the display settings from the resolved config.
    pub fn with_config(mut self, config: &ResolvedConfig) -> Self {
        self.no_value = config.no_value;
        self.export_dir = config.export_dir.clone();
        self
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn is_read_only(&self) -> bool {
        self.store.is_read_only()
    }

    /// Visible rows, cursor row flagged.
    pub fn current_rows(&self) -> Rows<'_> {
        view::rows(&self.tree, self.nav.cursor())
    }

    pub fn ui_state(&self) -> UiState {
        self.ui_state
    }

    /// Status or error text from the last key press, if any.
    pub fn pending_message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn pending_edit(&self) -> Option<&PendingEdit> {
        self.pending.as_ref()
    }

    pub fn selected(&self) -> Option<&Node> {
        let cursor = self.nav.cursor();
        if cursor.is_root() {
            None
        } else {
            self.tree.node(cursor)
        }
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use crate::test_support::{p, seeded_store};

    #[test]
    fn test_open_selects_first_row() {
        let browser = Browser::open(Box::new(seeded_store()), "test.db").unwrap();
        assert_eq!(browser.ui_state(), UiState::Browsing);
        assert_eq!(browser.nav.cursor(), &p(&["config"]));
        assert_eq!(browser.current_rows().count(), 2);
        assert!(browser.pending_message().is_none());
        assert!(browser.selected().unwrap().is_bucket());
    }

    #[test]
    fn test_unavailable_session_is_empty_and_read_only() {
        let browser = Browser::unavailable(
            Box::new(MemStore::empty_read_only()),
            "broken.db",
            "Error reading file".to_string(),
        );
        assert!(browser.is_read_only());
        assert_eq!(browser.current_rows().count(), 0);
        assert_eq!(browser.pending_message(), Some("Error reading file"));
        assert!(browser.selected().is_none());
    }
}
