//! Test utilities shared across the crate.
//!
//! This module is only compiled during tests (`#[cfg(test)]`).

use crate::core::action::Action;
use crate::core::state::Browser;
use crate::core::tree::TreeMirror;
use crate::store::{KeyPath, MemStore, PutMode, Store};

/// Path from string segments.
pub fn p(segments: &[&str]) -> KeyPath {
    KeyPath::from_strs(segments)
}

/// A small store shared by most tests:
///
/// ```text
/// config/
///   theme = "dark"
/// users/
///   admins/
///     root = "0"
///   alice = "alice@example.com"
///   bob   = "bob@example.com"
/// ```
pub fn seeded_store() -> MemStore {
    let store = MemStore::new();
    let mut tx = store.begin_write().unwrap();
    let root = KeyPath::root();
    tx.create_bucket(&root, b"config").unwrap();
    tx.put_value(&p(&["config"]), b"theme", b"dark", PutMode::Create)
        .unwrap();
    tx.create_bucket(&root, b"users").unwrap();
    tx.create_bucket(&p(&["users"]), b"admins").unwrap();
    tx.put_value(&p(&["users", "admins"]), b"root", b"0", PutMode::Create)
        .unwrap();
    tx.put_value(&p(&["users"]), b"alice", b"alice@example.com", PutMode::Create)
        .unwrap();
    tx.put_value(&p(&["users"]), b"bob", b"bob@example.com", PutMode::Create)
        .unwrap();
    tx.commit().unwrap();
    store
}

/// Browser over [`seeded_store`], cursor on `config`.
pub fn seeded_browser() -> Browser {
    Browser::open(Box::new(seeded_store()), "test.db").unwrap()
}

/// Loaded child keys under `path`, as strings.
pub fn keys_of(tree: &TreeMirror, path: &KeyPath) -> Vec<String> {
    tree.children(path)
        .unwrap_or_default()
        .iter()
        .map(|node| String::from_utf8_lossy(&node.key).into_owned())
        .collect()
}

/// Feeds each character of `text` as a key press.
pub fn type_text(browser: &mut Browser, text: &str) {
    for c in text.chars() {
        browser.handle_key(Action::Char(c));
    }
}
