//! # Navigator
//!
//! Cursor and scroll state over the visible rows. Every transition is total:
//! moving past an edge is a no-op, and after each transition the cursor is
//! re-anchored onto a visible row and the scroll offset recomputed so that row
//! stays inside the viewport.
//!
//! The cursor is the root path only when there is nothing to show.

use log::debug;

use crate::core::tree::{Node, TreeMirror};
use crate::core::view::visible_paths;
use crate::error::Result;
use crate::store::{KeyPath, Store};

/// Rows assumed visible until the renderer reports the real height.
pub const DEFAULT_VIEWPORT: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    cursor: KeyPath,
    /// Index of the first visible row.
    scroll: usize,
    viewport: usize,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            cursor: KeyPath::root(),
            scroll: 0,
            viewport: DEFAULT_VIEWPORT,
        }
    }

    pub fn cursor(&self) -> &KeyPath {
        &self.cursor
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll
    }

    pub fn viewport(&self) -> usize {
        self.viewport
    }

    /// Called by the renderer with the number of rows it can show.
    pub fn set_viewport(&mut self, tree: &TreeMirror, height: usize) {
        let height = height.max(1);
        if height != self.viewport {
            self.viewport = height;
            self.settle(tree);
        }
    }

    pub fn move_up(&mut self, tree: &TreeMirror) {
        self.move_by(tree, -1);
    }

    pub fn move_down(&mut self, tree: &TreeMirror) {
        self.move_by(tree, 1);
    }

    pub fn page_up(&mut self, tree: &TreeMirror) {
        self.move_by(tree, -(self.viewport as isize));
    }

    pub fn page_down(&mut self, tree: &TreeMirror) {
        self.move_by(tree, self.viewport as isize);
    }

    /// Move-into: expands the bucket under the cursor, fetching it first if
    /// needed. The cursor stays put. Only the fetch can fail.
    pub fn expand(&mut self, tree: &mut TreeMirror, store: &dyn Store) -> Result<()> {
        let path = self.cursor.clone();
        let is_bucket = tree.node(&path).is_some_and(Node::is_bucket);
        let result = if is_bucket && !path.is_root() {
            tree.load_children(store, &path).map(|()| {
                tree.set_expanded(&path, true);
                debug!("Expanded {}", path);
            })
        } else {
            Ok(())
        };
        self.settle(tree);
        result
    }

    /// Move-out: collapses the bucket under the cursor, or, on a pair or an
    /// already collapsed bucket, moves to the parent and collapses that.
    pub fn collapse(&mut self, tree: &mut TreeMirror) {
        let on_expanded_bucket = tree
            .node(&self.cursor)
            .is_some_and(|node| node.is_bucket() && node.expanded);
        if on_expanded_bucket {
            tree.set_expanded(&self.cursor, false);
        } else if self.cursor.depth() > 1 {
            let parent = self.cursor.parent();
            tree.set_expanded(&parent, false);
            self.cursor = parent;
        }
        self.settle(tree);
    }

    /// Expands a collapsed bucket, collapses an expanded one.
    pub fn toggle(&mut self, tree: &mut TreeMirror, store: &dyn Store) -> Result<()> {
        let expanded = tree.node(&self.cursor).is_some_and(|node| node.expanded);
        if expanded {
            self.collapse(tree);
            Ok(())
        } else {
            self.expand(tree, store)
        }
    }

    pub fn jump_to_first_sibling(&mut self, tree: &TreeMirror) {
        self.jump_to_sibling(tree, false);
    }

    pub fn jump_to_last_sibling(&mut self, tree: &TreeMirror) {
        self.jump_to_sibling(tree, true);
    }

    fn jump_to_sibling(&mut self, tree: &TreeMirror, last: bool) {
        if let Some(siblings) = tree.children(&self.cursor.parent()) {
            let target = if last { siblings.last() } else { siblings.first() };
            if let Some(node) = target {
                self.cursor = self.cursor.with_last(&node.key);
            }
        }
        self.settle(tree);
    }

    /// Puts the cursor on `path` (e.g. a freshly created node).
    pub fn select(&mut self, tree: &TreeMirror, path: KeyPath) {
        self.cursor = path;
        self.settle(tree);
    }

    fn move_by(&mut self, tree: &TreeMirror, delta: isize) {
        let paths = visible_paths(tree);
        if let Some(last) = paths.len().checked_sub(1) {
            let current = paths
                .iter()
                .position(|path| path == &self.cursor)
                .unwrap_or(0);
            let target = current.saturating_add_signed(delta).min(last);
            self.cursor = paths[target].clone();
        }
        self.settle(tree);
    }

    /// Re-anchors the cursor on a visible row and recomputes the scroll offset.
    pub fn settle(&mut self, tree: &TreeMirror) {
        self.reconcile(tree);
        let paths = visible_paths(tree);
        if self.cursor.is_root()
            && let Some(first) = paths.first()
        {
            self.cursor = first.clone();
        }
        let index = paths
            .iter()
            .position(|path| path == &self.cursor)
            .unwrap_or(0);
        self.scroll = scroll_for(index, self.scroll, self.viewport, paths.len());
    }

    /// Falls back from a cursor that no longer resolves to a visible row.
    /// A vanished node yields to its nearest surviving ancestor. When that
    /// is the root (a top-level entry is gone) it yields to the preceding
    /// top-level sibling, then the following one. A node hidden by a
    /// collapse yields to the collapsed ancestor.
    fn reconcile(&mut self, tree: &TreeMirror) {
        if self.cursor.is_root() || tree.is_visible(&self.cursor) {
            return;
        }
        let mut anchor = KeyPath::root();
        for segment in self.cursor.segments() {
            let Some(node) = tree.node(&anchor) else {
                break;
            };
            if !anchor.is_root() && !node.expanded {
                break;
            }
            let Some(children) = node.children.as_deref() else {
                break;
            };
            match children.binary_search_by(|c| c.key.as_slice().cmp(segment)) {
                Ok(_) => anchor = anchor.child(segment),
                Err(_) if !anchor.is_root() => break,
                Err(position) => {
                    let sibling = position
                        .checked_sub(1)
                        .and_then(|i| children.get(i))
                        .or_else(|| children.get(position));
                    if let Some(sibling) = sibling {
                        anchor = anchor.child(&sibling.key);
                    }
                    break;
                }
            }
        }
        debug!("Cursor {} recovered to {}", self.cursor, anchor);
        self.cursor = anchor;
    }
}

/// Smallest change to `scroll` that keeps row `index` inside the viewport.
fn scroll_for(index: usize, scroll: usize, viewport: usize, total: usize) -> usize {
    let viewport = viewport.max(1);
    let scroll = if index < scroll {
        index
    } else if index >= scroll + viewport {
        index + 1 - viewport
    } else {
        scroll
    };
    scroll.min(total.saturating_sub(viewport))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemStore;
    use crate::test_support::{p, seeded_store};

    fn setup() -> (MemStore, TreeMirror, Navigator) {
        let store = seeded_store();
        let mut tree = TreeMirror::new();
        tree.load_root(&store).unwrap();
        let mut nav = Navigator::new();
        nav.settle(&tree);
        (store, tree, nav)
    }

    #[test]
    fn test_cursor_starts_on_first_row() {
        let (_store, _tree, nav) = setup();
        assert_eq!(nav.cursor(), &p(&["config"]));
    }

    #[test]
    fn test_empty_tree_keeps_cursor_at_root() {
        let store = MemStore::new();
        let mut tree = TreeMirror::new();
        tree.load_root(&store).unwrap();
        let mut nav = Navigator::new();
        nav.move_down(&tree);
        nav.collapse(&mut tree);
        assert!(nav.cursor().is_root());
    }

    #[test]
    fn test_moves_clamp_at_edges() {
        let (_store, tree, mut nav) = setup();
        nav.move_up(&tree);
        assert_eq!(nav.cursor(), &p(&["config"]));
        nav.move_down(&tree);
        nav.move_down(&tree);
        nav.move_down(&tree);
        assert_eq!(nav.cursor(), &p(&["users"]));
    }

    #[test]
    fn test_expand_loads_and_keeps_cursor() {
        let (store, mut tree, mut nav) = setup();
        nav.move_down(&tree);
        nav.expand(&mut tree, &store).unwrap();
        assert_eq!(nav.cursor(), &p(&["users"]));
        let users = tree.node(&p(&["users"])).unwrap();
        assert!(users.expanded && users.is_loaded());
        nav.move_down(&tree);
        assert_eq!(nav.cursor(), &p(&["users", "admins"]));
    }

    #[test]
    fn test_expand_on_pair_is_noop() {
        let (store, mut tree, mut nav) = setup();
        nav.expand(&mut tree, &store).unwrap();
        nav.move_down(&tree);
        assert_eq!(nav.cursor(), &p(&["config", "theme"]));
        nav.expand(&mut tree, &store).unwrap();
        assert_eq!(nav.cursor(), &p(&["config", "theme"]));
    }

    #[test]
    fn test_collapse_from_leaf_moves_to_parent() {
        let (store, mut tree, mut nav) = setup();
        nav.move_down(&tree);
        nav.expand(&mut tree, &store).unwrap();
        nav.jump_to_last_sibling(&tree); // still top level: users
        nav.move_down(&tree);
        nav.move_down(&tree);
        assert_eq!(nav.cursor(), &p(&["users", "alice"]));

        nav.collapse(&mut tree);
        assert_eq!(nav.cursor(), &p(&["users"]));
        assert!(!tree.node(&p(&["users"])).unwrap().expanded);

        // Top-level collapsed bucket: nothing above it to collapse.
        nav.collapse(&mut tree);
        assert_eq!(nav.cursor(), &p(&["users"]));
    }

    #[test]
    fn test_collapse_expanded_bucket_keeps_cursor() {
        let (store, mut tree, mut nav) = setup();
        nav.expand(&mut tree, &store).unwrap();
        nav.collapse(&mut tree);
        assert_eq!(nav.cursor(), &p(&["config"]));
        assert!(!tree.node(&p(&["config"])).unwrap().expanded);
    }

    #[test]
    fn test_jump_within_sibling_list() {
        let (store, mut tree, mut nav) = setup();
        nav.move_down(&tree);
        nav.expand(&mut tree, &store).unwrap();
        nav.move_down(&tree);
        nav.jump_to_last_sibling(&tree);
        assert_eq!(nav.cursor(), &p(&["users", "bob"]));
        nav.jump_to_first_sibling(&tree);
        assert_eq!(nav.cursor(), &p(&["users", "admins"]));
    }

    #[test]
    fn test_deleted_cursor_falls_back_to_parent() {
        let (store, mut tree, mut nav) = setup();
        nav.move_down(&tree);
        nav.expand(&mut tree, &store).unwrap();
        nav.select(&tree, p(&["users", "alice"]));

        tree.apply_delete(&p(&["users", "alice"])).unwrap();
        nav.settle(&tree);
        assert_eq!(nav.cursor(), &p(&["users"]));
    }

    #[test]
    fn test_deleted_cursor_under_vanished_ancestor_lands_on_survivor() {
        let (store, mut tree, mut nav) = setup();
        nav.move_down(&tree);
        nav.expand(&mut tree, &store).unwrap();
        nav.select(&tree, p(&["users", "admins"]));
        nav.expand(&mut tree, &store).unwrap();
        nav.select(&tree, p(&["users", "admins", "root"]));

        tree.apply_delete(&p(&["users", "admins"])).unwrap();
        nav.settle(&tree);
        assert_eq!(nav.cursor(), &p(&["users"]));
    }

    #[test]
    fn test_deleted_top_level_cursor_falls_back_to_sibling() {
        let (_store, mut tree, mut nav) = setup();
        nav.move_down(&tree);
        assert_eq!(nav.cursor(), &p(&["users"]));

        tree.apply_delete(&p(&["users"])).unwrap();
        nav.settle(&tree);
        assert_eq!(nav.cursor(), &p(&["config"]));

        tree.apply_delete(&p(&["config"])).unwrap();
        nav.settle(&tree);
        assert!(nav.cursor().is_root());
    }

    #[test]
    fn test_hidden_cursor_falls_back_to_collapsed_ancestor() {
        let (store, mut tree, mut nav) = setup();
        nav.move_down(&tree);
        nav.expand(&mut tree, &store).unwrap();
        nav.select(&tree, p(&["users", "bob"]));
        tree.set_expanded(&p(&["users"]), false);
        nav.settle(&tree);
        assert_eq!(nav.cursor(), &p(&["users"]));
    }

    #[test]
    fn test_scroll_follows_cursor() {
        let (store, mut tree, mut nav) = setup();
        nav.set_viewport(&tree, 2);
        nav.move_down(&tree);
        nav.expand(&mut tree, &store).unwrap();
        for _ in 0..4 {
            nav.move_down(&tree);
        }
        // rows: config, users, admins, alice, bob → cursor on bob (index 4)
        assert_eq!(nav.cursor(), &p(&["users", "bob"]));
        assert_eq!(nav.scroll_offset(), 3);
        nav.page_up(&tree);
        assert_eq!(nav.cursor(), &p(&["users", "admins"]));
        assert_eq!(nav.scroll_offset(), 2);
        nav.page_up(&tree);
        assert_eq!(nav.scroll_offset(), 0);
    }

    #[test]
    fn test_scroll_for_clamps_to_content() {
        assert_eq!(scroll_for(0, 5, 10, 3), 0);
        assert_eq!(scroll_for(9, 0, 5, 10), 5);
        assert_eq!(scroll_for(2, 1, 5, 10), 1);
    }
}
