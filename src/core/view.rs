//! # View Projector
//!
//! Flattens the expanded part of the mirror into display rows, pre-order,
//! siblings in key order. The sequence is lazy and restartable: calling
//! [`rows`] again starts a fresh walk. It is recomputed on every state change
//! rather than patched, since only a terminal's worth of rows is ever drawn.

use crate::core::tree::{Node, TreeMirror};
use crate::store::KeyPath;

/// One visible line of the tree pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row<'a> {
    /// Indentation level, 0 for top-level entries.
    pub depth: usize,
    pub path: KeyPath,
    pub key: &'a [u8],
    /// Pairs only.
    pub value: Option<&'a [u8]>,
    pub is_bucket: bool,
    pub expanded: bool,
    /// Bucket whose children were never fetched.
    pub has_unseen_children: bool,
    pub is_cursor: bool,
}

/// Lazy pre-order walk over visible nodes.
#[derive(Clone)]
pub struct Rows<'a> {
    stack: Vec<std::slice::Iter<'a, Node>>,
    /// Keys of the buckets currently being descended; one per stack level past the first.
    prefix: Vec<&'a [u8]>,
    cursor: &'a KeyPath,
}

/// Visible rows of `tree`, flagging the one at `cursor`.
pub fn rows<'a>(tree: &'a TreeMirror, cursor: &'a KeyPath) -> Rows<'a> {
    let stack = match &tree.root().children {
        Some(children) => vec![children.iter()],
        None => Vec::new(),
    };
    Rows {
        stack,
        prefix: Vec::new(),
        cursor,
    }
}

/// Paths of all visible rows, in display order.
pub fn visible_paths(tree: &TreeMirror) -> Vec<KeyPath> {
    let root = KeyPath::root();
    rows(tree, &root).map(|row| row.path).collect()
}

impl<'a> Iterator for Rows<'a> {
    type Item = Row<'a>;

    fn next(&mut self) -> Option<Row<'a>> {
        loop {
            let depth = self.stack.len().checked_sub(1)?;
            let Some(node) = self.stack.last_mut()?.next() else {
                self.stack.pop();
                self.prefix.pop();
                continue;
            };

            let mut segments: Vec<Vec<u8>> = self.prefix.iter().map(|k| k.to_vec()).collect();
            segments.push(node.key.clone());
            let path = KeyPath::new(segments);
            let is_cursor = &path == self.cursor;

            if node.shows_children()
                && let Some(children) = &node.children
                && !children.is_empty()
            {
                self.stack.push(children.iter());
                self.prefix.push(&node.key);
            }

            return Some(Row {
                depth,
                path,
                key: &node.key,
                value: node.value.as_deref(),
                is_bucket: node.is_bucket(),
                expanded: node.expanded,
                has_unseen_children: node.has_unseen_children(),
                is_cursor,
            });
        }
    }
}
