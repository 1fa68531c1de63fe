//! # Tree Mirror
//!
//! In-memory copy of the bucket hierarchy, materialized one level at a time.
//!
//! ```text
//! TreeMirror
//! └── root: Node (Bucket, key = [])      top-level bucket list
//!     ├── children: None                 not fetched yet
//!     └── children: Some([...])          fetched, sorted by key bytes
//! ```
//!
//! A node is identified by its [`KeyPath`]; the parent of a node is the path
//! minus its last key, so nodes carry no back-pointers. Lookup walks the path
//! and binary-searches each sorted child list, O(depth · log width).
//!
//! The `apply_*` methods only touch memory. The edit engine calls them after
//! the matching store transaction has committed.

use log::debug;

use crate::error::{BrowseError, Result};
use crate::store::{EntryKind, KeyPath, ReadTx, Store};

/// Whether a node is a nested bucket or a key/value pair.
pub type NodeKind = EntryKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub key: Vec<u8>,
    pub kind: NodeKind,
    /// Value bytes, pairs only.
    pub value: Option<Vec<u8>>,
    /// `None` until fetched, buckets only. `Some(vec![])` is a loaded empty bucket.
    pub children: Option<Vec<Node>>,
    /// Display flag owned by the navigator.
    pub expanded: bool,
}

impl Node {
    pub fn bucket(key: Vec<u8>) -> Self {
        Self {
            key,
            kind: NodeKind::Bucket,
            value: None,
            children: None,
            expanded: false,
        }
    }

    pub fn pair(key: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            key,
            kind: NodeKind::Pair,
            value: Some(value),
            children: None,
            expanded: false,
        }
    }

    pub fn is_bucket(&self) -> bool {
        self.kind == NodeKind::Bucket
    }

    pub fn is_loaded(&self) -> bool {
        self.children.is_some()
    }

    /// A bucket whose children have not been fetched yet.
    pub fn has_unseen_children(&self) -> bool {
        self.is_bucket() && self.children.is_none()
    }

    /// Expanded and fetched, so its children are part of the visible tree.
    pub fn shows_children(&self) -> bool {
        self.expanded && self.is_loaded()
    }

    fn child_index(&self, key: &[u8]) -> Option<std::result::Result<usize, usize>> {
        self.children
            .as_ref()
            .map(|children| children.binary_search_by(|c| c.key.as_slice().cmp(key)))
    }
}

pub struct TreeMirror {
    root: Node,
}

impl Default for TreeMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl TreeMirror {
    /// An empty, unloaded mirror. Call [`TreeMirror::load_root`] before use.
    pub fn new() -> Self {
        let mut root = Node::bucket(Vec::new());
        root.expanded = true;
        Self { root }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Fetches the top-level list, replacing anything loaded before.
    pub fn load_root(&mut self, store: &dyn Store) -> Result<()> {
        let tx = store.begin_read()?;
        let children = fetch_level(tx.as_ref(), &KeyPath::root())?;
        debug!("Loaded {} top-level entries", children.len());
        self.root.children = Some(children);
        Ok(())
    }

    /// Fetches the immediate children of the bucket at `path`. No-op if already loaded.
    pub fn load_children(&mut self, store: &dyn Store, path: &KeyPath) -> Result<()> {
        let node = self
            .node(path)
            .ok_or_else(|| BrowseError::PathNotFound(path.clone()))?;
        if !node.is_bucket() {
            return Err(BrowseError::NotABucket(path.clone()));
        }
        if node.is_loaded() {
            return Ok(());
        }

        let tx = store.begin_read()?;
        let children = fetch_level(tx.as_ref(), path)?;
        debug!("Loaded {} entries under {}", children.len(), path);
        if let Some(node) = self.node_mut(path) {
            node.children = Some(children);
        }
        Ok(())
    }

    /// Re-fetches every loaded level from the store, keeping expansion where
    /// the bucket still exists.
    pub fn reload(&mut self, store: &dyn Store) -> Result<()> {
        let mut expanded = Vec::new();
        collect_expanded(&self.root, &KeyPath::root(), &mut expanded);
        self.load_root(store)?;
        // Parents sort before their descendants, so each level is loaded
        // before anything below it is looked up.
        expanded.sort();
        for path in expanded {
            let is_bucket = self.node(&path).is_some_and(Node::is_bucket);
            if !is_bucket {
                continue;
            }
            self.load_children(store, &path)?;
            self.set_expanded(&path, true);
        }
        Ok(())
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Resolves `path` against the loaded part of the tree.
    pub fn node(&self, path: &KeyPath) -> Option<&Node> {
        let mut current = &self.root;
        for segment in path.segments() {
            let index = current.child_index(segment)?.ok()?;
            current = &current.children.as_ref()?[index];
        }
        Some(current)
    }

    pub fn node_mut(&mut self, path: &KeyPath) -> Option<&mut Node> {
        let mut current = &mut self.root;
        for segment in path.segments() {
            let index = current.child_index(segment)?.ok()?;
            current = &mut current.children.as_mut()?[index];
        }
        Some(current)
    }

    pub fn contains(&self, path: &KeyPath) -> bool {
        self.node(path).is_some()
    }

    /// Loaded children of the bucket at `path`, if any.
    pub fn children(&self, path: &KeyPath) -> Option<&[Node]> {
        self.node(path)?.children.as_deref()
    }

    /// Sets the display flag. Returns false if `path` is not a loaded bucket.
    pub fn set_expanded(&mut self, path: &KeyPath, expanded: bool) -> bool {
        if path.is_root() {
            return false;
        }
        match self.node_mut(path) {
            Some(node) if node.is_bucket() => {
                node.expanded = expanded;
                true
            }
            _ => false,
        }
    }

    /// True when every ancestor of `path` is expanded, i.e. `path` is a row.
    pub fn is_visible(&self, path: &KeyPath) -> bool {
        if path.is_root() {
            return false;
        }
        let mut current = &self.root;
        for segment in path.segments() {
            if !current.expanded {
                return false;
            }
            let Some(children) = current.children.as_ref() else {
                return false;
            };
            let Ok(index) = children.binary_search_by(|c| c.key.as_slice().cmp(segment)) else {
                return false;
            };
            current = &children[index];
        }
        true
    }

    // ========================================================================
    // Mirrored mutations
    // ========================================================================

    fn loaded_parent_mut(&mut self, parent: &KeyPath) -> Result<&mut Vec<Node>> {
        let node = self
            .node_mut(parent)
            .ok_or_else(|| BrowseError::PathNotFound(parent.clone()))?;
        if !node.is_bucket() {
            return Err(BrowseError::NotABucket(parent.clone()));
        }
        node.children
            .as_mut()
            .ok_or_else(|| BrowseError::PathNotFound(parent.clone()))
    }

    /// Inserts a new node under a loaded bucket, keeping key order.
    /// A new bucket is loaded and empty.
    pub fn apply_create(
        &mut self,
        parent: &KeyPath,
        key: &[u8],
        kind: NodeKind,
        value: Option<Vec<u8>>,
    ) -> Result<()> {
        let children = self.loaded_parent_mut(parent)?;
        let position = match children.binary_search_by(|c| c.key.as_slice().cmp(key)) {
            Ok(_) => return Err(BrowseError::DuplicateKey(parent.child(key))),
            Err(position) => position,
        };
        let node = match kind {
            NodeKind::Bucket => {
                let mut node = Node::bucket(key.to_vec());
                node.children = Some(Vec::new());
                node
            }
            NodeKind::Pair => Node::pair(key.to_vec(), value.unwrap_or_default()),
        };
        children.insert(position, node);
        Ok(())
    }

    /// Moves a node (with its loaded subtree and expansion) to a new key.
    pub fn apply_rename(&mut self, path: &KeyPath, new_key: &[u8]) -> Result<()> {
        let Some(old_key) = path.last() else {
            return Err(BrowseError::PathNotFound(path.clone()));
        };
        let parent = path.parent();
        let children = self.loaded_parent_mut(&parent)?;
        let old_index = children
            .binary_search_by(|c| c.key.as_slice().cmp(old_key))
            .map_err(|_| BrowseError::PathNotFound(path.clone()))?;
        if old_key == new_key {
            return Ok(());
        }
        if children
            .binary_search_by(|c| c.key.as_slice().cmp(new_key))
            .is_ok()
        {
            return Err(BrowseError::DuplicateKey(parent.child(new_key)));
        }

        let mut node = children.remove(old_index);
        node.key = new_key.to_vec();
        let position = children
            .binary_search_by(|c| c.key.as_slice().cmp(new_key))
            .unwrap_or_else(|position| position);
        children.insert(position, node);
        Ok(())
    }

    pub fn apply_delete(&mut self, path: &KeyPath) -> Result<()> {
        let Some(key) = path.last() else {
            return Err(BrowseError::PathNotFound(path.clone()));
        };
        let children = self.loaded_parent_mut(&path.parent())?;
        let index = children
            .binary_search_by(|c| c.key.as_slice().cmp(key))
            .map_err(|_| BrowseError::PathNotFound(path.clone()))?;
        children.remove(index);
        Ok(())
    }

    pub fn apply_edit_value(&mut self, path: &KeyPath, value: Vec<u8>) -> Result<()> {
        if path.is_root() {
            return Err(BrowseError::NotAPair(path.clone()));
        }
        let node = self
            .node_mut(path)
            .ok_or_else(|| BrowseError::PathNotFound(path.clone()))?;
        if node.is_bucket() {
            return Err(BrowseError::NotAPair(path.clone()));
        }
        node.value = Some(value);
        Ok(())
    }
}

/// Reads one level of the hierarchy into unloaded, collapsed nodes.
pub fn fetch_level(tx: &dyn ReadTx, path: &KeyPath) -> Result<Vec<Node>> {
    let mut nodes = Vec::new();
    for entry in tx.list_children(path)? {
        let node = match entry.kind {
            NodeKind::Bucket => Node::bucket(entry.key),
            NodeKind::Pair => {
                let value = tx.get_value(&path.child(&entry.key))?;
                Node::pair(entry.key, value)
            }
        };
        nodes.push(node);
    }
    nodes.sort_by(|a, b| a.key.cmp(&b.key));
    Ok(nodes)
}

fn collect_expanded(node: &Node, path: &KeyPath, out: &mut Vec<KeyPath>) {
    let Some(children) = &node.children else {
        return;
    };
    for child in children {
        if child.is_bucket() && child.expanded {
            let child_path = path.child(&child.key);
            collect_expanded(child, &child_path, out);
            out.push(child_path);
        }
    }
}
