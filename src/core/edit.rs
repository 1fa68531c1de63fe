//! # Edit Engine
//!
//! Every mutation follows the same protocol:
//!
//! ```text
//! read-only? ──yes──► ReadOnlyMode (no transaction opened)
//!     │no
//! validate against the mirror (stale path, duplicate key, wrong kind)
//!     │
//! begin_write ─► mutate store ─► commit ─► apply_* to the mirror
//!                     │             │
//!                     └──error──────┴──► abort, mirror untouched
//! ```
//!
//! The store has no rename primitive. A rename is a recursive copy of the
//! subtree under the new key followed by a delete of the old key, all in one
//! write transaction, so the commit makes the whole rename visible or none of it.

use log::{error, info, warn};

use crate::core::tree::{NodeKind, TreeMirror};
use crate::error::{BrowseError, Result};
use crate::store::{EntryKind, KeyPath, PutMode, Store, WriteTx};

/// An edit intent awaiting its key/value input or its confirmation.
///
/// The buffers are what the user has typed so far; nothing touches the store
/// until the edit is committed. Existing bytes that are not valid UTF-8 are
/// prefilled as hex (`key_hex` / `value_hex`) and decoded back on commit, so
/// an untouched buffer always commits the original bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingEdit {
    pub op: EditOp,
    pub key: String,
    pub value: String,
    pub key_hex: bool,
    pub value_hex: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Create { parent: KeyPath, kind: NodeKind },
    Rename { path: KeyPath },
    EditValue { path: KeyPath },
    Delete { path: KeyPath },
}

impl PendingEdit {
    fn blank(op: EditOp) -> Self {
        Self {
            op,
            key: String::new(),
            value: String::new(),
            key_hex: false,
            value_hex: false,
        }
    }

    pub fn create(parent: KeyPath, kind: NodeKind) -> Self {
        Self::blank(EditOp::Create { parent, kind })
    }

    pub fn rename(path: KeyPath) -> Self {
        let (key, key_hex) = buffer_for(path.last().unwrap_or_default());
        Self {
            key,
            key_hex,
            ..Self::blank(EditOp::Rename { path })
        }
    }

    pub fn edit_value(path: KeyPath, current: &[u8]) -> Self {
        let (value, value_hex) = buffer_for(current);
        Self {
            value,
            value_hex,
            ..Self::blank(EditOp::EditValue { path })
        }
    }

    pub fn delete(path: KeyPath) -> Self {
        Self::blank(EditOp::Delete { path })
    }

    /// Key bytes the buffer stands for.
    pub fn key_bytes(&self) -> Result<Vec<u8>> {
        buffer_bytes(&self.key, self.key_hex)
    }

    /// Value bytes the buffer stands for.
    pub fn value_bytes(&self) -> Result<Vec<u8>> {
        buffer_bytes(&self.value, self.value_hex)
    }

    /// Prompt shown while collecting input for this edit.
    pub fn describe(&self) -> String {
        match &self.op {
            EditOp::Create {
                parent,
                kind: NodeKind::Bucket,
            } => format!("New bucket in {parent}"),
            EditOp::Create {
                parent,
                kind: NodeKind::Pair,
            } => format!("New pair in {parent}"),
            EditOp::Rename { path } => format!("Rename {path}"),
            EditOp::EditValue { path } => format!("Edit value of {path}"),
            EditOp::Delete { path } => format!("Delete {path}?"),
        }
    }
}

/// Runs `pending` against the store and the mirror. Returns the path the
/// cursor should land on (`None` for deletes, where the navigator picks).
pub fn commit(
    store: &dyn Store,
    tree: &mut TreeMirror,
    pending: &PendingEdit,
) -> Result<Option<KeyPath>> {
    match &pending.op {
        EditOp::Create { parent, kind } => {
            let key = pending.key_bytes()?;
            let value = match kind {
                NodeKind::Bucket => None,
                NodeKind::Pair => Some(pending.value_bytes()?),
            };
            create(store, tree, parent, &key, *kind, value.as_deref()).map(Some)
        }
        EditOp::Rename { path } => rename(store, tree, path, &pending.key_bytes()?).map(Some),
        EditOp::EditValue { path } => edit_value(store, tree, path, &pending.value_bytes()?)
            .map(|()| Some(path.clone())),
        EditOp::Delete { path } => delete(store, tree, path).map(|()| None),
    }
}

/// Text for valid UTF-8, otherwise lowercase hex.
fn buffer_for(bytes: &[u8]) -> (String, bool) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (text.to_string(), false),
        Err(_) => (hex::encode(bytes), true),
    }
}

/// Whitespace is allowed between hex digits.
fn buffer_bytes(buffer: &str, is_hex: bool) -> Result<Vec<u8>> {
    if !is_hex {
        return Ok(buffer.as_bytes().to_vec());
    }
    let digits: String = buffer.chars().filter(|c| !c.is_whitespace()).collect();
    hex::decode(digits).map_err(|e| BrowseError::InvalidHex(e.to_string()))
}

/// Creates a bucket or a pair under `parent`. When the parent level was
/// never fetched, the store detects duplicates inside the write transaction
/// and the level is fetched only after the commit.
pub fn create(
    store: &dyn Store,
    tree: &mut TreeMirror,
    parent: &KeyPath,
    key: &[u8],
    kind: NodeKind,
    value: Option<&[u8]>,
) -> Result<KeyPath> {
    ensure_writable(store)?;
    if key.is_empty() {
        return Err(BrowseError::EmptyKey);
    }
    let parent_node = tree
        .node(parent)
        .ok_or_else(|| BrowseError::PathNotFound(parent.clone()))?;
    if !parent_node.is_bucket() {
        return Err(BrowseError::NotABucket(parent.clone()));
    }
    let parent_loaded = parent_node.is_loaded();
    let path = parent.child(key);
    if parent_loaded && tree.contains(&path) {
        return Err(BrowseError::DuplicateKey(path));
    }

    transact(store, |tx| match kind {
        NodeKind::Bucket => tx.create_bucket(parent, key),
        NodeKind::Pair => tx.put_value(parent, key, value.unwrap_or_default(), PutMode::Create),
    })?;

    if parent_loaded {
        mirror(store, tree, parent, |tree| {
            tree.apply_create(parent, key, kind, value.map(<[u8]>::to_vec))
        });
    } else {
        let fetched = if parent.is_root() {
            tree.load_root(store)
        } else {
            tree.load_children(store, parent)
        };
        if let Err(e) = fetched {
            error!("Failed to fetch {parent} after create: {e}");
        }
    }
    info!("Created {:?} {}", kind, path);
    Ok(path)
}

/// Renames a pair, or a bucket together with everything below it.
pub fn rename(
    store: &dyn Store,
    tree: &mut TreeMirror,
    path: &KeyPath,
    new_key: &[u8],
) -> Result<KeyPath> {
    ensure_writable(store)?;
    if new_key.is_empty() {
        return Err(BrowseError::EmptyKey);
    }
    let kind = tree
        .node(path)
        .filter(|_| !path.is_root())
        .map(|node| node.kind)
        .ok_or_else(|| BrowseError::PathNotFound(path.clone()))?;
    let target = path.with_last(new_key);
    if path.last() == Some(new_key) {
        return Ok(target);
    }
    if tree.contains(&target) {
        return Err(BrowseError::DuplicateKey(target));
    }

    let parent = path.parent();
    transact(store, |tx| {
        match kind {
            EntryKind::Bucket => {
                tx.create_bucket(&parent, new_key)?;
                copy_subtree(tx, path, &target)?;
            }
            EntryKind::Pair => {
                let value = tx.get_value(path)?;
                tx.put_value(&parent, new_key, &value, PutMode::Create)?;
            }
        }
        tx.delete_path(path)
    })?;

    mirror(store, tree, &parent, |tree| tree.apply_rename(path, new_key));
    info!("Renamed {} to {}", path, target);
    Ok(target)
}

/// Deletes a pair, or a bucket and its whole subtree.
pub fn delete(store: &dyn Store, tree: &mut TreeMirror, path: &KeyPath) -> Result<()> {
    ensure_writable(store)?;
    if path.is_root() || !tree.contains(path) {
        return Err(BrowseError::PathNotFound(path.clone()));
    }

    transact(store, |tx| tx.delete_path(path))?;

    mirror(store, tree, &path.parent(), |tree| tree.apply_delete(path));
    info!("Deleted {}", path);
    Ok(())
}

/// Overwrites the value bytes of a pair. Unchanged bytes open no transaction.
pub fn edit_value(
    store: &dyn Store,
    tree: &mut TreeMirror,
    path: &KeyPath,
    value: &[u8],
) -> Result<()> {
    ensure_writable(store)?;
    let node = tree
        .node(path)
        .filter(|_| !path.is_root())
        .ok_or_else(|| BrowseError::PathNotFound(path.clone()))?;
    if node.is_bucket() {
        return Err(BrowseError::NotAPair(path.clone()));
    }
    if node.value.as_deref() == Some(value) {
        return Ok(());
    }
    let Some(key) = path.last() else {
        return Err(BrowseError::PathNotFound(path.clone()));
    };

    let parent = path.parent();
    transact(store, |tx| tx.put_value(&parent, key, value, PutMode::Overwrite))?;

    mirror(store, tree, &parent, |tree| {
        tree.apply_edit_value(path, value.to_vec())
    });
    info!("Updated value of {} ({} bytes)", path, value.len());
    Ok(())
}

fn ensure_writable(store: &dyn Store) -> Result<()> {
    if store.is_read_only() {
        warn!("Rejected edit: store is read-only");
        return Err(BrowseError::ReadOnlyMode);
    }
    Ok(())
}

/// Opens a write transaction, runs `op`, and commits. Any failure aborts.
fn transact<F>(store: &dyn Store, op: F) -> Result<()>
where
    F: FnOnce(&mut dyn WriteTx) -> Result<()>,
{
    let mut tx = store.begin_write()?;
    match op(tx.as_mut()) {
        Ok(()) => tx.commit(),
        Err(e) => {
            tx.abort();
            Err(e)
        }
    }
}

/// Applies a committed change to the mirror. If the mirror disagrees (it was
/// validated up front, so this means it went stale), re-fetch the parent level
/// from the store instead of leaving it diverged.
fn mirror<F>(store: &dyn Store, tree: &mut TreeMirror, parent: &KeyPath, apply: F)
where
    F: FnOnce(&mut TreeMirror) -> Result<()>,
{
    if let Err(e) = apply(tree) {
        error!("Mirror rejected committed change under {parent}: {e}");
        let refreshed = tree.reload(store);
        if let Err(e) = refreshed {
            error!("Failed to reload after mirror divergence: {e}");
        }
    }
}

/// Copies every descendant of `from` under the existing bucket `to`.
fn copy_subtree(tx: &mut dyn WriteTx, from: &KeyPath, to: &KeyPath) -> Result<()> {
    for child in tx.list_children(from)? {
        let source = from.child(&child.key);
        match child.kind {
            EntryKind::Bucket => {
                tx.create_bucket(to, &child.key)?;
                copy_subtree(tx, &source, &to.child(&child.key))?;
            }
            EntryKind::Pair => {
                let value = tx.get_value(&source)?;
                tx.put_value(to, &child.key, &value, PutMode::Create)?;
            }
        }
    }
    Ok(())
}
