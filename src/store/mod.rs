//! # Backing Store Adapter
//!
//! Thin synchronous interface over the embedded storage engine. The rest of
//! the crate only sees these traits, never the engine itself.
//!
//! ```text
//! Store ──begin_read()──►  ReadTx   list_children / get_value
//!       ──begin_write()─►  WriteTx  + create_bucket / put_value / delete_path
//!                                   commit() | abort()
//! ```
//!
//! Every path is a [`KeyPath`]: the keys from the top-level bucket list down
//! to a node. The empty path is the top-level bucket list itself.
//!
//! ## Implementations
//!
//! - [`RedbStore`]: the on-disk store (redb file with a bucket-id layout)
//! - [`MemStore`]: copy-on-write in-memory store, used for empty sessions and tests

mod memory;
mod redb_store;

pub use memory::MemStore;
pub use redb_store::{OpenOptions, RedbStore};

use std::fmt;

use crate::error::Result;

/// Sequence of keys from the root to a node. The root is the empty path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPath(Vec<Vec<u8>>);

impl KeyPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(segments: Vec<Vec<u8>>) -> Self {
        Self(segments)
    }

    /// Convenience for building paths from UTF-8 keys.
    pub fn from_strs(segments: &[&str]) -> Self {
        Self(segments.iter().map(|s| s.as_bytes().to_vec()).collect())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn segments(&self) -> &[Vec<u8>] {
        &self.0
    }

    /// Last key of the path, `None` for the root.
    pub fn last(&self) -> Option<&[u8]> {
        self.0.last().map(Vec::as_slice)
    }

    /// Path of the enclosing bucket. The root is its own parent.
    pub fn parent(&self) -> KeyPath {
        let mut segments = self.0.clone();
        segments.pop();
        Self(segments)
    }

    pub fn child(&self, key: &[u8]) -> KeyPath {
        let mut segments = self.0.clone();
        segments.push(key.to_vec());
        Self(segments)
    }

    /// Same parent, different final key.
    pub fn with_last(&self, key: &[u8]) -> KeyPath {
        self.parent().child(key)
    }

    pub fn starts_with(&self, prefix: &KeyPath) -> bool {
        self.0.starts_with(&prefix.0)
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}", String::from_utf8_lossy(segment))?;
        }
        Ok(())
    }
}

/// Whether an entry is a nested bucket or a key/value pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Bucket,
    Pair,
}

/// One immediate child of a bucket, as listed by [`ReadTx::list_children`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    pub key: Vec<u8>,
    pub kind: EntryKind,
}

/// How [`WriteTx::put_value`] treats an existing key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutMode {
    /// Fail with `DuplicateKey` if the key exists.
    Create,
    /// Replace the value of an existing pair; fail with `PathNotFound` if absent.
    Overwrite,
}

/// An opened database file.
pub trait Store {
    fn is_read_only(&self) -> bool;

    /// Fails with `StoreUnavailable` if no read transaction can be started.
    fn begin_read(&self) -> Result<Box<dyn ReadTx + '_>>;

    /// Fails with `ReadOnlyMode` without touching the engine when read-only.
    fn begin_write(&self) -> Result<Box<dyn WriteTx + '_>>;
}

pub trait ReadTx {
    /// Immediate children of the bucket at `path`, ordered by key bytes.
    fn list_children(&self, path: &KeyPath) -> Result<Vec<ChildEntry>>;

    /// Value bytes of the pair at `path`.
    fn get_value(&self, path: &KeyPath) -> Result<Vec<u8>>;
}

/// A write transaction. Nothing is visible to readers until [`WriteTx::commit`].
pub trait WriteTx: ReadTx {
    fn create_bucket(&mut self, parent: &KeyPath, key: &[u8]) -> Result<()>;

    fn put_value(&mut self, parent: &KeyPath, key: &[u8], value: &[u8], mode: PutMode)
    -> Result<()>;

    /// Deletes a pair, or a bucket together with its whole subtree.
    fn delete_path(&mut self, path: &KeyPath) -> Result<()>;

    /// All-or-nothing; fails with `StoreWriteFailed` leaving the store unchanged.
    fn commit(self: Box<Self>) -> Result<()>;

    fn abort(self: Box<Self>);
}
