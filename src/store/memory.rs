//! In-memory [`Store`] with copy-on-write transactions.
//!
//! A write transaction works on a private clone of the whole hierarchy and
//! swaps it in on commit, so commits are trivially all-or-nothing. Used for the
//! empty session shown when a file fails to open, and as the test double for
//! the edit engine (commit failures can be injected, write transactions are
//! counted).

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use crate::error::{BrowseError, Result};
use crate::store::{ChildEntry, EntryKind, KeyPath, PutMode, ReadTx, Store, WriteTx};

#[derive(Debug, Clone, Default, PartialEq)]
struct Bucket {
    entries: BTreeMap<Vec<u8>, Entry>,
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Pair(Vec<u8>),
    Bucket(Bucket),
}

impl Bucket {
    fn resolve(&self, path: &KeyPath) -> Result<&Bucket> {
        let mut current = self;
        for segment in path.segments() {
            current = match current.entries.get(segment) {
                Some(Entry::Bucket(bucket)) => bucket,
                Some(Entry::Pair(_)) => return Err(BrowseError::NotABucket(path.clone())),
                None => return Err(BrowseError::PathNotFound(path.clone())),
            };
        }
        Ok(current)
    }

    fn resolve_mut(&mut self, path: &KeyPath) -> Result<&mut Bucket> {
        let mut current = self;
        for segment in path.segments() {
            current = match current.entries.get_mut(segment) {
                Some(Entry::Bucket(bucket)) => bucket,
                Some(Entry::Pair(_)) => return Err(BrowseError::NotABucket(path.clone())),
                None => return Err(BrowseError::PathNotFound(path.clone())),
            };
        }
        Ok(current)
    }

    fn list(&self, path: &KeyPath) -> Result<Vec<ChildEntry>> {
        let bucket = self.resolve(path)?;
        Ok(bucket
            .entries
            .iter()
            .map(|(key, entry)| ChildEntry {
                key: key.clone(),
                kind: match entry {
                    Entry::Pair(_) => EntryKind::Pair,
                    Entry::Bucket(_) => EntryKind::Bucket,
                },
            })
            .collect())
    }

    fn value(&self, path: &KeyPath) -> Result<Vec<u8>> {
        let Some(key) = path.last() else {
            return Err(BrowseError::NotAPair(path.clone()));
        };
        let parent = self.resolve(&path.parent())?;
        match parent.entries.get(key) {
            Some(Entry::Pair(value)) => Ok(value.clone()),
            Some(Entry::Bucket(_)) => Err(BrowseError::NotAPair(path.clone())),
            None => Err(BrowseError::PathNotFound(path.clone())),
        }
    }
}

/// Copy-on-write in-memory store.
#[derive(Debug, Default)]
pub struct MemStore {
    data: RefCell<Bucket>,
    read_only: bool,
    fail_next_commit: Cell<bool>,
    write_transactions: Cell<usize>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty store that rejects every write.
    pub fn empty_read_only() -> Self {
        Self::new().into_read_only()
    }

    pub fn into_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Makes the next `commit()` fail with `StoreWriteFailed`.
    pub fn fail_next_commit(&self) {
        self.fail_next_commit.set(true);
    }

    /// Number of write transactions opened so far.
    pub fn write_transactions(&self) -> usize {
        self.write_transactions.get()
    }
}

impl Store for MemStore {
    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn begin_read(&self) -> Result<Box<dyn ReadTx + '_>> {
        Ok(Box::new(MemReadTx {
            snapshot: self.data.borrow().clone(),
        }))
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTx + '_>> {
        if self.read_only {
            return Err(BrowseError::ReadOnlyMode);
        }
        self.write_transactions.set(self.write_transactions.get() + 1);
        Ok(Box::new(MemWriteTx {
            store: self,
            working: self.data.borrow().clone(),
        }))
    }
}

struct MemReadTx {
    snapshot: Bucket,
}

impl ReadTx for MemReadTx {
    fn list_children(&self, path: &KeyPath) -> Result<Vec<ChildEntry>> {
        self.snapshot.list(path)
    }

    fn get_value(&self, path: &KeyPath) -> Result<Vec<u8>> {
        self.snapshot.value(path)
    }
}

struct MemWriteTx<'a> {
    store: &'a MemStore,
    working: Bucket,
}

impl ReadTx for MemWriteTx<'_> {
    fn list_children(&self, path: &KeyPath) -> Result<Vec<ChildEntry>> {
        self.working.list(path)
    }

    fn get_value(&self, path: &KeyPath) -> Result<Vec<u8>> {
        self.working.value(path)
    }
}

impl WriteTx for MemWriteTx<'_> {
    fn create_bucket(&mut self, parent: &KeyPath, key: &[u8]) -> Result<()> {
        let bucket = self.working.resolve_mut(parent)?;
        if bucket.entries.contains_key(key) {
            return Err(BrowseError::DuplicateKey(parent.child(key)));
        }
        bucket
            .entries
            .insert(key.to_vec(), Entry::Bucket(Bucket::default()));
        Ok(())
    }

    fn put_value(
        &mut self,
        parent: &KeyPath,
        key: &[u8],
        value: &[u8],
        mode: PutMode,
    ) -> Result<()> {
        let bucket = self.working.resolve_mut(parent)?;
        match (mode, bucket.entries.get_mut(key)) {
            (PutMode::Create, Some(_)) => Err(BrowseError::DuplicateKey(parent.child(key))),
            (PutMode::Create, None) => {
                bucket
                    .entries
                    .insert(key.to_vec(), Entry::Pair(value.to_vec()));
                Ok(())
            }
            (PutMode::Overwrite, Some(Entry::Pair(existing))) => {
                *existing = value.to_vec();
                Ok(())
            }
            (PutMode::Overwrite, Some(Entry::Bucket(_))) => {
                Err(BrowseError::NotAPair(parent.child(key)))
            }
            (PutMode::Overwrite, None) => Err(BrowseError::PathNotFound(parent.child(key))),
        }
    }

    fn delete_path(&mut self, path: &KeyPath) -> Result<()> {
        let Some(key) = path.last() else {
            return Err(BrowseError::PathNotFound(path.clone()));
        };
        let parent = self.working.resolve_mut(&path.parent())?;
        parent
            .entries
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| BrowseError::PathNotFound(path.clone()))
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        if this.store.fail_next_commit.replace(false) {
            return Err(BrowseError::StoreWriteFailed(
                "injected commit failure".to_string(),
            ));
        }
        *this.store.data.borrow_mut() = this.working;
        Ok(())
    }

    fn abort(self: Box<Self>) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded() -> MemStore {
        let store = MemStore::new();
        let mut tx = store.begin_write().unwrap();
        tx.create_bucket(&KeyPath::root(), b"users").unwrap();
        tx.put_value(&KeyPath::from_strs(&["users"]), b"bob", b"2", PutMode::Create)
            .unwrap();
        tx.put_value(&KeyPath::from_strs(&["users"]), b"alice", b"1", PutMode::Create)
            .unwrap();
        tx.commit().unwrap();
        store
    }

    #[test]
    fn test_children_are_listed_in_key_order() {
        let store = seeded();
        let tx = store.begin_read().unwrap();
        let keys: Vec<_> = tx
            .list_children(&KeyPath::from_strs(&["users"]))
            .unwrap()
            .into_iter()
            .map(|c| c.key)
            .collect();
        assert_eq!(keys, vec![b"alice".to_vec(), b"bob".to_vec()]);
    }

    #[test]
    fn test_uncommitted_writes_are_invisible() {
        let store = seeded();
        let mut tx = store.begin_write().unwrap();
        tx.delete_path(&KeyPath::from_strs(&["users"])).unwrap();
        tx.abort();
        let read = store.begin_read().unwrap();
        assert_eq!(read.list_children(&KeyPath::root()).unwrap().len(), 1);
    }

    #[test]
    fn test_injected_commit_failure_leaves_store_unchanged() {
        let store = seeded();
        store.fail_next_commit();
        let mut tx = store.begin_write().unwrap();
        tx.delete_path(&KeyPath::from_strs(&["users", "bob"])).unwrap();
        assert!(matches!(tx.commit(), Err(BrowseError::StoreWriteFailed(_))));
        let read = store.begin_read().unwrap();
        assert_eq!(
            read.get_value(&KeyPath::from_strs(&["users", "bob"])).unwrap(),
            b"2"
        );
    }

    #[test]
    fn test_read_only_rejects_write_transactions() {
        let store = seeded().into_read_only();
        assert!(matches!(store.begin_write(), Err(BrowseError::ReadOnlyMode)));
        assert_eq!(store.write_transactions(), 1); // only the seeding transaction
    }

    #[test]
    fn test_put_value_modes() {
        let store = seeded();
        let users = KeyPath::from_strs(&["users"]);
        let mut tx = store.begin_write().unwrap();
        assert!(matches!(
            tx.put_value(&users, b"bob", b"x", PutMode::Create),
            Err(BrowseError::DuplicateKey(_))
        ));
        assert!(matches!(
            tx.put_value(&users, b"carol", b"x", PutMode::Overwrite),
            Err(BrowseError::PathNotFound(_))
        ));
        assert!(matches!(
            tx.put_value(&KeyPath::root(), b"users", b"x", PutMode::Overwrite),
            Err(BrowseError::NotAPair(_))
        ));
        tx.put_value(&users, b"bob", b"22", PutMode::Overwrite).unwrap();
        assert_eq!(tx.get_value(&users.child(b"bob")).unwrap(), b"22");
    }

    #[test]
    fn test_pair_is_not_a_bucket() {
        let store = seeded();
        let tx = store.begin_read().unwrap();
        assert!(matches!(
            tx.list_children(&KeyPath::from_strs(&["users", "bob"])),
            Err(BrowseError::NotABucket(_))
        ));
        assert!(matches!(
            tx.get_value(&KeyPath::from_strs(&["users"])),
            Err(BrowseError::NotAPair(_))
        ));
    }
}
