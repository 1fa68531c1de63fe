//! On-disk [`Store`] backed by a redb file.
//!
//! redb only has flat tables, so the bucket hierarchy is laid out with
//! numeric bucket ids:
//!
//! ```text
//! entries:  (bucket_id, key) → 0x00 ++ value bytes          (pair)
//!                            → 0x01 ++ child_id (u64, BE)   (nested bucket)
//! sequence: "next_bucket"    → next free bucket id
//! ```
//!
//! The top-level bucket list is bucket `0`. The immediate children of a
//! bucket are the contiguous range `(id, [])..(id + 1, [])`, which redb
//! already yields in byte-lexicographic key order.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use redb::{Database, DatabaseError, ReadableTable, TableDefinition, TableError};

use crate::error::{BrowseError, Result};
use crate::store::{ChildEntry, EntryKind, KeyPath, PutMode, ReadTx, Store, WriteTx};

const ENTRIES: TableDefinition<(u64, &[u8]), &[u8]> = TableDefinition::new("entries");
const SEQUENCE: TableDefinition<&str, u64> = TableDefinition::new("sequence");
const NEXT_BUCKET: &str = "next_bucket";

const ROOT_BUCKET: u64 = 0;
const TAG_PAIR: u8 = 0;
const TAG_BUCKET: u8 = 1;

const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(50);

/// Default time to wait for another process to release the file lock.
pub const DEFAULT_OPEN_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Clone)]
pub struct OpenOptions {
    pub read_only: bool,
    /// How long to keep retrying while the file is locked.
    pub timeout: Duration,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            read_only: false,
            timeout: DEFAULT_OPEN_TIMEOUT,
        }
    }
}

// ============================================================================
// Entry encoding
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Stored {
    Pair(Vec<u8>),
    Bucket(u64),
}

impl Stored {
    fn decode(bytes: &[u8]) -> Result<Self> {
        match bytes.split_first() {
            Some((&TAG_PAIR, value)) => Ok(Self::Pair(value.to_vec())),
            Some((&TAG_BUCKET, id)) => {
                let id: [u8; 8] = id
                    .try_into()
                    .map_err(|_| BrowseError::StoreUnavailable("corrupt bucket entry".into()))?;
                Ok(Self::Bucket(u64::from_be_bytes(id)))
            }
            _ => Err(BrowseError::StoreUnavailable("corrupt entry".into())),
        }
    }

    fn encode(&self) -> Vec<u8> {
        match self {
            Self::Pair(value) => {
                let mut bytes = Vec::with_capacity(value.len() + 1);
                bytes.push(TAG_PAIR);
                bytes.extend_from_slice(value);
                bytes
            }
            Self::Bucket(id) => {
                let mut bytes = Vec::with_capacity(9);
                bytes.push(TAG_BUCKET);
                bytes.extend_from_slice(&id.to_be_bytes());
                bytes
            }
        }
    }

    fn kind(&self) -> EntryKind {
        match self {
            Self::Pair(_) => EntryKind::Pair,
            Self::Bucket(_) => EntryKind::Bucket,
        }
    }
}

fn unavailable(e: impl std::fmt::Display) -> BrowseError {
    BrowseError::StoreUnavailable(e.to_string())
}

fn write_failed(e: impl std::fmt::Display) -> BrowseError {
    BrowseError::StoreWriteFailed(e.to_string())
}

// ============================================================================
// Table walking (shared by read and write transactions)
// ============================================================================

fn lookup<T>(table: &T, bucket: u64, key: &[u8]) -> Result<Option<Stored>>
where
    T: ReadableTable<(u64, &'static [u8]), &'static [u8]>,
{
    match table.get((bucket, key)).map_err(unavailable)? {
        Some(guard) => Stored::decode(guard.value()).map(Some),
        None => Ok(None),
    }
}

/// Follows `path` from the top-level list down to a bucket id.
fn resolve_bucket<T>(table: &T, path: &KeyPath) -> Result<u64>
where
    T: ReadableTable<(u64, &'static [u8]), &'static [u8]>,
{
    let mut id = ROOT_BUCKET;
    for segment in path.segments() {
        id = match lookup(table, id, segment)? {
            Some(Stored::Bucket(child)) => child,
            Some(Stored::Pair(_)) => return Err(BrowseError::NotABucket(path.clone())),
            None => return Err(BrowseError::PathNotFound(path.clone())),
        };
    }
    Ok(id)
}

fn list_bucket<T>(table: &T, bucket: u64) -> Result<Vec<(Vec<u8>, Stored)>>
where
    T: ReadableTable<(u64, &'static [u8]), &'static [u8]>,
{
    let empty: &[u8] = &[];
    let range = table
        .range((bucket, empty)..(bucket + 1, empty))
        .map_err(unavailable)?;
    let mut children = Vec::new();
    for item in range {
        let (key, value) = item.map_err(unavailable)?;
        let (_, key) = key.value();
        children.push((key.to_vec(), Stored::decode(value.value())?));
    }
    Ok(children)
}

fn list_children_in<T>(table: &T, path: &KeyPath) -> Result<Vec<ChildEntry>>
where
    T: ReadableTable<(u64, &'static [u8]), &'static [u8]>,
{
    let id = resolve_bucket(table, path)?;
    Ok(list_bucket(table, id)?
        .into_iter()
        .map(|(key, stored)| ChildEntry {
            key,
            kind: stored.kind(),
        })
        .collect())
}

fn get_value_in<T>(table: &T, path: &KeyPath) -> Result<Vec<u8>>
where
    T: ReadableTable<(u64, &'static [u8]), &'static [u8]>,
{
    let Some(key) = path.last() else {
        return Err(BrowseError::NotAPair(path.clone()));
    };
    let parent = resolve_bucket(table, &path.parent())?;
    match lookup(table, parent, key)? {
        Some(Stored::Pair(value)) => Ok(value),
        Some(Stored::Bucket(_)) => Err(BrowseError::NotAPair(path.clone())),
        None => Err(BrowseError::PathNotFound(path.clone())),
    }
}

// ============================================================================
// Store
// ============================================================================

pub struct RedbStore {
    db: Database,
    path: PathBuf,
    read_only: bool,
}

impl RedbStore {
    /// Opens (or, in read-write mode, creates) the database file.
    ///
    /// Retries while another process holds the lock, up to `options.timeout`,
    /// then fails with `StoreLocked`.
    pub fn open(path: &Path, options: &OpenOptions) -> Result<Self> {
        let deadline = Instant::now() + options.timeout;
        let db = loop {
            let attempt = if options.read_only {
                Database::open(path)
            } else {
                Database::create(path)
            };
            match attempt {
                Ok(db) => break db,
                Err(DatabaseError::DatabaseAlreadyOpen) if Instant::now() < deadline => {
                    debug!("{} is locked, retrying", path.display());
                    thread::sleep(LOCK_RETRY_INTERVAL);
                }
                Err(DatabaseError::DatabaseAlreadyOpen) => {
                    return Err(BrowseError::StoreLocked(path.display().to_string()));
                }
                Err(e) => {
                    return Err(BrowseError::StoreUnavailable(format!(
                        "{}: {e}",
                        path.display()
                    )));
                }
            }
        };

        if !options.read_only {
            let txn = db.begin_write().map_err(unavailable)?;
            txn.open_table(ENTRIES).map_err(unavailable)?;
            txn.open_table(SEQUENCE).map_err(unavailable)?;
            txn.commit().map_err(unavailable)?;
        }

        info!(
            "Opened {} ({})",
            path.display(),
            if options.read_only { "read-only" } else { "read-write" }
        );
        Ok(Self {
            db,
            path: path.to_path_buf(),
            read_only: options.read_only,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Store for RedbStore {
    fn is_read_only(&self) -> bool {
        self.read_only
    }

    fn begin_read(&self) -> Result<Box<dyn ReadTx + '_>> {
        let txn = self.db.begin_read().map_err(unavailable)?;
        Ok(Box::new(RedbReadTx { txn }))
    }

    fn begin_write(&self) -> Result<Box<dyn WriteTx + '_>> {
        if self.read_only {
            return Err(BrowseError::ReadOnlyMode);
        }
        let txn = self.db.begin_write().map_err(write_failed)?;
        Ok(Box::new(RedbWriteTx { txn }))
    }
}

struct RedbReadTx {
    txn: redb::ReadTransaction,
}

impl RedbReadTx {
    /// `None` when the file has never been written (opened read-only while empty).
    fn entries(&self) -> Result<Option<redb::ReadOnlyTable<(u64, &'static [u8]), &'static [u8]>>> {
        match self.txn.open_table(ENTRIES) {
            Ok(table) => Ok(Some(table)),
            Err(TableError::TableDoesNotExist(_)) => Ok(None),
            Err(e) => Err(unavailable(e)),
        }
    }
}

impl ReadTx for RedbReadTx {
    fn list_children(&self, path: &KeyPath) -> Result<Vec<ChildEntry>> {
        match self.entries()? {
            Some(table) => list_children_in(&table, path),
            None if path.is_root() => Ok(Vec::new()),
            None => Err(BrowseError::PathNotFound(path.clone())),
        }
    }

    fn get_value(&self, path: &KeyPath) -> Result<Vec<u8>> {
        match self.entries()? {
            Some(table) => get_value_in(&table, path),
            None => Err(BrowseError::PathNotFound(path.clone())),
        }
    }
}

struct RedbWriteTx {
    txn: redb::WriteTransaction,
}

impl RedbWriteTx {
    fn entries(&self) -> Result<redb::Table<'_, (u64, &'static [u8]), &'static [u8]>> {
        self.txn.open_table(ENTRIES).map_err(write_failed)
    }

    fn allocate_bucket_id(&self) -> Result<u64> {
        let mut sequence = self.txn.open_table(SEQUENCE).map_err(write_failed)?;
        let next = sequence
            .get(NEXT_BUCKET)
            .map_err(write_failed)?
            .map(|guard| guard.value())
            .unwrap_or(ROOT_BUCKET + 1);
        sequence.insert(NEXT_BUCKET, next + 1).map_err(write_failed)?;
        Ok(next)
    }
}

impl ReadTx for RedbWriteTx {
    fn list_children(&self, path: &KeyPath) -> Result<Vec<ChildEntry>> {
        list_children_in(&self.entries()?, path)
    }

    fn get_value(&self, path: &KeyPath) -> Result<Vec<u8>> {
        get_value_in(&self.entries()?, path)
    }
}

impl WriteTx for RedbWriteTx {
    fn create_bucket(&mut self, parent: &KeyPath, key: &[u8]) -> Result<()> {
        let parent_id = {
            let table = self.entries()?;
            let parent_id = resolve_bucket(&table, parent)?;
            if lookup(&table, parent_id, key)?.is_some() {
                return Err(BrowseError::DuplicateKey(parent.child(key)));
            }
            parent_id
        };
        let id = self.allocate_bucket_id()?;
        let mut table = self.entries()?;
        table
            .insert((parent_id, key), Stored::Bucket(id).encode().as_slice())
            .map_err(write_failed)?;
        Ok(())
    }

    fn put_value(
        &mut self,
        parent: &KeyPath,
        key: &[u8],
        value: &[u8],
        mode: PutMode,
    ) -> Result<()> {
        let mut table = self.entries()?;
        let parent_id = resolve_bucket(&table, parent)?;
        match (mode, lookup(&table, parent_id, key)?) {
            (PutMode::Create, Some(_)) => Err(BrowseError::DuplicateKey(parent.child(key))),
            (PutMode::Overwrite, None) => Err(BrowseError::PathNotFound(parent.child(key))),
            (PutMode::Overwrite, Some(Stored::Bucket(_))) => {
                Err(BrowseError::NotAPair(parent.child(key)))
            }
            (PutMode::Create, None) | (PutMode::Overwrite, Some(Stored::Pair(_))) => {
                table
                    .insert(
                        (parent_id, key),
                        Stored::Pair(value.to_vec()).encode().as_slice(),
                    )
                    .map_err(write_failed)?;
                Ok(())
            }
        }
    }

    fn delete_path(&mut self, path: &KeyPath) -> Result<()> {
        let Some(key) = path.last() else {
            return Err(BrowseError::PathNotFound(path.clone()));
        };
        let mut table = self.entries()?;
        let parent_id = resolve_bucket(&table, &path.parent())?;
        let target = lookup(&table, parent_id, key)?
            .ok_or_else(|| BrowseError::PathNotFound(path.clone()))?;

        if let Stored::Bucket(id) = target {
            let mut pending = vec![id];
            while let Some(bucket) = pending.pop() {
                for (child_key, child) in list_bucket(&table, bucket)? {
                    if let Stored::Bucket(child_id) = child {
                        pending.push(child_id);
                    }
                    table
                        .remove((bucket, child_key.as_slice()))
                        .map_err(write_failed)?;
                }
            }
        }
        table.remove((parent_id, key)).map_err(write_failed)?;
        Ok(())
    }

    fn commit(self: Box<Self>) -> Result<()> {
        let this = *self;
        this.txn.commit().map_err(write_failed)
    }

    fn abort(self: Box<Self>) {
        let this = *self;
        if let Err(e) = this.txn.abort() {
            warn!("Failed to abort write transaction: {e}");
        }
    }
}
