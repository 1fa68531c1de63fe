//! # Errors
//!
//! One taxonomy shared by the store adapter, the tree mirror and the edit
//! engine. Only [`BrowseError::StoreUnavailable`] and
//! [`BrowseError::StoreLocked`] end a session; everything else is surfaced as
//! a transient status message.

use thiserror::Error;

use crate::store::KeyPath;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BrowseError {
    /// The file could not be opened or a read transaction could not be started.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// Another process holds the file lock and the open timeout elapsed.
    #[error("{0} is locked. Make sure it's not used by another app and try again")]
    StoreLocked(String),
    /// A mutation was attempted on a store opened read-only.
    #[error("database is open in read-only mode")]
    ReadOnlyMode,
    #[error("path not found: {0}")]
    PathNotFound(KeyPath),
    #[error("not a bucket: {0}")]
    NotABucket(KeyPath),
    #[error("not a key/value pair: {0}")]
    NotAPair(KeyPath),
    #[error("key already exists: {0}")]
    DuplicateKey(KeyPath),
    #[error("key must not be empty")]
    EmptyKey,
    /// A hex buffer (key or value that is not UTF-8) did not decode.
    #[error("not valid hex: {0}")]
    InvalidHex(String),
    /// The write transaction failed; the store is unchanged.
    #[error("write failed: {0}")]
    StoreWriteFailed(String),
}

impl BrowseError {
    /// True for errors that end the session for the current file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_) | Self::StoreLocked(_))
    }

    /// True for errors that keep a Pending Edit open so the input can be corrected.
    pub fn keeps_edit_open(&self) -> bool {
        matches!(
            self,
            Self::DuplicateKey(_) | Self::EmptyKey | Self::InvalidHex(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, BrowseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_open_failures_are_fatal() {
        assert!(BrowseError::StoreUnavailable("gone".into()).is_fatal());
        assert!(BrowseError::StoreLocked("a.db".into()).is_fatal());
        assert!(!BrowseError::ReadOnlyMode.is_fatal());
        assert!(!BrowseError::StoreWriteFailed("disk full".into()).is_fatal());
    }

    #[test]
    fn test_duplicate_key_keeps_edit_open() {
        let path = KeyPath::from_strs(&["a", "b"]);
        assert!(BrowseError::DuplicateKey(path.clone()).keeps_edit_open());
        assert!(BrowseError::EmptyKey.keeps_edit_open());
        assert!(BrowseError::InvalidHex("odd number of digits".into()).keeps_edit_open());
        assert!(!BrowseError::PathNotFound(path).keeps_edit_open());
    }

    #[test]
    fn test_display_includes_path() {
        let err = BrowseError::DuplicateKey(KeyPath::from_strs(&["users", "alice"]));
        assert_eq!(err.to_string(), "key already exists: users/alice");
    }
}
