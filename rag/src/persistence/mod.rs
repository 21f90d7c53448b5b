//! Persistence backends for the vector index.
//!
//! This module provides the [`Persistence`] trait and the rkyv implementation used for the
//! index file. The metadata log has its own format, see [`crate::metadata`].

mod rkyv_backend;

pub use rkyv_backend::RkyvPersistence;

use crate::error::Result;
use crate::types::IndexEntry;
use std::path::Path;

/// A snapshot of the index as stored on disk.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedIndex {
    /// Embedding dimension of every entry.
    pub dimension: usize,
    /// Entries in insertion order.
    pub entries: Vec<IndexEntry>,
}

/// Trait for persistence backends.
pub trait Persistence: Send + Sync {
    /// Writes the snapshot to storage, replacing any previous one.
    fn save(&self, index: &PersistedIndex) -> Result<()>;

    /// Loads the stored snapshot.
    ///
    /// Returns `None` if no data exists.
    fn load(&self) -> Result<Option<PersistedIndex>>;

    /// Deletes the stored snapshot, if any.
    fn remove(&self) -> Result<()>;

    /// Returns the storage path.
    fn path(&self) -> &Path;
}
