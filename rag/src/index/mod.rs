//! Vector index implementations.
//!
//! This module provides the [`VectorIndex`] trait, the approximate [`HnswIndex`] and the
//! exact [`FlatIndex`]. Both score by inner product and expect callers to store and query
//! unit-normalized vectors, which makes the score a cosine similarity.

mod flat;
mod hnsw;

pub use flat::FlatIndex;
pub use hnsw::HnswIndex;

use std::collections::HashSet;

use crate::config::IndexKind;
use crate::error::{RagError, Result};
use crate::types::IndexEntry;

/// An ID-addressed nearest-neighbor index.
pub trait VectorIndex: Send + Sync + std::fmt::Debug {
    /// Adds vectors under caller-supplied IDs.
    ///
    /// Either every entry is added or none is: a dimension mismatch or an ID that is already
    /// present rejects the whole call.
    fn add_with_ids(&self, entries: Vec<IndexEntry>) -> Result<()>;

    /// Returns up to `k` `(id, score)` pairs by descending inner product.
    ///
    /// An empty index yields an empty result.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(u64, f32)>>;

    /// Returns the embedding dimension.
    fn dimension(&self) -> usize;

    /// Returns the number of indexed vectors.
    fn len(&self) -> usize;

    /// Returns `true` if the index is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the ID is present.
    fn contains(&self, id: u64) -> bool;

    /// Clears all entries from the index.
    fn clear(&self);

    /// Returns a copy of every entry in insertion order.
    fn entries(&self) -> Vec<IndexEntry>;

    /// Loads entries into the index, replacing existing content.
    fn load(&self, entries: Vec<IndexEntry>) -> Result<()>;
}

/// Creates an empty index of the given kind.
#[must_use]
pub fn new_index(kind: IndexKind, dimension: usize) -> Box<dyn VectorIndex> {
    match kind {
        IndexKind::Hnsw => Box::new(HnswIndex::new(dimension)),
        IndexKind::Flat => Box::new(FlatIndex::new(dimension)),
    }
}

/// Checks a batch against the index dimension and the IDs already present.
pub(crate) fn validate_batch(
    dimension: usize,
    entries: &[IndexEntry],
    present: impl Fn(u64) -> bool,
) -> Result<()> {
    let mut seen = HashSet::with_capacity(entries.len());
    for entry in entries {
        if entry.embedding.len() != dimension {
            return Err(RagError::DimensionMismatch {
                expected: dimension,
                actual: entry.embedding.len(),
            });
        }
        if present(entry.id) || !seen.insert(entry.id) {
            return Err(RagError::DuplicateId(entry.id));
        }
    }
    Ok(())
}

pub(crate) fn check_query(dimension: usize, query: &[f32]) -> Result<()> {
    if query.len() == dimension {
        Ok(())
    } else {
        Err(RagError::DimensionMismatch {
            expected: dimension,
            actual: query.len(),
        })
    }
}
