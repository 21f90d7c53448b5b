//! Exact brute-force index, scored in parallel with rayon.

use parking_lot::RwLock;
use rayon::prelude::*;
use std::collections::HashSet;

use crate::error::Result;
use crate::types::IndexEntry;
use crate::vector::dot;

use super::{VectorIndex, check_query, validate_batch};

#[derive(Default)]
struct FlatState {
    entries: Vec<IndexEntry>,
    ids: HashSet<u64>,
}

/// Exact inner-product index that scores every vector on each search.
///
/// Suited to small corpora and tests, where exact results matter more than speed.
pub struct FlatIndex {
    dimension: usize,
    state: RwLock<FlatState>,
}

impl std::fmt::Debug for FlatIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatIndex")
            .field("dimension", &self.dimension)
            .field("len", &self.state.read().entries.len())
            .finish()
    }
}

impl FlatIndex {
    /// Creates an empty index with the specified embedding dimension.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: RwLock::new(FlatState::default()),
        }
    }
}

impl VectorIndex for FlatIndex {
    fn add_with_ids(&self, entries: Vec<IndexEntry>) -> Result<()> {
        let mut state = self.state.write();
        validate_batch(self.dimension, &entries, |id| state.ids.contains(&id))?;
        for entry in entries {
            state.ids.insert(entry.id);
            state.entries.push(entry);
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(u64, f32)>> {
        let state = self.state.read();
        if state.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        check_query(self.dimension, query)?;

        let mut scored: Vec<(u64, f32)> = state
            .entries
            .par_iter()
            .map(|entry| (entry.id, dot(&entry.embedding, query)))
            .collect();

        scored.par_sort_unstable_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    fn contains(&self, id: u64) -> bool {
        self.state.read().ids.contains(&id)
    }

    fn clear(&self) {
        let mut state = self.state.write();
        state.entries.clear();
        state.ids.clear();
    }

    fn entries(&self) -> Vec<IndexEntry> {
        self.state.read().entries.clone()
    }

    fn load(&self, entries: Vec<IndexEntry>) -> Result<()> {
        validate_batch(self.dimension, &entries, |_| false)?;
        let mut state = self.state.write();
        state.ids = entries.iter().map(|entry| entry.id).collect();
        state.entries = entries;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_break_by_id() {
        let index = FlatIndex::new(2);
        index
            .add_with_ids(vec![
                IndexEntry::new(7, vec![1.0, 0.0]),
                IndexEntry::new(3, vec![1.0, 0.0]),
            ])
            .unwrap();
        let results = index.search(&[1.0, 0.0], 2).unwrap();
        assert_eq!(results.iter().map(|r| r.0).collect::<Vec<_>>(), vec![3, 7]);
    }

    #[test]
    fn k_larger_than_len_returns_everything() {
        let index = FlatIndex::new(2);
        index
            .add_with_ids(vec![IndexEntry::new(0, vec![0.0, 1.0])])
            .unwrap();
        assert_eq!(index.search(&[1.0, 0.0], 10).unwrap().len(), 1);
    }
}
