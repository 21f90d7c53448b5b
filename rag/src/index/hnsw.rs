//! HNSW-based vector index using instant-distance.

use instant_distance::{Builder, HnswMap, Point, Search};
use parking_lot::RwLock;
use std::collections::HashMap;

use crate::error::Result;
use crate::types::IndexEntry;
use crate::vector::dot;

use super::{VectorIndex, check_query, validate_batch};

/// A point wrapper for instant-distance that stores a unit embedding.
#[derive(Clone, Debug)]
struct EmbeddingPoint {
    embedding: Vec<f32>,
}

impl Point for EmbeddingPoint {
    fn distance(&self, other: &Self) -> f32 {
        // Inner-product distance over unit vectors; smaller is more similar.
        1.0 - dot(&self.embedding, &other.embedding)
    }
}

/// Internal state for the HNSW index.
struct IndexState {
    /// All stored entries in insertion order.
    entries: Vec<IndexEntry>,
    /// Map from external ID to position in `entries`.
    id_to_index: HashMap<u64, usize>,
    /// The HNSW graph (rebuilt after modifications).
    hnsw: Option<HnswMap<EmbeddingPoint, usize>>,
    /// Whether the graph needs rebuilding.
    dirty: bool,
}

impl IndexState {
    fn new() -> Self {
        Self {
            entries: Vec::new(),
            id_to_index: HashMap::new(),
            hnsw: None,
            dirty: false,
        }
    }

    fn reindex(&mut self) {
        self.id_to_index = self
            .entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (entry.id, idx))
            .collect();
        self.dirty = true;
    }

    fn rebuild_hnsw(&mut self) {
        if self.entries.is_empty() {
            self.hnsw = None;
            self.dirty = false;
            return;
        }

        let points: Vec<EmbeddingPoint> = self
            .entries
            .iter()
            .map(|e| EmbeddingPoint {
                embedding: e.embedding.clone(),
            })
            .collect();

        let indices: Vec<usize> = (0..self.entries.len()).collect();

        self.hnsw = Some(Builder::default().build(points, indices));
        self.dirty = false;
    }
}

/// HNSW-based vector index for approximate nearest neighbor search.
///
/// Entries are kept in insertion order next to the graph, which is rebuilt lazily on the
/// first search after a modification.
///
/// ```rust
/// use seabrief_rag::index::{HnswIndex, VectorIndex};
/// use seabrief_rag::IndexEntry;
///
/// let index = HnswIndex::new(2);
/// index.add_with_ids(vec![IndexEntry::new(0, vec![1.0, 0.0])]).unwrap();
/// let hits = index.search(&[1.0, 0.0], 1).unwrap();
/// assert_eq!(hits[0].0, 0);
/// ```
pub struct HnswIndex {
    dimension: usize,
    state: RwLock<IndexState>,
}

impl std::fmt::Debug for HnswIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("HnswIndex")
            .field("dimension", &self.dimension)
            .field("len", &state.entries.len())
            .finish()
    }
}

impl HnswIndex {
    /// Creates a new HNSW index with the specified embedding dimension.
    #[must_use]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            state: RwLock::new(IndexState::new()),
        }
    }
}

impl VectorIndex for HnswIndex {
    fn add_with_ids(&self, entries: Vec<IndexEntry>) -> Result<()> {
        let mut state = self.state.write();
        validate_batch(self.dimension, &entries, |id| {
            state.id_to_index.contains_key(&id)
        })?;

        for entry in entries {
            let idx = state.entries.len();
            state.id_to_index.insert(entry.id, idx);
            state.entries.push(entry);
        }

        state.dirty = true;
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<(u64, f32)>> {
        let mut state = self.state.write();

        if state.entries.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        check_query(self.dimension, query)?;

        if state.dirty || state.hnsw.is_none() {
            state.rebuild_hnsw();
        }

        let Some(ref hnsw) = state.hnsw else {
            return Ok(Vec::new());
        };

        let query_point = EmbeddingPoint {
            embedding: query.to_vec(),
        };

        let mut search = Search::default();
        let mut results: Vec<(u64, f32)> = hnsw
            .search(&query_point, &mut search)
            .take(k)
            .map(|candidate| {
                let entry = &state.entries[*candidate.value];
                (entry.id, 1.0 - candidate.distance)
            })
            .collect();

        results.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        Ok(results)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn len(&self) -> usize {
        self.state.read().entries.len()
    }

    fn contains(&self, id: u64) -> bool {
        self.state.read().id_to_index.contains_key(&id)
    }

    fn clear(&self) {
        let mut state = self.state.write();
        state.entries.clear();
        state.id_to_index.clear();
        state.hnsw = None;
        state.dirty = false;
    }

    fn entries(&self) -> Vec<IndexEntry> {
        self.state.read().entries.clone()
    }

    fn load(&self, entries: Vec<IndexEntry>) -> Result<()> {
        validate_batch(self.dimension, &entries, |_| false)?;

        let mut state = self.state.write();
        state.entries = entries;
        state.hnsw = None;
        state.reindex();
        Ok(())
    }
}
