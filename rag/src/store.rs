//! The vector store: an ID-addressed index paired with the metadata log.

use std::fs;

use parking_lot::RwLock;

use crate::config::RagConfig;
use crate::error::{RagError, Result};
use crate::index::{VectorIndex, new_index};
use crate::metadata::{MetadataLog, MetadataSnapshot};
use crate::persistence::{PersistedIndex, Persistence, RkyvPersistence};
use crate::types::{IndexEntry, IndexStats, MetadataRecord};

/// Durable nearest-neighbor index with a side metadata log.
///
/// The store keeps the parsed log in memory so lookups by ID do not touch the disk. Appends
/// hold the metadata lock for their whole duration, so readers never observe a log line
/// without its vector.
pub struct VectorStore {
    dimension: usize,
    index: Box<dyn VectorIndex>,
    persistence: RkyvPersistence,
    log: MetadataLog,
    metadata: RwLock<MetadataSnapshot>,
}

impl std::fmt::Debug for VectorStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VectorStore")
            .field("index", &self.index)
            .field("metadata_path", &self.log.path())
            .field("metadata_len", &self.metadata.read().len())
            .finish_non_exhaustive()
    }
}

impl VectorStore {
    /// Opens the store described by `config`.
    ///
    /// Never fails: an unreadable or incompatible index file yields an empty index, and an
    /// unreadable metadata log yields an empty snapshot. Both cases are logged.
    #[must_use]
    pub fn open(config: &RagConfig, dimension: usize) -> Self {
        Self::with_index(config, dimension, new_index(config.index_kind, dimension))
    }

    pub(crate) fn with_index(
        config: &RagConfig,
        dimension: usize,
        index: Box<dyn VectorIndex>,
    ) -> Self {
        let store = Self {
            dimension,
            index,
            persistence: RkyvPersistence::new(&config.index_path),
            log: MetadataLog::new(&config.metadata_path),
            metadata: RwLock::new(MetadataSnapshot::default()),
        };
        store.load();
        store
    }

    /// Reloads the index and the metadata log from disk, degrading to empty state on errors.
    pub fn load(&self) {
        self.index.clear();
        match self.persistence.load() {
            Ok(Some(snapshot)) if snapshot.dimension != self.dimension => {
                tracing::warn!(
                    path = %self.persistence.path().display(),
                    stored = snapshot.dimension,
                    expected = self.dimension,
                    "Index dimension differs from the embedding model, starting empty"
                );
            }
            Ok(Some(snapshot)) => {
                if let Err(err) = self.index.load(snapshot.entries) {
                    tracing::warn!(error = %err, "Stored index is inconsistent, starting empty");
                    self.index.clear();
                }
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(error = %err, "Failed to load index, starting empty");
            }
        }

        let snapshot = self.log.read_all().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "Failed to read metadata log");
            MetadataSnapshot::default()
        });

        if snapshot.len() != self.index.len() {
            tracing::warn!(
                vectors = self.index.len(),
                metadata = snapshot.len(),
                "Index and metadata log are out of sync; rebuild recommended"
            );
        }
        if let Err(err) = snapshot.validate_ids() {
            tracing::warn!(error = %err, "Metadata log ids do not match line positions");
        }

        *self.metadata.write() = snapshot;
    }

    /// Writes the index to disk.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Persistence`] or [`RagError::Serialization`] when the write fails.
    pub fn save(&self) -> Result<()> {
        self.persistence.save(&PersistedIndex {
            dimension: self.dimension,
            entries: self.index.entries(),
        })
    }

    /// The ID the next appended document will receive.
    #[must_use]
    pub fn next_id(&self) -> u64 {
        self.metadata.read().len() as u64
    }

    /// Appends documents as `(metadata, vector)` pairs.
    ///
    /// IDs must continue the log: the first pair carries [`next_id`](Self::next_id) and each
    /// following pair the next integer. The metadata lines are written first and the vectors
    /// are added only once the write succeeded. If the index then rejects the vectors, the
    /// lines are cut from the log again.
    ///
    /// # Errors
    ///
    /// Rejects misnumbered or mis-sized pairs before touching anything, returns
    /// [`RagError::Persistence`] when the metadata write fails, and returns the index error
    /// when the vectors cannot be added.
    pub fn append(&self, records: Vec<MetadataRecord>, entries: Vec<IndexEntry>) -> Result<()> {
        if records.len() != entries.len() {
            return Err(RagError::Validation(format!(
                "{} metadata records for {} vectors",
                records.len(),
                entries.len()
            )));
        }
        if records.is_empty() {
            return Ok(());
        }

        let mut metadata = self.metadata.write();
        let start = metadata.len();
        for (offset, (record, entry)) in records.iter().zip(&entries).enumerate() {
            let line = start + offset;
            if record.id != Some(entry.id) || usize::try_from(entry.id).ok() != Some(line) {
                return Err(RagError::IdMismatch { line, id: entry.id });
            }
            if entry.embedding.len() != self.dimension {
                return Err(RagError::DimensionMismatch {
                    expected: self.dimension,
                    actual: entry.embedding.len(),
                });
            }
            if self.index.contains(entry.id) {
                return Err(RagError::DuplicateId(entry.id));
            }
        }

        let previous_len = self.log.append(&records)?;
        if let Err(err) = self.index.add_with_ids(entries) {
            if let Err(rollback) = self.log.truncate_to(previous_len) {
                tracing::error!(
                    error = %rollback,
                    "Failed to remove metadata lines of a rejected batch; rebuild recommended"
                );
            }
            return Err(err);
        }
        for record in records {
            metadata.push(record);
        }
        Ok(())
    }

    /// Returns up to `k` `(id, score)` pairs by descending similarity.
    ///
    /// # Errors
    ///
    /// Fails only when the query has the wrong dimension.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(u64, f32)>> {
        self.index.search(query, k)
    }

    /// Looks up the record for an ID.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Consistency`] when the ID has no parsed line in the log.
    pub fn record(&self, id: u64) -> Result<MetadataRecord> {
        let metadata = self.metadata.read();
        metadata
            .get(id)
            .cloned()
            .ok_or(RagError::Consistency {
                id,
                metadata_len: metadata.len(),
            })
    }

    /// Runs `f` against the in-memory metadata snapshot.
    pub fn with_metadata<R>(&self, f: impl FnOnce(&MetadataSnapshot) -> R) -> R {
        f(&self.metadata.read())
    }

    /// Number of vectors in the index.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the index holds no vectors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Embedding dimension.
    #[must_use]
    pub const fn dimension(&self) -> usize {
        self.dimension
    }

    /// The metadata log backing this store.
    #[must_use]
    pub const fn log(&self) -> &MetadataLog {
        &self.log
    }

    /// Size and consistency figures. Missing files count as zero bytes.
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        IndexStats {
            total_vectors: self.index.len(),
            metadata_count: self.metadata.read().len(),
            dimension: self.dimension,
            index_size_bytes: fs::metadata(self.persistence.path())
                .map(|m| m.len())
                .unwrap_or(0),
            metadata_size_bytes: self.log.size_bytes(),
        }
    }

    /// Deletes both files and empties the in-memory state.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Persistence`] if a file exists but cannot be removed.
    pub fn reset(&self) -> Result<()> {
        let mut metadata = self.metadata.write();
        self.persistence.remove()?;
        self.log.remove()?;
        self.index.clear();
        *metadata = MetadataSnapshot::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexKind;
    use seabrief_core::AnalyzedArticle;
    use tempfile::tempdir;

    fn config(dir: &std::path::Path) -> RagConfig {
        RagConfig::builder()
            .directory(dir)
            .index_kind(IndexKind::Flat)
            .build()
    }

    fn pair(id: u64, title: &str, embedding: Vec<f32>) -> (MetadataRecord, IndexEntry) {
        let article = AnalyzedArticle {
            title: title.into(),
            summary: "summary".into(),
            ..AnalyzedArticle::default()
        };
        (MetadataRecord::new(id, article), IndexEntry::new(id, embedding))
    }

    fn append(store: &VectorStore, pairs: Vec<(MetadataRecord, IndexEntry)>) -> Result<()> {
        let (records, entries) = pairs.into_iter().unzip();
        store.append(records, entries)
    }

    #[test]
    fn fresh_store_is_empty_and_searchable() {
        let dir = tempdir().unwrap();
        let store = VectorStore::open(&config(dir.path()), 2);
        assert!(store.is_empty());
        assert!(store.search(&[1.0, 0.0], 5).unwrap().is_empty());
        assert_eq!(store.stats(), IndexStats { dimension: 2, ..IndexStats::default() });
    }

    #[test]
    fn append_keeps_log_and_index_aligned() {
        let dir = tempdir().unwrap();
        let store = VectorStore::open(&config(dir.path()), 2);

        append(&store, vec![pair(0, "a", vec![1.0, 0.0]), pair(1, "b", vec![0.0, 1.0])]).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.log().line_count().unwrap(), 2);
        assert_eq!(store.next_id(), 2);

        append(&store, vec![pair(2, "c", vec![0.6, 0.8])]).unwrap();
        let stats = store.stats();
        assert_eq!(stats.total_vectors, 3);
        assert_eq!(stats.metadata_count, 3);
        assert!(stats.is_consistent());
        assert_eq!(store.record(2).unwrap().article.title, "c");
    }

    #[test]
    fn misnumbered_append_touches_nothing() {
        let dir = tempdir().unwrap();
        let store = VectorStore::open(&config(dir.path()), 2);

        let result = append(&store, vec![pair(1, "gap", vec![1.0, 0.0])]);
        assert!(matches!(result, Err(RagError::IdMismatch { line: 0, id: 1 })));

        let result = append(&store, vec![pair(0, "short", vec![1.0])]);
        assert!(matches!(result, Err(RagError::DimensionMismatch { .. })));

        assert!(store.is_empty());
        assert!(!store.log().exists());
    }

    /// Accepts nothing, so every append fails after the metadata write.
    #[derive(Debug)]
    struct RejectingIndex(crate::index::FlatIndex);

    impl VectorIndex for RejectingIndex {
        fn add_with_ids(&self, entries: Vec<IndexEntry>) -> Result<()> {
            Err(RagError::DuplicateId(entries.first().map_or(0, |entry| entry.id)))
        }
        fn search(&self, query: &[f32], k: usize) -> Result<Vec<(u64, f32)>> {
            self.0.search(query, k)
        }
        fn dimension(&self) -> usize {
            self.0.dimension()
        }
        fn len(&self) -> usize {
            self.0.len()
        }
        fn contains(&self, id: u64) -> bool {
            self.0.contains(id)
        }
        fn clear(&self) {
            self.0.clear();
        }
        fn entries(&self) -> Vec<IndexEntry> {
            self.0.entries()
        }
        fn load(&self, entries: Vec<IndexEntry>) -> Result<()> {
            self.0.load(entries)
        }
    }

    #[test]
    fn rejected_vectors_remove_their_metadata_lines() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        {
            let store = VectorStore::open(&config, 2);
            append(&store, vec![pair(0, "kept", vec![1.0, 0.0])]).unwrap();
        }
        let size = fs::metadata(&config.metadata_path).unwrap().len();

        let store = VectorStore::with_index(
            &config,
            2,
            Box::new(RejectingIndex(crate::index::FlatIndex::new(2))),
        );
        assert_eq!(store.next_id(), 1);
        let result = append(
            &store,
            vec![pair(1, "lost", vec![0.0, 1.0]), pair(2, "lost", vec![0.6, 0.8])],
        );
        assert!(matches!(result, Err(RagError::DuplicateId(1))));

        assert_eq!(store.next_id(), 1);
        assert_eq!(fs::metadata(&config.metadata_path).unwrap().len(), size);
        let snapshot = store.log().read_all().unwrap();
        assert_eq!(snapshot.len(), 1);
        snapshot.validate_ids().unwrap();
    }

    #[test]
    fn save_and_reopen() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        {
            let store = VectorStore::open(&config, 2);
            append(&store, vec![pair(0, "kept", vec![1.0, 0.0])]).unwrap();
            store.save().unwrap();
            assert!(store.stats().index_size_bytes > 0);
        }

        let store = VectorStore::open(&config, 2);
        assert_eq!(store.len(), 1);
        assert_eq!(store.search(&[1.0, 0.0], 1).unwrap()[0].0, 0);
        assert_eq!(store.record(0).unwrap().article.title, "kept");
    }

    #[test]
    fn corrupt_or_foreign_index_loads_empty() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        fs::write(&config.index_path, b"garbage").unwrap();
        let store = VectorStore::open(&config, 2);
        assert!(store.is_empty());

        append(&store, vec![pair(0, "a", vec![1.0, 0.0])]).unwrap();
        store.save().unwrap();
        let other_dimension = VectorStore::open(&config, 3);
        assert!(other_dimension.is_empty());
        assert_eq!(other_dimension.stats().metadata_count, 1);
    }

    #[test]
    fn failed_save_is_reported() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, b"").unwrap();
        let config = RagConfig::builder()
            .index_path(blocker.join("index.rkyv"))
            .metadata_path(dir.path().join("metadata.jsonl"))
            .build();
        let store = VectorStore::open(&config, 2);
        assert!(matches!(store.save(), Err(RagError::Persistence { .. })));
    }

    #[test]
    fn out_of_range_record_is_a_consistency_error() {
        let dir = tempdir().unwrap();
        let store = VectorStore::open(&config(dir.path()), 2);
        assert!(matches!(
            store.record(4),
            Err(RagError::Consistency { id: 4, metadata_len: 0 })
        ));
    }

    #[test]
    fn reset_removes_everything() {
        let dir = tempdir().unwrap();
        let config = config(dir.path());
        let store = VectorStore::open(&config, 2);
        append(&store, vec![pair(0, "a", vec![1.0, 0.0])]).unwrap();
        store.save().unwrap();

        store.reset().unwrap();
        assert!(store.is_empty());
        assert_eq!(store.next_id(), 0);
        assert!(!config.index_path.exists());
        assert!(!config.metadata_path.exists());
    }
}
