//! Core types for the news store.

use seabrief_core::{AnalyzedArticle, Group};
use serde::{Deserialize, Serialize};

/// One line of the metadata log.
///
/// The record's `id` equals its zero-based line position and the ID of its vector in the
/// index. Lines written before IDs were stored explicitly have no `id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Vector ID, equal to the line position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    /// The indexed article.
    #[serde(flatten)]
    pub article: AnalyzedArticle,
}

impl MetadataRecord {
    /// Creates a record for the vector with the given ID.
    #[must_use]
    pub const fn new(id: u64, article: AnalyzedArticle) -> Self {
        Self {
            id: Some(id),
            article,
        }
    }
}

/// A vector ID paired with its embedding.
#[derive(Clone, Debug, PartialEq)]
pub struct IndexEntry {
    /// External ID assigned at append time.
    pub id: u64,
    /// Unit-normalized embedding.
    pub embedding: Vec<f32>,
}

impl IndexEntry {
    /// Creates a new index entry.
    #[must_use]
    pub const fn new(id: u64, embedding: Vec<f32>) -> Self {
        Self { id, embedding }
    }
}

/// A retrieved article with its similarity score.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchHit {
    /// ID of the matching vector.
    pub id: u64,
    /// Inner product of the normalized query and document vectors.
    pub score: f32,
    /// The matching article.
    pub article: AnalyzedArticle,
}

impl SearchHit {
    /// Number of this hit's groups that also appear in `groups`.
    #[must_use]
    pub fn shared_groups(&self, groups: &[Group]) -> usize {
        self.article
            .assigned_group
            .iter()
            .filter(|group| groups.contains(group))
            .count()
    }
}

/// Size and consistency figures for the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Vectors held by the index.
    pub total_vectors: usize,
    /// Lines in the metadata log.
    pub metadata_count: usize,
    /// Embedding dimension.
    pub dimension: usize,
    /// Size of the index file in bytes.
    pub index_size_bytes: u64,
    /// Size of the metadata log in bytes.
    pub metadata_size_bytes: u64,
}

impl IndexStats {
    /// Index file size in megabytes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn index_size_mb(&self) -> f64 {
        self.index_size_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Metadata log size in megabytes.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn metadata_size_mb(&self) -> f64 {
        self.metadata_size_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Whether the index and the metadata log hold the same number of entries.
    #[must_use]
    pub const fn is_consistent(&self) -> bool {
        self.total_vectors == self.metadata_count
    }
}

/// Outcome of an ingestion run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestReport {
    /// Documents handed to ingestion.
    pub submitted: usize,
    /// Documents written to the index and metadata log.
    pub ingested: usize,
    /// Documents rejected by validation.
    pub dropped: usize,
    /// Documents skipped because they could not be embedded.
    pub skipped: usize,
    /// Documents already present in the store.
    pub duplicates: usize,
    /// Documents lost because their batch could not be written.
    pub failed: usize,
}

/// Outcome of a rebuild.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RebuildReport {
    /// Records replayed into the new index.
    pub restored: usize,
    /// Records that could not be re-embedded or failed validation.
    pub skipped: usize,
    /// Metadata lines that could not be parsed.
    pub malformed: usize,
}

/// Distinct tag values across the corpus, used to populate filter pickers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Facets {
    /// Sorted distinct categories.
    pub categories: Vec<String>,
    /// Sorted distinct events.
    pub events: Vec<String>,
    /// Groups that appear on at least one article.
    pub groups: Vec<Group>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_flattens_article_fields() {
        let record = MetadataRecord::new(
            3,
            AnalyzedArticle {
                title: "Capesize rebound".into(),
                assigned_group: vec![Group::CoalImport],
                ..AnalyzedArticle::default()
            },
        );
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["id"], 3);
        assert_eq!(value["title"], "Capesize rebound");
        assert_eq!(value["assigned_group"][0], "coal_import_group");

        let parsed: MetadataRecord = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn legacy_lines_without_id_parse() {
        let record: MetadataRecord =
            serde_json::from_str(r#"{"title":"Old","summary":"Legacy line","category":["bdi"]}"#)
                .unwrap();
        assert_eq!(record.id, None);
        assert_eq!(record.article.category, vec!["bdi"]);
    }

    #[test]
    fn stats_sizes() {
        let stats = IndexStats {
            total_vectors: 2,
            metadata_count: 3,
            dimension: 4,
            index_size_bytes: 2 * 1024 * 1024,
            metadata_size_bytes: 0,
        };
        assert!((stats.index_size_mb() - 2.0).abs() < f64::EPSILON);
        assert!(!stats.is_consistent());
    }
}
