//! Configuration for the news vector store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use seabrief_core::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Which vector index implementation backs the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    /// Approximate search over an HNSW graph.
    #[default]
    Hnsw,
    /// Exact brute-force search.
    Flat,
}

/// Configuration for a [`NewsIndex`](crate::NewsIndex).
#[derive(Debug, Clone)]
pub struct RagConfig {
    /// Path to the binary index file.
    pub index_path: PathBuf,
    /// Path to the JSON-lines metadata log.
    pub metadata_path: PathBuf,
    /// Index implementation.
    pub index_kind: IndexKind,
    /// Minimum similarity score for search results.
    pub similarity_threshold: f32,
    /// Default number of results to return.
    pub default_top_k: usize,
    /// How many candidates to request per wanted result before filtering.
    pub overfetch_factor: usize,
    /// Number of documents embedded and appended per batch.
    pub batch_size: usize,
    /// Pause between ingestion batches.
    pub batch_delay: Duration,
    /// Whether to skip documents whose title and link are already indexed.
    pub deduplication: bool,
    /// Retry policy for embedding calls during ingestion.
    pub embed_retry: RetryPolicy,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            index_path: PathBuf::from("vector_store/index.rkyv"),
            metadata_path: PathBuf::from("vector_store/metadata.jsonl"),
            index_kind: IndexKind::default(),
            similarity_threshold: 0.1,
            default_top_k: 5,
            overfetch_factor: 5,
            batch_size: 50,
            batch_delay: Duration::from_secs(1),
            deduplication: true,
            embed_retry: RetryPolicy::none(),
        }
    }
}

impl RagConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder for custom configuration.
    #[must_use]
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::new()
    }

    /// Path of the metadata backup written during a rebuild.
    #[must_use]
    pub fn backup_path(&self) -> PathBuf {
        with_backup_suffix(&self.metadata_path)
    }

    /// Path of the index backup written during a rebuild.
    #[must_use]
    pub fn index_backup_path(&self) -> PathBuf {
        with_backup_suffix(&self.index_path)
    }
}

fn with_backup_suffix(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(".backup");
    path.with_file_name(name)
}

/// Builder for store configuration.
#[derive(Debug, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Creates a new configuration builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: RagConfig::default(),
        }
    }

    /// Places the index and metadata files inside `dir`.
    #[must_use]
    pub fn directory(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        self.config.index_path = dir.join("index.rkyv");
        self.config.metadata_path = dir.join("metadata.jsonl");
        self
    }

    /// Sets the index persistence path.
    #[must_use]
    pub fn index_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.index_path = path.into();
        self
    }

    /// Sets the metadata log path.
    #[must_use]
    pub fn metadata_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.metadata_path = path.into();
        self
    }

    /// Selects the index implementation.
    #[must_use]
    pub const fn index_kind(mut self, kind: IndexKind) -> Self {
        self.config.index_kind = kind;
        self
    }

    /// Sets the minimum similarity threshold for search results.
    #[must_use]
    pub const fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Sets the default number of results to return.
    #[must_use]
    pub const fn default_top_k(mut self, k: usize) -> Self {
        self.config.default_top_k = k;
        self
    }

    /// Sets the candidate over-fetch factor.
    #[must_use]
    pub const fn overfetch_factor(mut self, factor: usize) -> Self {
        self.config.overfetch_factor = factor;
        self
    }

    /// Sets the ingestion batch size.
    #[must_use]
    pub const fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// Sets the pause between ingestion batches.
    #[must_use]
    pub const fn batch_delay(mut self, delay: Duration) -> Self {
        self.config.batch_delay = delay;
        self
    }

    /// Enables or disables content deduplication.
    #[must_use]
    pub const fn deduplication(mut self, enabled: bool) -> Self {
        self.config.deduplication = enabled;
        self
    }

    /// Sets the retry policy for embedding calls during ingestion.
    #[must_use]
    pub fn embed_retry(mut self, policy: RetryPolicy) -> Self {
        self.config.embed_retry = policy;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> RagConfig {
        self.config
    }
}
