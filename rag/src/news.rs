//! High-level entry point tying the store, ingestion and retrieval together.

use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use seabrief_core::{AnalyzedArticle, EmbeddingModel};

use crate::config::RagConfig;
use crate::dedup::normalize_title;
use crate::error::{RagError, Result};
use crate::filter::SearchFilters;
use crate::ingest::{IngestOptions, ingest_documents};
use crate::retrieval::retrieve;
use crate::store::VectorStore;
use crate::types::{Facets, IndexStats, IngestReport, RebuildReport, SearchHit};

struct NewsIndexInner<M> {
    embedder: M,
    store: VectorStore,
    config: RagConfig,
    // Held by every writer; IDs come from the log length, so writers must not interleave.
    write_lock: async_lock::Mutex<()>,
}

/// A persistent, searchable collection of analyzed news articles.
///
/// Cloning is cheap and every clone shares the same store.
///
/// ```rust,no_run
/// use seabrief_rag::{NewsIndex, RagConfig, SearchFilters};
/// use seabrief_core::EmbeddingModel;
///
/// async fn demo(embedder: impl EmbeddingModel) -> seabrief_rag::Result<()> {
///     let news = NewsIndex::new(embedder, RagConfig::builder().directory("vector_store").build());
///     let hits = news
///         .retrieve("supramax rates", &SearchFilters::new().categories(["supramax"]), 5)
///         .await?;
///     for hit in hits {
///         println!("{} ({:.2})", hit.article.title, hit.score);
///     }
///     Ok(())
/// }
/// ```
pub struct NewsIndex<M> {
    inner: Arc<NewsIndexInner<M>>,
}

impl<M> Clone for NewsIndex<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<M> std::fmt::Debug for NewsIndex<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewsIndex")
            .field("store", &self.inner.store)
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

impl<M: EmbeddingModel> NewsIndex<M> {
    /// Opens the store described by `config`, using `embedder` for documents and queries.
    ///
    /// Opening never fails; see [`VectorStore::open`].
    #[must_use]
    pub fn new(embedder: M, config: RagConfig) -> Self {
        let store = VectorStore::open(&config, embedder.dim());
        Self {
            inner: Arc::new(NewsIndexInner {
                embedder,
                store,
                config,
                write_lock: async_lock::Mutex::new(()),
            }),
        }
    }

    /// Ingests documents and returns how many were stored.
    ///
    /// # Errors
    ///
    /// Returns an error when the index cannot be saved.
    pub async fn ingest(&self, documents: Vec<AnalyzedArticle>) -> Result<usize> {
        Ok(self.ingest_with_report(documents).await?.ingested)
    }

    /// Ingests documents and returns the full accounting.
    ///
    /// # Errors
    ///
    /// Returns an error when the index cannot be saved.
    pub async fn ingest_with_report(&self, documents: Vec<AnalyzedArticle>) -> Result<IngestReport> {
        let _guard = self.inner.write_lock.lock().await;
        ingest_documents(
            &self.inner.store,
            &self.inner.embedder,
            &self.inner.config,
            documents,
            IngestOptions {
                deduplicate: self.inner.config.deduplication,
            },
        )
        .await
    }

    /// Retrieves at most `top_k` articles for `query` that pass `filters`.
    ///
    /// Results are ordered newest first, then by similarity.
    ///
    /// # Errors
    ///
    /// Returns an error when the query cannot be embedded.
    pub async fn retrieve(
        &self,
        query: &str,
        filters: &SearchFilters,
        top_k: usize,
    ) -> Result<Vec<SearchHit>> {
        retrieve(
            &self.inner.store,
            &self.inner.embedder,
            &self.inner.config,
            query,
            filters,
            top_k,
        )
        .await
    }

    /// Retrieves with no filters and the configured default `top_k`.
    ///
    /// # Errors
    ///
    /// Returns an error when the query cannot be embedded.
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>> {
        self.retrieve(query, &SearchFilters::default(), self.inner.config.default_top_k)
            .await
    }

    /// Replays the metadata log into a fresh index.
    ///
    /// The log is backed up first and the backup is removed only on success. Records whose
    /// stored ID differs from their line position abort the rebuild before anything changes.
    /// Documents that fail re-embedding are skipped; if none can be re-embedded the original
    /// log is restored and the rebuild fails.
    ///
    /// # Errors
    ///
    /// Fails when there is nothing to replay, when IDs are misplaced, or when writing the new
    /// index fails.
    pub async fn rebuild(&self) -> Result<RebuildReport> {
        let _guard = self.inner.write_lock.lock().await;
        let store = &self.inner.store;
        let log = store.log();

        if !log.exists() {
            return Err(RagError::NothingToRebuild(format!(
                "{} does not exist",
                log.path().display()
            )));
        }
        let snapshot = log.read_all()?;
        snapshot.validate_ids()?;

        let articles: Vec<AnalyzedArticle> = snapshot
            .iter()
            .map(|(_, record)| record.article.clone())
            .collect();
        if articles.is_empty() {
            return Err(RagError::NothingToRebuild(format!(
                "{} has no readable records",
                log.path().display()
            )));
        }

        let backup = self.inner.config.backup_path();
        log.backup_to(&backup)?;
        let index_backup = self.backup_index()?;
        tracing::info!(
            records = articles.len(),
            malformed = snapshot.malformed,
            backup = %backup.display(),
            "Rebuilding index"
        );

        let outcome = self.replay(articles).await;

        match outcome {
            Ok(report) => {
                for path in std::iter::once(backup).chain(index_backup) {
                    if let Err(err) = fs::remove_file(&path) {
                        tracing::warn!(path = %path.display(), error = %err, "Failed to remove backup");
                    }
                }
                let result = RebuildReport {
                    restored: report.ingested,
                    skipped: report.skipped + report.dropped + report.failed,
                    malformed: snapshot.malformed,
                };
                tracing::info!(
                    restored = result.restored,
                    skipped = result.skipped,
                    "Rebuild finished"
                );
                Ok(result)
            }
            Err(err) => {
                tracing::error!(error = %err, "Rebuild failed, restoring metadata backup");
                if let Err(restore_err) = log.restore_from(&backup) {
                    tracing::error!(
                        error = %restore_err,
                        backup = %backup.display(),
                        "Failed to restore metadata backup; it is kept for manual recovery"
                    );
                }
                if let Some(index_backup) = index_backup {
                    if let Err(restore_err) = fs::rename(&index_backup, &self.inner.config.index_path) {
                        tracing::error!(error = %restore_err, "Failed to restore index backup");
                    }
                }
                store.load();
                Err(err)
            }
        }
    }

    /// Resets the store and re-ingests `articles` without deduplication.
    async fn replay(&self, articles: Vec<AnalyzedArticle>) -> Result<IngestReport> {
        let total = articles.len();
        self.inner.store.reset()?;
        let report = ingest_documents(
            &self.inner.store,
            &self.inner.embedder,
            &self.inner.config,
            articles,
            IngestOptions { deduplicate: false },
        )
        .await?;
        if report.ingested == 0 {
            return Err(RagError::Validation(format!(
                "none of {total} records could be re-embedded"
            )));
        }
        Ok(report)
    }

    /// Copies the index file aside, if there is one.
    fn backup_index(&self) -> Result<Option<PathBuf>> {
        let source = &self.inner.config.index_path;
        if !source.exists() {
            return Ok(None);
        }
        let target = self.inner.config.index_backup_path();
        fs::copy(source, &target).map_err(|e| RagError::persistence(&target, e))?;
        Ok(Some(target))
    }

    /// Writes the index to disk.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Persistence`] when the write fails.
    pub fn save(&self) -> Result<()> {
        self.inner.store.save()
    }

    /// Size and consistency figures.
    #[must_use]
    pub fn stats(&self) -> IndexStats {
        self.inner.store.stats()
    }

    /// Distinct categories, events and groups across the corpus.
    #[must_use]
    pub fn facets(&self) -> Facets {
        self.inner.store.with_metadata(|snapshot| {
            let mut categories = BTreeSet::new();
            let mut events = BTreeSet::new();
            let mut groups = BTreeSet::new();
            for (_, record) in snapshot.iter() {
                categories.extend(record.article.category.iter().cloned());
                events.extend(record.article.events.iter().cloned());
                groups.extend(record.article.assigned_group.iter().copied());
            }
            Facets {
                categories: categories.into_iter().collect(),
                events: events.into_iter().collect(),
                groups: groups.into_iter().collect(),
            }
        })
    }

    /// Lists the newest articles passing `filters`, one per title, without embedding anything.
    #[must_use]
    pub fn browse(&self, filters: &SearchFilters, limit: usize) -> Vec<AnalyzedArticle> {
        self.inner.store.with_metadata(|snapshot| {
            let mut matching: Vec<(usize, &AnalyzedArticle)> = snapshot
                .iter()
                .filter(|(_, record)| filters.matches(&record.article))
                .map(|(line, record)| (line, &record.article))
                .collect();
            matching.sort_by(|(a_line, a), (b_line, b)| {
                b.date.cmp(&a.date).then_with(|| b_line.cmp(a_line))
            });

            let mut titles = HashSet::new();
            matching
                .into_iter()
                .filter(|(_, article)| titles.insert(normalize_title(&article.title)))
                .take(limit)
                .map(|(_, article)| article.clone())
                .collect()
        })
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &VectorStore {
        &self.inner.store
    }

    /// The store configuration.
    #[must_use]
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }

    /// The embedding model.
    #[must_use]
    pub fn embedder(&self) -> &M {
        &self.inner.embedder
    }
}
