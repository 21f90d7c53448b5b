//! Batched document ingestion.

use std::collections::HashSet;

use seabrief_core::retry::sleep;
use seabrief_core::{AnalyzedArticle, EmbeddingModel, is_placeholder};

use crate::config::RagConfig;
use crate::dedup::article_hash;
use crate::error::{RagError, Result};
use crate::store::VectorStore;
use crate::types::{IndexEntry, IngestReport, MetadataRecord};
use crate::vector::normalize;

/// Checks an article at the ingestion boundary and returns its normalized form.
///
/// # Errors
///
/// Returns [`RagError::Validation`] when the title or the summary is empty or a placeholder.
pub fn validate(article: AnalyzedArticle) -> Result<AnalyzedArticle> {
    let article = article.normalized();
    if is_placeholder(&article.title) {
        return Err(RagError::Validation("title is empty".into()));
    }
    if is_placeholder(&article.summary) {
        return Err(RagError::Validation(format!(
            "summary of \"{}\" is empty",
            article.title
        )));
    }
    Ok(article)
}

/// Options that differ between regular ingestion and a rebuild replay.
#[derive(Debug, Clone, Copy)]
pub(crate) struct IngestOptions {
    pub deduplicate: bool,
}

/// Embeds `text` and normalizes the result, or explains why it cannot be indexed.
async fn embed<M: EmbeddingModel>(
    embedder: &M,
    config: &RagConfig,
    dimension: usize,
    text: &str,
) -> Result<Vec<f32>> {
    let mut vector = config
        .embed_retry
        .run("embed", move |_| embedder.embed(text))
        .await
        .map_err(RagError::Embedding)?;

    if vector.len() != dimension {
        return Err(RagError::DimensionMismatch {
            expected: dimension,
            actual: vector.len(),
        });
    }
    if !normalize(&mut vector) {
        return Err(RagError::Validation("embedding has zero length".into()));
    }
    Ok(vector)
}

/// Validates, embeds and appends `documents` in batches.
///
/// Bad documents and embedding failures are skipped, a batch whose write fails is lost, and
/// the remaining batches still run. The index is saved after every written batch.
///
/// # Errors
///
/// Returns the error of a failed index save; everything written before it stays in place.
pub(crate) async fn ingest_documents<M: EmbeddingModel>(
    store: &VectorStore,
    embedder: &M,
    config: &RagConfig,
    documents: Vec<AnalyzedArticle>,
    options: IngestOptions,
) -> Result<IngestReport> {
    let mut report = IngestReport {
        submitted: documents.len(),
        ..IngestReport::default()
    };

    let mut seen: HashSet<u64> = if options.deduplicate {
        store.with_metadata(|snapshot| {
            snapshot
                .iter()
                .map(|(_, record)| article_hash(&record.article))
                .collect()
        })
    } else {
        HashSet::new()
    };

    let mut valid = Vec::with_capacity(documents.len());
    for document in documents {
        match validate(document) {
            Ok(article) => {
                if options.deduplicate && !seen.insert(article_hash(&article)) {
                    tracing::debug!(title = %article.title, "Skipping duplicate article");
                    report.duplicates += 1;
                    continue;
                }
                valid.push(article);
            }
            Err(err) => {
                tracing::warn!(error = %err, "Dropping invalid document");
                report.dropped += 1;
            }
        }
    }

    let batch_size = config.batch_size.max(1);
    let total_batches = valid.len().div_ceil(batch_size);

    for (batch_no, batch) in valid.chunks(batch_size).enumerate() {
        if batch_no > 0 {
            sleep(config.batch_delay).await;
        }
        tracing::info!(
            batch = batch_no + 1,
            total_batches,
            size = batch.len(),
            "Embedding batch"
        );

        let mut embedded = Vec::with_capacity(batch.len());
        for article in batch {
            let text = article.embedding_text();
            if text.trim().is_empty() {
                tracing::warn!(title = %article.title, "Nothing to embed, skipping");
                report.skipped += 1;
                continue;
            }
            match embed(embedder, config, store.dimension(), &text).await {
                Ok(vector) => embedded.push((article.clone(), vector)),
                Err(err) => {
                    tracing::warn!(title = %article.title, error = %err, "Skipping document");
                    report.skipped += 1;
                }
            }
        }

        if embedded.is_empty() {
            continue;
        }

        let start = store.next_id();
        let count = embedded.len();
        let (records, entries): (Vec<_>, Vec<_>) = embedded
            .into_iter()
            .zip(start..)
            .map(|((article, vector), id)| {
                (MetadataRecord::new(id, article), IndexEntry::new(id, vector))
            })
            .unzip();

        if let Err(err) = store.append(records, entries) {
            tracing::error!(batch = batch_no + 1, error = %err, "Batch write failed, documents lost");
            report.failed += count;
            continue;
        }
        report.ingested += count;
        store.save()?;
    }

    tracing::info!(
        ingested = report.ingested,
        dropped = report.dropped,
        skipped = report.skipped,
        duplicates = report.duplicates,
        failed = report.failed,
        "Ingestion finished"
    );
    Ok(report)
}
