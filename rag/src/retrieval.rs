//! Query-time retrieval: embed, over-fetch, filter, rank.

use seabrief_core::EmbeddingModel;

use crate::config::RagConfig;
use crate::error::{RagError, Result};
use crate::filter::SearchFilters;
use crate::store::VectorStore;
use crate::types::SearchHit;
use crate::vector::normalize;

/// Orders hits newest first, breaking ties by descending score.
///
/// Dates are compared as strings, which is chronological for zero-padded ISO dates.
pub fn rank_by_recency(hits: &mut [SearchHit]) {
    hits.sort_by(|a, b| {
        b.article
            .date
            .cmp(&a.article.date)
            .then_with(|| b.score.total_cmp(&a.score))
            .then_with(|| a.id.cmp(&b.id))
    });
}

/// Retrieves at most `top_k` articles for `query` that pass `filters`.
///
/// # Errors
///
/// Returns [`RagError::Embedding`] when the query cannot be embedded and
/// [`RagError::DimensionMismatch`] when the embedding has the wrong size.
pub(crate) async fn retrieve<M: EmbeddingModel>(
    store: &VectorStore,
    embedder: &M,
    config: &RagConfig,
    query: &str,
    filters: &SearchFilters,
    top_k: usize,
) -> Result<Vec<SearchHit>> {
    if top_k == 0 || store.is_empty() {
        return Ok(Vec::new());
    }

    let mut vector = embedder.embed(query).await.map_err(RagError::Embedding)?;
    if vector.len() != store.dimension() {
        return Err(RagError::DimensionMismatch {
            expected: store.dimension(),
            actual: vector.len(),
        });
    }
    if !normalize(&mut vector) {
        tracing::warn!(query, "Query embedding has zero length");
        return Ok(Vec::new());
    }

    let search_k = top_k
        .saturating_mul(config.overfetch_factor.max(1))
        .min(store.len());
    let candidates = store.search(&vector, search_k)?;

    let mut hits = store.with_metadata(|metadata| {
        let mut hits = Vec::with_capacity(top_k);
        for (id, score) in candidates {
            if score < config.similarity_threshold {
                continue;
            }
            let Some(record) = metadata.get(id) else {
                tracing::warn!(
                    id,
                    metadata_len = metadata.len(),
                    "Index returned an id without metadata; rebuild recommended"
                );
                continue;
            };
            if !filters.matches(&record.article) {
                continue;
            }
            hits.push(SearchHit {
                id,
                score,
                article: record.article.clone(),
            });
            if hits.len() >= top_k {
                break;
            }
        }
        hits
    });

    rank_by_recency(&mut hits);
    tracing::debug!(query, candidates = search_k, hits = hits.len(), "Retrieved");
    Ok(hits)
}
