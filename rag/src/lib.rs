//! Persistent semantic search over analyzed shipping and steel news.
//!
//! [`NewsIndex`] pairs any [`EmbeddingModel`](seabrief_core::EmbeddingModel) with an
//! ID-addressed vector index and an append-only JSON-lines metadata log:
//! - [`NewsIndex::ingest`] validates, embeds and appends articles in batches.
//! - [`NewsIndex::retrieve`] embeds a query, over-fetches candidates, applies
//!   [`SearchFilters`] and returns hits newest first.
//! - [`NewsIndex::rebuild`] replays the metadata log into a fresh index.
//!
//! Line `N` of the metadata log always describes the vector with ID `N`. The index file is a
//! cache of the log and can be regenerated from it at any time.

mod config;
mod dedup;
mod error;
mod filter;
pub mod index;
mod ingest;
mod metadata;
mod news;
pub mod persistence;
mod retrieval;
mod store;
mod types;
mod vector;

pub use config::{IndexKind, RagConfig, RagConfigBuilder};
pub use dedup::normalize_title;
pub use error::{RagError, Result};
pub use filter::{DateRange, SearchFilters, parse_date};
pub use ingest::validate;
pub use metadata::{MetadataLog, MetadataSnapshot};
pub use news::NewsIndex;
pub use retrieval::rank_by_recency;
pub use store::VectorStore;
pub use types::{
    Facets, IndexEntry, IndexStats, IngestReport, MetadataRecord, RebuildReport, SearchHit,
};
