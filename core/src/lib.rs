//! # seabrief-core
//!
//! Shared vocabulary for the seabrief workspace: the article data model that flows from the
//! crawler through classification into the vector store, the business-group mapping derived
//! from category tags, and the two collaborator traits every external service implements.
//!
//! ```text
//! ┌──────────────┐    ┌──────────────────┐    ┌──────────────────┐
//! │  Crawler     │───▶│  seabrief-core   │◀───│   Providers      │
//! │              │    │                  │    │                  │
//! │ ArticleRecord│    │ - EmbeddingModel │    │ - openai         │
//! │              │    │ - LanguageModel  │    │ - test doubles   │
//! │              │    │ - Group mapping  │    │                  │
//! └──────────────┘    └──────────────────┘    └──────────────────┘
//! ```
//!
//! | Capability | Trait | Description |
//! |------------|-------|-------------|
//! | **Embeddings** | [`EmbeddingModel`] | Convert text to vectors for semantic search |
//! | **Generation** | [`LanguageModel`] | Produce text from a system and a user prompt |
//!
//! ## Modules
//!
//! - [`article`]: raw and analyzed article records plus the JSON intermediate files.
//! - [`group`]: the closed set of business groups and the category-to-group mapping.
//! - [`embedding`]: turn text into dense vectors.
//! - [`llm`]: single-shot text generation.
//! - [`retry`]: a reusable retry policy for calls to external services.

pub mod article;
pub mod embedding;
pub mod group;
pub mod llm;
pub mod retry;

#[doc(inline)]
pub use article::{AnalyzedArticle, ArticleRecord, is_placeholder, read_articles, write_articles};
#[doc(inline)]
pub use embedding::EmbeddingModel;
#[doc(inline)]
pub use group::{Group, map_categories_to_groups};
#[doc(inline)]
pub use llm::LanguageModel;
#[doc(inline)]
pub use retry::RetryPolicy;

/// Result type used by collaborator traits.
///
/// Type alias for [`anyhow::Result<T>`](anyhow::Result) with [`String`] as default success type.
pub type Result<T = String> = anyhow::Result<T>;

pub use anyhow::Error;
