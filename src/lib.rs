//! # seabrief
//!
//! Façade crate for a retrieval-augmented news assistant covering shipping and steel-industry
//! news. It re-exports everything from [`seabrief_core`] and, behind features, the pipeline
//! stages built on top of it.
//!
//! ## What's inside?
//!
//! - [`EmbeddingModel`] and [`LanguageModel`], the two collaborator traits every provider implements.
//! - The article model ([`ArticleRecord`], [`AnalyzedArticle`]) and the category-to-[`Group`] mapping.
//! - `rag` (default): the persistent vector store with ingestion, filtered retrieval and rebuild.
//! - `assistant` (default): intent classification, prompt assembly and answer synthesis.
//! - `analyzer`: LLM classification of crawled articles with retry and keyword fallback.
//! - `openai`: an OpenAI-compatible gateway implementing both collaborator traits.
//!
//! ## Example
//!
//! ```rust,no_run
//! # #[cfg(all(feature = "openai", feature = "assistant"))]
//! # async fn demo() -> seabrief::Result<()> {
//! use seabrief::Group;
//! use seabrief::assistant::{Assistant, AssistantConfig, Role, UserMeta};
//! use seabrief::openai::OpenAI;
//! use seabrief::rag::{NewsIndex, RagConfig};
//!
//! let model = OpenAI::new(std::env::var("OPENAI_API_KEY")?);
//! let index = NewsIndex::new(model.clone(), RagConfig::builder().directory("vector_store").build());
//! let assistant = Assistant::new(index, model, AssistantConfig::default());
//!
//! let user = UserMeta::new(Role::Director, [Group::Container]);
//! println!("{}", assistant.answer("이번주 SCFI 동향 분석해줘", &user).await);
//! # Ok(())
//! # }
//! ```

pub use seabrief_core::*;

/// Vector store, ingestion and retrieval.
#[cfg(feature = "rag")]
pub use seabrief_rag as rag;

/// Article classification.
#[cfg(feature = "analyzer")]
pub use seabrief_analyzer as analyzer;

/// Question answering.
#[cfg(feature = "assistant")]
pub use seabrief_assistant as assistant;

/// OpenAI-compatible gateway.
#[cfg(feature = "openai")]
pub use seabrief_openai as openai;
