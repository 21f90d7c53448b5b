//! # Embedding Module
//!
//! Embeddings are dense vector representations of text that capture semantic meaning.
//! Similar articles produce similar vectors, which is what the vector store relies on to
//! answer questions with related news.
//!
//! ```rust
//! use seabrief_core::EmbeddingModel;
//!
//! async fn example<T: EmbeddingModel>(model: &T) -> seabrief_core::Result<()> {
//!     let embedding = model.embed("Capesize rates jump on iron ore demand").await?;
//!     assert_eq!(embedding.len(), model.dim());
//!     Ok(())
//! }
//! ```

use std::future::Future;

/// A type alias for an embedding vector of 32-bit floats.
pub type Embedding = Vec<f32>;

/// Converts text to vector representations.
///
/// # Implementation Requirements
///
/// - The [`embed`](EmbeddingModel::embed) method must return vectors with length equal to [`dim`](EmbeddingModel::dim)
/// - Vectors do not need to be normalized; the vector store normalizes before indexing
/// - Network failures, rate limits and timeouts are reported as errors, never panics
pub trait EmbeddingModel: Send + Sized + Sync {
    /// Returns the embedding vector dimension.
    fn dim(&self) -> usize;

    /// Converts text to an embedding vector.
    fn embed(&self, text: &str) -> impl Future<Output = crate::Result<Embedding>> + Send;
}
