//! Error types for article classification.

use thiserror::Error;

/// Errors produced while classifying an article.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    /// The article is missing a title or body.
    #[error("Invalid article: {0}")]
    InvalidArticle(String),

    /// The language model call failed.
    #[error("LLM error: {0}")]
    Llm(anyhow::Error),

    /// The model replied with something that is not a usable classification.
    #[error("Unusable model output: {0}")]
    Parse(String),
}

/// Result type for analyzer operations.
pub type Result<T> = core::result::Result<T, AnalyzerError>;
