//! Error types for the vector store.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur in store, ingestion and retrieval operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// A document failed validation at the ingestion boundary.
    #[error("invalid document: {0}")]
    Validation(String),

    /// Embedding operation failed.
    #[error("embedding failed: {0}")]
    Embedding(#[source] anyhow::Error),

    /// The metadata log and the index disagree about an ID.
    #[error("id {id} has no metadata record ({metadata_len} lines in the log)")]
    Consistency {
        /// ID returned by the index.
        id: u64,
        /// Number of lines in the metadata log.
        metadata_len: usize,
    },

    /// A metadata record carries an ID that differs from its line position.
    #[error("metadata line {line} carries id {id}")]
    IdMismatch {
        /// Zero-based line position.
        line: usize,
        /// ID stored in the record.
        id: u64,
    },

    /// The vector index already holds this ID.
    #[error("id {0} is already indexed")]
    DuplicateId(u64),

    /// Persistence operation failed.
    #[error("persistence error at {path}: {source}")]
    Persistence {
        /// Path where the error occurred.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A metadata line could not be parsed.
    #[error("malformed metadata at line {line}: {source}")]
    Parse {
        /// Zero-based line position.
        line: usize,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },

    /// IO operation failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Dimension mismatch between embedding and index.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension provided.
        actual: usize,
    },

    /// Rebuild cannot run because there is nothing to replay.
    #[error("nothing to rebuild: {0}")]
    NothingToRebuild(String),
}

impl RagError {
    pub(crate) fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, RagError>;
