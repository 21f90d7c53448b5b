//! OpenAI-compatible gateway for the seabrief pipeline, built on `reqwest`.
//!
//! [`OpenAI`] implements both collaborator traits from `seabrief-core`:
//! [`EmbeddingModel`](seabrief_core::EmbeddingModel) through the `/embeddings` endpoint and
//! [`LanguageModel`](seabrief_core::LanguageModel) through `/chat/completions`. Requests carry a
//! bearer token, an optional organization header and a per-request timeout. Rate limits, server
//! errors and transport failures can be retried with a [`RetryPolicy`](seabrief_core::RetryPolicy);
//! by default each request is attempted once and callers decide how to recover.
//!
//! ```no_run
//! use seabrief_core::{EmbeddingModel, LanguageModel};
//! use seabrief_openai::OpenAI;
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let model = OpenAI::new(std::env::var("OPENAI_API_KEY")?);
//!
//! let vector = model.embed("Capesize rates rebound on iron ore demand").await?;
//! assert_eq!(vector.len(), model.dim());
//!
//! let reply = model
//!     .generate("You are a shipping analyst.", "Summarize the BDI trend in one sentence.")
//!     .await?;
//! println!("{reply}");
//! # Ok(()) }
//! ```

use std::time::Duration;

mod client;
mod embedding;
mod error;
mod request;
mod response;

pub use client::{Builder, Config, OpenAI};
pub use error::OpenAIError;

mod constant;
pub use constant::*;

pub(crate) const DEFAULT_MODEL: &str = GPT4O;
pub(crate) const DEFAULT_BASE_URL: &str = OPENAI_BASE_URL;
pub(crate) const DEFAULT_EMBEDDING_MODEL: &str = EMBEDDING_SMALL;
pub(crate) const DEFAULT_EMBEDDING_DIM: usize = 1536;
pub(crate) const DEFAULT_TEMPERATURE: f32 = 0.3;
pub(crate) const DEFAULT_MAX_TOKENS: u32 = 1500;
pub(crate) const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
