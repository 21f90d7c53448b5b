//! # Language Models
//!
//! Both the article classifier and the answer synthesizer talk to a language model through a
//! single-shot interface: a system prompt, a user prompt, and free text back. Streaming, tool
//! calling and multi-turn history are deliberately outside this trait.
//!
//! ```rust
//! use seabrief_core::LanguageModel;
//!
//! async fn summarize(model: &impl LanguageModel, article: &str) -> seabrief_core::Result {
//!     model
//!         .generate("You summarize shipping news in two sentences.", article)
//!         .await
//! }
//! ```

use std::future::Future;

/// Generates text from a system prompt and a user prompt.
pub trait LanguageModel: Send + Sync {
    /// Runs one completion and returns the generated text.
    ///
    /// Timeouts, rate limits and transport failures surface as errors so callers can apply
    /// their own retry or fallback policy.
    fn generate(&self, system: &str, user: &str)
    -> impl Future<Output = crate::Result<String>> + Send;
}

impl<T: LanguageModel> LanguageModel for &T {
    fn generate(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = crate::Result<String>> + Send {
        (**self).generate(system, user)
    }
}

impl<T: LanguageModel> LanguageModel for std::sync::Arc<T> {
    fn generate(
        &self,
        system: &str,
        user: &str,
    ) -> impl Future<Output = crate::Result<String>> + Send {
        (**self).generate(system, user)
    }
}
