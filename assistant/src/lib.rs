//! Role-aware question answering over indexed shipping and steel news.
//!
//! An [`Assistant`] answers one question at a time. It classifies the question's [`Intent`],
//! detects the answer [`Language`], retrieves articles from a [`seabrief_rag::NewsIndex`]
//! restricted to the asker's business groups, optionally adds [`GLOSSARY`] entries, and asks a
//! language model for the answer. The reply is returned with a numbered source list and
//! warnings about thin or stale evidence.
//!
//! Answering never fails: retrieval or generation errors produce an apology that carries the
//! error text, so callers can show the result as-is.
//!
//! ```rust,no_run
//! use seabrief_assistant::{Assistant, AssistantConfig, Role, UserMeta};
//! use seabrief_core::{EmbeddingModel, Group, LanguageModel};
//! use seabrief_rag::NewsIndex;
//!
//! async fn brief<M: EmbeddingModel, L: LanguageModel>(index: NewsIndex<M>, llm: L) {
//!     let assistant = Assistant::new(index, llm, AssistantConfig::default());
//!     let user = UserMeta::new(Role::President, [Group::CoalImport]).with_glossary();
//!
//!     let answer = assistant.answer_detailed("Panamax 석탄 운임 전망은?", &user).await;
//!     println!("{}", answer.text);
//!     println!("confidence {:.1}", answer.metadata.confidence);
//! }
//! ```

mod answer;
mod context;
mod glossary;
mod intent;
mod language;

pub use answer::{
    Answer, AnswerMetadata, Assistant, AssistantConfig, AssistantError, LIMITED_WARNING,
    NO_NEWS_WARNING, STALE_WARNING, confidence, fallback_message, format_sources,
    quality_warnings,
};
pub use context::{
    GROUP_BOOST, UserMeta, build_context, build_system_prompt, build_user_prompt,
    presentation_order,
};
pub use glossary::{GLOSSARY, GlossaryEntry, TermKind, lookup};
pub use intent::{Intent, Role, TechnicalLevel, Topic, Urgency, classify_intent};
pub use language::{Language, detect_language};
