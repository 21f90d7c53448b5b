//! Model and endpoint constants.
//!
//! Only stable, non-snapshot model names are listed. Any other identifier can be passed as a
//! plain string.

/// Default `OpenAI` API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// [`Deepseek`](https://api-docs.deepseek.com)'s OpenAI-compatible base URL.
pub const DEEPSEEK_BASE_URL: &str = "https://api.deepseek.com/v1";
/// [`OpenRouter`](https://openrouter.ai)'s OpenAI-compatible base URL.
pub const OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Multimodal flagship, the default chat model.
pub const GPT4O: &str = "gpt-4o";
/// Cheaper small `GPT-4o` variant.
pub const GPT4O_MINI: &str = "gpt-4o-mini";
/// Strong general model without reasoning overhead.
pub const GPT41: &str = "gpt-4.1";
/// Smaller, faster 4.1 model.
pub const GPT41_MINI: &str = "gpt-4.1-mini";

/// Small and inexpensive embedding model (1536-dim).
pub const EMBEDDING_SMALL: &str = "text-embedding-3-small";
/// High-accuracy embedding model (3072-dim).
pub const EMBEDDING_LARGE: &str = "text-embedding-3-large";
/// Legacy embedding model (1536-dim).
pub const EMBEDDING_ADA002: &str = "text-embedding-ada-002";
