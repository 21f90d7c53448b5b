use std::{sync::Arc, time::Duration};

use reqwest::{Client, RequestBuilder, header};
use seabrief_core::{LanguageModel, RetryPolicy};
use serde::de::DeserializeOwned;

use crate::{
    DEEPSEEK_BASE_URL, DEFAULT_BASE_URL, DEFAULT_EMBEDDING_DIM, DEFAULT_EMBEDDING_MODEL,
    DEFAULT_MAX_TOKENS, DEFAULT_MODEL, DEFAULT_REQUEST_TIMEOUT, DEFAULT_TEMPERATURE,
    OPENROUTER_BASE_URL,
    error::OpenAIError,
    request::ChatCompletionRequest,
    response::{ChatCompletionResponse, error_message},
};

const USER_AGENT: &str = concat!("seabrief-openai/", env!("CARGO_PKG_VERSION"));

/// Client for an OpenAI-compatible chat completions and embeddings API.
///
/// Cloning is cheap; clones share the configuration and the connection pool.
#[derive(Clone, Debug)]
pub struct OpenAI {
    inner: Arc<Config>,
    http: Client,
}

impl OpenAI {
    /// Create a new client using the provided API key and default models.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::builder(api_key).build()
    }

    /// Create a client configured for [`Deepseek`](https://api-docs.deepseek.com)'s OpenAI-compatible endpoint.
    pub fn deepseek(api_key: impl Into<String>) -> Self {
        Self::builder(api_key).base_url(DEEPSEEK_BASE_URL).build()
    }

    /// Create a client configured for [`OpenRouter`](https://openrouter.ai)'s OpenAI-compatible endpoint.
    pub fn openrouter(api_key: impl Into<String>) -> Self {
        Self::builder(api_key).base_url(OPENROUTER_BASE_URL).build()
    }

    /// Start building an [`OpenAI`] client with custom configuration.
    #[must_use]
    pub fn builder(api_key: impl Into<String>) -> Builder {
        Builder::new(api_key)
    }

    /// Override the chat model in-place.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.inner).chat_model = sanitize_model(model);
        self
    }

    /// Override the sampling temperature in-place.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        Arc::make_mut(&mut self.inner).temperature = temperature;
        self
    }

    /// Override the completion token limit in-place.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        Arc::make_mut(&mut self.inner).max_tokens = Some(max_tokens);
        self
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner
    }

    pub(crate) fn post(&self, path: &str) -> RequestBuilder {
        let cfg = &self.inner;
        let mut builder = self
            .http
            .post(cfg.request_url(path))
            .bearer_auth(&cfg.api_key)
            .header(header::USER_AGENT, USER_AGENT)
            .timeout(cfg.request_timeout);
        if let Some(org) = &cfg.organization {
            builder = builder.header("OpenAI-Organization", org);
        }
        builder
    }

    /// Sends a JSON request built by `make_request`, retrying per the configured policy.
    pub(crate) async fn send_json<T, F>(&self, label: &str, make_request: F) -> Result<T, OpenAIError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        self.inner
            .retry
            .run_when(
                label,
                |_| send_once(make_request()),
                OpenAIError::is_retryable,
            )
            .await
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String, OpenAIError> {
        let cfg = &self.inner;
        let mut request = ChatCompletionRequest::new(&cfg.chat_model, system, user);
        request.temperature = cfg.temperature;
        request.max_tokens = cfg.max_tokens;

        let response: ChatCompletionResponse = self
            .send_json("chat completion", || {
                self.post("/chat/completions").json(&request)
            })
            .await?;
        response
            .into_text()
            .ok_or_else(|| OpenAIError::Api("chat completion returned no message content".into()))
    }
}

async fn send_once<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, OpenAIError> {
    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        let retry_after = response
            .headers()
            .get(header::RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok())
            .map(Duration::from_secs);
        let body = response.text().await.unwrap_or_default();
        return Err(OpenAIError::from_status(
            status.as_u16(),
            error_message(&body),
            retry_after,
        ));
    }
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

impl LanguageModel for OpenAI {
    async fn generate(&self, system: &str, user: &str) -> seabrief_core::Result<String> {
        tracing::debug!(model = %self.inner.chat_model, "Requesting chat completion");
        Ok(self.chat(system, user).await?)
    }
}

/// Builder for [`OpenAI`] clients.
#[derive(Debug)]
pub struct Builder {
    api_key: String,
    base_url: String,
    chat_model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    embedding_model: String,
    embedding_dimensions: usize,
    request_dimensions: bool,
    organization: Option<String>,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl Builder {
    /// Create a new builder with the default models and settings.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: Some(DEFAULT_MAX_TOKENS),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dimensions: DEFAULT_EMBEDDING_DIM,
            request_dimensions: false,
            organization: None,
            retry: RetryPolicy::none(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set a custom API base URL.
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Select a chat model identifier (e.g., `gpt-4o-mini`).
    #[must_use]
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.chat_model = sanitize_model(model);
        self
    }

    /// Set the sampling temperature.
    #[must_use]
    pub const fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token limit. `None` lets the server decide.
    #[must_use]
    pub const fn max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Select the embeddings model identifier. Known models also set the dimension.
    #[must_use]
    pub fn embedding_model(mut self, model: impl Into<String>) -> Self {
        let model = sanitize_model(model);
        if let Some(dim) = infer_embedding_dim(&model) {
            self.embedding_dimensions = dim;
        }
        self.embedding_model = model;
        self
    }

    /// Request vectors of a specific dimension.
    ///
    /// The value is sent to the API, which shortens `text-embedding-3` vectors accordingly.
    #[must_use]
    pub const fn embedding_dimensions(mut self, dimensions: usize) -> Self {
        self.embedding_dimensions = dimensions;
        self.request_dimensions = true;
        self
    }

    /// Attach an `OpenAI` organization header.
    #[must_use]
    pub fn organization(mut self, organization: impl Into<String>) -> Self {
        self.organization = Some(organization.into());
        self
    }

    /// Configure retries for rate limits, server errors and transport failures.
    ///
    /// By default every request is attempted once.
    #[must_use]
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Set the request timeout. A timed-out request fails like any transport error.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Consume the builder and create an [`OpenAI`] client.
    #[must_use]
    pub fn build(self) -> OpenAI {
        OpenAI {
            inner: Arc::new(Config {
                api_key: self.api_key,
                base_url: self.base_url,
                chat_model: self.chat_model,
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                embedding_model: self.embedding_model,
                embedding_dimensions: self.embedding_dimensions,
                request_dimensions: self.request_dimensions,
                organization: self.organization,
                retry: self.retry,
                request_timeout: self.request_timeout,
            }),
            http: Client::new(),
        }
    }
}

/// Resolved client configuration.
#[derive(Clone)]
pub struct Config {
    pub(crate) api_key: String,
    pub(crate) base_url: String,
    pub(crate) chat_model: String,
    pub(crate) temperature: f32,
    pub(crate) max_tokens: Option<u32>,
    pub(crate) embedding_model: String,
    pub(crate) embedding_dimensions: usize,
    pub(crate) request_dimensions: bool,
    pub(crate) organization: Option<String>,
    pub(crate) retry: RetryPolicy,
    pub(crate) request_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("chat_model", &self.chat_model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("embedding_model", &self.embedding_model)
            .field("embedding_dimensions", &self.embedding_dimensions)
            .field("organization", &self.organization)
            .field("request_timeout", &self.request_timeout)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Chat model identifier.
    #[must_use]
    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    /// Sampling temperature.
    #[must_use]
    pub const fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Completion token limit.
    #[must_use]
    pub const fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    /// Embedding model identifier.
    #[must_use]
    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    /// Dimension of returned embeddings.
    #[must_use]
    pub const fn embedding_dimensions(&self) -> usize {
        self.embedding_dimensions
    }

    /// Per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub(crate) fn request_url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn sanitize_model(model: impl Into<String>) -> String {
    model.into().trim().to_string()
}

fn infer_embedding_dim(model: &str) -> Option<usize> {
    match model {
        "text-embedding-3-large" => Some(3072),
        "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seabrief_core::EmbeddingModel;

    #[test]
    fn defaults() {
        let client = OpenAI::new("sk-test");
        let cfg = client.config();
        assert_eq!(cfg.base_url(), "https://api.openai.com/v1");
        assert_eq!(cfg.chat_model(), "gpt-4o");
        assert_eq!(cfg.embedding_model(), "text-embedding-3-small");
        assert_eq!(client.dim(), 1536);
        assert_eq!(cfg.max_tokens(), Some(1500));
        assert!((cfg.temperature() - 0.3).abs() < f32::EPSILON);
        assert_eq!(cfg.retry, RetryPolicy::none());
    }

    #[test]
    fn builder_overrides() {
        let client = OpenAI::builder("sk-test")
            .base_url("http://localhost:8080/v1/")
            .model("  gpt-4o-mini ")
            .temperature(0.2)
            .max_tokens(Some(1000))
            .embedding_model("text-embedding-3-large")
            .organization("org-shipping")
            .timeout(Duration::from_secs(10))
            .build();
        let cfg = client.config();
        assert_eq!(cfg.chat_model(), "gpt-4o-mini");
        assert_eq!(cfg.embedding_dimensions(), 3072);
        assert!(!cfg.request_dimensions);
        assert_eq!(cfg.organization.as_deref(), Some("org-shipping"));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(10));
        assert_eq!(
            cfg.request_url("/chat/completions"),
            "http://localhost:8080/v1/chat/completions"
        );
    }

    #[test]
    fn explicit_dimensions_are_requested() {
        let client = OpenAI::builder("sk-test")
            .embedding_model("text-embedding-3-large")
            .embedding_dimensions(256)
            .build();
        assert_eq!(client.dim(), 256);
        assert!(client.config().request_dimensions);
    }

    #[test]
    fn in_place_overrides_do_not_touch_clones() {
        let answers = OpenAI::new("sk-test");
        let classifier = answers.clone().with_temperature(0.2).with_max_tokens(1000);
        assert!((answers.config().temperature() - 0.3).abs() < f32::EPSILON);
        assert!((classifier.config().temperature() - 0.2).abs() < f32::EPSILON);
        assert_eq!(classifier.config().max_tokens(), Some(1000));
    }

    #[test]
    fn debug_hides_api_key() {
        let client = OpenAI::new("sk-secret-value");
        assert!(!format!("{client:?}").contains("sk-secret-value"));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_transport_error() {
        let client = OpenAI::builder("sk-test")
            .base_url("http://127.0.0.1:9")
            .timeout(Duration::from_secs(2))
            .build();
        let err = client.chat("system", "user").await.unwrap_err();
        assert!(matches!(err, OpenAIError::Http(_)), "{err}");
        assert!(err.is_retryable());
    }
}
