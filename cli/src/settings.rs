//! Layered settings for the `seabrief` binary.
//!
//! Sources, lowest priority first: built-in defaults, `seabrief.toml` (or the file passed with
//! `--config`), then environment variables such as `SEABRIEF__STORE__TOP_K=8`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use config::{Config, Environment, File};
use seabrief_analyzer::AnalyzerConfig;
use seabrief_assistant::{AssistantConfig, Language};
use seabrief_core::RetryPolicy;
use seabrief_rag::{IndexKind, RagConfig};
use serde::{Deserialize, Serialize};

/// Default settings file, looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "seabrief.toml";
/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "SEABRIEF";
/// Environment variable holding the API key.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// All settings of the binary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Logging.
    pub log: LogSettings,
    /// Vector store.
    pub store: StoreSettings,
    /// OpenAI-compatible gateway.
    pub openai: OpenAISettings,
    /// Article classification.
    pub analyzer: AnalyzerSettings,
    /// Question answering.
    pub assistant: AssistantSettings,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default `tracing` filter directive, overridden by `RUST_LOG`.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

/// Vector store settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Directory holding `index.rkyv` and `metadata.jsonl`.
    pub directory: PathBuf,
    /// Index implementation.
    pub index: IndexKind,
    /// Minimum similarity of a search result.
    pub similarity_threshold: f32,
    /// Results returned by `search` without `--top-k`.
    pub top_k: usize,
    /// Candidates fetched per wanted result before filtering.
    pub overfetch_factor: usize,
    /// Documents per ingestion batch.
    pub batch_size: usize,
    /// Pause between ingestion batches, in milliseconds.
    pub batch_delay_ms: u64,
    /// Skip documents whose title and link are already indexed.
    pub deduplication: bool,
}

impl Default for StoreSettings {
    fn default() -> Self {
        let rag = RagConfig::default();
        Self {
            directory: PathBuf::from("vector_store"),
            index: rag.index_kind,
            similarity_threshold: rag.similarity_threshold,
            top_k: rag.default_top_k,
            overfetch_factor: rag.overfetch_factor,
            batch_size: rag.batch_size,
            batch_delay_ms: 1000,
            deduplication: rag.deduplication,
        }
    }
}

/// Gateway settings. The API key is never read from files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAISettings {
    /// API base URL.
    pub base_url: String,
    /// Chat model for both classification and answers.
    pub chat_model: String,
    /// Embedding model.
    pub embedding_model: String,
    /// Requested embedding dimension, when not the model's native one.
    pub embedding_dimensions: Option<usize>,
    /// Organization header.
    pub organization: Option<String>,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    /// Sampling temperature for answers.
    pub answer_temperature: f32,
    /// Completion token limit for answers.
    pub answer_max_tokens: u32,
    /// Sampling temperature for classification.
    pub classify_temperature: f32,
    /// Completion token limit for classification.
    pub classify_max_tokens: u32,
}

impl Default for OpenAISettings {
    fn default() -> Self {
        Self {
            base_url: seabrief_openai::OPENAI_BASE_URL.into(),
            chat_model: seabrief_openai::GPT4O.into(),
            embedding_model: seabrief_openai::EMBEDDING_SMALL.into(),
            embedding_dimensions: None,
            organization: None,
            timeout_secs: 60,
            answer_temperature: 0.3,
            answer_max_tokens: 1500,
            classify_temperature: 0.2,
            classify_max_tokens: 1000,
        }
    }
}

/// Classification settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerSettings {
    /// Classification attempts per article.
    pub max_attempts: u32,
    /// Pause between attempts, in milliseconds.
    pub retry_delay_ms: u64,
    /// Articles per batch.
    pub batch_size: usize,
    /// Pause between batches, in milliseconds.
    pub batch_delay_ms: u64,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_ms: 2000,
            batch_size: 10,
            batch_delay_ms: 2000,
        }
    }
}

/// Question answering settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantSettings {
    /// Answer language when detection fails.
    pub language: Language,
    /// Results retrieved for a regular question.
    pub top_k: usize,
    /// Results retrieved for a question about recent events.
    pub recent_top_k: usize,
    /// Articles shown to the model.
    pub context_top_k: usize,
    /// Days after which the freshest article is stale.
    pub freshness_days: i64,
    /// Add glossary entries to every question.
    pub always_use_glossary: bool,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        let assistant = AssistantConfig::default();
        Self {
            language: assistant.default_language,
            top_k: assistant.top_k,
            recent_top_k: assistant.recent_top_k,
            context_top_k: assistant.context_top_k,
            freshness_days: assistant.freshness_days,
            always_use_glossary: assistant.always_use_glossary,
        }
    }
}

/// Loads settings from `path` (required) or from `seabrief.toml` (optional), then the environment.
///
/// # Errors
///
/// Fails when an explicit file is missing, a source cannot be parsed or a value is out of range.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let file = path.map_or_else(
        || File::with_name(DEFAULT_SETTINGS_FILE).required(false),
        |path| File::from(path).required(true),
    );

    let settings: Settings = Config::builder()
        .add_source(file)
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .context("Failed to read settings")?
        .try_deserialize()
        .context("Invalid settings")?;

    settings.validate()?;
    Ok(settings)
}

impl Settings {
    /// Rejects values no component can work with.
    ///
    /// # Errors
    ///
    /// Names the first offending key.
    pub fn validate(&self) -> Result<()> {
        if !(-1.0..=1.0).contains(&self.store.similarity_threshold) {
            bail!("store.similarity_threshold must be within [-1, 1]");
        }
        if self.store.top_k == 0 || self.assistant.top_k == 0 || self.assistant.recent_top_k == 0 {
            bail!("top_k values must be at least 1");
        }
        if self.store.batch_size == 0 || self.analyzer.batch_size == 0 {
            bail!("batch sizes must be at least 1");
        }
        if self.openai.timeout_secs == 0 {
            bail!("openai.timeout_secs must be at least 1");
        }
        if self.assistant.freshness_days < 0 {
            bail!("assistant.freshness_days must not be negative");
        }
        Ok(())
    }

    /// Store configuration.
    #[must_use]
    pub fn rag_config(&self) -> RagConfig {
        let store = &self.store;
        RagConfig::builder()
            .directory(&store.directory)
            .index_kind(store.index)
            .similarity_threshold(store.similarity_threshold)
            .default_top_k(store.top_k)
            .overfetch_factor(store.overfetch_factor)
            .batch_size(store.batch_size)
            .batch_delay(Duration::from_millis(store.batch_delay_ms))
            .deduplication(store.deduplication)
            .build()
    }

    /// Analyzer configuration.
    #[must_use]
    pub const fn analyzer_config(&self) -> AnalyzerConfig {
        let analyzer = &self.analyzer;
        AnalyzerConfig {
            retry: RetryPolicy {
                max_attempts: analyzer.max_attempts,
                delay: Duration::from_millis(analyzer.retry_delay_ms),
                backoff: 1.0,
                max_delay: Duration::from_secs(30),
                jitter: 0.0,
            },
            batch_size: analyzer.batch_size,
            batch_delay: Duration::from_millis(analyzer.batch_delay_ms),
        }
    }

    /// Assistant configuration.
    #[must_use]
    pub fn assistant_config(&self) -> AssistantConfig {
        let assistant = &self.assistant;
        AssistantConfig {
            top_k: assistant.top_k,
            recent_top_k: assistant.recent_top_k,
            context_top_k: assistant.context_top_k,
            freshness_days: assistant.freshness_days,
            default_language: assistant.language,
            always_use_glossary: assistant.always_use_glossary,
            ..AssistantConfig::default()
        }
    }

    /// Gateway builder with everything but the per-use temperature and token limit.
    #[must_use]
    pub fn openai_builder(&self, api_key: String) -> seabrief_openai::Builder {
        let openai = &self.openai;
        let mut builder = seabrief_openai::OpenAI::builder(api_key)
            .base_url(openai.base_url.clone())
            .model(openai.chat_model.clone())
            .embedding_model(openai.embedding_model.clone())
            .timeout(Duration::from_secs(openai.timeout_secs));
        if let Some(dimensions) = openai.embedding_dimensions {
            builder = builder.embedding_dimensions(dimensions);
        }
        if let Some(organization) = &openai.organization {
            builder = builder.organization(organization.clone());
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_components() {
        let settings = Settings::default();
        settings.validate().unwrap();

        let rag = settings.rag_config();
        assert_eq!(rag.index_path, PathBuf::from("vector_store/index.rkyv"));
        assert_eq!(rag.metadata_path, PathBuf::from("vector_store/metadata.jsonl"));
        assert_eq!(rag.default_top_k, 5);
        assert_eq!(rag.batch_delay, Duration::from_secs(1));

        let analyzer = settings.analyzer_config();
        assert_eq!(analyzer.retry, RetryPolicy::fixed(3, Duration::from_secs(2)));
        assert_eq!(analyzer.batch_size, 10);

        let assistant = settings.assistant_config();
        assert_eq!(assistant.recent_top_k, 7);
        assert_eq!(assistant.default_language, Language::Korean);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
[store]
directory = "/data/news"
index = "flat"
top_k = 8

[assistant]
language = "english"
freshness_days = 3

[openai]
chat_model = "gpt-4o-mini"
"#
        )
        .unwrap();

        let settings = load_settings(Some(&path)).unwrap();
        assert_eq!(settings.store.index, IndexKind::Flat);
        assert_eq!(settings.store.top_k, 8);
        assert_eq!(settings.store.batch_size, 50);
        assert_eq!(settings.assistant.language, Language::English);
        assert_eq!(settings.assistant.freshness_days, 3);
        assert_eq!(settings.openai.chat_model, "gpt-4o-mini");
        assert_eq!(settings.openai.embedding_model, "text-embedding-3-small");
        assert_eq!(
            settings.rag_config().index_path,
            PathBuf::from("/data/news/index.rkyv")
        );
    }

    #[test]
    fn explicit_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_settings(Some(&dir.path().join("missing.toml"))).is_err());
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut settings = Settings::default();
        settings.store.similarity_threshold = 1.5;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.analyzer.batch_size = 0;
        assert!(settings.validate().is_err());
    }
}
