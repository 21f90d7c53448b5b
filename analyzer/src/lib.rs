//! Article classification for the shipping news pipeline.
//!
//! An [`ArticleAnalyzer`] turns crawled [`ArticleRecord`]s into [`AnalyzedArticle`]s by asking a
//! [`Classifier`] for a summary, category tags, business groups and events. Classification is
//! retried on failure and, when the model never produces a usable reply, replaced by a keyword
//! scan so that every valid article still comes out analyzed.
//!
//! ```rust,no_run
//! use seabrief_analyzer::{AnalyzerConfig, ArticleAnalyzer, LlmClassifier};
//! use seabrief_core::{ArticleRecord, LanguageModel};
//!
//! async fn classify(llm: impl LanguageModel, crawled: &[ArticleRecord]) {
//!     let analyzer = ArticleAnalyzer::new(LlmClassifier::new(llm), AnalyzerConfig::default());
//!     for article in analyzer.analyze_batch(crawled).await {
//!         println!("{}: {:?}", article.title, article.assigned_group);
//!     }
//! }
//! ```

use std::future::Future;
use std::time::{Duration, Instant};

use seabrief_core::retry::sleep;
use seabrief_core::{
    AnalyzedArticle, ArticleRecord, LanguageModel, RetryPolicy, is_placeholder,
    map_categories_to_groups,
};
use tracing::{debug, info, warn};

pub mod error;
pub mod output;
pub mod quality;

pub use error::{AnalyzerError, Result};
pub use output::{ClassificationOutput, clean_response, parse_output};
pub use quality::{Grade, QualityIssue, QualityReport, assess_quality};

/// Produces a classification for one article.
pub trait Classifier: Send + Sync {
    /// Classifies `article`.
    fn classify(
        &self,
        article: &ArticleRecord,
    ) -> impl Future<Output = Result<ClassificationOutput>> + Send;
}

/// A [`Classifier`] backed by a language model and the domain system prompt.
#[derive(Debug, Clone)]
pub struct LlmClassifier<L> {
    llm: L,
    system_prompt: String,
}

impl<L: LanguageModel> LlmClassifier<L> {
    /// Creates a classifier using the built-in shipping and steel prompt.
    pub fn new(llm: L) -> Self {
        let system_prompt = format!(
            "{}\nThe reply must validate against this JSON schema:\n{}",
            include_str!("../prompts/classify.txt"),
            ClassificationOutput::schema_json()
        );
        Self { llm, system_prompt }
    }

    /// Replaces the system prompt.
    #[must_use]
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// The system prompt sent with every request.
    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }
}

impl<L: LanguageModel> Classifier for LlmClassifier<L> {
    async fn classify(&self, article: &ArticleRecord) -> Result<ClassificationOutput> {
        let prompt = format!("Title: {}\n\nContent: {}", article.title, article.content);
        let reply = self
            .llm
            .generate(&self.system_prompt, &prompt)
            .await
            .map_err(AnalyzerError::Llm)?;
        debug!(title = %article.title, reply = %preview(&reply, 200), "Model replied");
        parse_output(&reply)
    }
}

/// Configuration for an [`ArticleAnalyzer`].
#[derive(Debug, Clone)]
pub struct AnalyzerConfig {
    /// Retry policy for each classification.
    pub retry: RetryPolicy,
    /// Articles per batch in [`ArticleAnalyzer::analyze_batch`].
    pub batch_size: usize,
    /// Pause between batches.
    pub batch_delay: Duration,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::fixed(3, Duration::from_secs(2)),
            batch_size: 10,
            batch_delay: Duration::from_secs(2),
        }
    }
}

/// Classifies crawled articles, with retry and a keyword fallback.
#[derive(Debug, Clone)]
pub struct ArticleAnalyzer<C> {
    classifier: C,
    config: AnalyzerConfig,
}

impl<C: Classifier> ArticleAnalyzer<C> {
    /// Creates an analyzer.
    pub const fn new(classifier: C, config: AnalyzerConfig) -> Self {
        Self { classifier, config }
    }

    /// The analyzer configuration.
    pub const fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Analyzes one article.
    ///
    /// When every classification attempt fails, the result is built by [`fallback_result`].
    ///
    /// # Errors
    ///
    /// Returns [`AnalyzerError::InvalidArticle`] if the title or content is missing.
    pub async fn analyze(&self, article: &ArticleRecord) -> Result<AnalyzedArticle> {
        validate_input(article)?;
        let started = Instant::now();
        info!(title = %preview(&article.title, 50), "Analyzing article");

        let output = match self
            .config
            .retry
            .run("classify", |_| self.classifier.classify(article))
            .await
        {
            Ok(output) => output,
            Err(err) => {
                warn!(title = %article.title, error = %err, "Classification failed, using keyword fallback");
                fallback_result(article)
            }
        };

        let analyzed = AnalyzedArticle {
            title: article.title.clone(),
            summary: output.summary,
            category: output.category,
            assigned_group: output.assigned_group,
            events: output.events,
            source_url: article.url.clone(),
            source: article.source.clone(),
            date: article.date.clone(),
            keywords: article.keywords.clone(),
        }
        .normalized();

        info!(
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            categories = analyzed.category.len(),
            events = analyzed.events.len(),
            "Article analyzed"
        );
        Ok(analyzed)
    }

    /// Analyzes articles in batches, pausing between batches. Invalid articles are skipped.
    pub async fn analyze_batch(&self, articles: &[ArticleRecord]) -> Vec<AnalyzedArticle> {
        let batch_size = self.config.batch_size.max(1);
        let total_batches = articles.len().div_ceil(batch_size);
        let mut results = Vec::with_capacity(articles.len());

        for (batch_no, batch) in articles.chunks(batch_size).enumerate() {
            if batch_no > 0 {
                sleep(self.config.batch_delay).await;
            }
            info!(
                batch = batch_no + 1,
                total_batches,
                size = batch.len(),
                "Analyzing batch"
            );
            for article in batch {
                match self.analyze(article).await {
                    Ok(analyzed) => results.push(analyzed),
                    Err(err) => warn!(title = %article.title, error = %err, "Skipping article"),
                }
            }
        }

        info!(
            analyzed = results.len(),
            total = articles.len(),
            "Batch analysis finished"
        );
        results
    }
}

/// Checks that an article has a usable title and body.
///
/// # Errors
///
/// Returns [`AnalyzerError::InvalidArticle`] naming the first missing field.
pub fn validate_input(article: &ArticleRecord) -> Result<()> {
    for (field, value) in [("title", &article.title), ("content", &article.content)] {
        if is_placeholder(value) {
            return Err(AnalyzerError::InvalidArticle(format!("missing {field}")));
        }
    }
    Ok(())
}

/// Keywords the fallback scans for, in reporting order.
pub const FALLBACK_KEYWORDS: [&str; 12] = [
    "bulk",
    "handy",
    "handymax",
    "supramax",
    "panamax",
    "capesize",
    "steel",
    "iron ore",
    "coal",
    "container",
    "freight",
    "rates",
];

const FALLBACK_MAX_CATEGORIES: usize = 5;
const FALLBACK_SUMMARY_CHARS: usize = 200;

/// Builds a classification without a model: keyword categories and the start of the body.
#[must_use]
pub fn fallback_result(article: &ArticleRecord) -> ClassificationOutput {
    let text = format!("{} {}", article.title, article.content).to_lowercase();
    let category: Vec<String> = FALLBACK_KEYWORDS
        .iter()
        .filter(|keyword| text.contains(*keyword))
        .take(FALLBACK_MAX_CATEGORIES)
        .map(|keyword| (*keyword).to_owned())
        .collect();
    let assigned_group = map_categories_to_groups(&category);

    ClassificationOutput {
        summary: preview(&article.content, FALLBACK_SUMMARY_CHARS),
        category,
        assigned_group,
        events: Vec::new(),
    }
}

/// The first `max_chars` characters of `text`, trimmed, ending in `...` when shortened.
fn preview(text: &str, max_chars: usize) -> String {
    let head: String = text.chars().take(max_chars).collect();
    let head = head.trim();
    let limit = max_chars.saturating_sub(3);
    if head.chars().count() > limit {
        let mut cut: String = head.chars().take(limit).collect();
        cut.push_str("...");
        cut
    } else {
        head.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use seabrief_core::Group;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Replies with queued answers in order, then with errors.
    struct ScriptedModel {
        replies: Mutex<Vec<seabrief_core::Result<String>>>,
        calls: AtomicUsize,
        last_prompt: Mutex<String>,
    }

    impl ScriptedModel {
        fn new(replies: Vec<seabrief_core::Result<String>>) -> Self {
            let mut replies = replies;
            replies.reverse();
            Self {
                replies: Mutex::new(replies),
                calls: AtomicUsize::new(0),
                last_prompt: Mutex::new(String::new()),
            }
        }
    }

    impl LanguageModel for ScriptedModel {
        async fn generate(&self, _system: &str, user: &str) -> seabrief_core::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = user.to_owned();
            self.replies
                .lock()
                .unwrap()
                .pop()
                .unwrap_or_else(|| Err(anyhow::anyhow!("quota exceeded")))
        }
    }

    fn config() -> AnalyzerConfig {
        AnalyzerConfig {
            retry: RetryPolicy::fixed(3, Duration::ZERO),
            batch_size: 2,
            batch_delay: Duration::ZERO,
        }
    }

    fn crawled(title: &str, content: &str) -> ArticleRecord {
        ArticleRecord {
            title: title.into(),
            content: content.into(),
            url: "https://news.example/a".into(),
            source: "Example".into(),
            date: "2025-08-01".into(),
            keywords: vec!["supramax".into()],
        }
    }

    const GOOD_REPLY: &str = r#"```json
{"summary":"Supramax rates rose on steel demand from Asia.","category":["Supramax","steel"],"assigned_group":"steel_export_group","events":["운임 급등"]}
```"#;

    #[tokio::test]
    async fn successful_classification() {
        let model = ScriptedModel::new(vec![Ok(GOOD_REPLY.into())]);
        let analyzer = ArticleAnalyzer::new(LlmClassifier::new(&model), config());
        let article = analyzer
            .analyze(&crawled("Supramax rates surge", "Rates rose."))
            .await
            .unwrap();

        assert_eq!(article.title, "Supramax rates surge");
        assert_eq!(article.category, vec!["supramax", "steel"]);
        assert_eq!(article.assigned_group, vec![Group::SteelExport]);
        assert_eq!(article.events, vec!["운임 급등"]);
        assert_eq!(article.source_url, "https://news.example/a");
        assert_eq!(article.date, "2025-08-01");
        assert_eq!(article.keywords, vec!["supramax"]);
        assert_eq!(
            *model.last_prompt.lock().unwrap(),
            "Title: Supramax rates surge\n\nContent: Rates rose."
        );
    }

    #[tokio::test]
    async fn retries_after_bad_reply() {
        let model = ScriptedModel::new(vec![
            Ok("I'm not sure.".into()),
            Err(anyhow::anyhow!("timeout")),
            Ok(GOOD_REPLY.into()),
        ]);
        let analyzer = ArticleAnalyzer::new(LlmClassifier::new(&model), config());
        let article = analyzer
            .analyze(&crawled("Supramax rates surge", "Rates rose."))
            .await
            .unwrap();
        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
        assert_eq!(article.assigned_group, vec![Group::SteelExport]);
    }

    #[tokio::test]
    async fn falls_back_after_three_failures() {
        let model = ScriptedModel::new(Vec::new());
        let analyzer = ArticleAnalyzer::new(LlmClassifier::new(&model), config());
        let content = "Capesize and Panamax bulk carriers saw coal freight rates climb. ".repeat(5);
        let article = analyzer
            .analyze(&crawled("Dry bulk update", &content))
            .await
            .unwrap();

        assert_eq!(model.calls.load(Ordering::SeqCst), 3);
        assert_eq!(
            article.category,
            vec!["bulk", "panamax", "capesize", "coal", "freight"]
        );
        assert_eq!(article.assigned_group, vec![Group::General, Group::CoalImport]);
        assert!(article.events.is_empty());
        assert_eq!(article.summary.chars().count(), 200);
        assert!(article.summary.ends_with("..."));
    }

    #[tokio::test]
    async fn empty_group_is_derived_from_categories() {
        let reply = r#"{"summary":"Container spot rates slid again.","category":["container","scfi"]}"#;
        let model = ScriptedModel::new(vec![Ok(reply.into())]);
        let analyzer = ArticleAnalyzer::new(LlmClassifier::new(&model), config());
        let article = analyzer
            .analyze(&crawled("SCFI falls", "Rates slid."))
            .await
            .unwrap();
        assert_eq!(article.assigned_group, vec![Group::Container]);
    }

    #[tokio::test]
    async fn invalid_articles_are_rejected_without_calling_the_model() {
        let model = ScriptedModel::new(vec![Ok(GOOD_REPLY.into())]);
        let analyzer = ArticleAnalyzer::new(LlmClassifier::new(&model), config());
        for article in [crawled("", "body"), crawled("title", "None")] {
            assert!(matches!(
                analyzer.analyze(&article).await,
                Err(AnalyzerError::InvalidArticle(_))
            ));
        }
        assert_eq!(model.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn batch_skips_invalid_articles() {
        let model = ScriptedModel::new(vec![Ok(GOOD_REPLY.into()), Ok(GOOD_REPLY.into())]);
        let analyzer = ArticleAnalyzer::new(LlmClassifier::new(&model), config());
        let articles = vec![
            crawled("First", "Rates rose."),
            crawled("", "Untitled"),
            crawled("Second", "Rates rose again."),
        ];
        let analyzed = analyzer.analyze_batch(&articles).await;
        assert_eq!(
            analyzed.iter().map(|a| a.title.as_str()).collect::<Vec<_>>(),
            vec!["First", "Second"]
        );
    }

    #[test]
    fn fallback_summary_of_short_content() {
        let output = fallback_result(&crawled("Grain", "  Short body.  "));
        assert_eq!(output.summary, "Short body.");
        assert!(output.category.is_empty());
        assert_eq!(output.assigned_group, vec![Group::General]);
    }

    #[test]
    fn system_prompt_includes_schema() {
        struct Unused;
        impl LanguageModel for Unused {
            async fn generate(&self, _: &str, _: &str) -> seabrief_core::Result<String> {
                Ok(String::new())
            }
        }
        let classifier = LlmClassifier::new(Unused);
        assert!(classifier.system_prompt().contains("steel_export_group"));
        assert!(classifier.system_prompt().contains("JSON schema"));
    }
}
