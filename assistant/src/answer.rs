//! Answer synthesis and post-processing.

use std::fmt::Write as _;

use seabrief_core::{EmbeddingModel, LanguageModel, RetryPolicy};
use seabrief_rag::{NewsIndex, RagError, SearchHit, parse_date};
use serde::Serialize;
use thiserror::Error;
use time::{Date, OffsetDateTime};

use crate::context::{UserMeta, build_context, build_system_prompt, build_user_prompt};
use crate::glossary::{self, GlossaryEntry};
use crate::intent::{Intent, Topic, classify_intent};
use crate::language::{Language, detect_language};

/// Configuration for an [`Assistant`].
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// Results retrieved for a regular question.
    pub top_k: usize,
    /// Results retrieved when the question asks for recent information.
    pub recent_top_k: usize,
    /// Articles shown to the model.
    pub context_top_k: usize,
    /// Age in days after which the freshest article counts as stale.
    pub freshness_days: i64,
    /// Answer language when detection fails.
    pub default_language: Language,
    /// Consult the glossary for every question, not only definitions.
    pub always_use_glossary: bool,
    /// Retry policy for the generation call.
    pub generation_retry: RetryPolicy,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            recent_top_k: 7,
            context_top_k: 5,
            freshness_days: 7,
            default_language: Language::Korean,
            always_use_glossary: false,
            generation_retry: RetryPolicy::none(),
        }
    }
}

/// Why an answer could not be generated.
#[derive(Debug, Error)]
pub enum AssistantError {
    /// Retrieval failed.
    #[error("retrieval failed: {0}")]
    Retrieval(#[from] RagError),
    /// The language model call failed.
    #[error("generation failed: {0}")]
    Generation(anyhow::Error),
}

/// Summary figures about an answer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnswerMetadata {
    /// Question type.
    pub topic: Topic,
    /// Number of retrieved articles.
    pub hit_count: usize,
    /// Whether glossary entries were added to the prompt.
    pub has_glossary: bool,
    /// Heuristic confidence in `[0, 1]`.
    pub confidence: f32,
    /// Whether the text is the fallback message.
    pub fallback: bool,
}

/// A generated answer with everything that went into it.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Final text, including sources and warnings.
    pub text: String,
    /// Articles retrieved for the question, newest first.
    pub hits: Vec<SearchHit>,
    /// Classified intent.
    pub intent: Intent,
    /// Answer language.
    pub language: Language,
    /// Summary figures.
    pub metadata: AnswerMetadata,
}

/// Answers questions from indexed news with a language model.
///
/// ```rust,no_run
/// use seabrief_assistant::{Assistant, AssistantConfig, Role, UserMeta};
/// use seabrief_core::{EmbeddingModel, Group, LanguageModel};
/// use seabrief_rag::NewsIndex;
///
/// async fn ask<M: EmbeddingModel, L: LanguageModel>(index: NewsIndex<M>, llm: L) {
///     let assistant = Assistant::new(index, llm, AssistantConfig::default());
///     let user = UserMeta::new(Role::GroupLead, [Group::SteelExport]);
///     println!("{}", assistant.answer("최근 Supramax 운임 전망은?", &user).await);
/// }
/// ```
#[derive(Debug)]
pub struct Assistant<M, L> {
    index: NewsIndex<M>,
    llm: L,
    config: AssistantConfig,
    today: Option<Date>,
}

impl<M: EmbeddingModel, L: LanguageModel> Assistant<M, L> {
    /// Creates an assistant over `index`.
    pub const fn new(index: NewsIndex<M>, llm: L, config: AssistantConfig) -> Self {
        Self {
            index,
            llm,
            config,
            today: None,
        }
    }

    /// Pins the date used for the freshness check instead of the current UTC date.
    #[must_use]
    pub const fn with_today(mut self, today: Date) -> Self {
        self.today = Some(today);
        self
    }

    /// The news index answers are drawn from.
    pub const fn index(&self) -> &NewsIndex<M> {
        &self.index
    }

    /// Answers `query` for `user`. Never fails; errors produce an apology with the error text.
    pub async fn answer(&self, query: &str, user: &UserMeta) -> String {
        self.answer_detailed(query, user).await.text
    }

    /// Like [`answer`](Self::answer), with hits, intent and metadata.
    pub async fn answer_detailed(&self, query: &str, user: &UserMeta) -> Answer {
        let intent = classify_intent(query, user.role);
        let language = detect_language(query, self.config.default_language);
        tracing::info!(?intent, ?language, "Answering question");

        match self.compose(query, user, intent, language).await {
            Ok(answer) => answer,
            Err(err) => {
                tracing::error!(error = %err, "Answer generation failed");
                Answer {
                    text: fallback_message(&err),
                    hits: Vec::new(),
                    intent,
                    language,
                    metadata: AnswerMetadata {
                        topic: intent.topic,
                        hit_count: 0,
                        has_glossary: false,
                        confidence: confidence(0, false, &intent),
                        fallback: true,
                    },
                }
            }
        }
    }

    async fn compose(
        &self,
        query: &str,
        user: &UserMeta,
        intent: Intent,
        language: Language,
    ) -> Result<Answer, AssistantError> {
        let top_k = if intent.requires_recent_data {
            self.config.recent_top_k
        } else {
            self.config.top_k
        };
        let hits = self
            .index
            .retrieve(query, &user.search_filters(), top_k)
            .await?;
        tracing::info!(hits = hits.len(), top_k, "Retrieved context");

        let glossary: Vec<&GlossaryEntry> =
            if intent.topic == Topic::Definition || user.glossary || self.config.always_use_glossary {
                glossary::lookup(query)
            } else {
                Vec::new()
            };

        let context = build_context(&hits, &user.groups, self.config.context_top_k);
        let system = build_system_prompt(user, &intent);
        let prompt = build_user_prompt(query, language, &context, &glossary, &intent);

        let reply = self
            .config
            .generation_retry
            .run("generate", |_| self.llm.generate(&system, &prompt))
            .await
            .map_err(AssistantError::Generation)?;

        let mut text = reply.trim().to_owned();
        text.push_str(&format_sources(&hits));
        let warnings = quality_warnings(&hits, &intent, self.today(), self.config.freshness_days);
        if !warnings.is_empty() {
            text.push_str("\n\n");
            text.push_str(&warnings.join("\n"));
        }

        let metadata = AnswerMetadata {
            topic: intent.topic,
            hit_count: hits.len(),
            has_glossary: !glossary.is_empty(),
            confidence: confidence(hits.len(), !glossary.is_empty(), &intent),
            fallback: false,
        };
        tracing::info!(?metadata, "Answer ready");

        Ok(Answer {
            text,
            hits,
            intent,
            language,
            metadata,
        })
    }

    fn today(&self) -> Date {
        self.today
            .unwrap_or_else(|| OffsetDateTime::now_utc().date())
    }
}

/// Numbered source list appended to answers, empty without hits.
#[must_use]
pub fn format_sources(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return String::new();
    }
    let mut sources = String::from("\n\n**📰 참고 기사:**");
    for (i, hit) in hits.iter().enumerate() {
        let article = &hit.article;
        let _ = write!(
            sources,
            "\n{}. **{}** ({}, {})",
            i + 1,
            article.title,
            article.source,
            article.date
        );
        if !article.source_url.is_empty() {
            let _ = write!(sources, " → [링크]({})", article.source_url);
        }
    }
    sources
}

/// Shown when no article was retrieved.
pub const NO_NEWS_WARNING: &str = "⚠️ *관련 최신 뉴스가 없어 일반적인 지식을 바탕으로 답변했습니다.*";
/// Shown when one or two articles were retrieved.
pub const LIMITED_WARNING: &str = "⚠️ *제한적인 정보를 바탕으로 작성된 답변입니다.*";
/// Shown when recent information was asked for but the freshest article is old.
pub const STALE_WARNING: &str = "⚠️ *최신 정보가 1주일 이상 오래되었습니다.*";

/// Warnings about the evidence behind an answer.
///
/// Hit dates that do not parse never count as fresh.
#[must_use]
pub fn quality_warnings(
    hits: &[SearchHit],
    intent: &Intent,
    today: Date,
    freshness_days: i64,
) -> Vec<&'static str> {
    let mut warnings = Vec::new();
    if hits.is_empty() {
        warnings.push(NO_NEWS_WARNING);
    } else if hits.len() < 3 {
        warnings.push(LIMITED_WARNING);
    }

    if intent.requires_recent_data && !hits.is_empty() {
        let freshest = hits
            .iter()
            .filter_map(|hit| parse_date(&hit.article.date))
            .max();
        let stale = freshest.is_none_or(|date| today - date > time::Duration::days(freshness_days));
        if stale {
            warnings.push(STALE_WARNING);
        }
    }
    warnings
}

/// Heuristic confidence of an answer in `[0, 1]`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn confidence(hit_count: usize, has_glossary: bool, intent: &Intent) -> f32 {
    let mut confidence = 0.3;
    if hit_count > 0 {
        confidence += 0.4 + (0.1 * hit_count as f32).min(0.2);
    }
    if has_glossary {
        confidence += 0.2;
    }
    if intent.topic == Topic::Definition {
        confidence += 0.1;
    }
    if intent.requires_recent_data && hit_count == 0 {
        confidence -= 0.2;
    }
    confidence.clamp(0.0, 1.0)
}

/// The apology returned when an answer cannot be produced.
#[must_use]
pub fn fallback_message(err: &AssistantError) -> String {
    let detail: String = err.to_string().chars().take(100).collect();
    format!(
        "죄송합니다. 답변 생성 중 기술적 문제가 발생했습니다.\n\n\
         **문제 해결 방법:**\n\
         1. 잠시 후 다시 시도해보세요\n\
         2. 질문을 더 구체적으로 바꿔보세요\n\
         3. 시스템 관리자에게 문의하세요\n\n\
         **오류 정보:** {detail}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Role;
    use seabrief_core::{AnalyzedArticle, Group};
    use seabrief_rag::{IndexKind, RagConfig};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tempfile::{TempDir, tempdir};
    use time::macros::date;

    const DIM: usize = 256;

    struct BagOfWords {
        broken: AtomicBool,
    }

    impl EmbeddingModel for BagOfWords {
        fn dim(&self) -> usize {
            DIM
        }

        async fn embed(&self, text: &str) -> seabrief_core::Result<Vec<f32>> {
            if self.broken.load(Ordering::SeqCst) {
                anyhow::bail!("embedding endpoint returned 503");
            }
            let mut vector = vec![0.0; DIM];
            for token in text.split_whitespace() {
                let token = token.to_lowercase();
                let bucket = xxhash_rust::xxh3::xxh3_64(token.as_bytes()) as usize % DIM;
                vector[bucket] += 1.0;
            }
            Ok(vector)
        }
    }

    /// Records prompts and replies with a fixed text, or fails.
    #[derive(Default)]
    struct RecordingModel {
        fail: bool,
        prompts: Mutex<Vec<(String, String)>>,
    }

    impl LanguageModel for RecordingModel {
        async fn generate(&self, system: &str, user: &str) -> seabrief_core::Result<String> {
            self.prompts
                .lock()
                .unwrap()
                .push((system.to_owned(), user.to_owned()));
            if self.fail {
                anyhow::bail!("rate limit exceeded for gpt-4o");
            }
            Ok("  Supramax rates are rising.  ".into())
        }
    }

    fn article(title: &str, summary: &str, category: &str, date: &str) -> AnalyzedArticle {
        AnalyzedArticle {
            title: title.into(),
            summary: summary.into(),
            category: vec![category.into()],
            source: "Example News".into(),
            source_url: format!("https://news.example/{}", title.len()),
            date: date.into(),
            ..AnalyzedArticle::default()
        }
    }

    async fn index(dir: &TempDir, articles: Vec<AnalyzedArticle>) -> NewsIndex<BagOfWords> {
        let config = RagConfig::builder()
            .directory(dir.path())
            .index_kind(IndexKind::Flat)
            .batch_delay(Duration::ZERO)
            .build();
        let index = NewsIndex::new(
            BagOfWords {
                broken: AtomicBool::new(false),
            },
            config,
        );
        index.ingest(articles).await.unwrap();
        index
    }

    fn hit(date: &str) -> SearchHit {
        SearchHit {
            id: 0,
            score: 0.5,
            article: AnalyzedArticle {
                title: "t".into(),
                date: date.into(),
                ..AnalyzedArticle::default()
            },
        }
    }

    #[tokio::test]
    async fn answer_with_sources() {
        let dir = tempdir().unwrap();
        let index = index(
            &dir,
            vec![article(
                "Supramax rates surge",
                "Rates rose due to demand.",
                "supramax",
                "2025-08-01",
            )],
        )
        .await;
        let llm = RecordingModel::default();
        let assistant = Assistant::new(index, &llm, AssistantConfig::default())
            .with_today(date!(2025 - 08 - 03));

        let user = UserMeta::new(Role::Leader, [Group::SteelExport]);
        let answer = assistant
            .answer_detailed("Where are supramax rates heading this quarter?", &user)
            .await;

        assert!(!answer.metadata.fallback);
        assert_eq!(answer.hits.len(), 1);
        assert!(answer.text.starts_with("Supramax rates are rising.\n\n**📰 참고 기사:**\n"));
        assert!(answer.text.contains(
            "1. **Supramax rates surge** (Example News, 2025-08-01) → [링크](https://news.example/20)"
        ));
        assert!(answer.text.ends_with(LIMITED_WARNING));
        assert!((answer.metadata.confidence - 0.8).abs() < 1e-6);

        let prompts = llm.prompts.lock().unwrap();
        let (system, user_prompt) = &prompts[0];
        assert!(system.contains("- 직책: 리더"));
        assert!(user_prompt.starts_with("[Answer in English]"));
        assert!(user_prompt.contains("제목: Supramax rates surge"));
    }

    #[tokio::test]
    async fn group_filter_excludes_other_groups() {
        let dir = tempdir().unwrap();
        let index = index(
            &dir,
            vec![article(
                "Container spot rates slide",
                "SCFI fell again.",
                "container",
                "2025-08-01",
            )],
        )
        .await;
        let assistant = Assistant::new(index, RecordingModel::default(), AssistantConfig::default());

        let user = UserMeta::new(Role::Staff, [Group::CoalImport]);
        let answer = assistant
            .answer_detailed("container spot rates", &user)
            .await;
        assert!(answer.hits.is_empty());
        assert!(answer.text.ends_with(NO_NEWS_WARNING));
        assert!(!answer.text.contains("참고 기사"));
    }

    #[tokio::test]
    async fn definitions_use_the_glossary() {
        let dir = tempdir().unwrap();
        let index = index(&dir, Vec::new()).await;
        let llm = RecordingModel::default();
        let assistant = Assistant::new(index, &llm, AssistantConfig::default());

        let answer = assistant
            .answer_detailed("Capesize가 무엇인가요?", &UserMeta::default())
            .await;
        assert_eq!(answer.intent.topic, Topic::Definition);
        assert_eq!(answer.language, Language::Korean);
        assert!(answer.metadata.has_glossary);
        // 0.3 base + 0.2 glossary + 0.1 definition
        assert!((answer.metadata.confidence - 0.6).abs() < 1e-6);

        let prompts = llm.prompts.lock().unwrap();
        assert!(prompts[0].1.contains("[기본 지식 정보]\n**Capesize**:"));
        assert!(prompts[0].1.contains("관련된 최신 뉴스 정보가 없습니다."));
    }

    #[tokio::test]
    async fn generation_failure_yields_fallback_text() {
        let dir = tempdir().unwrap();
        let index = index(&dir, Vec::new()).await;
        let llm = RecordingModel {
            fail: true,
            ..RecordingModel::default()
        };
        let assistant = Assistant::new(index, llm, AssistantConfig::default());

        let answer = assistant.answer_detailed("BDI", &UserMeta::default()).await;
        assert!(answer.metadata.fallback);
        assert!(answer.text.starts_with("죄송합니다. 답변 생성 중 기술적 문제가 발생했습니다."));
        assert!(answer.text.contains("**오류 정보:** generation failed: rate limit exceeded"));
    }

    #[tokio::test]
    async fn retrieval_failure_yields_fallback_text() {
        let dir = tempdir().unwrap();
        let index = index(
            &dir,
            vec![article("Capesize slump", "Iron ore cargoes slowed.", "capesize", "2025-07-01")],
        )
        .await;
        index.embedder().broken.store(true, Ordering::SeqCst);
        let llm = RecordingModel::default();
        let assistant = Assistant::new(index, &llm, AssistantConfig::default());

        let text = assistant.answer("capesize", &UserMeta::default()).await;
        assert!(text.contains("**오류 정보:** retrieval failed"));
        assert!(llm.prompts.lock().unwrap().is_empty());
    }

    #[test]
    fn fallback_truncates_error() {
        let err = AssistantError::Generation(anyhow::anyhow!("{}", "x".repeat(500)));
        let message = fallback_message(&err);
        let detail = message.rsplit("**오류 정보:** ").next().unwrap();
        assert_eq!(detail.chars().count(), 100);
    }

    #[test]
    fn warnings() {
        let recent = classify_intent("최근 운임", Role::Staff);
        let plain = classify_intent("운임", Role::Staff);
        let today = date!(2025 - 08 - 10);

        assert_eq!(quality_warnings(&[], &recent, today, 7), vec![NO_NEWS_WARNING]);
        assert_eq!(
            quality_warnings(&[hit("2025-08-09")], &plain, today, 7),
            vec![LIMITED_WARNING]
        );

        let fresh = vec![hit("2025-08-09"), hit("2025-07-01"), hit("2025-08-03")];
        assert!(quality_warnings(&fresh, &recent, today, 7).is_empty());

        let old = vec![hit("2025-08-02"), hit("2025-07-01"), hit("2025-06-01")];
        assert_eq!(quality_warnings(&old, &recent, today, 7), vec![STALE_WARNING]);
        assert!(quality_warnings(&old, &plain, today, 7).is_empty());

        let undated = vec![hit(""), hit("soon"), hit("2025-13-01")];
        assert_eq!(quality_warnings(&undated, &recent, today, 7), vec![STALE_WARNING]);
    }

    #[test]
    fn confidence_bounds() {
        let recent = classify_intent("latest rates", Role::Staff);
        let plain = classify_intent("rates", Role::Staff);
        assert!((confidence(0, false, &plain) - 0.3).abs() < 1e-6);
        assert!((confidence(0, false, &recent) - 0.1).abs() < 1e-6);
        assert!((confidence(1, false, &plain) - 0.8).abs() < 1e-6);
        assert!((confidence(5, false, &plain) - 0.9).abs() < 1e-6);
        let definition = classify_intent("what is bdi", Role::Staff);
        assert!((confidence(5, true, &definition) - 1.0).abs() < 1e-6);
    }
}
