//! Crawled articles through classification, indexing and question answering.

use std::sync::Mutex;
use std::time::Duration;

use seabrief::{AnalyzedArticle, ArticleRecord, EmbeddingModel, Group, LanguageModel, RetryPolicy};
use seabrief_analyzer::{AnalyzerConfig, ArticleAnalyzer, LlmClassifier};
use seabrief_assistant::{Assistant, AssistantConfig, Role, UserMeta};
use seabrief_rag::{IndexKind, NewsIndex, RagConfig, SearchFilters};
use time::macros::date;

const DIM: usize = 256;

struct BagOfWords;

impl EmbeddingModel for BagOfWords {
    fn dim(&self) -> usize {
        DIM
    }

    async fn embed(&self, text: &str) -> seabrief::Result<Vec<f32>> {
        let mut vector = vec![0.0; DIM];
        for token in text.split_whitespace() {
            let token = token.to_lowercase();
            vector[xxhash_rust::xxh3::xxh3_64(token.as_bytes()) as usize % DIM] += 1.0;
        }
        Ok(vector)
    }
}

/// Classifies by title keyword and answers everything else with a fixed sentence.
#[derive(Default)]
struct DeskModel {
    answer_prompts: Mutex<Vec<String>>,
}

impl LanguageModel for DeskModel {
    async fn generate(&self, system: &str, user: &str) -> seabrief::Result<String> {
        if !system.contains("JSON schema") {
            self.answer_prompts.lock().unwrap().push(user.to_owned());
            return Ok("Supramax earnings are firm on grain cargoes.".into());
        }
        let reply = if user.contains("Supramax") {
            r#"```json
{"summary": "Supramax freight rates rose sharply on South American grain demand.",
 "category": ["supramax"], "assigned_group": ["steel_export_group"], "events": ["운임 급등"]}
```"#
        } else if user.contains("SCFI") {
            r#"{"summary": "The SCFI fell for a fourth week as transpacific capacity grew.",
 "category": ["container", "scfi"], "assigned_group": "container_group", "events": ["운임 하락"]}"#
        } else {
            "I cannot classify this article."
        };
        Ok(reply.into())
    }
}

fn record(title: &str, content: &str, date: &str) -> ArticleRecord {
    ArticleRecord {
        title: title.into(),
        content: content.into(),
        url: format!("https://news.example/{}", title.len()),
        source: "Example Shipping Daily".into(),
        date: date.into(),
        ..ArticleRecord::default()
    }
}

#[tokio::test]
async fn crawled_articles_become_answerable() {
    let dir = tempfile::tempdir().unwrap();
    let llm = DeskModel::default();

    let crawled = vec![
        record(
            "Supramax freight rates climb",
            "Supramax owners saw earnings rise as grain cargoes from Brazil increased.",
            "2025-08-01",
        ),
        record(
            "SCFI extends slide",
            "Container spot rates on the SCFI dropped again this week.",
            "2025-07-31",
        ),
        record(
            "Capesize iron ore volumes steady",
            "Capesize demand for iron ore and coal from Australia held steady.",
            "2025-07-30",
        ),
        record("Empty wire item", "", "2025-07-29"),
    ];

    let analyzer = ArticleAnalyzer::new(
        LlmClassifier::new(&llm),
        AnalyzerConfig {
            retry: RetryPolicy::none(),
            batch_size: 2,
            batch_delay: Duration::ZERO,
        },
    );
    let analyzed = analyzer.analyze_batch(&crawled).await;
    assert_eq!(analyzed.len(), 3);
    // The unparseable reply falls back to a keyword scan.
    assert!(analyzed[2].category.contains(&"capesize".to_owned()));
    assert!(analyzed[2].assigned_group.contains(&Group::CoalImport));

    let path = dir.path().join("analyzed.json");
    seabrief::write_articles(&path, &analyzed).unwrap();
    let analyzed: Vec<AnalyzedArticle> = seabrief::read_articles(&path).unwrap();

    let config = RagConfig::builder()
        .directory(dir.path().join("store"))
        .index_kind(IndexKind::Flat)
        .batch_delay(Duration::ZERO)
        .build();
    let index = NewsIndex::new(BagOfWords, config.clone());
    assert_eq!(index.ingest(analyzed).await.unwrap(), 3);

    let container = index
        .retrieve(
            "SCFI container rates",
            &SearchFilters::new().groups([Group::Container]),
            5,
        )
        .await
        .unwrap();
    assert_eq!(container.len(), 1);
    assert_eq!(container[0].article.title, "SCFI extends slide");

    let assistant = Assistant::new(index, &llm, AssistantConfig::default())
        .with_today(date!(2025 - 08 - 03));
    let user = UserMeta::new(Role::GroupLead, [Group::SteelExport]);
    let answer = assistant
        .answer_detailed("Where are supramax freight rates heading?", &user)
        .await;

    assert!(!answer.metadata.fallback);
    assert_eq!(answer.hits.len(), 1);
    assert!(answer.text.starts_with("Supramax earnings are firm on grain cargoes."));
    assert!(answer.text.contains("1. **Supramax freight rates climb** (Example Shipping Daily, 2025-08-01)"));
    assert!(answer.text.contains("→ [링크](https://news.example/28)"));

    let prompts = llm.answer_prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("제목: Supramax freight rates climb"));
    assert!(!prompts[0].contains("SCFI extends slide"));
    drop(prompts);

    let reopened = NewsIndex::new(BagOfWords, config);
    let stats = reopened.stats();
    assert_eq!(stats.total_vectors, 3);
    assert!(stats.is_consistent());
    let hits = reopened.search("capesize iron ore").await.unwrap();
    assert!(
        hits.iter()
            .any(|hit| hit.article.title == "Capesize iron ore volumes steady")
    );
}
