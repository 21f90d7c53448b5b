//! Index a few analyzed articles with a toy embedder and run a filtered search.

use seabrief_core::{AnalyzedArticle, EmbeddingModel, Group, Result};
use seabrief_rag::{IndexKind, NewsIndex, RagConfig, SearchFilters};

struct DemoEmbedder;

impl EmbeddingModel for DemoEmbedder {
    fn dim(&self) -> usize {
        64
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0; self.dim()];
        for word in text.split_whitespace() {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(0usize, |acc, b| acc.wrapping_mul(31).wrapping_add(usize::from(b)));
            vector[bucket % self.dim()] += 1.0;
        }
        Ok(vector)
    }
}

fn article(title: &str, summary: &str, category: &str, date: &str) -> AnalyzedArticle {
    AnalyzedArticle {
        title: title.into(),
        summary: summary.into(),
        category: vec![category.into()],
        source: "demo".into(),
        date: date.into(),
        ..AnalyzedArticle::default()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dir = std::env::temp_dir().join("seabrief-rag-demo");
    let config = RagConfig::builder()
        .directory(&dir)
        .index_kind(IndexKind::Flat)
        .build();
    let index = NewsIndex::new(DemoEmbedder, config);

    let ingested = index
        .ingest(vec![
            article(
                "Supramax rates climb",
                "Grain cargoes lift supramax earnings.",
                "supramax",
                "2025-08-01",
            ),
            article(
                "Capesize demand steady",
                "Iron ore shipments from Australia hold steady.",
                "capesize",
                "2025-07-30",
            ),
            article(
                "SCFI slides again",
                "Container spot rates fall for a fourth week.",
                "container",
                "2025-07-31",
            ),
        ])
        .await?;
    println!("Ingested {ingested} articles into {}", dir.display());

    let filters = SearchFilters::new().groups([Group::CoalImport, Group::SteelExport]);
    for (rank, hit) in index.retrieve("dry bulk rates", &filters, 5).await?.iter().enumerate() {
        println!(
            "{rank}: {} (score = {:.3}, {})",
            hit.article.title, hit.score, hit.article.date
        );
    }

    println!("{:?}", index.stats());
    Ok(())
}
