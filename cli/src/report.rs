//! Plain-text rendering of command results.

use std::fmt::Write as _;

use seabrief_analyzer::{Grade, assess_quality};
use seabrief_core::AnalyzedArticle;
use seabrief_rag::{Facets, IndexStats, IngestReport, RebuildReport, SearchHit};

/// One block per hit: rank, score, title, date and source, then the summary.
#[must_use]
pub fn render_hits(hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return "No matching articles.".to_owned();
    }
    let mut out = String::new();
    for (i, hit) in hits.iter().enumerate() {
        let article = &hit.article;
        let _ = writeln!(
            out,
            "{}. [{:.3}] {} ({}, {})",
            i + 1,
            hit.score,
            article.title,
            display_or_dash(&article.date),
            display_or_dash(&article.source)
        );
        let _ = writeln!(out, "   {}", article.summary);
        if !article.source_url.is_empty() {
            let _ = writeln!(out, "   {}", article.source_url);
        }
    }
    out
}

/// One line per article, newest first as given.
#[must_use]
pub fn render_articles(articles: &[AnalyzedArticle]) -> String {
    if articles.is_empty() {
        return "No matching articles.".to_owned();
    }
    let mut out = String::new();
    for article in articles {
        let groups: Vec<&str> = article.assigned_group.iter().map(|g| g.as_str()).collect();
        let _ = writeln!(
            out,
            "{}  {}  [{}]",
            display_or_dash(&article.date),
            article.title,
            groups.join(", ")
        );
    }
    out
}

/// Store statistics, with a warning line when index and log disagree.
#[must_use]
pub fn render_stats(stats: &IndexStats, facets: &Facets) -> String {
    let mut out = format!(
        "Vectors:     {}\nMetadata:    {}\nDimension:   {}\nIndex size:  {:.2} MB\nLog size:    {:.2} MB\n",
        stats.total_vectors,
        stats.metadata_count,
        stats.dimension,
        stats.index_size_mb(),
        stats.metadata_size_mb()
    );
    if !stats.is_consistent() {
        out.push_str("Warning: index and metadata log are out of sync; run `seabrief rebuild`.\n");
    }
    let groups: Vec<&str> = facets.groups.iter().map(|g| g.as_str()).collect();
    let _ = writeln!(out, "Groups:      {}", groups.join(", "));
    let _ = writeln!(out, "Categories:  {}", facets.categories.len());
    let _ = writeln!(out, "Events:      {}", facets.events.len());
    out
}

/// Ingestion counters on one line.
#[must_use]
pub fn render_ingest(report: &IngestReport) -> String {
    format!(
        "Ingested {} of {} documents ({} invalid, {} duplicates, {} without embedding, {} lost in failed batches)",
        report.ingested,
        report.submitted,
        report.dropped,
        report.duplicates,
        report.skipped,
        report.failed
    )
}

/// Rebuild counters on one line.
#[must_use]
pub fn render_rebuild(report: &RebuildReport) -> String {
    format!(
        "Rebuilt index with {} records ({} skipped, {} malformed lines)",
        report.restored, report.skipped, report.malformed
    )
}

/// Grade distribution of analyzed articles.
#[must_use]
pub fn render_quality(articles: &[AnalyzedArticle]) -> String {
    let mut counts = [0usize; 3];
    for article in articles {
        let index = match assess_quality(article).grade {
            Grade::A => 0,
            Grade::B => 1,
            Grade::C => 2,
        };
        counts[index] += 1;
    }
    format!(
        "Analyzed {} articles: {} A, {} B, {} C",
        articles.len(),
        counts[0],
        counts[1],
        counts[2]
    )
}

fn display_or_dash(value: &str) -> &str {
    if value.trim().is_empty() { "-" } else { value }
}
