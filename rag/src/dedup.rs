//! Content deduplication using xxhash.

use seabrief_core::AnalyzedArticle;
use xxhash_rust::xxh3::xxh3_64;

/// Computes a content hash for deduplication.
#[must_use]
pub fn content_hash(text: &str) -> u64 {
    xxh3_64(text.as_bytes())
}

/// Title with case, punctuation and whitespace differences removed.
#[must_use]
pub fn normalize_title(title: &str) -> String {
    title
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Identity hash of an article: its normalized title and its link.
#[must_use]
pub fn article_hash(article: &AnalyzedArticle) -> u64 {
    let key = format!(
        "{}\u{1f}{}",
        normalize_title(&article.title),
        article.source_url.trim()
    );
    content_hash(&key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_same_hash() {
        let text = "Baltic Dry Index climbs";
        assert_eq!(content_hash(text), content_hash(text));
        assert_ne!(content_hash(text), content_hash("Baltic Dry Index falls"));
    }

    #[test]
    fn title_normalization_ignores_cosmetics() {
        assert_eq!(
            normalize_title("  Capesize Rates SURGE! "),
            normalize_title("capesize   rates surge")
        );
        assert_eq!(normalize_title("벌크선 운임, 상승"), "벌크선 운임 상승");
    }

    #[test]
    fn article_hash_uses_title_and_link() {
        let a = AnalyzedArticle {
            title: "Capesize rates surge".into(),
            source_url: "https://example.com/1".into(),
            ..AnalyzedArticle::default()
        };
        let mut b = a.clone();
        b.title = "CAPESIZE rates surge.".into();
        assert_eq!(article_hash(&a), article_hash(&b));

        b.source_url = "https://example.com/2".into();
        assert_ne!(article_hash(&a), article_hash(&b));
    }
}
