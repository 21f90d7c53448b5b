//! Article records as they move through the pipeline.
//!
//! A crawler produces [`ArticleRecord`]s, classification turns each into an
//! [`AnalyzedArticle`], and the analyzed form is what gets embedded and written to the
//! metadata log. Both are stored between pipeline stages as pretty-printed JSON arrays.

use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};

use crate::group::{Group, map_categories_to_groups};

/// A raw article as scraped from a news site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArticleRecord {
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Link to the original page.
    pub url: String,
    /// Publisher name.
    pub source: String,
    /// Publication date, `YYYY-MM-DD`.
    pub date: String,
    /// Keywords that led the crawler to the article.
    pub keywords: Vec<String>,
}

/// An article after classification, ready to be indexed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzedArticle {
    /// Headline.
    pub title: String,
    /// Short summary produced by the classifier.
    pub summary: String,
    /// Lower-cased keyword tags.
    pub category: Vec<String>,
    /// Business groups the article is relevant to. Accepts a single string on input.
    #[serde(deserialize_with = "deserialize_groups")]
    pub assigned_group: Vec<Group>,
    /// Free-text event labels.
    pub events: Vec<String>,
    /// Link to the original page.
    pub source_url: String,
    /// Publisher name.
    pub source: String,
    /// Publication date, `YYYY-MM-DD`.
    pub date: String,
    /// Keywords carried over from the crawl.
    pub keywords: Vec<String>,
}

/// Returns `true` for empty strings and the usual "no value" spellings.
#[must_use]
pub fn is_placeholder(value: &str) -> bool {
    let value = value.trim();
    value.is_empty()
        || ["none", "null", "n/a", "not available"]
            .iter()
            .any(|placeholder| value.eq_ignore_ascii_case(placeholder))
}

fn clean_tags(tags: Vec<String>, lowercase: bool) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim();
        if is_placeholder(tag) {
            continue;
        }
        let tag = if lowercase {
            tag.to_lowercase()
        } else {
            tag.to_owned()
        };
        if !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    cleaned
}

impl AnalyzedArticle {
    /// Returns a copy with trimmed text, de-duplicated tags and a non-empty group set.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.title = self.title.trim().to_owned();
        self.summary = self.summary.trim().to_owned();
        self.category = clean_tags(self.category, true);
        self.events = clean_tags(self.events, false);
        self.keywords = clean_tags(self.keywords, false);

        let mut groups: Vec<Group> = Vec::with_capacity(self.assigned_group.len());
        for group in self.assigned_group {
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
        if groups.is_empty() {
            groups = map_categories_to_groups(&self.category);
        }
        self.assigned_group = groups;
        self
    }

    /// The text that represents this article in vector space.
    ///
    /// Title, summary, events and categories, space-joined with empty parts skipped.
    #[must_use]
    pub fn embedding_text(&self) -> String {
        let events = self.events.join(" ");
        let categories = self.category.join(" ");
        [
            self.title.trim(),
            self.summary.trim(),
            events.trim(),
            categories.trim(),
        ]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }

    /// Returns `true` if any assigned group is one of `groups`.
    #[must_use]
    pub fn in_any_group(&self, groups: &[Group]) -> bool {
        self.assigned_group.iter().any(|group| groups.contains(group))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn deserialize_groups<'de, D>(deserializer: D) -> Result<Vec<Group>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<OneOrMany>::deserialize(deserializer)?;
    let names = match raw {
        None => Vec::new(),
        Some(OneOrMany::One(name)) => vec![name],
        Some(OneOrMany::Many(names)) => names,
    };
    Ok(names
        .iter()
        .filter(|name| !name.trim().is_empty())
        .map(|name| Group::parse_lossy(name))
        .collect())
}

/// Reads a JSON array of records from `path`.
///
/// # Errors
///
/// Fails if the file cannot be read or is not a JSON array of `T`.
pub fn read_articles<T: DeserializeOwned>(path: impl AsRef<Path>) -> crate::Result<Vec<T>> {
    let path = path.as_ref();
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_slice(&bytes).with_context(|| format!("invalid JSON in {}", path.display()))
}

/// Writes records to `path` as a pretty-printed UTF-8 JSON array, creating parent directories.
///
/// # Errors
///
/// Fails if the directory or file cannot be written.
pub fn write_articles<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> crate::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(records)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
    Ok(())
}
