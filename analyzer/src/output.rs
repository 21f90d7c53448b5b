//! The classification a model returns for one article, and how to read it out of free text.

use schemars::JsonSchema;
use seabrief_core::{Group, is_placeholder};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{AnalyzerError, Result};

/// Shortest summary, in characters, accepted from the model.
pub const MIN_SUMMARY_CHARS: usize = 10;

/// Classification of a single article.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ClassificationOutput {
    /// The article in at most three sentences.
    pub summary: String,
    /// Lower-cased keyword tags.
    pub category: Vec<String>,
    /// Business groups the article concerns. May be empty; it is then derived from `category`.
    pub assigned_group: Vec<Group>,
    /// Industry events mentioned in the article.
    pub events: Vec<String>,
}

impl ClassificationOutput {
    /// JSON schema of the expected reply, for inclusion in prompts.
    #[must_use]
    pub fn schema_json() -> String {
        serde_json::to_string_pretty(&schemars::schema_for!(Self)).unwrap_or_default()
    }
}

/// Extracts the JSON object from a model reply.
///
/// Prefers the body of a ```` ```json ```` fence, then the span from the first `{` to the last `}`,
/// and otherwise returns the trimmed input.
#[must_use]
pub fn clean_response(reply: &str) -> &str {
    let reply = reply.trim();
    if let Some(start) = reply.find("```json") {
        let body = &reply[start + "```json".len()..];
        if let Some(end) = body.find("```") {
            return body[..end].trim();
        }
    }
    if let (Some(start), Some(end)) = (reply.find('{'), reply.rfind('}')) {
        if start < end {
            return &reply[start..=end];
        }
    }
    reply
}

/// Parses a model reply into a [`ClassificationOutput`].
///
/// Fields of the wrong type are treated as absent. Placeholder categories and events are dropped.
/// `assigned_group` may be a single name or a list; unknown names become `general_group`.
///
/// # Errors
///
/// Returns [`AnalyzerError::Parse`] when the reply is not a JSON object or the summary is shorter
/// than [`MIN_SUMMARY_CHARS`] or a placeholder.
pub fn parse_output(reply: &str) -> Result<ClassificationOutput> {
    let value: Value = serde_json::from_str(clean_response(reply))
        .map_err(|e| AnalyzerError::Parse(format!("invalid JSON: {e}")))?;
    let Value::Object(fields) = value else {
        return Err(AnalyzerError::Parse("expected a JSON object".into()));
    };

    let summary = match fields.get("summary") {
        Some(Value::String(text)) => text.trim().to_owned(),
        None | Some(Value::Null) => String::new(),
        Some(other) => other.to_string(),
    };
    if summary.chars().count() < MIN_SUMMARY_CHARS || is_placeholder(&summary) {
        return Err(AnalyzerError::Parse(format!(
            "summary too short or meaningless: {summary:?}"
        )));
    }

    Ok(ClassificationOutput {
        summary,
        category: string_list(&fields, "category"),
        assigned_group: groups(&fields),
        events: string_list(&fields, "events"),
    })
}

fn string_list(fields: &Map<String, Value>, key: &str) -> Vec<String> {
    let Some(Value::Array(items)) = fields.get(key) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|item| !is_placeholder(item))
        .map(str::to_owned)
        .collect()
}

fn groups(fields: &Map<String, Value>) -> Vec<Group> {
    let names: Vec<&str> = match fields.get("assigned_group") {
        Some(Value::String(name)) => vec![name.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };
    let mut groups = Vec::with_capacity(names.len());
    for name in names.into_iter().filter(|name| !name.trim().is_empty()) {
        let group = Group::parse_lossy(name);
        if !groups.contains(&group) {
            groups.push(group);
        }
    }
    groups
}
