//! Structured metadata filters applied to search candidates.

use seabrief_core::{AnalyzedArticle, Group};
use time::Date;
use time::macros::format_description;

/// Parses a `YYYY-MM-DD` date, ignoring any time-of-day suffix.
#[must_use]
pub fn parse_date(value: &str) -> Option<Date> {
    let value = value.trim();
    let day = value.get(..10).unwrap_or(value);
    if value.len() > 10 && !matches!(value.as_bytes()[10], b'T' | b't' | b' ') {
        return None;
    }
    Date::parse(day, format_description!("[year]-[month]-[day]")).ok()
}

/// An inclusive range of publication dates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DateRange {
    /// First accepted day.
    pub start: Date,
    /// Last accepted day.
    pub end: Date,
}

impl DateRange {
    /// Creates a range, swapping the bounds if they are reversed.
    #[must_use]
    pub fn new(start: Date, end: Date) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Whether `date` lies within the range.
    #[must_use]
    pub fn contains(&self, date: Date) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Filters combined with AND. An absent or empty filter does not constrain results.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchFilters {
    /// Keep articles sharing at least one event label.
    pub events: Option<Vec<String>>,
    /// Keep articles sharing at least one category tag.
    pub category: Option<Vec<String>>,
    /// Keep articles sharing at least one group.
    pub assigned_group: Option<Vec<Group>>,
    /// Keep articles whose date parses and falls within the range.
    pub date_range: Option<DateRange>,
}

fn active<T>(filter: Option<&Vec<T>>) -> Option<&[T]> {
    filter.map(Vec::as_slice).filter(|values| !values.is_empty())
}

impl SearchFilters {
    /// Creates an empty filter set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts results to the given events.
    #[must_use]
    pub fn events<I, S>(mut self, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.events = Some(events.into_iter().map(Into::into).collect());
        self
    }

    /// Restricts results to the given categories.
    #[must_use]
    pub fn categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.category = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    /// Restricts results to the given groups.
    #[must_use]
    pub fn groups(mut self, groups: impl IntoIterator<Item = Group>) -> Self {
        self.assigned_group = Some(groups.into_iter().collect());
        self
    }

    /// Restricts results to an inclusive date range.
    #[must_use]
    pub fn date_range(mut self, start: Date, end: Date) -> Self {
        self.date_range = Some(DateRange::new(start, end));
        self
    }

    /// Whether any filter is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        active(self.events.as_ref()).is_none()
            && active(self.category.as_ref()).is_none()
            && active(self.assigned_group.as_ref()).is_none()
            && self.date_range.is_none()
    }

    /// Whether any group filter is active.
    #[must_use]
    pub fn has_group_filter(&self) -> bool {
        active(self.assigned_group.as_ref()).is_some()
    }

    /// Whether `article` passes every active filter.
    #[must_use]
    pub fn matches(&self, article: &AnalyzedArticle) -> bool {
        if let Some(events) = active(self.events.as_ref()) {
            if !article.events.iter().any(|event| events.contains(event)) {
                return false;
            }
        }

        if let Some(categories) = active(self.category.as_ref()) {
            let wanted = |tag: &String| {
                categories
                    .iter()
                    .any(|category| category.trim().eq_ignore_ascii_case(tag))
            };
            if !article.category.iter().any(wanted) {
                return false;
            }
        }

        if let Some(groups) = active(self.assigned_group.as_ref()) {
            if !article.in_any_group(groups) {
                return false;
            }
        }

        if let Some(range) = self.date_range {
            match parse_date(&article.date) {
                Some(date) if range.contains(date) => {}
                _ => return false,
            }
        }

        true
    }
}
