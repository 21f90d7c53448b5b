//! Heuristic grading of classification results.

use std::fmt;

use seabrief_core::{AnalyzedArticle, Group};
use serde::Serialize;

/// Letter grade derived from a quality score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Grade {
    /// 75 points or more.
    A,
    /// 50 to 74 points.
    B,
    /// Below 50 points.
    C,
}

impl Grade {
    /// Grade for a score out of 100.
    #[must_use]
    pub const fn from_score(score: u8) -> Self {
        if score >= 75 {
            Self::A
        } else if score >= 50 {
            Self::B
        } else {
            Self::C
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
        })
    }
}

/// A shortcoming found by [`assess_quality`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityIssue {
    /// Summary under 50 characters.
    ShortSummary,
    /// No category tags.
    NoCategory,
    /// No events.
    NoEvent,
    /// Only the general group was assigned.
    GeneralGroupOnly,
}

impl fmt::Display for QualityIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ShortSummary => "summary is too short",
            Self::NoCategory => "no categories",
            Self::NoEvent => "no events",
            Self::GeneralGroupOnly => "only the general group was assigned",
        })
    }
}

/// Score, issues and grade of one analyzed article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    /// Score out of 100.
    pub score: u8,
    /// What cost points.
    pub issues: Vec<QualityIssue>,
    /// Letter grade.
    pub grade: Grade,
}

const SUMMARY_MIN_CHARS: usize = 50;
const POINTS: u8 = 25;

/// Grades an analyzed article: 25 points each for a summary of at least 50 characters, at least
/// one category, at least one event, and a group other than `general_group`.
#[must_use]
pub fn assess_quality(article: &AnalyzedArticle) -> QualityReport {
    let checks = [
        (
            article.summary.chars().count() >= SUMMARY_MIN_CHARS,
            QualityIssue::ShortSummary,
        ),
        (!article.category.is_empty(), QualityIssue::NoCategory),
        (!article.events.is_empty(), QualityIssue::NoEvent),
        (
            !article.assigned_group.is_empty() && article.assigned_group != [Group::General],
            QualityIssue::GeneralGroupOnly,
        ),
    ];

    let mut score = 0;
    let mut issues = Vec::new();
    for (passed, issue) in checks {
        if passed {
            score += POINTS;
        } else {
            issues.push(issue);
        }
    }

    QualityReport {
        score,
        issues,
        grade: Grade::from_score(score),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_classification_gets_an_a() {
        let article = AnalyzedArticle {
            summary: "Supramax freight rates climbed for a third week as steel exporters booked more tonnage."
                .into(),
            category: vec!["supramax".into()],
            events: vec!["운임 급등".into()],
            assigned_group: vec![Group::SteelExport],
            ..AnalyzedArticle::default()
        };
        let report = assess_quality(&article);
        assert_eq!(report.score, 100);
        assert!(report.issues.is_empty());
        assert_eq!(report.grade, Grade::A);
    }

    #[test]
    fn fallback_style_result_grades_low() {
        let article = AnalyzedArticle {
            summary: "Short body.".into(),
            category: vec!["coal".into()],
            assigned_group: vec![Group::General],
            ..AnalyzedArticle::default()
        };
        let report = assess_quality(&article);
        assert_eq!(report.score, 25);
        assert_eq!(
            report.issues,
            vec![
                QualityIssue::ShortSummary,
                QualityIssue::NoEvent,
                QualityIssue::GeneralGroupOnly
            ]
        );
        assert_eq!(report.grade, Grade::C);
    }

    #[test]
    fn grade_boundaries() {
        assert_eq!(Grade::from_score(75), Grade::A);
        assert_eq!(Grade::from_score(50), Grade::B);
        assert_eq!(Grade::from_score(49), Grade::C);
    }

    #[test]
    fn general_plus_specific_group_counts() {
        let article = AnalyzedArticle {
            assigned_group: vec![Group::General, Group::Container],
            ..AnalyzedArticle::default()
        };
        assert!(!assess_quality(&article).issues.contains(&QualityIssue::GeneralGroupOnly));
    }
}
