//! Deterministic query intent classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Position of the person asking, which sets how technical the answer is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// 사장
    President,
    /// 실장
    Director,
    /// 그룹장
    GroupLead,
    /// 리더
    Leader,
    /// 담당자
    #[default]
    Staff,
}

impl Role {
    /// Every role, most senior first.
    pub const ALL: [Self; 5] = [
        Self::President,
        Self::Director,
        Self::GroupLead,
        Self::Leader,
        Self::Staff,
    ];

    /// Korean title as used inside the company.
    #[must_use]
    pub const fn korean(self) -> &'static str {
        match self {
            Self::President => "사장",
            Self::Director => "실장",
            Self::GroupLead => "그룹장",
            Self::Leader => "리더",
            Self::Staff => "담당자",
        }
    }

    /// Parses a Korean title or an English name. Anything unrecognized is [`Role::Staff`].
    #[must_use]
    pub fn parse_lossy(value: &str) -> Self {
        let value = value.trim().to_lowercase().replace(['-', ' '], "_");
        match value.as_str() {
            "사장" | "president" | "ceo" => Self::President,
            "실장" | "director" => Self::Director,
            "그룹장" | "group_lead" | "grouplead" => Self::GroupLead,
            "리더" | "leader" => Self::Leader,
            _ => Self::Staff,
        }
    }

    /// How much technical detail this role expects.
    #[must_use]
    pub const fn technical_level(self) -> TechnicalLevel {
        match self {
            Self::President | Self::Director => TechnicalLevel::Low,
            Self::GroupLead => TechnicalLevel::Medium,
            Self::Leader | Self::Staff => TechnicalLevel::High,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.korean())
    }
}

/// What kind of answer the question asks for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// No specific structure.
    #[default]
    General,
    /// Outlook or prediction.
    Forecast,
    /// Impact analysis.
    Analysis,
    /// Explanation of a term or concept.
    Definition,
    /// Step-by-step guidance.
    HowTo,
}

/// How pressing the question is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    /// Regular question.
    #[default]
    Normal,
    /// Needs the key points first.
    High,
}

/// Depth of explanation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalLevel {
    /// Key points, little jargon.
    Low,
    /// Balanced.
    #[default]
    Medium,
    /// Full technical detail.
    High,
}

/// Signals derived from a question and the asker's role.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intent {
    /// Kind of answer wanted.
    pub topic: Topic,
    /// How pressing the question is.
    pub urgency: Urgency,
    /// Whether the question is about the current state of the market.
    pub requires_recent_data: bool,
    /// Depth of explanation.
    pub technical_level: TechnicalLevel,
}

const URGENCY_KEYWORDS: &[&str] = &["긴급", "즉시", "urgent", "immediate", "오늘", "today"];
const RECENCY_KEYWORDS: &[&str] = &[
    "최근", "현재", "지금", "요즘", "오늘", "이번주", "recent", "current", "latest", "now", "today",
];
const FORECAST_KEYWORDS: &[&str] = &["전망", "예측", "forecast", "outlook", "predict"];
const ANALYSIS_KEYWORDS: &[&str] = &["분석", "영향", "analysis", "impact"];
const DEFINITION_KEYWORDS: &[&str] = &[
    "무엇", "뭐야", "설명", "차이", "what is", "explain", "difference",
];
const HOW_TO_KEYWORDS: &[&str] = &["어떻게", "방법", "how to"];

/// Korean keywords match anywhere, since particles attach to the stem. ASCII keywords match whole
/// words, except that the last word may continue ("forecasts", "today's").
fn mentions(query: &str, keywords: &[&str]) -> bool {
    let words: Vec<&str> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .collect();
    keywords.iter().any(|keyword| {
        if keyword.is_ascii() {
            mentions_words(&words, keyword)
        } else {
            query.contains(keyword)
        }
    })
}

fn mentions_words(words: &[&str], keyword: &str) -> bool {
    let parts: Vec<&str> = keyword.split(' ').collect();
    let Some((last, leading)) = parts.split_last() else {
        return false;
    };
    words.windows(parts.len()).any(|window| {
        window[..leading.len()] == *leading && window[leading.len()].starts_with(last)
    })
}

/// Classifies a question. Keyword matching is case-insensitive; English keywords match at word
/// starts.
///
/// ```rust
/// use seabrief_assistant::{Role, TechnicalLevel, Topic, classify_intent};
///
/// let intent = classify_intent("최근 BDI 전망은?", Role::President);
/// assert_eq!(intent.topic, Topic::Forecast);
/// assert!(intent.requires_recent_data);
/// assert_eq!(intent.technical_level, TechnicalLevel::Low);
/// ```
#[must_use]
pub fn classify_intent(query: &str, role: Role) -> Intent {
    let query = query.to_lowercase();

    let topic = [
        (FORECAST_KEYWORDS, Topic::Forecast),
        (ANALYSIS_KEYWORDS, Topic::Analysis),
        (DEFINITION_KEYWORDS, Topic::Definition),
        (HOW_TO_KEYWORDS, Topic::HowTo),
    ]
    .into_iter()
    .find(|(keywords, _)| mentions(&query, keywords))
    .map_or(Topic::General, |(_, topic)| topic);

    Intent {
        topic,
        urgency: if mentions(&query, URGENCY_KEYWORDS) {
            Urgency::High
        } else {
            Urgency::Normal
        },
        requires_recent_data: mentions(&query, RECENCY_KEYWORDS),
        technical_level: role.technical_level(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topic_priority() {
        let topic = |q| classify_intent(q, Role::Staff).topic;
        assert_eq!(topic("Capesize outlook and impact analysis"), Topic::Forecast);
        assert_eq!(topic("관세가 운임에 미치는 영향 설명해줘"), Topic::Analysis);
        assert_eq!(topic("What is the difference between BDI and SCFI?"), Topic::Definition);
        assert_eq!(topic("선박 용선 계약은 어떻게 하나요"), Topic::HowTo);
        assert_eq!(topic("Supramax rates"), Topic::General);
    }

    #[test]
    fn urgency_and_recency_are_independent() {
        let intent = classify_intent("URGENT: port strike", Role::Staff);
        assert_eq!(intent.urgency, Urgency::High);
        assert!(!intent.requires_recent_data);

        let intent = classify_intent("Latest container rates", Role::Staff);
        assert_eq!(intent.urgency, Urgency::Normal);
        assert!(intent.requires_recent_data);

        let intent = classify_intent("오늘 운임 동향", Role::Staff);
        assert_eq!(intent.urgency, Urgency::High);
        assert!(intent.requires_recent_data);

        for query in [
            "What do you know about capesize?",
            "snow delays at port",
            "a well-known index",
        ] {
            assert!(!classify_intent(query, Role::Staff).requires_recent_data, "{query}");
        }
        assert!(classify_intent("Where do rates stand now?", Role::Staff).requires_recent_data);
        assert!(classify_intent("today's BDI", Role::Staff).requires_recent_data);
    }

    #[test]
    fn english_keywords_match_at_word_starts() {
        let topic = |q| classify_intent(q, Role::Staff).topic;
        assert_eq!(topic("Panamax forecasts for Q3"), Topic::Forecast);
        assert_eq!(topic("Explain, what is a supramax?"), Topic::Definition);
        assert_eq!(topic("somewhat isolated markets"), Topic::General);
        assert_eq!(topic("show to the board"), Topic::General);
    }

    #[test]
    fn technical_level_follows_role() {
        let level = |role| classify_intent("question", role).technical_level;
        assert_eq!(level(Role::President), TechnicalLevel::Low);
        assert_eq!(level(Role::Director), TechnicalLevel::Low);
        assert_eq!(level(Role::GroupLead), TechnicalLevel::Medium);
        assert_eq!(level(Role::Leader), TechnicalLevel::High);
        assert_eq!(level(Role::Staff), TechnicalLevel::High);
    }

    #[test]
    fn role_parsing() {
        assert_eq!(Role::parse_lossy("사장"), Role::President);
        assert_eq!(Role::parse_lossy(" Group Lead "), Role::GroupLead);
        assert_eq!(Role::parse_lossy("group-lead"), Role::GroupLead);
        assert_eq!(Role::parse_lossy("리더"), Role::Leader);
        assert_eq!(Role::parse_lossy("intern"), Role::Staff);
        for role in Role::ALL {
            assert_eq!(Role::parse_lossy(role.korean()), role);
        }
    }
}
