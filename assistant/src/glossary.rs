//! A small static glossary of shipping terms.

use std::fmt;

use serde::Serialize;

/// Which part of the glossary a term belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TermKind {
    /// Dry bulk vessel size classes.
    VesselType,
    /// Freight rate benchmarks.
    MarketIndex,
    /// Bulk cargoes.
    Commodity,
}

/// One glossary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GlossaryEntry {
    /// Lookup key, lower-case, underscores standing for spaces.
    pub key: &'static str,
    /// Display name.
    pub name: &'static str,
    /// Group of the entry.
    pub kind: TermKind,
    /// Explanation in Korean.
    pub description: &'static str,
}

impl GlossaryEntry {
    fn matches(&self, query: &str) -> bool {
        query.contains(&self.key.replace('_', " "))
    }
}

impl fmt::Display for GlossaryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "**{}**: {}", self.name, self.description)
    }
}

/// Every known term, in lookup order.
pub const GLOSSARY: &[GlossaryEntry] = &[
    GlossaryEntry {
        key: "capesize",
        name: "Capesize",
        kind: TermKind::VesselType,
        description: "180,000 DWT 이상의 대형 벌크선. 주로 철광석, 석탄 운송",
    },
    GlossaryEntry {
        key: "panamax",
        name: "Panamax",
        kind: TermKind::VesselType,
        description: "65,000-80,000 DWT 벌크선. 파나마 운하를 통과할 수 있는 최대 크기",
    },
    GlossaryEntry {
        key: "supramax",
        name: "Supramax",
        kind: TermKind::VesselType,
        description: "50,000-65,000 DWT 벌크선. 중간 규모 화물 운송",
    },
    GlossaryEntry {
        key: "handysize",
        name: "Handysize",
        kind: TermKind::VesselType,
        description: "10,000-40,000 DWT 소형 벌크선. 소규모 항만 접근 가능",
    },
    GlossaryEntry {
        key: "bdi",
        name: "BDI",
        kind: TermKind::MarketIndex,
        description: "Baltic Dry Index. 건화물선 종합 운임 지수",
    },
    GlossaryEntry {
        key: "scfi",
        name: "SCFI",
        kind: TermKind::MarketIndex,
        description: "Shanghai Containerized Freight Index. 상하이 컨테이너 운임 지수",
    },
    GlossaryEntry {
        key: "iron_ore",
        name: "Iron Ore",
        kind: TermKind::Commodity,
        description: "철광석. 제철 원료, 주요 수출국은 호주와 브라질",
    },
    GlossaryEntry {
        key: "coal",
        name: "Coal",
        kind: TermKind::Commodity,
        description: "석탄. 발전 및 제철용, 주요 수출국은 호주와 인도네시아",
    },
    GlossaryEntry {
        key: "grain",
        name: "Grain",
        kind: TermKind::Commodity,
        description: "곡물. 밀, 옥수수, 대두 등",
    },
];

/// Entries whose key appears literally in the lower-cased query.
#[must_use]
pub fn lookup(query: &str) -> Vec<&'static GlossaryEntry> {
    let query = query.to_lowercase();
    GLOSSARY.iter().filter(|entry| entry.matches(&query)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_terms_case_insensitively() {
        let names: Vec<_> = lookup("Capesize 와 BDI 의 차이는?")
            .iter()
            .map(|entry| entry.name)
            .collect();
        assert_eq!(names, vec!["Capesize", "BDI"]);
    }

    #[test]
    fn multi_word_keys_match_with_spaces() {
        let entries = lookup("What drives iron ore demand?");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, TermKind::Commodity);
        assert_eq!(
            entries[0].to_string(),
            "**Iron Ore**: 철광석. 제철 원료, 주요 수출국은 호주와 브라질"
        );
        assert!(lookup("iron_ore").is_empty());
    }

    #[test]
    fn unknown_terms_find_nothing() {
        assert!(lookup("container spot rates").is_empty());
    }
}
