//! Business groups derived from article category tags.
//!
//! Every analyzed article belongs to at least one [`Group`]. The mapping from free-form
//! category tags to groups is a fixed keyword table: an exact match on the tag wins, otherwise
//! the first table key that contains the tag (or is contained in it) decides. Tags that match
//! nothing contribute nothing, and an article with no matching tag falls back to
//! [`Group::General`].

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A coarse business-unit classification used for filtering and answer personalization.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, JsonSchema,
)]
pub enum Group {
    /// Steel exports carried by small bulkers (Handy, Handymax, Supramax).
    #[serde(rename = "steel_export_group")]
    SteelExport,
    /// Coal and iron ore imports carried by large bulkers (Panamax, Capesize).
    #[serde(rename = "coal_import_group")]
    CoalImport,
    /// Container transport.
    #[serde(rename = "container_group")]
    Container,
    /// General shipping and logistics.
    #[serde(rename = "general_group")]
    General,
}

impl Group {
    /// All groups in declaration order.
    pub const ALL: [Self; 4] = [
        Self::SteelExport,
        Self::CoalImport,
        Self::Container,
        Self::General,
    ];

    /// The identifier used in metadata records and filters.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SteelExport => "steel_export_group",
            Self::CoalImport => "coal_import_group",
            Self::Container => "container_group",
            Self::General => "general_group",
        }
    }

    /// Human readable description shown to users.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::SteelExport => "철강 수출 관련 (소형 벌크선: Handy, Handymax, Supramax)",
            Self::CoalImport => "석탄/철광석 수입 관련 (대형 벌크선: Panamax, Capesize)",
            Self::Container => "컨테이너 운송 관련",
            Self::General => "일반 해운/물류 관련",
        }
    }

    /// Parses a group identifier, mapping anything unknown to [`Group::General`].
    #[must_use]
    pub fn parse_lossy(value: &str) -> Self {
        value.parse().unwrap_or(Self::General)
    }
}

impl fmt::Display for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not a known group identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownGroup(pub String);

impl fmt::Display for UnknownGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown group: {}", self.0)
    }
}

impl std::error::Error for UnknownGroup {}

impl FromStr for Group {
    type Err = UnknownGroup;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|group| group.as_str() == normalized)
            .ok_or_else(|| UnknownGroup(s.to_owned()))
    }
}

/// Keyword table, in lookup order.
const CATEGORY_TABLE: &[(&str, Group)] = &[
    ("handy", Group::SteelExport),
    ("handymax", Group::SteelExport),
    ("supramax", Group::SteelExport),
    ("bdi", Group::SteelExport),
    ("steel", Group::SteelExport),
    ("baltic", Group::SteelExport),
    ("panamax", Group::CoalImport),
    ("capesize", Group::CoalImport),
    ("coal", Group::CoalImport),
    ("iron ore", Group::CoalImport),
    ("ironore", Group::CoalImport),
    ("container", Group::Container),
    ("scfi", Group::Container),
    ("shipping schedule", Group::Container),
    ("boxship", Group::Container),
    ("teu", Group::Container),
    ("bulk", Group::General),
    ("bulker", Group::General),
    ("dry bulk", Group::General),
    ("freight", Group::General),
    ("rates", Group::General),
    ("charter", Group::General),
    ("tonnage", Group::General),
    ("vessel", Group::General),
    ("shipping", Group::General),
    ("maritime", Group::General),
    ("port", Group::General),
    ("cargo", Group::General),
    ("demand", Group::General),
    ("supply", Group::General),
];

fn lookup(tag: &str) -> Option<Group> {
    if let Some((_, group)) = CATEGORY_TABLE.iter().find(|(key, _)| *key == tag) {
        return Some(*group);
    }
    CATEGORY_TABLE
        .iter()
        .find(|(key, _)| tag.contains(key) || key.contains(tag))
        .map(|(_, group)| *group)
}

/// Maps category tags to the groups they belong to.
///
/// The result is ordered, free of duplicates and never empty.
///
/// ```rust
/// use seabrief_core::{Group, map_categories_to_groups};
///
/// assert_eq!(map_categories_to_groups(&["supramax"]), vec![Group::SteelExport]);
/// assert_eq!(map_categories_to_groups::<&str>(&[]), vec![Group::General]);
/// ```
#[must_use]
pub fn map_categories_to_groups<S: AsRef<str>>(categories: &[S]) -> Vec<Group> {
    let mut groups = Vec::new();
    for category in categories {
        let tag = category.as_ref().trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }
        if let Some(group) = lookup(&tag) {
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
    }
    if groups.is_empty() {
        groups.push(Group::General);
    }
    groups
}
