//! Context and prompt assembly.

use std::fmt::Write as _;

use seabrief_core::Group;
use seabrief_rag::{SearchFilters, SearchHit};

use crate::glossary::GlossaryEntry;
use crate::intent::{Intent, Role, TechnicalLevel, Topic, Urgency};
use crate::language::Language;

/// Who is asking and what they may see.
#[derive(Debug, Clone, Default)]
pub struct UserMeta {
    /// Position of the asker.
    pub role: Role,
    /// Business groups the asker belongs to.
    pub groups: Vec<Group>,
    /// Extra retrieval filters. When it has no group filter, `groups` is used instead.
    pub filters: SearchFilters,
    /// Include glossary entries regardless of the question type.
    pub glossary: bool,
}

impl UserMeta {
    /// A user with the given role and groups and no extra filters.
    #[must_use]
    pub fn new(role: Role, groups: impl IntoIterator<Item = Group>) -> Self {
        Self {
            role,
            groups: groups.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Sets extra retrieval filters.
    #[must_use]
    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Requests glossary entries for every question.
    #[must_use]
    pub const fn with_glossary(mut self) -> Self {
        self.glossary = true;
        self
    }

    /// Filters used for retrieval.
    #[must_use]
    pub fn search_filters(&self) -> SearchFilters {
        if self.filters.has_group_filter() || self.groups.is_empty() {
            self.filters.clone()
        } else {
            self.filters.clone().groups(self.groups.iter().copied())
        }
    }
}

/// Bonus added to a hit's score for every group it shares with the user.
pub const GROUP_BOOST: f32 = 0.1;

/// Orders hits for display: score plus [`GROUP_BOOST`] per shared group, highest first, at most
/// `limit` of them. Ties keep retrieval order.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn presentation_order<'a>(
    hits: &'a [SearchHit],
    user_groups: &[Group],
    limit: usize,
) -> Vec<&'a SearchHit> {
    let relevance = |hit: &SearchHit| hit.score + GROUP_BOOST * hit.shared_groups(user_groups) as f32;
    let mut ordered: Vec<&SearchHit> = hits.iter().collect();
    ordered.sort_by(|a, b| relevance(b).total_cmp(&relevance(a)));
    ordered.truncate(limit);
    ordered
}

/// Renders retrieved articles as the reference block of the prompt.
#[must_use]
pub fn build_context(hits: &[SearchHit], user_groups: &[Group], limit: usize) -> String {
    if hits.is_empty() {
        return "관련된 최신 뉴스 정보가 없습니다.".to_owned();
    }

    let mut parts = vec!["=== 관련 최신 뉴스 정보 ===".to_owned()];
    for (i, hit) in presentation_order(hits, user_groups, limit).into_iter().enumerate() {
        let article = &hit.article;
        parts.push(format!(
            "[뉴스 {}]\n제목: {}\n요약: {}\n날짜: {}\n출처: {}",
            i + 1,
            article.title,
            article.summary,
            article.date,
            article.source
        ));
    }
    parts.join("\n\n")
}

/// Builds the system prompt for a user and intent.
#[must_use]
pub fn build_system_prompt(user: &UserMeta, intent: &Intent) -> String {
    let mut prompt = include_str!("../prompts/system.txt").trim_end().to_owned();

    let groups = if user.groups.is_empty() {
        Group::General.as_str().to_owned()
    } else {
        user.groups
            .iter()
            .map(|group| group.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };
    let _ = write!(
        prompt,
        "\n\n## 현재 사용자 정보:\n- 직책: {}\n- 소속 그룹: {groups}",
        user.role
    );

    let topic_section = match intent.topic {
        Topic::Forecast => Some(
            "## 특별 지침 (전망/예측):\n- 과거 데이터와 현재 트렌드를 기반으로 분석\n- 불확실성과 리스크 요소 명시\n- 여러 시나리오 고려",
        ),
        Topic::Analysis => Some(
            "## 특별 지침 (분석):\n- 다각도 분석 (기술적, 경제적, 정치적 요인)\n- 단기/중기/장기 영향 구분\n- 정량적 데이터와 정성적 분석 병행",
        ),
        Topic::Definition => Some(
            "## 특별 지침 (정의/설명):\n- 기본 개념부터 차근차근 설명\n- 실제 사례나 예시 포함\n- 관련 용어나 개념도 함께 설명",
        ),
        Topic::HowTo => Some(
            "## 특별 지침 (방법/절차):\n- 단계별 절차로 설명\n- 실무에서 주의할 점 포함",
        ),
        Topic::General => None,
    };
    if let Some(section) = topic_section {
        prompt.push_str("\n\n");
        prompt.push_str(section);
    }

    match intent.technical_level {
        TechnicalLevel::Low => prompt.push_str("\n- 전문 용어 최소화, 핵심만 간단히"),
        TechnicalLevel::High => prompt.push_str("\n- 상세한 설명과 기술적 세부사항 포함"),
        TechnicalLevel::Medium => {}
    }
    prompt
}

/// Builds the user prompt around the question.
#[must_use]
pub fn build_user_prompt(
    query: &str,
    language: Language,
    context: &str,
    glossary: &[&GlossaryEntry],
    intent: &Intent,
) -> String {
    let mut prompt = format!(
        "{}\n\n질문: {query}\n\n참고 정보:\n{context}\n\n",
        language.instruction()
    );

    if !glossary.is_empty() {
        prompt.push_str("[기본 지식 정보]\n");
        for entry in glossary {
            let _ = writeln!(prompt, "{entry}");
        }
        prompt.push('\n');
    }
    if intent.urgency == Urgency::High {
        prompt.push_str("⚠️ 이 질문은 시급한 사안입니다. 핵심 포인트를 우선적으로 답변해주세요.\n\n");
    }
    if intent.requires_recent_data {
        prompt.push_str(
            "📅 최신 정보가 중요한 질문입니다. 제공된 뉴스의 날짜를 확인하고 최신성을 고려해주세요.\n\n",
        );
    }
    if matches!(intent.topic, Topic::Analysis | Topic::Forecast) {
        prompt.push_str(
            "분석 요청: 가능한 여러 시나리오와 리스크 요소를 고려하여 균형잡힌 분석을 제공해주세요.\n",
        );
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glossary;
    use crate::intent::classify_intent;
    use seabrief_core::AnalyzedArticle;

    fn hit(id: u64, title: &str, score: f32, groups: &[Group]) -> SearchHit {
        SearchHit {
            id,
            score,
            article: AnalyzedArticle {
                title: title.into(),
                summary: format!("{title} summary"),
                assigned_group: groups.to_vec(),
                date: "2025-08-01".into(),
                source: "Example".into(),
                ..AnalyzedArticle::default()
            },
        }
    }

    #[test]
    fn group_overlap_boosts_presentation() {
        let hits = vec![
            hit(0, "generic", 0.55, &[Group::General]),
            hit(1, "steel", 0.50, &[Group::SteelExport]),
            hit(2, "both", 0.30, &[Group::SteelExport, Group::Container]),
        ];
        let order: Vec<u64> = presentation_order(&hits, &[Group::SteelExport, Group::Container], 5)
            .iter()
            .map(|hit| hit.id)
            .collect();
        assert_eq!(order, vec![1, 0, 2]);

        let limited = presentation_order(&hits, &[], 2);
        assert_eq!(limited.iter().map(|h| h.id).collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn context_lists_articles() {
        let hits = vec![hit(0, "Supramax rates surge", 0.8, &[Group::SteelExport])];
        let context = build_context(&hits, &[], 5);
        assert!(context.starts_with("=== 관련 최신 뉴스 정보 ==="));
        assert!(context.contains("[뉴스 1]\n제목: Supramax rates surge"));
        assert!(context.contains("날짜: 2025-08-01"));

        assert_eq!(build_context(&[], &[], 5), "관련된 최신 뉴스 정보가 없습니다.");
    }

    #[test]
    fn user_groups_become_the_group_filter() {
        let user = UserMeta::new(Role::Leader, [Group::Container]);
        assert_eq!(
            user.search_filters(),
            SearchFilters::new().groups([Group::Container])
        );

        let explicit = user
            .clone()
            .with_filters(SearchFilters::new().groups([Group::CoalImport]));
        assert_eq!(
            explicit.search_filters(),
            SearchFilters::new().groups([Group::CoalImport])
        );

        assert!(UserMeta::default().search_filters().is_empty());
    }

    #[test]
    fn system_prompt_reflects_role_and_topic() {
        let user = UserMeta::new(Role::President, [Group::SteelExport]);
        let intent = classify_intent("Supramax 운임 전망", user.role);
        let prompt = build_system_prompt(&user, &intent);
        assert!(prompt.contains("- 직책: 사장"));
        assert!(prompt.contains("- 소속 그룹: steel_export_group"));
        assert!(prompt.contains("## 특별 지침 (전망/예측):"));
        assert!(prompt.ends_with("- 전문 용어 최소화, 핵심만 간단히"));

        let staff = UserMeta::default();
        let prompt = build_system_prompt(&staff, &classify_intent("hello", staff.role));
        assert!(prompt.contains("- 소속 그룹: general_group"));
        assert!(!prompt.contains("특별 지침 ("));
    }

    #[test]
    fn user_prompt_sections() {
        let intent = classify_intent("오늘 BDI 영향 분석, 긴급", Role::Staff);
        let entries = glossary::lookup("BDI");
        let prompt = build_user_prompt("q", Language::Korean, "ctx", &entries, &intent);
        assert!(prompt.starts_with("[한국어로 답변]\n\n질문: q\n\n참고 정보:\nctx\n\n"));
        assert!(prompt.contains("[기본 지식 정보]\n**BDI**:"));
        assert!(prompt.contains("시급한 사안"));
        assert!(prompt.contains("최신 정보가 중요한 질문"));
        assert!(prompt.ends_with("균형잡힌 분석을 제공해주세요.\n"));

        let plain = classify_intent("Supramax rates", Role::Staff);
        let prompt = build_user_prompt("Supramax rates", Language::English, "ctx", &[], &plain);
        assert_eq!(prompt, "[Answer in English]\n\n질문: Supramax rates\n\n참고 정보:\nctx\n\n");
    }
}
