//! Answer language detection.

use serde::{Deserialize, Serialize};
use whatlang::Lang;

/// Language the answer should be written in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Language {
    /// 한국어
    #[default]
    Korean,
    /// English
    English,
}

impl Language {
    /// Instruction line placed at the top of the user prompt.
    #[must_use]
    pub const fn instruction(self) -> &'static str {
        match self {
            Self::Korean => "[한국어로 답변]",
            Self::English => "[Answer in English]",
        }
    }
}

const HANGUL_RATIO: f64 = 0.3;

const fn is_hangul_syllable(c: char) -> bool {
    matches!(c, '\u{AC00}'..='\u{D7A3}')
}

/// Detects the language of `text`.
///
/// Text whose alphabetic characters are more than 30% Hangul syllables is Korean. Otherwise a
/// statistical detector decides; Korean stays Korean and any other language becomes English.
/// When neither works, `default` is returned.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn detect_language(text: &str, default: Language) -> Language {
    let (hangul, alphabetic) = text
        .chars()
        .filter(|c| c.is_alphabetic())
        .fold((0usize, 0usize), |(hangul, total), c| {
            (hangul + usize::from(is_hangul_syllable(c)), total + 1)
        });
    if alphabetic > 0 && hangul as f64 / alphabetic as f64 > HANGUL_RATIO {
        return Language::Korean;
    }

    match whatlang::detect(text).map(|info| info.lang()) {
        Some(Lang::Kor) => Language::Korean,
        Some(_) => Language::English,
        None => default,
    }
}
