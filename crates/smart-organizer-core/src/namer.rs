use crate::metadata::Metadata;
use regex::Regex;

/// Extensions whose text preview may be mined for descriptive words.
pub const DOCUMENT_EXTENSIONS: &[&str] = &[".txt", ".md", ".pdf", ".doc", ".docx"];

/// Source files keep their (sanitized) original stem.
pub const SOURCE_CODE_EXTENSIONS: &[&str] = &[".py", ".js", ".html", ".css", ".java", ".cpp"];

const CONTENT_WINDOW_CHARS: usize = 200;
const MIN_SUGGESTION_LEN: usize = 3;
const FALLBACK_NAME: &str = "unnamed";

lazy_static::lazy_static! {
    static ref WORD_RE: Regex = Regex::new(r"\b[A-Za-z]{4,}\b").unwrap();
}

/// Naming rules in priority order. The first one that yields a name wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingRule {
    AiSuggestion,
    PhotoDate,
    ContentWords,
    SourceCode,
    SanitizedStem,
}

pub const RULES: [NamingRule; 5] = [
    NamingRule::AiSuggestion,
    NamingRule::PhotoDate,
    NamingRule::ContentWords,
    NamingRule::SourceCode,
    NamingRule::SanitizedStem,
];

/// Everything the namer looks at for one file.
#[derive(Debug, Clone, Copy)]
pub struct NamingInput<'a> {
    pub stem: &'a str,
    /// Lowercased, with leading dot.
    pub extension: &'a str,
    pub photo_date: Option<&'a str>,
    pub content_preview: &'a str,
    pub ai_suggestion: &'a str,
}

impl<'a> NamingInput<'a> {
    pub fn from_metadata(metadata: &'a Metadata, content_preview: &'a str, ai_suggestion: &'a str) -> Self {
        Self {
            stem: &metadata.entry.stem,
            extension: &metadata.entry.extension,
            photo_date: metadata.photo_date.as_deref(),
            content_preview,
            ai_suggestion,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameChoice {
    pub name: String,
    pub rule: NamingRule,
}

impl NamingRule {
    pub fn apply(self, input: &NamingInput<'_>) -> Option<String> {
        match self {
            Self::AiSuggestion => {
                if input.ai_suggestion.trim().is_empty() {
                    return None;
                }
                let cleaned = sanitize(input.ai_suggestion);
                (cleaned.chars().count() > MIN_SUGGESTION_LEN).then_some(cleaned)
            }
            Self::PhotoDate => input.photo_date.map(|date| {
                let compact = date.replace(':', "").replace(' ', "_");
                sanitize(&format!("photo_{}", compact))
            }),
            Self::ContentWords => {
                if input.content_preview.is_empty()
                    || !DOCUMENT_EXTENSIONS.contains(&input.extension)
                {
                    return None;
                }
                let window: String = input
                    .content_preview
                    .chars()
                    .take(CONTENT_WINDOW_CHARS)
                    .collect();
                let words: Vec<&str> = WORD_RE.find_iter(&window).map(|m| m.as_str()).collect();
                if words.len() < 2 {
                    return None;
                }
                Some(words.iter().take(3).copied().collect::<Vec<_>>().join("_").to_lowercase())
            }
            Self::SourceCode => SOURCE_CODE_EXTENSIONS
                .contains(&input.extension)
                .then(|| sanitize(input.stem)),
            Self::SanitizedStem => Some(sanitize(input.stem)),
        }
    }
}

/// Pick a new base filename (no extension) for a file.
pub fn choose_name(input: &NamingInput<'_>) -> NameChoice {
    RULES
        .iter()
        .find_map(|rule| rule.apply(input).map(|name| NameChoice { name, rule: *rule }))
        .unwrap_or_else(|| NameChoice {
            name: sanitize(input.stem),
            rule: NamingRule::SanitizedStem,
        })
}

/// New base filename only, without the rule that produced it.
pub fn name(input: &NamingInput<'_>) -> String {
    choose_name(input).name
}

/// Replace every char outside `[A-Za-z0-9_-]` with `_`. Never returns an empty string.
pub fn sanitize(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn input<'a>(stem: &'a str, extension: &'a str) -> NamingInput<'a> {
        NamingInput {
            stem,
            extension,
            photo_date: None,
            content_preview: "",
            ai_suggestion: "",
        }
    }

    #[test]
    fn test_ai_suggestion_wins() {
        let mut i = input("scan001", ".txt");
        i.ai_suggestion = "Quarterly Budget Review";
        i.content_preview = "Some preview text that would otherwise name it";
        let choice = choose_name(&i);
        assert_eq!(choice.name, "Quarterly_Budget_Review");
        assert_eq!(choice.rule, NamingRule::AiSuggestion);
    }

    #[test]
    fn test_short_ai_suggestion_is_ignored() {
        let mut i = input("notes", ".rtf");
        i.ai_suggestion = "abc";
        assert_eq!(choose_name(&i).rule, NamingRule::SanitizedStem);
    }

    #[test]
    fn test_photo_date_name() {
        let mut i = input("photo", ".jpg");
        i.photo_date = Some("2024:07:15 14:30:22");
        let choice = choose_name(&i);
        assert_eq!(choice.name, "photo_20240715_143022");
        assert_eq!(choice.rule, NamingRule::PhotoDate);
    }

    #[test]
    fn test_content_words_in_order_of_appearance() {
        let mut i = input("sample", ".txt");
        i.content_preview = "This is a sample document about machine learning algorithms.";
        let choice = choose_name(&i);
        assert_eq!(choice.name, "this_sample_document");
        assert_eq!(choice.rule, NamingRule::ContentWords);
    }

    #[test]
    fn test_content_words_need_two_words_in_window() {
        let mut i = input("memo", ".txt");
        i.content_preview = "a an the word";
        assert_eq!(choose_name(&i).rule, NamingRule::SanitizedStem);

        let late = format!("{}alpha bravo charlie", " ".repeat(CONTENT_WINDOW_CHARS));
        i.content_preview = &late;
        assert_eq!(choose_name(&i).name, "memo");
    }

    #[test]
    fn test_content_words_only_for_documents() {
        let mut i = input("data export", ".csv");
        i.content_preview = "name,value\nalpha,bravo";
        let choice = choose_name(&i);
        assert_eq!(choice.name, "data_export");
        assert_eq!(choice.rule, NamingRule::SanitizedStem);
    }

    #[test]
    fn test_source_code_keeps_stem() {
        let mut i = input("my script (v2)", ".py");
        i.content_preview = "import numpy as np\n# Data analysis script";
        let choice = choose_name(&i);
        assert_eq!(choice.name, "my_script__v2_");
        assert_eq!(choice.rule, NamingRule::SourceCode);
    }

    #[test]
    fn test_sanitize_edge_cases() {
        assert_eq!(sanitize("résumé final"), "r_sum__final");
        assert_eq!(sanitize(""), "unnamed");
        assert_eq!(sanitize("keep-this_one9"), "keep-this_one9");
    }

    proptest! {
        #[test]
        fn prop_name_matches_safe_charset(
            stem in ".*",
            ai in ".*",
            preview in ".*",
            date in proptest::option::of(".*"),
            ext in prop::sample::select(vec![".txt", ".py", ".jpg", ".bin", ""]),
        ) {
            let i = NamingInput {
                stem: &stem,
                extension: ext,
                photo_date: date.as_deref(),
                content_preview: &preview,
                ai_suggestion: &ai,
            };
            let out = name(&i);
            prop_assert!(!out.is_empty());
            prop_assert!(
                out.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
                "unsafe name {:?}", out
            );
        }
    }
}
