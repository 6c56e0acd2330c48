// File: src/lang/catalog.rs

/// A language offered for translation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Language {
    pub code: &'static str,
    pub display_name: &'static str,
}

/// Direction of a translation request.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LanguagePair {
    pub source: String,
    pub target: String,
}

impl LanguagePair {
    pub fn new(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    pub fn reversed(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
        }
    }
}

const LANGUAGES: &[Language] = &[
    lang("en", "English"),
    lang("ar", "Arabic"),
    lang("bn", "Bengali"),
    lang("de", "German"),
    lang("es", "Spanish"),
    lang("fr", "French"),
    lang("hi", "Hindi"),
    lang("it", "Italian"),
    lang("ja", "Japanese"),
    lang("ko", "Korean"),
    lang("nl", "Dutch"),
    lang("pl", "Polish"),
    lang("pt", "Portuguese"),
    lang("ru", "Russian"),
    lang("th", "Thai"),
    lang("tr", "Turkish"),
    lang("vi", "Vietnamese"),
    lang("zh", "Chinese (Simplified)"),
    lang("zh-Hant", "Chinese (Traditional)"),
];

// Every supported pair goes through English; pairs are symmetric.
const PAIRS: &[(&str, &str)] = &[
    ("en", "ar"),
    ("en", "bn"),
    ("en", "de"),
    ("en", "es"),
    ("en", "fr"),
    ("en", "hi"),
    ("en", "it"),
    ("en", "ja"),
    ("en", "ko"),
    ("en", "nl"),
    ("en", "pl"),
    ("en", "pt"),
    ("en", "ru"),
    ("en", "th"),
    ("en", "tr"),
    ("en", "vi"),
    ("en", "zh"),
    ("en", "zh-Hant"),
];

const fn lang(code: &'static str, display_name: &'static str) -> Language {
    Language { code, display_name }
}

fn lookup(code: &str) -> Option<Language> {
    LANGUAGES.iter().copied().find(|l| l.code == code)
}

/// Every language that takes part in at least one pair, in catalog order.
pub fn all_languages() -> Vec<Language> {
    LANGUAGES
        .iter()
        .copied()
        .filter(|l| PAIRS.iter().any(|(a, b)| *a == l.code || *b == l.code))
        .collect()
}

/// Languages `source` can be translated into. Unknown codes have no targets.
pub fn target_languages(source: &str) -> Vec<Language> {
    PAIRS
        .iter()
        .filter_map(|&(a, b)| {
            if a == source {
                Some(b)
            } else if b == source {
                Some(a)
            } else {
                None
            }
        })
        .filter_map(lookup)
        .collect()
}

pub fn is_valid_pair(source: &str, target: &str) -> bool {
    PAIRS
        .iter()
        .any(|&(a, b)| (a == source && b == target) || (b == source && a == target))
}

/// Display name for `code`, falling back to the code itself.
pub fn display_name(code: &str) -> &str {
    lookup(code).map_or(code, |l| l.display_name)
}
