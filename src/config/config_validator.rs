use std::{fmt::Write as _, ops::RangeInclusive};

use chat_bridge_core::lang;

use super::RawConfig;

const DEBOUNCE_RANGE_MS: RangeInclusive<u64> = 1..=10_000;

pub fn find_config_problems(raw: &RawConfig) -> Vec<String> {
    let mut problems = Vec::new();

    let langs = &raw.selected_languages;
    if !lang::is_valid_pair(&langs.my.code, &langs.partner.code) {
        problems.push(format!(
            "unsupported language pair '{}' -> '{}'",
            langs.my.code, langs.partner.code
        ));
    }

    let t = &raw.timing;
    let windows = [
        ("watchDebounceMs", t.watch_debounce_ms),
        ("hoverDebounceMs", t.hover_debounce_ms),
        ("highlightDebounceMs", t.highlight_debounce_ms),
        ("translateDebounceMs", t.translate_debounce_ms),
    ];
    problems.extend(
        windows
            .iter()
            .filter(|(_, ms)| !DEBOUNCE_RANGE_MS.contains(ms))
            .map(|(name, ms)| {
                format!(
                    "'{name}' is {ms} ms, expected {}..={} ms",
                    DEBOUNCE_RANGE_MS.start(),
                    DEBOUNCE_RANGE_MS.end()
                )
            }),
    );

    if t.notice_ttl_ms == 0 {
        problems.push("'noticeTtlMs' must be positive".to_string());
    }

    problems
}

impl RawConfig {
    pub fn validate(&self) -> Result<(), String> {
        let problems = find_config_problems(self);
        if problems.is_empty() {
            return Ok(());
        }

        let mut error = String::from("Invalid configuration:\n");
        for p in &problems {
            // Writing into a String cannot fail.
            let _ = writeln!(error, "- {p}");
        }
        Err(error)
    }
}
