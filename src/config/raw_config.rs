use serde::Deserialize;

use super::{Config, SelectedLanguages, Timing};

/// Unvalidated shape of the config file. Missing sections fall back to defaults.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawConfig {
    pub selected_languages: SelectedLanguages,
    pub timing: Timing,
}

impl Default for RawConfig {
    fn default() -> Self {
        let Config {
            selected_languages,
            timing,
        } = Config::default();
        Self {
            selected_languages,
            timing,
        }
    }
}
