mod config_validator;
pub mod raw_config;
pub mod store;

use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use chat_bridge_core::lang::{self, LanguagePair};
pub use raw_config::RawConfig;
use serde::{Deserialize, Deserializer, Serialize};
pub use store::{ConfyStore, MemoryStore, SettingsStore};

use crate::errors::ConfigError;

const APP_NAME: &str = "chat-bridge";
const CONFIG_NAME: &str = "config";
const CONFIG_FILE: &str = "config.toml";
pub const HOME_VAR: &str = "CHAT_BRIDGE_HOME";

const DEFAULT_PARTNER: &str = "es";
const FALLBACK_MY: &str = "en";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageChoice {
    pub code: String,
    pub display_name: String,
}

impl LanguageChoice {
    pub fn from_code(code: &str) -> Self {
        Self {
            code: code.to_string(),
            display_name: lang::display_name(code).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectedLanguages {
    pub partner: LanguageChoice,
    pub my: LanguageChoice,
}

impl SelectedLanguages {
    pub fn new(my: &str, partner: &str) -> Self {
        Self {
            partner: LanguageChoice::from_code(partner),
            my: LanguageChoice::from_code(my),
        }
    }

    pub fn my_to_partner(&self) -> LanguagePair {
        LanguagePair::new(&self.my.code, &self.partner.code)
    }

    pub fn partner_to_my(&self) -> LanguagePair {
        self.my_to_partner().reversed()
    }

    pub fn is_valid(&self) -> bool {
        lang::is_valid_pair(&self.my.code, &self.partner.code)
    }
}

impl Default for SelectedLanguages {
    fn default() -> Self {
        let my = system_language()
            .filter(|code| lang::is_valid_pair(code, DEFAULT_PARTNER))
            .unwrap_or_else(|| FALLBACK_MY.to_string());
        Self::new(&my, DEFAULT_PARTNER)
    }
}

/// Primary subtag of the OS locale, e.g. `de` for `de-AT`.
pub fn system_language() -> Option<String> {
    let locale = sys_locale::get_locale()?;
    let primary = locale.split(['-', '_']).next()?.to_ascii_lowercase();
    (!primary.is_empty()).then_some(primary)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub watch_debounce_ms: u64,
    pub hover_debounce_ms: u64,
    pub highlight_debounce_ms: u64,
    pub translate_debounce_ms: u64,
    pub notice_ttl_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            watch_debounce_ms: 500,
            hover_debounce_ms: 50,
            highlight_debounce_ms: 100,
            translate_debounce_ms: 500,
            notice_ttl_ms: 3000,
        }
    }
}

impl Timing {
    pub fn watch_debounce(&self) -> Duration {
        Duration::from_millis(self.watch_debounce_ms)
    }

    pub fn hover_debounce(&self) -> Duration {
        Duration::from_millis(self.hover_debounce_ms)
    }

    pub fn highlight_debounce(&self) -> Duration {
        Duration::from_millis(self.highlight_debounce_ms)
    }

    pub fn translate_debounce(&self) -> Duration {
        Duration::from_millis(self.translate_debounce_ms)
    }

    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    pub selected_languages: SelectedLanguages,
    pub timing: Timing,
}

/// `$CHAT_BRIDGE_HOME/config.toml` when the variable is set, otherwise confy's
/// per-user location.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    if let Some(home) = std::env::var_os(HOME_VAR) {
        return Ok(PathBuf::from(home).join(CONFIG_FILE));
    }
    confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
        .map_err(|e| ConfigError::Location(e.to_string()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), ConfigError> {
    let Some(dir) = path.parent() else {
        return Ok(());
    };
    std::fs::create_dir_all(dir)?;
    Ok(())
}

pub fn load() -> Result<Config, ConfigError> {
    let path = config_path()?;
    load_from(&path)
}

/// Loads the config at `path`, writing the defaults there first if it does not exist.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    ensure_parent_dir(path)?;
    Ok(confy::load_path(path)?)
}

pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path()?;
    save_to(&path, cfg)
}

pub fn save_to(path: &Path, cfg: &Config) -> Result<(), ConfigError> {
    ensure_parent_dir(path)?;
    confy::store_path(path, cfg)?;
    Ok(())
}

impl TryFrom<RawConfig> for Config {
    type Error = String;

    fn try_from(raw: RawConfig) -> Result<Self, Self::Error> {
        raw.validate()?;

        Ok(Self {
            selected_languages: raw.selected_languages,
            timing: raw.timing,
        })
    }
}

impl<'de> Deserialize<'de> for Config {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawConfig::deserialize(deserializer)?;
        Self::try_from(raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_languages_form_a_valid_pair() {
        let langs = SelectedLanguages::default();
        assert_eq!(langs.partner.code, "es");
        assert!(langs.is_valid());
    }

    #[test]
    fn pair_directions() {
        let langs = SelectedLanguages::new("en", "ja");
        assert_eq!(langs.my_to_partner(), LanguagePair::new("en", "ja"));
        assert_eq!(langs.partner_to_my(), LanguagePair::new("ja", "en"));
        assert_eq!(langs.partner.display_name, "Japanese");
    }
}
