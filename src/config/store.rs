use std::path::PathBuf;

use super::{Config, SelectedLanguages, config_path, load_from, save_to};
use crate::errors::ConfigError;

/// Persisted key-value settings used by the side panel.
pub trait SettingsStore {
    /// `None` when nothing has been stored yet.
    fn load_languages(&mut self) -> Result<Option<SelectedLanguages>, ConfigError>;

    fn store_languages(&mut self, languages: &SelectedLanguages) -> Result<(), ConfigError>;
}

/// Stores settings inside the confy-managed config file.
#[derive(Debug, Clone)]
pub struct ConfyStore {
    path: PathBuf,
}

impl ConfyStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the default config location.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::new(config_path()?))
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl SettingsStore for ConfyStore {
    fn load_languages(&mut self) -> Result<Option<SelectedLanguages>, ConfigError> {
        if !self.path.exists() {
            return Ok(None);
        }
        Ok(Some(load_from(&self.path)?.selected_languages))
    }

    fn store_languages(&mut self, languages: &SelectedLanguages) -> Result<(), ConfigError> {
        let mut cfg = if self.path.exists() {
            load_from(&self.path)?
        } else {
            Config::default()
        };
        cfg.selected_languages = languages.clone();
        save_to(&self.path, &cfg)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    languages: Option<SelectedLanguages>,
    writes: usize,
}

impl MemoryStore {
    pub fn with_languages(languages: SelectedLanguages) -> Self {
        Self {
            languages: Some(languages),
            writes: 0,
        }
    }

    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl SettingsStore for MemoryStore {
    fn load_languages(&mut self) -> Result<Option<SelectedLanguages>, ConfigError> {
        Ok(self.languages.clone())
    }

    fn store_languages(&mut self, languages: &SelectedLanguages) -> Result<(), ConfigError> {
        self.languages = Some(languages.clone());
        self.writes += 1;
        Ok(())
    }
}
