//! Translation backend seam and the per-direction translator holder.

use std::collections::{HashMap, HashSet};

use chat_bridge_core::lang::{self, LanguagePair};

use super::notifier::NoticeLevel;
use crate::errors::TranslationError;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Availability {
    No,
    AfterDownload,
    Readily,
}

impl Availability {
    pub fn as_str(self) -> &'static str {
        match self {
            Availability::No => "no",
            Availability::AfterDownload => "after-download",
            Availability::Readily => "readily",
        }
    }
}

pub trait Translator {
    /// Waits until the model is available locally.
    fn ready(&mut self) -> Result<(), TranslationError>;

    fn translate(&self, text: &str) -> Result<String, TranslationError>;
}

pub trait TranslationBackend {
    fn can_translate(&self, pair: &LanguagePair) -> Availability;

    fn create_translator(
        &self,
        pair: &LanguagePair,
    ) -> Result<Box<dyn Translator>, TranslationError>;
}

/// User-facing message produced while setting up a translator.
pub type NoticeDraft = (NoticeLevel, String);

/// Translator for one direction, or nothing when that direction is unavailable.
pub struct TranslationService {
    pair: LanguagePair,
    translator: Option<Box<dyn Translator>>,
}

impl std::fmt::Debug for TranslationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TranslationService")
            .field("pair", &self.pair)
            .field("available", &self.translator.is_some())
            .finish()
    }
}

impl TranslationService {
    pub fn unavailable(pair: LanguagePair) -> Self {
        Self {
            pair,
            translator: None,
        }
    }

    pub fn setup<B: TranslationBackend + ?Sized>(
        backend: &B,
        pair: LanguagePair,
    ) -> (Self, Vec<NoticeDraft>) {
        let mut notices = Vec::new();
        let availability = backend.can_translate(&pair);
        tracing::debug!(
            source = %pair.source,
            target = %pair.target,
            availability = availability.as_str(),
            "translator setup"
        );

        let created = match availability {
            Availability::No => {
                notices.push((
                    NoticeLevel::Error,
                    "No translation available for this language pair".to_string(),
                ));
                return (Self::unavailable(pair), notices);
            }
            Availability::AfterDownload => {
                notices.push((
                    NoticeLevel::Warning,
                    "Translation needs to be downloaded".to_string(),
                ));
                backend
                    .create_translator(&pair)
                    .and_then(|mut t| t.ready().map(|()| t))
            }
            Availability::Readily => backend.create_translator(&pair),
        };

        match created {
            Ok(translator) => (
                Self {
                    pair,
                    translator: Some(translator),
                },
                notices,
            ),
            Err(e) => {
                tracing::warn!(error = %e, "translator setup failed");
                notices.push((NoticeLevel::Error, "Error setting translation".to_string()));
                (Self::unavailable(pair), notices)
            }
        }
    }

    pub fn pair(&self) -> &LanguagePair {
        &self.pair
    }

    pub fn is_available(&self) -> bool {
        self.translator.is_some()
    }

    /// `Ok(None)` when this direction has no translator. A failed translation makes the
    /// direction unavailable.
    pub fn translate(&mut self, text: &str) -> Result<Option<String>, TranslationError> {
        let Some(translator) = self.translator.as_ref() else {
            return Ok(None);
        };
        if text.trim().is_empty() {
            return Ok(Some(String::new()));
        }

        match translator.translate(text) {
            Ok(out) => Ok(Some(out)),
            Err(e) => {
                self.translator = None;
                Err(e)
            }
        }
    }
}

/// Deterministic backend that tags text with the target language, e.g. `[ES] hola`.
///
/// Every catalog pair is readily available unless configured otherwise.
#[derive(Debug, Clone, Default)]
pub struct TaggingBackend {
    availability: HashMap<LanguagePair, Availability>,
    failing_creation: HashSet<LanguagePair>,
    failing_translation: HashSet<LanguagePair>,
}

impl TaggingBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_availability(mut self, pair: LanguagePair, availability: Availability) -> Self {
        self.availability.insert(pair, availability);
        self
    }

    pub fn failing_creation(mut self, pair: LanguagePair) -> Self {
        self.failing_creation.insert(pair);
        self
    }

    pub fn failing_translation(mut self, pair: LanguagePair) -> Self {
        self.failing_translation.insert(pair);
        self
    }
}

impl TranslationBackend for TaggingBackend {
    fn can_translate(&self, pair: &LanguagePair) -> Availability {
        if !lang::is_valid_pair(&pair.source, &pair.target) {
            return Availability::No;
        }
        self.availability
            .get(pair)
            .copied()
            .unwrap_or(Availability::Readily)
    }

    fn create_translator(
        &self,
        pair: &LanguagePair,
    ) -> Result<Box<dyn Translator>, TranslationError> {
        if self.failing_creation.contains(pair) {
            return Err(TranslationError::Create(format!(
                "{} -> {}",
                pair.source, pair.target
            )));
        }
        Ok(Box::new(TaggingTranslator {
            tag: pair.target.to_uppercase(),
            downloaded: self.can_translate(pair) == Availability::Readily,
            fails: self.failing_translation.contains(pair),
        }))
    }
}

#[derive(Debug)]
struct TaggingTranslator {
    tag: String,
    downloaded: bool,
    fails: bool,
}

impl Translator for TaggingTranslator {
    fn ready(&mut self) -> Result<(), TranslationError> {
        self.downloaded = true;
        Ok(())
    }

    fn translate(&self, text: &str) -> Result<String, TranslationError> {
        if !self.downloaded {
            return Err(TranslationError::Download("model not downloaded".to_string()));
        }
        if self.fails {
            return Err(TranslationError::Translate(format!("{} rejected", self.tag)));
        }
        Ok(format!("[{}] {}", self.tag, text.trim()))
    }
}
