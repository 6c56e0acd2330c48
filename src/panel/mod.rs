//! Presenting side: language selection, translation and reply composition.
//!
//! The panel owns its own virtual clock for translation debouncing and notice expiry.
//! The embedding application forwards elapsed time through [`SidePanel::advance`] and
//! polls the channel through [`SidePanel::poll`].

pub mod notifier;
pub mod translation;

use std::time::Duration;

use chat_bridge_core::{
    lang,
    timing::{Debouncer, TimerQueue},
};
pub use notifier::{Notice, NoticeLevel, Notifier};
pub use translation::{
    Availability, TaggingBackend, TranslationBackend, TranslationService, Translator,
};

use crate::{
    channel::{CHANNEL_NAME, Channel, ChannelEvent, ContextId, Transport},
    config::{SelectedLanguages, SettingsStore, Timing},
    domain::{ChannelMessage, ElementRole},
    errors::{ChannelError, ConfigError},
};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Texts {
    pub partner: String,
    pub partner_translation: String,
    pub my: String,
    pub my_translation: String,
}

pub struct SidePanel<T: Transport, B: TranslationBackend, S: SettingsStore> {
    channel: Channel<T>,
    backend: B,
    store: S,
    timers: TimerQueue,
    languages: SelectedLanguages,
    my_to_partner: TranslationService,
    partner_to_my: TranslationService,
    texts: Texts,
    partner_pending: Debouncer<String>,
    my_pending: Debouncer<String>,
    notices: Notifier,
    tab: Option<u32>,
}

impl<T: Transport, B: TranslationBackend, S: SettingsStore> SidePanel<T, B, S> {
    pub fn new(transport: T, backend: B, store: S, timing: &Timing) -> Self {
        let languages = SelectedLanguages::default();
        Self {
            channel: Channel::new(transport, CHANNEL_NAME),
            backend,
            store,
            timers: TimerQueue::new(),
            my_to_partner: TranslationService::unavailable(languages.my_to_partner()),
            partner_to_my: TranslationService::unavailable(languages.partner_to_my()),
            languages,
            texts: Texts::default(),
            partner_pending: Debouncer::new(timing.translate_debounce()),
            my_pending: Debouncer::new(timing.translate_debounce()),
            notices: Notifier::new(timing.notice_ttl()),
            tab: None,
        }
    }

    pub fn texts(&self) -> &Texts {
        &self.texts
    }

    pub fn languages(&self) -> &SelectedLanguages {
        &self.languages
    }

    pub fn notices(&self) -> &Notifier {
        &self.notices
    }

    /// Removes the oldest visible notice, as the user dismissing it does.
    pub fn dismiss_notice(&mut self) -> Option<Notice> {
        self.notices.drain_one(&mut self.timers)
    }

    pub fn channel(&self) -> &Channel<T> {
        &self.channel
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn translators_ready(&self) -> (bool, bool) {
        (
            self.my_to_partner.is_available(),
            self.partner_to_my.is_available(),
        )
    }

    /// Connects to `tab`, announces the panel and prepares translators.
    pub fn open(&mut self, tab: u32) -> Result<(), ChannelError> {
        self.texts = Texts::default();
        self.partner_pending.cancel(&mut self.timers);
        self.my_pending.cancel(&mut self.timers);
        self.tab = Some(tab);

        match self.store.load_languages() {
            Ok(Some(stored)) if stored.is_valid() => self.languages = stored,
            Ok(Some(stored)) => tracing::warn!(
                my = %stored.my.code,
                partner = %stored.partner.code,
                "stored language pair is not supported, using defaults"
            ),
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "could not load stored languages"),
        }
        self.setup_translators();

        let connected = self
            .channel
            .connect(ContextId::tab(tab))
            .and_then(|()| self.channel.send(&ChannelMessage::SidePanelOpened { tab_id: tab }));
        if let Err(e) = &connected {
            tracing::warn!(error = %e, tab, "could not reach the page");
            self.notify(NoticeLevel::Error, "Could not connect to the page");
        }
        connected
    }

    /// Takes over a connection the embedded side opened towards the panel.
    pub fn adopt(&mut self, port: T::Port, peer: ContextId) {
        self.channel.adopt(port, peer);
    }

    pub fn close(&mut self) {
        if self.channel.is_open()
            && let Err(e) = self.channel.send(&ChannelMessage::SidePanelClosed)
        {
            tracing::debug!(error = %e, "close notice not delivered");
        }
        self.channel.disconnect();
        self.partner_pending.cancel(&mut self.timers);
        self.my_pending.cancel(&mut self.timers);
        self.notices.clear(&mut self.timers);
        self.tab = None;
    }

    pub fn poll(&mut self) {
        for event in self.channel.poll() {
            match event {
                ChannelEvent::Message(message) => self.dispatch(message),
                ChannelEvent::Disconnected => {
                    self.channel.disconnect();
                    self.notify(NoticeLevel::Warning, "Connection to the page was lost");
                }
            }
        }
    }

    fn dispatch(&mut self, message: ChannelMessage) {
        match message {
            ChannelMessage::ChatMessageDetected { text } => {
                self.texts.partner = text.clone();
                self.partner_pending.call(&mut self.timers, text);
            }
            ChannelMessage::ElementSelected { element_type } => {
                let text = format!("{} selected", capitalize(element_type.label()));
                self.notify(NoticeLevel::Success, &text);
            }
            ChannelMessage::CloseSidePanel => {
                tracing::info!("page asked the panel to close");
                self.close();
            }
            other => {
                tracing::warn!(
                    message_type = other.type_name(),
                    "ignoring message not meant for the panel"
                );
            }
        }
    }

    /// Advances the panel clock, running settled translations and expiring notices.
    pub fn advance(&mut self, delta: Duration) {
        for id in self.timers.advance_by(delta) {
            if let Some(text) = self.partner_pending.fire(id) {
                if let Some(out) = self.run_translation(Direction::PartnerToMy, &text) {
                    self.texts.partner_translation = out;
                }
            } else if let Some(text) = self.my_pending.fire(id) {
                if let Some(out) = self.run_translation(Direction::MyToPartner, &text) {
                    self.texts.my_translation = out;
                }
            } else {
                self.notices.on_timer(id);
            }
        }
    }

    pub fn set_my_text(&mut self, text: &str) {
        self.texts.my = text.to_string();
        self.my_pending.call(&mut self.timers, text.to_string());
    }

    /// Asks the page to start manual selection of `role`.
    pub fn request_selection(&mut self, role: ElementRole) -> Result<(), ChannelError> {
        let sent = self
            .channel
            .send(&ChannelMessage::StartElementSelection { element_type: role });
        if sent.is_err() {
            self.notify(NoticeLevel::Warning, "Selection request could not be delivered");
        }
        sent
    }

    /// Sends the reply: its translation when there is one, otherwise the text as typed.
    pub fn send_reply(&mut self) -> Result<(), ChannelError> {
        let original = self.texts.my.clone();
        let text = if self.texts.my_translation.is_empty() {
            original.clone()
        } else {
            self.texts.my_translation.clone()
        };
        let partner_translation =
            (!self.texts.partner_translation.is_empty()).then(|| self.texts.partner_translation.clone());

        let sent = self.channel.send(&ChannelMessage::InjectTextIntoChat {
            text,
            original_text: Some(original),
            partner_translation,
        });
        if sent.is_err() {
            self.notify(NoticeLevel::Warning, "Reply could not be delivered");
        }
        sent
    }

    /// Switches languages, persists them and re-translates the current reply.
    pub fn set_languages(&mut self, my: &str, partner: &str) -> Result<(), ConfigError> {
        if !lang::is_valid_pair(my, partner) {
            self.notify(NoticeLevel::Error, "Unsupported language pair");
            return Err(ConfigError::Invalid(format!(
                "unsupported language pair '{my}' -> '{partner}'"
            )));
        }

        self.languages = SelectedLanguages::new(my, partner);
        self.setup_translators();
        self.store.store_languages(&self.languages)?;

        let text = format!(
            "Language pair updated to {} to {}",
            self.languages.partner.display_name, self.languages.my.display_name
        );
        self.notify(NoticeLevel::Success, &text);

        let mine = self.texts.my.clone();
        self.texts.my_translation.clear();
        self.my_pending.call(&mut self.timers, mine);
        Ok(())
    }

    fn setup_translators(&mut self) {
        let (to_partner, mut notices) =
            TranslationService::setup(&self.backend, self.languages.my_to_partner());

        let to_me = if to_partner.is_available() {
            let (svc, more) = TranslationService::setup(&self.backend, self.languages.partner_to_my());
            notices.extend(more);
            svc
        } else {
            TranslationService::unavailable(self.languages.partner_to_my())
        };

        self.my_to_partner = to_partner;
        self.partner_to_my = to_me;
        for (level, text) in notices {
            self.notify(level, &text);
        }
    }

    fn run_translation(&mut self, direction: Direction, text: &str) -> Option<String> {
        let service = match direction {
            Direction::MyToPartner => &mut self.my_to_partner,
            Direction::PartnerToMy => &mut self.partner_to_my,
        };

        match service.translate(text) {
            Ok(out) => Some(out.unwrap_or_default()),
            Err(e) => {
                tracing::warn!(error = %e, direction = direction.as_str(), "translation failed");
                self.notify(NoticeLevel::Error, "Translation failed");
                None
            }
        }
    }

    fn notify(&mut self, level: NoticeLevel, text: &str) {
        self.notices.push(&mut self.timers, level, text);
    }
}

#[derive(Copy, Clone, Debug)]
enum Direction {
    MyToPartner,
    PartnerToMy,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::MyToPartner => "my_to_partner",
            Direction::PartnerToMy => "partner_to_my",
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use chat_bridge_core::lang::LanguagePair;

    use super::*;
    use crate::{
        channel::{LoopbackHub, LoopbackPort, LoopbackTransport, Port, PortEvent},
        config::MemoryStore,
        domain::encode,
    };

    type Panel = SidePanel<LoopbackTransport, TaggingBackend, MemoryStore>;

    const SETTLE: Duration = Duration::from_millis(500);

    fn open_panel(backend: TaggingBackend, store: MemoryStore) -> (LoopbackHub, Panel, LoopbackPort) {
        let hub = LoopbackHub::new();
        hub.listen(ContextId::tab(3));
        let mut panel = SidePanel::new(
            hub.transport(ContextId::panel()),
            backend,
            store,
            &Timing::default(),
        );
        panel.open(3).unwrap();
        let page = hub.accept(&ContextId::tab(3)).pop().unwrap().port;
        (hub, panel, page)
    }

    fn received(page: &mut LoopbackPort) -> Vec<String> {
        page.poll()
            .into_iter()
            .filter_map(|e| match e {
                PortEvent::Message(m) => Some(m),
                PortEvent::Disconnected => None,
            })
            .collect()
    }

    #[test]
    fn open_announces_panel_and_uses_stored_languages() {
        let store = MemoryStore::with_languages(SelectedLanguages::new("en", "de"));
        let (_hub, panel, mut page) = open_panel(TaggingBackend::new(), store);

        assert_eq!(received(&mut page), vec![r#"{"type":"sidePanelOpened","tabId":3}"#]);
        assert_eq!(panel.languages().partner.code, "de");
        assert_eq!(panel.translators_ready(), (true, true));
    }

    #[test]
    fn partner_text_is_translated_after_quiet_period() {
        let store = MemoryStore::with_languages(SelectedLanguages::new("es", "en"));
        let (_hub, mut panel, mut page) = open_panel(TaggingBackend::new(), store);

        let raw = encode(&ChannelMessage::ChatMessageDetected { text: "there".into() }).unwrap();
        page.post(&raw).unwrap();
        panel.poll();
        assert_eq!(panel.texts().partner, "there");
        assert!(panel.texts().partner_translation.is_empty());

        panel.advance(SETTLE);
        assert_eq!(panel.texts().partner_translation, "[ES] there");
    }

    #[test]
    fn reply_falls_back_to_typed_text_without_translation() {
        let store = MemoryStore::with_languages(SelectedLanguages::new("en", "es"));
        let (_hub, mut panel, mut page) = open_panel(TaggingBackend::new(), store);
        received(&mut page);

        panel.set_my_text("Bye");
        panel.send_reply().unwrap();
        assert_eq!(
            received(&mut page),
            vec![r#"{"type":"injectTextIntoChat","text":"Bye","originalText":"Bye"}"#]
        );

        panel.set_my_text("Bye");
        panel.advance(SETTLE);
        panel.send_reply().unwrap();
        assert_eq!(
            received(&mut page),
            vec![r#"{"type":"injectTextIntoChat","text":"[ES] Bye","originalText":"Bye"}"#]
        );
    }

    #[test]
    fn second_direction_is_skipped_when_first_is_unavailable() {
        let backend = TaggingBackend::new().failing_creation(LanguagePair::new("en", "es"));
        let store = MemoryStore::with_languages(SelectedLanguages::new("en", "es"));
        let (_hub, panel, _page) = open_panel(backend, store);
        assert_eq!(panel.translators_ready(), (false, false));
        assert_eq!(panel.notices().latest().unwrap().level, NoticeLevel::Error);
    }

    #[test]
    fn set_languages_validates_persists_and_retranslates() {
        let (_hub, mut panel, _page) = open_panel(TaggingBackend::new(), MemoryStore::default());
        panel.set_my_text("hello");
        panel.advance(SETTLE);

        assert!(panel.set_languages("es", "fr").is_err());
        assert_eq!(panel.store().writes(), 0);

        panel.set_languages("en", "ja").unwrap();
        assert_eq!(panel.store().writes(), 1);
        assert_eq!(panel.notices().latest().unwrap().level, NoticeLevel::Success);
        panel.advance(SETTLE);
        assert_eq!(panel.texts().my_translation, "[JA] hello");
    }

    #[test]
    fn element_selected_and_disconnect_raise_notices() {
        let (_hub, mut panel, mut page) = open_panel(TaggingBackend::new(), MemoryStore::default());
        let raw = encode(&ChannelMessage::ElementSelected {
            element_type: ElementRole::ChatArea,
        })
        .unwrap();
        page.post(&raw).unwrap();
        panel.poll();
        assert_eq!(panel.notices().latest().unwrap().text, "Chat area selected");

        page.close();
        panel.poll();
        assert_eq!(panel.notices().latest().unwrap().level, NoticeLevel::Warning);
        assert!(!panel.channel().is_open());

        panel.advance(Duration::from_secs(3));
        assert!(panel.notices().latest().is_none());
    }

    #[test]
    fn undeliverable_selection_request_raises_a_notice() {
        let (hub, mut panel, _page) = open_panel(TaggingBackend::new(), MemoryStore::default());
        while panel.dismiss_notice().is_some() {}

        hub.sever(&ContextId::tab(3));
        hub.refuse(ContextId::tab(3));
        let err = panel.request_selection(ElementRole::ChatArea).unwrap_err();
        assert!(matches!(err, ChannelError::Dropped { .. }));

        let notice = panel.notices().latest().unwrap();
        assert_eq!(notice.level, NoticeLevel::Warning);
        assert_eq!(notice.text, "Selection request could not be delivered");
    }

    #[test]
    fn close_clears_notices() {
        let (_hub, mut panel, _page) = open_panel(TaggingBackend::new(), MemoryStore::default());
        panel.set_languages("en", "ja").unwrap();
        assert!(panel.notices().latest().is_some());

        panel.close();
        assert!(panel.notices().latest().is_none());
        assert!(panel.dismiss_notice().is_none());
    }
}
