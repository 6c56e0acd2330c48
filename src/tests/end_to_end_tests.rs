use std::time::Duration;

use chat_bridge_core::lang::LanguagePair;

use super::{PageFixture, TAB, WATCH};
use crate::{
    bridge::LocalBridge,
    config::{MemoryStore, SelectedLanguages, Timing},
    domain::ChannelMessage,
    embedded::HeuristicDetector,
    host::{ElementSpec, HostTree, MemoryTree, RectI},
    panel::{TaggingBackend, TranslationService},
};

#[test]
fn partner_text_is_forwarded_and_own_reply_is_not_echoed() {
    let mut page = PageFixture::new();
    page.host.set_text(page.chat, "Hi");
    page.open();
    page.select_both();
    assert_eq!(page.detected_texts(), vec!["Hi".to_string()]);

    page.host.append_text(page.chat, " there");
    page.pump(WATCH);
    let detected = page.detected_texts();
    assert_eq!(detected, vec!["there".to_string()]);

    let (mut to_me, _) =
        TranslationService::setup(&TaggingBackend::new(), LanguagePair::new("en", "es"));
    let translated = to_me.translate(&detected[0]).unwrap().unwrap();
    assert_eq!(translated, "[ES] there");

    page.send(ChannelMessage::InjectTextIntoChat {
        text: "Adiós".into(),
        original_text: Some("Goodbye".into()),
        partner_translation: Some(translated.clone()),
    });
    assert_eq!(page.host.value(page.input), Some("Adiós"));
    assert_eq!(page.session.baseline().last_self_text, "Adiós");
    assert_eq!(page.session.baseline().observed_len, "Hi there".len());

    let entry = page.session.history().last().unwrap();
    assert_eq!(entry.remote_text, "Hi\nthere");
    assert_eq!(entry.remote_translation, "[ES] there");
    assert_eq!(entry.local_text, "Goodbye");
    assert_eq!(entry.local_translation, "Adiós");

    page.host.append_text(page.chat, " Adiós");
    page.pump(WATCH);
    assert_eq!(page.chat_text(), "Hi there Adiós");
    assert!(page.detected_texts().is_empty());
    assert_eq!(page.session.baseline().observed_len, "Hi there Adiós".len());
}

#[test]
fn text_after_the_echo_is_still_reported() {
    let mut page = PageFixture::new();
    page.open();
    page.select_both();

    page.send(ChannelMessage::InjectTextIntoChat {
        text: "hello".into(),
        original_text: None,
        partner_translation: None,
    });
    page.host.append_text(page.chat, "hello world");
    page.pump(WATCH);
    assert_eq!(page.detected_texts(), vec!["world".to_string()]);
}

#[test]
fn wholesale_replacement_is_reported_in_full() {
    let mut page = PageFixture::new();
    page.host.set_text(page.chat, "a long conversation");
    page.open();
    page.select_both();
    page.received();

    page.host.set_text(page.chat, "fresh");
    page.pump(WATCH);
    assert_eq!(page.detected_texts(), vec!["fresh".to_string()]);
}

fn chat_page() -> (MemoryTree, crate::host::NodeId, crate::host::NodeId) {
    let mut page = MemoryTree::new(RectI::new(0, 0, 1024, 768));
    let root = page.root();
    let log = page.append_child(
        root,
        ElementSpec::new("div")
            .class("thread-view")
            .attr("role", "log")
            .attr("aria-live", "polite")
            .scrollable()
            .rect(RectI::new(0, 0, 1024, 680)),
    );
    let input = page.append_child(
        root,
        ElementSpec::new("div")
            .attr("contenteditable", "true")
            .class("editor")
            .rect(RectI::new(0, 700, 1024, 60)),
    );
    (page, log, input)
}

#[test]
fn full_bridge_detects_translates_and_injects() {
    let (page, log, input) = chat_page();
    let mut bridge = LocalBridge::new(
        page,
        TAB,
        &Timing::default(),
        Box::new(HeuristicDetector),
        TaggingBackend::new(),
        MemoryStore::with_languages(SelectedLanguages::new("es", "en")),
    );
    let settle = Duration::from_millis(1100);

    bridge.panel.open(TAB).unwrap();
    bridge.run_for(Duration::from_millis(50));
    assert!(bridge.session.targeting().is_complete());
    assert_eq!(bridge.session.watched_node(), Some(log));

    bridge.page.append_child(log, ElementSpec::new("p").text("Hi"));
    bridge.run_for(settle);
    bridge.page.append_child(log, ElementSpec::new("p").text(" there"));
    bridge.run_for(settle);
    assert_eq!(bridge.panel.texts().partner, "there");
    assert_eq!(bridge.panel.texts().partner_translation, "[ES] there");

    bridge.panel.set_my_text("Adiós");
    bridge.run_for(settle);
    assert_eq!(bridge.panel.texts().my_translation, "[EN] Adiós");
    bridge.panel.send_reply().unwrap();
    bridge.run_for(Duration::from_millis(50));

    assert_eq!(bridge.page.value(input), Some("[EN] Adiós"));
    assert_eq!(bridge.page.text_content(input).unwrap(), "[EN] Adiós");
    let entry = bridge.session.history().last().unwrap();
    assert_eq!(entry.local_text, "Adiós");
    assert_eq!(entry.remote_translation, "[ES] there");

    bridge
        .page
        .append_child(log, ElementSpec::new("p").text(" [EN] Adiós"));
    bridge.run_for(settle);
    assert_eq!(bridge.panel.texts().partner, "there");
}
