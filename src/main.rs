use std::{path::PathBuf, time::Duration};

use chat_bridge::{
    bridge::LocalBridge,
    config::{self, Config, MemoryStore},
    embedded::HeuristicDetector,
    host::{ElementSpec, MemoryTree, NodeId, RectI},
    panel::TaggingBackend,
    utils::tracing::{init_file_tracing, init_tracing},
};

const TAB: u32 = 1;
const LOG_DIR_VAR: &str = "CHAT_BRIDGE_LOG_DIR";

/// A minimal chat page: a message log above a composer.
fn chat_page() -> (MemoryTree, NodeId, NodeId) {
    let mut page = MemoryTree::new(RectI::new(0, 0, 1024, 768));
    let root = page.root();
    let log = page.append_child(
        root,
        ElementSpec::new("div")
            .class("message-list")
            .attr("role", "log")
            .attr("aria-live", "polite")
            .scrollable()
            .rect(RectI::new(0, 0, 1024, 680)),
    );
    let input = page.append_child(
        root,
        ElementSpec::new("textarea")
            .class("composer-input")
            .attr("spellcheck", "true")
            .rect(RectI::new(0, 700, 1024, 60)),
    );
    (page, log, input)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    match std::env::var_os(LOG_DIR_VAR) {
        Some(dir) => init_file_tracing(&PathBuf::from(dir)),
        None => init_tracing(),
    }

    let cfg = config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "config unavailable, using defaults");
        Config::default()
    });

    let (page, log, input) = chat_page();
    let mut bridge = LocalBridge::new(
        page,
        TAB,
        &cfg.timing,
        Box::new(HeuristicDetector),
        TaggingBackend::new(),
        MemoryStore::with_languages(cfg.selected_languages.clone()),
    );
    let settle = cfg.timing.watch_debounce() + cfg.timing.translate_debounce();

    bridge.panel.open(TAB)?;
    bridge.run_for(Duration::from_millis(50));

    bridge.page.append_child(log, ElementSpec::new("p").text("Hi"));
    bridge.run_for(settle);
    bridge.page.append_child(log, ElementSpec::new("p").text(" there"));
    bridge.run_for(settle);

    let texts = bridge.panel.texts();
    tracing::info!(
        partner = %texts.partner,
        translation = %texts.partner_translation,
        "partner text received"
    );

    bridge.panel.set_my_text("Adiós");
    bridge.run_for(settle);
    bridge.panel.send_reply()?;
    bridge.run_for(Duration::from_millis(50));

    let injected = bridge.page.value(input).unwrap_or_default().to_string();
    tracing::info!(
        input = %injected,
        exchanges = bridge.session.history().len(),
        "reply injected"
    );

    // The host echoes the submitted reply into the log.
    bridge
        .page
        .append_child(log, ElementSpec::new("p").text(&format!(" {injected}")));
    bridge.run_for(settle);
    tracing::info!(
        last_partner_text = %bridge.panel.texts().partner,
        "self echo suppressed"
    );

    while let Some(notice) = bridge.panel.dismiss_notice() {
        tracing::info!(level = notice.level.as_str(), text = %notice.text, "panel notice");
    }
    tracing::info!(transcript = %bridge.session.history().transcript(), "conversation");
    println!("{}", bridge.session.history().to_json()?);

    bridge.panel.close();
    bridge.run_for(Duration::from_millis(50));
    Ok(())
}
