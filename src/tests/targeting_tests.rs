use std::time::Duration;

use super::PageFixture;
use crate::{
    domain::{ChannelMessage, ElementRole},
    host::{ElementSpec, OverlayKind, RectI},
};

fn highlight_rects(page: &PageFixture) -> Vec<(OverlayKind, Option<RectI>)> {
    page.host
        .overlays()
        .filter(|(_, s)| matches!(s.kind, OverlayKind::Highlight(_)))
        .map(|(_, s)| (s.kind, s.rect))
        .collect()
}

#[test]
fn roles_are_confirmed_one_at_a_time() {
    let mut page = PageFixture::new();
    page.open();
    assert!(page.session.targeting().selection().confirmed.is_empty());

    page.send(ChannelMessage::StartElementSelection {
        element_type: ElementRole::ChatArea,
    });
    assert!(page.session.targeting().is_selecting());
    page.click(page.chat);
    assert_eq!(
        page.session.targeting().selection().confirmed,
        vec![ElementRole::ChatArea]
    );
    assert!(!page.session.targeting().is_complete());

    page.send(ChannelMessage::StartElementSelection {
        element_type: ElementRole::InputArea,
    });
    page.click(page.composer);
    assert!(page.session.targeting().is_complete());

    let announced: Vec<ElementRole> = page
        .received()
        .into_iter()
        .filter_map(|m| match m {
            ChannelMessage::ElementSelected { element_type } => Some(element_type),
            _ => None,
        })
        .collect();
    assert_eq!(announced, vec![ElementRole::ChatArea, ElementRole::InputArea]);
}

#[test]
fn reselecting_chat_replaces_only_its_target() {
    let mut page = PageFixture::new();
    page.open();
    page.select_both();
    let input_target = *page.session.targeting().target(ElementRole::InputArea).unwrap();

    let other = page.host.append_child(
        page.host.root(),
        ElementSpec::new("section").rect(RectI::new(0, 0, 400, 300)),
    );
    page.send(ChannelMessage::StartElementSelection {
        element_type: ElementRole::ChatArea,
    });
    page.click(other);

    assert_eq!(
        page.session.targeting().target(ElementRole::ChatArea).unwrap().node,
        other
    );
    assert_eq!(
        *page.session.targeting().target(ElementRole::InputArea).unwrap(),
        input_target
    );
    assert_eq!(page.session.watched_node(), Some(other));
    assert_eq!(highlight_rects(&page).len(), 2);
    // One content observer for the watcher, one layout observer per highlighted node.
    assert_eq!(page.host.observer_count(), 3);
}

#[test]
fn clicks_outside_selection_mode_are_not_intercepted() {
    let mut page = PageFixture::new();
    page.open();
    assert!(page.host.click(page.chat).is_none());

    page.select_both();
    assert!(!page.session.targeting().is_selecting());
    assert!(page.host.click(page.chat).is_none());
}

#[test]
fn highlights_follow_scroll_immediately() {
    let mut page = PageFixture::new();
    page.open();
    page.select_both();

    page.host.scroll_by(40);
    page.pump(Duration::ZERO);

    let rects = highlight_rects(&page);
    assert!(rects.contains(&(
        OverlayKind::Highlight(ElementRole::ChatArea),
        Some(RectI::new(0, -40, 800, 500))
    )));
    assert!(rects.contains(&(
        OverlayKind::Highlight(ElementRole::InputArea),
        Some(RectI::new(10, 490, 780, 60))
    )));
}

#[test]
fn highlight_hides_when_its_node_disappears() {
    let mut page = PageFixture::new();
    page.open();
    page.select_both();

    page.host.remove(page.chat);
    page.host.resize(RectI::new(0, 0, 640, 480));
    page.pump(Duration::from_millis(500));

    let rects = highlight_rects(&page);
    assert!(rects.contains(&(OverlayKind::Highlight(ElementRole::ChatArea), None)));
}
