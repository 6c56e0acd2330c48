//! Automatic discovery of the chat and input regions.
//!
//! Detection is best effort. Pages it cannot read fall back to manual targeting.

use crate::host::{HostTree, NodeId, NodeInfo};

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DetectedRegions {
    pub chat_area: Option<NodeId>,
    pub input_area: Option<NodeId>,
}

pub trait RegionDetector {
    /// `None` when neither region could be identified.
    fn detect_regions(&self, host: &dyn HostTree) -> Option<DetectedRegions>;
}

/// Disables detection; every page needs manual targeting.
#[derive(Copy, Clone, Debug, Default)]
pub struct ManualOnly;

impl RegionDetector for ManualOnly {
    fn detect_regions(&self, _host: &dyn HostTree) -> Option<DetectedRegions> {
        None
    }
}

const INPUT_TERMS: &[&str] = &["input", "editor", "compose", "textbox", "field"];
const CONTAINER_TERMS: &[&str] = &["container", "list", "view", "thread", "log"];

const INPUT_THRESHOLD: i32 = 3;
const CONTAINER_THRESHOLD: i32 = 4;
const NEAR_BOTTOM_PX: i32 = 100;
const MESSAGE_TEXT_LEN: usize = 20;

/// Scores every element on structural hints and picks the best candidate per role.
#[derive(Copy, Clone, Debug, Default)]
pub struct HeuristicDetector;

impl RegionDetector for HeuristicDetector {
    fn detect_regions(&self, host: &dyn HostTree) -> Option<DetectedRegions> {
        let mut best_input: Option<(i32, NodeId)> = None;
        let mut best_chat: Option<(i32, NodeId)> = None;

        for node in host.elements() {
            let Some(info) = host.describe(node) else {
                continue;
            };

            if info.is_editable() {
                let score = input_score(host, &info);
                if score > INPUT_THRESHOLD && best_input.is_none_or(|(s, _)| score > s) {
                    best_input = Some((score, node));
                }
            } else if is_container_tag(&info) {
                let score = container_score(host, node, &info);
                if score > CONTAINER_THRESHOLD && best_chat.is_none_or(|(s, _)| score > s) {
                    best_chat = Some((score, node));
                }
            }
        }

        let found = DetectedRegions {
            chat_area: best_chat.map(|(_, n)| n),
            input_area: best_input.map(|(_, n)| n),
        };
        tracing::debug!(
            chat_score = best_chat.map(|(s, _)| s),
            input_score = best_input.map(|(s, _)| s),
            "region detection finished"
        );

        if found.chat_area.is_none() && found.input_area.is_none() {
            None
        } else {
            Some(found)
        }
    }
}

fn is_container_tag(info: &NodeInfo) -> bool {
    matches!(info.tag.as_str(), "div" | "section" | "main" | "article")
        || info.attr("role") == Some("log")
}

fn class_hits(info: &NodeInfo, terms: &[&str]) -> i32 {
    let hits: usize = info
        .classes
        .iter()
        .map(|c| {
            let c = c.to_lowercase();
            terms.iter().filter(|t| c.contains(**t)).count()
        })
        .sum();
    i32::try_from(hits).unwrap_or(i32::MAX)
}

fn input_score(host: &dyn HostTree, info: &NodeInfo) -> i32 {
    let mut score = 0;
    let form_control = matches!(info.tag.as_str(), "textarea" | "input");
    let content_editable = info.attr("contenteditable") == Some("true");

    if form_control {
        score += 2;
    }
    if content_editable {
        score += 2;
    }
    if info.attr("role") == Some("textbox") {
        score += 2;
    }
    if info.attr("type") == Some("text") {
        score += 1;
    }
    if form_control || content_editable {
        score += 3;
    }

    score += class_hits(info, INPUT_TERMS);

    if host.viewport().bottom() - info.rect.bottom() < NEAR_BOTTOM_PX {
        score += 2;
    }
    if info.fixed_or_sticky {
        score += 1;
    }
    if info.z_index > 0 {
        score += 1;
    }

    for attr in ["maxlength", "autocomplete", "spellcheck"] {
        if info.has_attr(attr) {
            score += 1;
        }
    }
    score
}

fn container_score(host: &dyn HostTree, node: NodeId, info: &NodeInfo) -> i32 {
    let mut score = 0;

    if info.attr("role") == Some("log") {
        score += 2;
    }
    if info.attr("aria-live") == Some("polite") {
        score += 2;
    }

    score += class_hits(info, CONTAINER_TERMS);

    if info.scrollable {
        score += 3;
    }
    if has_message_like_children(host, node) {
        score += 4;
    }
    if host
        .text_content(node)
        .is_some_and(|t| contains_clock_time(&t))
    {
        score += 2;
    }
    if info.overflow_auto {
        score += 2;
    }
    if info.flex_or_grid {
        score += 1;
    }
    if info.rect.h > 200 {
        score += 1;
    }
    score
}

/// At least two children look like chat messages: an avatar, a timestamp, some
/// structure, enough text, or a width that differs from the next sibling.
fn has_message_like_children(host: &dyn HostTree, node: NodeId) -> bool {
    let children = host.children(node);
    if children.len() < 2 {
        return false;
    }

    let widths: Vec<i32> = children
        .iter()
        .map(|c| host.bounding_rect(*c).map_or(0, |r| r.w))
        .collect();

    let mut matches = 0;
    for (i, child) in children.iter().enumerate() {
        let alternating = widths.get(i + 1).is_some_and(|next| *next != widths[i]);
        if alternating || looks_like_message(host, *child) {
            matches += 1;
        }
    }
    matches >= 2
}

fn looks_like_message(host: &dyn HostTree, node: NodeId) -> bool {
    if host
        .text_content(node)
        .is_some_and(|t| t.chars().count() > MESSAGE_TEXT_LEN)
    {
        return true;
    }

    let mut blocks = 0;
    let mut stack = host.children(node);
    while let Some(id) = stack.pop() {
        if let Some(info) = host.describe(id) {
            match info.tag.as_str() {
                "img" | "time" => return true,
                "div" | "p" => blocks += 1,
                _ => {}
            }
        }
        stack.extend(host.children(id));
    }
    blocks > 1
}

/// Matches clock-like times such as `3:45`, `15.45`, `3:45pm` or `3 : 45`.
fn contains_clock_time(text: &str) -> bool {
    let bytes = text.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b != b':' && *b != b'.' {
            continue;
        }

        let before = bytes[..i].iter().rev().find(|c| **c != b' ');
        if !before.is_some_and(u8::is_ascii_digit) {
            continue;
        }

        let mut after = bytes[i + 1..].iter().skip_while(|c| **c == b' ');
        if after.next().is_some_and(u8::is_ascii_digit)
            && after.next().is_some_and(u8::is_ascii_digit)
        {
            return true;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::host::{ElementSpec, MemoryTree, RectI};

    fn chat_page() -> (MemoryTree, NodeId, NodeId) {
        let mut host = MemoryTree::new(RectI::new(0, 0, 800, 600));
        let root = host.root();
        let log = host.append_child(
            root,
            ElementSpec::new("div")
                .class("message-list")
                .attr("role", "log")
                .attr("aria-live", "polite")
                .scrollable()
                .rect(RectI::new(0, 0, 800, 500)),
        );
        host.append_child(
            log,
            ElementSpec::new("div")
                .text("Hola, ¿cómo estás hoy? 10:41")
                .rect(RectI::new(0, 0, 400, 40)),
        );
        host.append_child(
            log,
            ElementSpec::new("div")
                .text("Muy bien, gracias por preguntar")
                .rect(RectI::new(0, 40, 300, 40)),
        );
        let input = host.append_child(
            root,
            ElementSpec::new("textarea")
                .class("composer-input")
                .attr("spellcheck", "true")
                .rect(RectI::new(0, 540, 800, 50)),
        );
        (host, log, input)
    }

    #[test]
    fn finds_both_regions_on_a_typical_chat_page() {
        let (host, log, input) = chat_page();
        let found = HeuristicDetector.detect_regions(&host).unwrap();
        assert_eq!(found.chat_area, Some(log));
        assert_eq!(found.input_area, Some(input));
    }

    #[test]
    fn plain_page_yields_nothing() {
        let mut host = MemoryTree::new(RectI::new(0, 0, 800, 600));
        let root = host.root();
        host.append_child(root, ElementSpec::new("div").text("About us"));
        host.append_child(
            root,
            ElementSpec::new("input")
                .attr("type", "checkbox")
                .rect(RectI::new(0, 0, 10, 10)),
        );
        assert_eq!(HeuristicDetector.detect_regions(&host), None);
    }

    #[test]
    fn pinned_composer_beats_a_plain_field() {
        let mut host = MemoryTree::new(RectI::new(0, 0, 800, 600));
        let root = host.root();
        host.append_child(
            root,
            ElementSpec::new("textarea").rect(RectI::new(0, 0, 300, 40)),
        );
        let thread = host.append_child(
            root,
            ElementSpec::new("section")
                .class("thread")
                .scrollable()
                .flex()
                .rect(RectI::new(0, 50, 800, 400)),
        );
        let composer = host.append_child(
            root,
            ElementSpec::new("div")
                .attr("contenteditable", "true")
                .fixed()
                .z_index(10)
                .rect(RectI::new(0, 550, 800, 40)),
        );

        let found = HeuristicDetector.detect_regions(&host).unwrap();
        assert_eq!(found.input_area, Some(composer));
        assert_eq!(found.chat_area, Some(thread));
    }

    #[test]
    fn overflow_tips_a_borderline_container() {
        let mut host = MemoryTree::new(RectI::new(0, 0, 800, 600));
        let root = host.root();
        let spec = ElementSpec::new("section")
            .class("thread")
            .flex()
            .rect(RectI::new(0, 0, 800, 400));

        let plain = host.append_child(root, spec.clone());
        assert_eq!(HeuristicDetector.detect_regions(&host), None);

        host.remove(plain);
        let overflowing = host.append_child(root, spec.overflow());
        let found = HeuristicDetector.detect_regions(&host).unwrap();
        assert_eq!(found.chat_area, Some(overflowing));
        assert_eq!(found.input_area, None);
    }

    #[test]
    fn manual_only_never_detects() {
        let (host, _, _) = chat_page();
        assert_eq!(ManualOnly.detect_regions(&host), None);
    }

    #[test]
    fn clock_times() {
        assert!(contains_clock_time("sent 3:45"));
        assert!(contains_clock_time("15.45"));
        assert!(contains_clock_time("3 : 45 pm"));
        assert!(!contains_clock_time("version 2."));
        assert!(!contains_clock_time("a:b"));
        assert!(!contains_clock_time("3:4"));
    }
}
