use std::{collections::VecDeque, time::Duration};

use chat_bridge_core::timing::{TimerId, TimerQueue, Timers};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

impl NoticeLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            NoticeLevel::Info => "info",
            NoticeLevel::Success => "success",
            NoticeLevel::Warning => "warning",
            NoticeLevel::Error => "error",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
    pub expires_at_ms: u64,
}

/// Short-lived user-visible notices.
///
/// Pushing the same notice as the newest one only extends its lifetime.
#[derive(Debug)]
pub struct Notifier {
    ttl: Duration,
    active: VecDeque<(TimerId, Notice)>,
}

impl Notifier {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            active: VecDeque::new(),
        }
    }

    pub fn push(&mut self, timers: &mut TimerQueue, level: NoticeLevel, text: &str) {
        match level {
            NoticeLevel::Error => tracing::error!(level = level.as_str(), "{text}"),
            NoticeLevel::Warning => tracing::warn!(level = level.as_str(), "{text}"),
            NoticeLevel::Info | NoticeLevel::Success => {
                tracing::info!(level = level.as_str(), "{text}");
            }
        }

        let ttl_ms = u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX);
        let expires_at_ms = timers.now_ms().saturating_add(ttl_ms);

        if let Some((id, last)) = self.active.back_mut()
            && last.level == level
            && last.text == text
        {
            timers.clear_timeout(*id);
            *id = timers.set_timeout(self.ttl);
            last.expires_at_ms = expires_at_ms;
            return;
        }

        let id = timers.set_timeout(self.ttl);
        self.active.push_back((
            id,
            Notice {
                level,
                text: text.to_string(),
                expires_at_ms,
            },
        ));
    }

    /// Expires the notice owning `id`.
    pub fn on_timer(&mut self, id: TimerId) -> bool {
        let before = self.active.len();
        self.active.retain(|(t, _)| *t != id);
        self.active.len() != before
    }

    pub fn active(&self) -> impl Iterator<Item = &Notice> {
        self.active.iter().map(|(_, n)| n)
    }

    pub fn latest(&self) -> Option<&Notice> {
        self.active.back().map(|(_, n)| n)
    }

    pub fn drain_one(&mut self, timers: &mut TimerQueue) -> Option<Notice> {
        let (id, notice) = self.active.pop_front()?;
        timers.clear_timeout(id);
        Some(notice)
    }

    pub fn clear(&mut self, timers: &mut TimerQueue) {
        for (id, _) in self.active.drain(..) {
            timers.clear_timeout(id);
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    const TTL: Duration = Duration::from_secs(3);

    #[test]
    fn notices_expire_after_ttl() {
        let mut timers = TimerQueue::new();
        let mut n = Notifier::new(TTL);
        n.push(&mut timers, NoticeLevel::Success, "Chat area selected");
        assert_eq!(n.latest().unwrap().expires_at_ms, 3000);

        for id in timers.advance_by(Duration::from_millis(2999)) {
            n.on_timer(id);
        }
        assert_eq!(n.active().count(), 1);
        for id in timers.advance_by(Duration::from_millis(1)) {
            assert!(n.on_timer(id));
        }
        assert!(n.latest().is_none());
    }

    #[test]
    fn repeated_notice_is_extended_not_duplicated() {
        let mut timers = TimerQueue::new();
        let mut n = Notifier::new(TTL);
        n.push(&mut timers, NoticeLevel::Warning, "Connection lost");
        timers.advance_by(Duration::from_secs(2));
        n.push(&mut timers, NoticeLevel::Warning, "Connection lost");

        assert_eq!(n.active().count(), 1);
        assert_eq!(timers.pending_count(), 1);
        assert_eq!(n.latest().unwrap().expires_at_ms, 5000);
    }

    #[test]
    fn drain_one_is_fifo_and_clears_timers() {
        let mut timers = TimerQueue::new();
        let mut n = Notifier::new(TTL);
        n.push(&mut timers, NoticeLevel::Error, "a");
        n.push(&mut timers, NoticeLevel::Info, "b");
        assert_eq!(n.drain_one(&mut timers).unwrap().text, "a");
        assert_eq!(timers.pending_count(), 1);
        n.clear(&mut timers);
        assert_eq!(timers.pending_count(), 0);
    }
}
