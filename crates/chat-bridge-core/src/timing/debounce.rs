use std::time::Duration;

use super::timers::{TimerId, Timers};

/// Trailing-edge debouncer.
///
/// Every [`Debouncer::call`] re-arms a single timer for the quiet period and replaces the
/// stored arguments. When the owner sees that timer fire it hands the id to
/// [`Debouncer::fire`], which yields the arguments of the last call exactly once.
///
/// The armed timer handle is tracked so [`Debouncer::cancel`] can clear it; a cancelled
/// debouncer never yields stale arguments.
#[derive(Debug)]
pub struct Debouncer<A> {
    quiet: Duration,
    pending: Option<TimerId>,
    args: Option<A>,
}

impl<A> Debouncer<A> {
    pub fn new(quiet: Duration) -> Self {
        Self {
            quiet,
            pending: None,
            args: None,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    pub fn call(&mut self, timers: &mut (impl Timers + ?Sized), args: A) {
        if let Some(id) = self.pending.take() {
            timers.clear_timeout(id);
        }
        self.pending = Some(timers.set_timeout(self.quiet));
        self.args = Some(args);
    }

    /// Returns `true` when `id` is the timer currently armed by this debouncer.
    pub fn owns(&self, id: TimerId) -> bool {
        self.pending == Some(id)
    }

    /// Consumes the settled call if `id` is this debouncer's armed timer.
    pub fn fire(&mut self, id: TimerId) -> Option<A> {
        if !self.owns(id) {
            return None;
        }
        self.pending = None;
        self.args.take()
    }

    pub fn cancel(&mut self, timers: &mut (impl Timers + ?Sized)) {
        if let Some(id) = self.pending.take() {
            timers.clear_timeout(id);
        }
        self.args = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}
