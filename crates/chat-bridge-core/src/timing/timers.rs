use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

/// Handle of a one-shot timer armed through [`Timers::set_timeout`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// One-shot timer service of a single-threaded context.
///
/// Fired timers are reported back to the owner as events carrying the [`TimerId`];
/// the owner routes them to whichever component armed the timer.
pub trait Timers {
    fn set_timeout(&mut self, delay: Duration) -> TimerId;

    /// Cancels a pending timer. Unknown or already fired ids are ignored.
    fn clear_timeout(&mut self, id: TimerId);
}

/// Deterministic virtual-time timer queue.
///
/// Time only moves through [`TimerQueue::advance_to`] / [`TimerQueue::advance_by`], which
/// makes timing behaviour reproducible in tests and in the in-memory host.
#[derive(Debug, Default)]
pub struct TimerQueue {
    now_ms: u64,
    next_id: u64,
    // (deadline, id) keeps firing order stable for equal deadlines.
    pending: BTreeSet<(u64, TimerId)>,
    deadlines: BTreeMap<TimerId, u64>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending_count(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    /// Moves the clock to `now_ms` and returns every timer that came due, in deadline order.
    /// The clock never goes backwards.
    pub fn advance_to(&mut self, now_ms: u64) -> Vec<TimerId> {
        self.now_ms = self.now_ms.max(now_ms);

        let mut fired = Vec::new();
        while let Some(&(deadline, id)) = self.pending.first() {
            if deadline > self.now_ms {
                break;
            }
            self.pending.remove(&(deadline, id));
            self.deadlines.remove(&id);
            fired.push(id);
        }
        fired
    }

    pub fn advance_by(&mut self, delta: Duration) -> Vec<TimerId> {
        let target = self.now_ms.saturating_add(duration_ms(delta));
        self.advance_to(target)
    }
}

impl Timers for TimerQueue {
    fn set_timeout(&mut self, delay: Duration) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        let deadline = self.now_ms.saturating_add(duration_ms(delay));
        self.pending.insert((deadline, id));
        self.deadlines.insert(id, deadline);
        id
    }

    fn clear_timeout(&mut self, id: TimerId) {
        if let Some(deadline) = self.deadlines.remove(&id) {
            self.pending.remove(&(deadline, id));
        }
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}
