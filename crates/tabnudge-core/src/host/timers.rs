use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::clock::{Clock, ManualClock};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimerId(pub u64);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

/// One-shot timers. Expiry is delivered back to the owning context as an
/// event carrying the `TimerId`; a cancelled timer never fires.
pub trait Timers {
    fn schedule(&mut self, delay: Duration) -> TimerId;
    fn cancel(&mut self, id: TimerId);
}

/// Virtual-time timers driven by a shared [`ManualClock`].
///
/// ```ignore
/// let id = timers.schedule(Duration::from_secs(5));
/// while let Some(fired) = timers.pop_due(clock.now_ms() + 5_000) {
///     context.dispatch(Event::TimerFired(fired));
/// }
/// ```
#[derive(Debug)]
pub struct ManualTimers {
    clock: Arc<ManualClock>,
    pending: BTreeMap<TimerId, u64>,
    next_id: u64,
}

impl ManualTimers {
    pub fn new(clock: Arc<ManualClock>) -> Self {
        Self {
            clock,
            pending: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn clock(&self) -> &Arc<ManualClock> {
        &self.clock
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Due time of a pending timer, in clock milliseconds.
    pub fn due_at(&self, id: TimerId) -> Option<u64> {
        self.pending.get(&id).copied()
    }

    /// Remove and return the earliest timer due at or before `until_ms`,
    /// moving the clock to its due time. Ties fire in scheduling order.
    pub fn pop_due(&mut self, until_ms: u64) -> Option<TimerId> {
        let (id, due) = self
            .pending
            .iter()
            .filter(|(_, due)| **due <= until_ms)
            .min_by_key(|(id, due)| (**due, **id))
            .map(|(id, due)| (*id, *due))?;
        self.pending.remove(&id);
        if due > self.clock.now_ms() {
            self.clock.set(due);
        }
        Some(id)
    }
}

impl Timers for ManualTimers {
    fn schedule(&mut self, delay: Duration) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        let due = self.clock.now_ms().saturating_add(delay.as_millis() as u64);
        self.pending.insert(id, due);
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.remove(&id);
    }
}
