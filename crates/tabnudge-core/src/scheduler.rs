//! Per-navigation suggestion timer.
//!
//! At most one suggestion is pending at a time. Arming cancels the
//! previous timer, and a fired id that no longer matches the pending one
//! is ignored, so a stale expiry that raced a cancel cannot deliver.

use std::time::Duration;

use tracing::{debug, info};

use crate::host::{TimerId, Timers};
use crate::site::Classification;
use crate::tracker::TabId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingSuggestion {
    pub timer: TimerId,
    pub tab_id: TabId,
    pub is_productive: bool,
}

#[derive(Debug, Default)]
pub struct SuggestionScheduler {
    pending: Option<PendingSuggestion>,
}

impl SuggestionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<&PendingSuggestion> {
        self.pending.as_ref()
    }

    pub fn cancel(&mut self, timers: &mut dyn Timers) -> Option<PendingSuggestion> {
        let pending = self.pending.take()?;
        timers.cancel(pending.timer);
        debug!(tab_id = pending.tab_id, timer = %pending.timer, "pending suggestion cancelled");
        Some(pending)
    }

    /// Supersede any pending suggestion. Neutral pages leave nothing armed.
    pub fn arm(
        &mut self,
        tab_id: TabId,
        classification: Classification,
        delay: Duration,
        timers: &mut dyn Timers,
    ) -> Option<TimerId> {
        self.cancel(timers);
        let is_productive = match classification {
            Classification::Productive => true,
            Classification::Unproductive => false,
            Classification::Neutral => return None,
        };
        let timer = timers.schedule(delay);
        self.pending = Some(PendingSuggestion {
            timer,
            tab_id,
            is_productive,
        });
        info!(
            tab_id,
            nudge = if is_productive { "unproductive" } else { "productive" },
            delay_s = delay.as_secs_f64(),
            "suggestion scheduled"
        );
        Some(timer)
    }

    /// Claim the pending suggestion if `timer` is its timer.
    pub fn take_fired(&mut self, timer: TimerId) -> Option<PendingSuggestion> {
        match self.pending {
            Some(p) if p.timer == timer => self.pending.take(),
            _ => None,
        }
    }
}
