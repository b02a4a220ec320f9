//! Per-tab foreground time accounting.
//!
//! The tracker is driven by tab activation and removal events. Time is
//! credited to a tab only when the user switches away from it; the
//! open-ended interval of the currently active tab is never counted
//! until the next activation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

/// Browser tab identifier, scoped to one browser session.
pub type TabId = u32;

/// Accumulated foreground milliseconds per tab.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabDurationLedger(BTreeMap<TabId, u64>);

impl TabDurationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, tab_id: TabId) -> Option<u64> {
        self.0.get(&tab_id).copied()
    }

    /// Add `ms` to the entry for `tab_id`, creating it at zero. Returns the new total.
    pub fn credit(&mut self, tab_id: TabId, ms: u64) -> u64 {
        let entry = self.0.entry(tab_id).or_insert(0);
        *entry = entry.saturating_add(ms);
        *entry
    }

    pub fn remove(&mut self, tab_id: TabId) -> Option<u64> {
        self.0.remove(&tab_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (TabId, u64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn total_ms(&self) -> u64 {
        self.0.values().fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    /// JSON object keyed by the tab id as a string.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .0
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect();
        Value::Object(map)
    }

    /// Lenient decode of a persisted ledger; entries that are not
    /// `"<tab id>": <non-negative integer>` are skipped.
    pub fn from_value(value: &Value) -> Self {
        let mut ledger = Self::new();
        let Some(obj) = value.as_object() else {
            warn!("persisted tab durations are not an object, ignoring");
            return ledger;
        };
        for (key, ms) in obj {
            match (key.parse::<TabId>(), ms.as_u64()) {
                (Ok(tab_id), Some(ms)) => {
                    ledger.0.insert(tab_id, ms);
                }
                _ => warn!(key = key.as_str(), "skipping malformed tab duration entry"),
            }
        }
        ledger
    }
}

impl FromIterator<(TabId, u64)> for TabDurationLedger {
    fn from_iter<I: IntoIterator<Item = (TabId, u64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ActiveTab {
    tab_id: TabId,
    since_ms: u64,
}

/// Time credited to the tab the user switched away from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Credit {
    pub tab_id: TabId,
    pub added_ms: u64,
    pub total_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct TabActivityTracker {
    ledger: TabDurationLedger,
    active: Option<ActiveTab>,
}

impl TabActivityTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from a previously persisted ledger with no active tab.
    pub fn with_ledger(ledger: TabDurationLedger) -> Self {
        Self {
            ledger,
            active: None,
        }
    }

    pub fn active_tab(&self) -> Option<TabId> {
        self.active.map(|a| a.tab_id)
    }

    pub fn ledger(&self) -> &TabDurationLedger {
        &self.ledger
    }

    /// Snapshot copy of the full ledger.
    pub fn snapshot(&self) -> TabDurationLedger {
        self.ledger.clone()
    }

    /// Tab `tab_id` became the active tab at `now_ms`.
    pub fn on_activated(&mut self, tab_id: TabId, now_ms: u64) -> Option<Credit> {
        let credit = self.active.map(|prev| {
            let added_ms = now_ms.saturating_sub(prev.since_ms);
            let total_ms = self.ledger.credit(prev.tab_id, added_ms);
            Credit {
                tab_id: prev.tab_id,
                added_ms,
                total_ms,
            }
        });
        self.active = Some(ActiveTab {
            tab_id,
            since_ms: now_ms,
        });
        credit
    }

    /// Tab `tab_id` was closed. Returns the removed ledger entry.
    pub fn on_removed(&mut self, tab_id: TabId) -> Option<u64> {
        if self.active_tab() == Some(tab_id) {
            self.active = None;
        }
        self.ledger.remove(tab_id)
    }
}
