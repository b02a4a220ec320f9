//! Banner display loop for one page load.
//!
//! The loop is Idle when no banner is in the document and Showing
//! otherwise. Every `show` arms two timers: one removing the banner and
//! one re-invoking `show`. The re-arm chain survives dismissal and is only
//! torn down with the page, so overlapping chains can coexist; the most
//! recent `show` always owns the single visible banner.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, error, info};

use super::document::{Banner, Document, Element, ElementId};
use super::pools::pick_message;
use crate::host::{RandomSource, TimerId, Timers};
use crate::storage::TimingConfig;

/// A banner that was put on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShownSuggestion {
    pub message: String,
    pub is_productive: bool,
    pub testing_mode: bool,
    pub dismiss_after_ms: u64,
    pub next_in_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    Idle,
    Showing,
}

#[derive(Debug)]
pub struct SuggestionDisplayLoop {
    timing: TimingConfig,
    testing_mode: bool,
    banner: Option<ElementId>,
    dismiss_timer: Option<TimerId>,
    /// Pending re-arm timers and the classification they re-show.
    recurrences: HashMap<TimerId, bool>,
    shown: Vec<ShownSuggestion>,
}

impl SuggestionDisplayLoop {
    pub fn new(timing: TimingConfig, testing_mode: bool) -> Self {
        Self {
            timing,
            testing_mode,
            banner: None,
            dismiss_timer: None,
            recurrences: HashMap::new(),
            shown: Vec::new(),
        }
    }

    pub fn testing_mode(&self) -> bool {
        self.testing_mode
    }

    /// Affects delays armed from now on; pending timers keep their due time.
    pub fn set_testing_mode(&mut self, testing_mode: bool) {
        self.testing_mode = testing_mode;
    }

    pub fn banner(&self) -> Option<ElementId> {
        self.banner
    }

    pub fn state(&self, doc: &dyn Document) -> DisplayState {
        match self.banner {
            Some(id) if doc.contains(id) => DisplayState::Showing,
            _ => DisplayState::Idle,
        }
    }

    pub fn pending_recurrences(&self) -> usize {
        self.recurrences.len()
    }

    pub fn shown(&self) -> &[ShownSuggestion] {
        &self.shown
    }

    /// Replace any visible banner with a fresh one and arm the
    /// auto-dismiss and re-arm timers. Returns false when the page has
    /// no body, in which case nothing is armed.
    pub fn show(
        &mut self,
        is_productive: bool,
        doc: &mut dyn Document,
        timers: &mut dyn Timers,
        rng: &mut dyn RandomSource,
    ) -> bool {
        self.remove_banner(doc);
        if let Some(timer) = self.dismiss_timer.take() {
            timers.cancel(timer);
        }

        if !doc.has_body() {
            error!("document body not available, suggestion not shown");
            return false;
        }

        let message = pick_message(is_productive, rng);
        let banner = Banner::new(message, is_productive, self.testing_mode);
        self.banner = Some(doc.append(Element::Banner(banner)));

        let dismiss_after = self.timing.dismiss_after(self.testing_mode);
        self.dismiss_timer = Some(timers.schedule(dismiss_after));

        let (min_ms, max_ms) = self.timing.next_range_ms(self.testing_mode);
        let next_in_ms = rng.between_ms(min_ms, max_ms);
        let recurrence = timers.schedule(Duration::from_millis(next_in_ms));
        self.recurrences.insert(recurrence, is_productive);

        info!(
            site = if is_productive { "productive" } else { "unproductive" },
            dismiss_s = dismiss_after.as_secs_f64(),
            next_s = next_in_ms as f64 / 1000.0,
            "suggestion shown"
        );
        self.shown.push(ShownSuggestion {
            message: message.to_string(),
            is_productive,
            testing_mode: self.testing_mode,
            dismiss_after_ms: dismiss_after.as_millis() as u64,
            next_in_ms,
        });
        true
    }

    /// Dismiss control activated. The re-arm chain keeps running.
    pub fn dismiss(&mut self, doc: &mut dyn Document) -> bool {
        let removed = self.remove_banner(doc);
        if removed {
            debug!("suggestion dismissed");
        }
        removed
    }

    /// Route a fired timer. Returns false if `timer` does not belong to
    /// this loop.
    pub fn on_timer(
        &mut self,
        timer: TimerId,
        doc: &mut dyn Document,
        timers: &mut dyn Timers,
        rng: &mut dyn RandomSource,
    ) -> bool {
        if self.dismiss_timer == Some(timer) {
            self.dismiss_timer = None;
            if self.remove_banner(doc) {
                debug!("suggestion auto-dismissed");
            }
            return true;
        }
        if let Some(is_productive) = self.recurrences.remove(&timer) {
            self.show(is_productive, doc, timers, rng);
            return true;
        }
        false
    }

    fn remove_banner(&mut self, doc: &mut dyn Document) -> bool {
        match self.banner.take() {
            Some(id) => doc.remove(id),
            None => false,
        }
    }
}
