//! The content context of one page load.
//!
//! Created when a page finishes loading and dropped on navigation or tab
//! close; dropping it discards the display loop and, with a
//! [`TokioTimers`](crate::runtime::TokioTimers) timer source, aborts every
//! pending timer of the page.

use tracing::{debug, warn};

use crate::events::ContentEvent;
use crate::host::{RandomSource, TimerId, Timers};
use crate::messages::{Message, Response};
use crate::runtime::{Context, Control};
use crate::site::Classification;
use crate::storage::{keys, Config, KvStore, Settings, StorageChange};
use crate::suggestion::{AnchorPanel, Document, SuggestionDisplayLoop};

pub const STATUS_SHOWING: &str = "Showing suggestion";
pub const STATUS_ANCHORS: &str = "Anchors injected";
pub const STATUS_UNKNOWN: &str = "Unknown action";

pub struct ContentContext<D, T, R> {
    page_url: String,
    classification: Classification,
    doc: D,
    timers: T,
    rng: R,
    display: SuggestionDisplayLoop,
    anchors: AnchorPanel,
}

impl<D: Document, T: Timers, R: RandomSource> ContentContext<D, T, R> {
    pub fn new(
        page_url: impl Into<String>,
        doc: D,
        timers: T,
        rng: R,
        store: &dyn KvStore,
        config: &Config,
    ) -> Self {
        let page_url = page_url.into();
        let classification = config.classifier().classify(&page_url);
        let testing_mode = Settings::load(store)
            .map(|s| s.in_testing_mode)
            .unwrap_or_else(|e| {
                warn!(error = %e, "failed to read settings");
                false
            });
        Self {
            page_url,
            classification,
            doc,
            timers,
            rng,
            display: SuggestionDisplayLoop::new(config.timing.clone(), testing_mode),
            anchors: AnchorPanel::new(),
        }
    }

    pub fn page_url(&self) -> &str {
        &self.page_url
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    pub fn display(&self) -> &SuggestionDisplayLoop {
        &self.display
    }

    /// Every message is acknowledged, including ones meant for the background.
    pub fn handle_message(&mut self, message: &Message) -> Response {
        match message {
            Message::ShowSuggestion {
                is_productive,
                testing_mode,
            } => {
                self.display.set_testing_mode(*testing_mode);
                self.display
                    .show(*is_productive, &mut self.doc, &mut self.timers, &mut self.rng);
                Response::ack(STATUS_SHOWING)
            }
            Message::InjectAnchors => {
                self.anchors.inject(self.classification, &mut self.doc);
                Response::ack(STATUS_ANCHORS)
            }
            other => {
                debug!(action = other.action(), "content script ignoring message");
                Response::ack(STATUS_UNKNOWN)
            }
        }
    }

    pub fn on_timer(&mut self, timer: TimerId) {
        if !self
            .display
            .on_timer(timer, &mut self.doc, &mut self.timers, &mut self.rng)
        {
            debug!(%timer, "unknown timer fired");
        }
    }

    pub fn dismiss(&mut self) -> bool {
        self.display.dismiss(&mut self.doc)
    }

    pub fn on_storage_changed(&mut self, change: &StorageChange) {
        if change.key == keys::IN_TESTING_MODE {
            let testing_mode = change
                .new_value
                .as_ref()
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            self.display.set_testing_mode(testing_mode);
        }
    }
}

impl<D: Document, T: Timers, R: RandomSource> Context for ContentContext<D, T, R> {
    type Event = ContentEvent;

    fn dispatch(&mut self, event: ContentEvent) -> Control {
        match event {
            ContentEvent::Message { message, reply } => {
                let response = self.handle_message(&message);
                if let Some(reply) = reply {
                    if reply.send(response).is_err() {
                        debug!(action = message.action(), "sender went away before reply");
                    }
                }
            }
            ContentEvent::TimerFired(timer) => self.on_timer(timer),
            ContentEvent::DismissClicked => {
                self.dismiss();
            }
            ContentEvent::StorageChanged(change) => self.on_storage_changed(&change),
            ContentEvent::Unload => {
                debug!(url = self.page_url.as_str(), "page unloading");
                return Control::Stop;
            }
        }
        Control::Continue
    }
}
