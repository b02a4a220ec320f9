//! The background context.
//!
//! A single instance owns the classifier, the tab ledger and the
//! suggestion scheduler. It reacts to tab events from the host, to its own
//! timer expirations, to settings changes and to messages from the popup.
//! Host failures (closed tabs, pages without a content script, storage
//! write errors) are logged and absorbed here.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::error::{CoreError, HostError, ValidationError};
use crate::events::BackgroundEvent;
use crate::host::{Clock, CreateTab, CreateWindow, TabHost, TabInfo, TimerId, Timers};
use crate::messages::{Message, Mode, OpenUrlsResponse, Response, SwitchModeResponse};
use crate::runtime::{Context, Control};
use crate::scheduler::SuggestionScheduler;
use crate::site::hosts::{with_scheme, TEST_URLS};
use crate::site::{Classification, SiteClassifier};
use crate::storage::settings::{
    keys, load_tab_durations, save_current_site_type, save_tab_durations,
};
use crate::storage::{Config, KvStore, Settings, StorageChange, TimingConfig};
use crate::tracker::{TabActivityTracker, TabId};

pub const SWITCH_WINDOW_WIDTH: u32 = 1200;
pub const SWITCH_WINDOW_HEIGHT: u32 = 800;
const SWITCH_TAB_COUNT: usize = 3;

pub struct BackgroundContext<H, T> {
    host: H,
    timers: T,
    store: Arc<dyn KvStore>,
    clock: Arc<dyn Clock>,
    classifier: SiteClassifier,
    timing: TimingConfig,
    testing_mode: bool,
    tracker: TabActivityTracker,
    scheduler: SuggestionScheduler,
}

impl<H: TabHost, T: Timers> BackgroundContext<H, T> {
    /// Build the context, restoring the ledger and testing mode from `store`.
    pub fn new(
        host: H,
        timers: T,
        store: Arc<dyn KvStore>,
        clock: Arc<dyn Clock>,
        config: &Config,
    ) -> Self {
        let settings = Settings::load(store.as_ref()).unwrap_or_else(|e| {
            warn!(error = %e, "failed to read settings, using defaults");
            Settings::default()
        });
        let ledger = load_tab_durations(store.as_ref()).unwrap_or_else(|e| {
            warn!(error = %e, "failed to restore tab durations");
            Default::default()
        });
        info!(
            testing_mode = settings.in_testing_mode,
            restored_tabs = ledger.len(),
            "background context started"
        );
        Self {
            host,
            timers,
            store,
            clock,
            classifier: config.classifier(),
            timing: config.timing.clone(),
            testing_mode: settings.in_testing_mode,
            tracker: TabActivityTracker::with_ledger(ledger),
            scheduler: SuggestionScheduler::new(),
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    pub fn timers_mut(&mut self) -> &mut T {
        &mut self.timers
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    pub fn tracker(&self) -> &TabActivityTracker {
        &self.tracker
    }

    pub fn scheduler(&self) -> &SuggestionScheduler {
        &self.scheduler
    }

    pub fn testing_mode(&self) -> bool {
        self.testing_mode
    }

    pub fn on_tab_activated(&mut self, tab_id: TabId) {
        let now = self.clock.now_ms();
        if let Some(credit) = self.tracker.on_activated(tab_id, now) {
            self.persist_ledger();
            debug!(
                tab_id = credit.tab_id,
                total_s = (credit.total_ms as f64 / 1000.0).round(),
                "time credited to previous tab"
            );
        }
        match self.host.tab_url(tab_id) {
            Some(url) => {
                self.check_site(tab_id, &url);
            }
            None => debug!(tab_id, "tab activated but no URL available yet"),
        }
    }

    pub fn on_tab_removed(&mut self, tab_id: TabId) {
        self.tracker.on_removed(tab_id);
        self.persist_ledger();
    }

    pub fn on_navigation_completed(&mut self, tab_id: TabId, url: &str) -> Classification {
        self.check_site(tab_id, url)
    }

    /// Classify `url`, publish it as the current site type and rearm the
    /// suggestion timer for `tab_id`.
    pub fn check_site(&mut self, tab_id: TabId, url: &str) -> Classification {
        let classification = self.classifier.classify(url);
        debug!(tab_id, url, site = %classification, "site categorized");
        if let Err(e) = save_current_site_type(self.store.as_ref(), classification) {
            warn!(error = %e, "failed to store current site type");
        }
        let delay = self.timing.suggestion_delay(self.testing_mode);
        self.scheduler
            .arm(tab_id, classification, delay, &mut self.timers);
        classification
    }

    pub fn on_timer(&mut self, timer: TimerId) {
        let Some(pending) = self.scheduler.take_fired(timer) else {
            debug!(%timer, "ignoring stale timer");
            return;
        };
        if !self.host.tab_exists(pending.tab_id) {
            debug!(tab_id = pending.tab_id, "tab no longer exists, suggestion dropped");
            return;
        }
        let message = Message::ShowSuggestion {
            is_productive: pending.is_productive,
            testing_mode: self.testing_mode,
        };
        match self.host.send_to_tab(pending.tab_id, &message) {
            Ok(Some(response)) => {
                debug!(tab_id = pending.tab_id, ?response, "message received by content script")
            }
            Ok(None) => debug!(tab_id = pending.tab_id, "suggestion delivered"),
            Err(e) => warn!(tab_id = pending.tab_id, error = %e, "error sending message"),
        }
    }

    pub fn on_storage_changed(&mut self, change: &StorageChange) {
        if change.key == keys::IN_TESTING_MODE {
            self.testing_mode = change
                .new_value
                .as_ref()
                .and_then(|v| v.as_bool())
                .unwrap_or(false);
            info!(testing_mode = self.testing_mode, "testing mode updated");
        }
    }

    /// Answer a message addressed to the background. Messages meant for
    /// content contexts get no response.
    pub fn handle_message(&mut self, message: &Message) -> Option<Response> {
        match message {
            Message::GetTabDurations => Some(Response::Durations {
                durations: self.tracker.snapshot(),
            }),
            Message::OpenUrls {
                urls,
                make_first_tab_active,
            } => Some(Response::OpenUrls(
                self.open_urls(urls.as_deref(), make_first_tab_active.unwrap_or(false)),
            )),
            Message::SwitchMode { mode } => Some(Response::SwitchMode(
                self.switch_mode(mode.unwrap_or_default()),
            )),
            Message::ShowSuggestion { .. } | Message::InjectAnchors => {
                debug!(action = message.action(), "not a background message");
                None
            }
        }
    }

    /// Open `urls` in the current window, or the built-in test set when
    /// `urls` is absent.
    pub fn open_urls(
        &mut self,
        urls: Option<&[String]>,
        make_first_tab_active: bool,
    ) -> OpenUrlsResponse {
        let result = match urls {
            Some(urls) => self.open_tabs(urls, make_first_tab_active),
            None => {
                let defaults: Vec<String> = TEST_URLS.iter().map(|u| u.to_string()).collect();
                self.open_tabs(&defaults, true)
            }
        };
        match result {
            Ok(tabs) => OpenUrlsResponse {
                success: true,
                tabs: Some(tabs),
                error: None,
            },
            Err(e) => {
                let error = match e {
                    CoreError::Validation(ValidationError::EmptyCollection(_)) => {
                        "Invalid URLs provided".to_string()
                    }
                    other => other.to_string(),
                };
                error!(%error, "openUrls failed");
                OpenUrlsResponse {
                    success: false,
                    tabs: None,
                    error: Some(error),
                }
            }
        }
    }

    fn open_tabs(
        &mut self,
        urls: &[String],
        activate_first: bool,
    ) -> Result<Vec<TabInfo>, CoreError> {
        if urls.is_empty() {
            return Err(ValidationError::EmptyCollection("urls".into()).into());
        }
        let window_id = self.host.current_window().ok_or(HostError::NoWindow)?;
        info!(count = urls.len(), window_id, "opening tabs");

        let mut created = Vec::with_capacity(urls.len());
        for (index, url) in urls.iter().enumerate() {
            let url = with_scheme(url);
            let request = CreateTab {
                window_id,
                url: url.clone(),
                active: activate_first && index == 0,
            };
            match self.host.create_tab(request) {
                Ok(tab) => {
                    debug!(url = url.as_str(), tab_id = tab.id, "created tab");
                    created.push(tab);
                }
                Err(e) => warn!(url = url.as_str(), error = %e, "error creating tab"),
            }
        }
        Ok(created)
    }

    /// Open a new focused window seeded with the first hosts of `mode`'s list.
    pub fn switch_mode(&mut self, mode: Mode) -> SwitchModeResponse {
        let hosts = match mode {
            Mode::Productive => self.classifier.productive_hosts(),
            Mode::Unproductive => self.classifier.unproductive_hosts(),
        };
        let urls: Vec<String> = hosts
            .iter()
            .take(SWITCH_TAB_COUNT)
            .map(|h| with_scheme(h))
            .collect();
        let Some((first, rest)) = urls.split_first() else {
            return SwitchModeResponse {
                success: false,
                mode: Some(mode),
                window_id: None,
                tabs: None,
                message: None,
                error: Some(format!("no {} hosts configured", mode.as_str())),
            };
        };

        let window = match self.host.create_window(CreateWindow {
            url: first.clone(),
            focused: true,
            width: SWITCH_WINDOW_WIDTH,
            height: SWITCH_WINDOW_HEIGHT,
        }) {
            Ok(window) => window,
            Err(e) => {
                error!(error = %e, "error creating window");
                return SwitchModeResponse {
                    success: false,
                    mode: None,
                    window_id: None,
                    tabs: None,
                    message: None,
                    error: Some(e.to_string()),
                };
            }
        };
        info!(mode = mode.as_str(), window_id = window.id, "created window");

        let mut tabs: Vec<TabInfo> = window.tabs.into_iter().take(1).collect();
        for url in rest {
            let request = CreateTab {
                window_id: window.id,
                url: url.clone(),
                active: false,
            };
            match self.host.create_tab(request) {
                Ok(tab) => tabs.push(tab),
                Err(e) => warn!(url = url.as_str(), error = %e, "error creating tab"),
            }
        }

        SwitchModeResponse {
            success: true,
            mode: Some(mode),
            window_id: Some(window.id),
            tabs: Some(tabs),
            message: Some(format!("Switched to {} mode in new window", mode.as_str())),
            error: None,
        }
    }

    fn persist_ledger(&self) {
        if let Err(e) = save_tab_durations(self.store.as_ref(), self.tracker.ledger()) {
            warn!(error = %e, "failed to persist tab durations");
        }
    }
}

impl<H: TabHost, T: Timers> Context for BackgroundContext<H, T> {
    type Event = BackgroundEvent;

    fn dispatch(&mut self, event: BackgroundEvent) -> Control {
        match event {
            BackgroundEvent::TabActivated { tab_id } => self.on_tab_activated(tab_id),
            BackgroundEvent::TabRemoved { tab_id } => self.on_tab_removed(tab_id),
            BackgroundEvent::NavigationCompleted { tab_id, url } => {
                self.on_navigation_completed(tab_id, &url);
            }
            BackgroundEvent::TimerFired(timer) => self.on_timer(timer),
            BackgroundEvent::StorageChanged(change) => self.on_storage_changed(&change),
            BackgroundEvent::Message { message, reply } => {
                let response = self.handle_message(&message);
                if let Some(reply) = reply {
                    if reply.send(response).is_err() {
                        debug!(action = message.action(), "sender went away before reply");
                    }
                }
            }
            BackgroundEvent::Shutdown => {
                self.scheduler.cancel(&mut self.timers);
                return Control::Stop;
            }
        }
        Control::Continue
    }
}
