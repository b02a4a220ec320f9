//! Shared fakes for the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use tabnudge_core::background::BackgroundContext;
use tabnudge_core::host::{
    Clock, CreateTab, CreateWindow, ManualClock, ManualTimers, TabHost, TabInfo, WindowId,
    WindowInfo,
};
use tabnudge_core::storage::{Config, KvStore, LocalStore};
use tabnudge_core::{HostError, Message, Response, TabId};

/// Browser with scripted tabs that records every delivered message.
#[derive(Debug)]
pub struct FakeBrowser {
    pub tabs: BTreeMap<TabId, TabInfo>,
    /// Tabs with a content script listening.
    pub receivers: HashSet<TabId>,
    pub sent: Vec<(TabId, Message)>,
    pub windows_created: Vec<CreateWindow>,
    pub window: Option<WindowId>,
    pub fail_urls: HashSet<String>,
    pub fail_windows: bool,
    next_tab: TabId,
    next_window: WindowId,
}

impl Default for FakeBrowser {
    fn default() -> Self {
        Self {
            tabs: BTreeMap::new(),
            receivers: HashSet::new(),
            sent: Vec::new(),
            windows_created: Vec::new(),
            window: Some(1),
            fail_urls: HashSet::new(),
            fail_windows: false,
            next_tab: 100,
            next_window: 2,
        }
    }
}

impl FakeBrowser {
    /// Add a loaded tab with a content script.
    pub fn open(&mut self, tab_id: TabId, url: &str) {
        self.tabs.insert(
            tab_id,
            TabInfo {
                id: tab_id,
                window_id: 1,
                url: url.to_string(),
                active: false,
            },
        );
        self.receivers.insert(tab_id);
    }

    pub fn close(&mut self, tab_id: TabId) {
        self.tabs.remove(&tab_id);
        self.receivers.remove(&tab_id);
    }

    fn new_tab(&mut self, window_id: WindowId, url: String, active: bool) -> TabInfo {
        let tab = TabInfo {
            id: self.next_tab,
            window_id,
            url,
            active,
        };
        self.next_tab += 1;
        self.tabs.insert(tab.id, tab.clone());
        tab
    }
}

impl TabHost for FakeBrowser {
    fn tab_exists(&self, tab_id: TabId) -> bool {
        self.tabs.contains_key(&tab_id)
    }

    fn tab_url(&self, tab_id: TabId) -> Option<String> {
        self.tabs.get(&tab_id).map(|t| t.url.clone())
    }

    fn send_to_tab(
        &mut self,
        tab_id: TabId,
        message: &Message,
    ) -> Result<Option<Response>, HostError> {
        if !self.tabs.contains_key(&tab_id) {
            return Err(HostError::TabNotFound(tab_id));
        }
        if !self.receivers.contains(&tab_id) {
            return Err(HostError::NoReceiver(tab_id));
        }
        self.sent.push((tab_id, message.clone()));
        Ok(Some(Response::ack("Showing suggestion")))
    }

    fn current_window(&self) -> Option<WindowId> {
        self.window
    }

    fn create_tab(&mut self, request: CreateTab) -> Result<TabInfo, HostError> {
        if self.fail_urls.contains(&request.url) {
            return Err(HostError::Rejected(format!("cannot open {}", request.url)));
        }
        Ok(self.new_tab(request.window_id, request.url, request.active))
    }

    fn create_window(&mut self, request: CreateWindow) -> Result<WindowInfo, HostError> {
        if self.fail_windows {
            return Err(HostError::Rejected("window creation blocked".into()));
        }
        let id = self.next_window;
        self.next_window += 1;
        let tab = self.new_tab(id, request.url.clone(), true);
        self.windows_created.push(request);
        Ok(WindowInfo { id, tabs: vec![tab] })
    }
}

pub type TestBackground = BackgroundContext<FakeBrowser, ManualTimers>;

pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub store: Arc<LocalStore>,
    pub ctx: TestBackground,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_store(LocalStore::in_memory())
    }

    pub fn with_store(store: LocalStore) -> Self {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let store = Arc::new(store);
        let ctx = BackgroundContext::new(
            FakeBrowser::default(),
            ManualTimers::new(clock.clone()),
            store.clone() as Arc<dyn KvStore>,
            clock.clone() as Arc<dyn Clock>,
            &Config::default(),
        );
        Self { clock, store, ctx }
    }

    /// Move time forward by `ms`, firing due timers in order.
    pub fn advance(&mut self, ms: u64) {
        let until = self.clock.now_ms() + ms;
        while let Some(timer) = self.ctx.timers_mut().pop_due(until) {
            self.ctx.on_timer(timer);
        }
        self.clock.set(until);
    }

    pub fn sent(&self) -> &[(TabId, Message)] {
        &self.ctx.host().sent
    }
}
