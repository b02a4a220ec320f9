//! Scripted browsing session against an in-memory browser.
//!
//! One background loop and one content loop per page load run on the
//! tokio runtime exactly as they would in the extension. Delays are
//! divided by `--speed`, and the ledger clock runs `speed` times faster,
//! so reported durations stay in script milliseconds.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabnudge_core::host::{
    Clock, CreateTab, CreateWindow, RandomSource, SeededRandom, SystemClock, TabHost, TabInfo,
    ThreadRandom, WindowId, WindowInfo,
};
use tabnudge_core::runtime::{
    run_background, run_content, spawn_store_forwarder, TokioTimers, MIN_SPEED,
};
use tabnudge_core::storage::keys;
use tabnudge_core::suggestion::{MemoryDocument, ShownSuggestion};
use tabnudge_core::{
    BackgroundContext, BackgroundEvent, Classification, Config, ContentContext, ContentEvent,
    HostError, KvStore, LocalStore, Message, Response, TabId, ValidationError,
};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const SCRIPT_WINDOW: WindowId = 1;
const FIRST_OPENED_TAB: TabId = 1000;

type PageContext = ContentContext<MemoryDocument, TokioTimers<ContentEvent>, SeededRandom>;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Script {
    #[serde(default)]
    testing_mode: bool,
    seed: Option<u64>,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
enum Step {
    Navigate { tab: TabId, url: String },
    Activate { tab: TabId },
    Close { tab: TabId },
    Dismiss { tab: TabId },
    Wait { ms: u64 },
    /// To the page in `tab`, or to the background when absent.
    Message { tab: Option<TabId>, message: Message },
}

/// Wall clock running `speed` times faster from the moment it is created.
struct ScaledClock {
    origin_ms: u64,
    started: Instant,
    speed: f64,
}

impl ScaledClock {
    fn new(speed: f64) -> Self {
        Self {
            origin_ms: SystemClock.now_ms(),
            started: Instant::now(),
            speed,
        }
    }
}

impl Clock for ScaledClock {
    fn now_ms(&self) -> u64 {
        self.origin_ms + (self.started.elapsed().as_secs_f64() * 1000.0 * self.speed) as u64
    }
}

struct SimTab {
    window_id: WindowId,
    url: String,
    active: bool,
    content: Option<mpsc::UnboundedSender<ContentEvent>>,
}

struct BrowserState {
    tabs: BTreeMap<TabId, SimTab>,
    next_tab: TabId,
    next_window: WindowId,
}

/// Browser shared between the background loop and the script driver.
#[derive(Clone)]
struct SimBrowser {
    state: Arc<Mutex<BrowserState>>,
}

impl SimBrowser {
    fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BrowserState {
                tabs: BTreeMap::new(),
                next_tab: FIRST_OPENED_TAB,
                next_window: SCRIPT_WINDOW + 1,
            })),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, BrowserState>, HostError> {
        self.state
            .lock()
            .map_err(|_| HostError::Rejected("browser state poisoned".into()))
    }

    fn load(
        &self,
        tab_id: TabId,
        url: &str,
        content: mpsc::UnboundedSender<ContentEvent>,
    ) -> Result<(), HostError> {
        let mut state = self.lock()?;
        let tab = state.tabs.entry(tab_id).or_insert_with(|| SimTab {
            window_id: SCRIPT_WINDOW,
            url: String::new(),
            active: false,
            content: None,
        });
        tab.url = url.to_string();
        tab.content = Some(content);
        Ok(())
    }

    fn activate(&self, tab_id: TabId) -> Result<(), HostError> {
        let mut state = self.lock()?;
        for (id, tab) in state.tabs.iter_mut() {
            tab.active = *id == tab_id;
        }
        Ok(())
    }

    fn close(&self, tab_id: TabId) -> Result<(), HostError> {
        self.lock()?.tabs.remove(&tab_id);
        Ok(())
    }

    fn open(state: &mut BrowserState, window_id: WindowId, url: String, active: bool) -> TabInfo {
        let id = state.next_tab;
        state.next_tab += 1;
        state.tabs.insert(
            id,
            SimTab {
                window_id,
                url: url.clone(),
                active,
                content: None,
            },
        );
        info!(tab = id, window = window_id, url = %url, "opened tab");
        TabInfo {
            id,
            window_id,
            url,
            active,
        }
    }
}

impl TabHost for SimBrowser {
    fn tab_exists(&self, tab_id: TabId) -> bool {
        self.lock().map(|s| s.tabs.contains_key(&tab_id)).unwrap_or(false)
    }

    fn tab_url(&self, tab_id: TabId) -> Option<String> {
        self.lock().ok()?.tabs.get(&tab_id).map(|t| t.url.clone())
    }

    fn send_to_tab(
        &mut self,
        tab_id: TabId,
        message: &Message,
    ) -> Result<Option<Response>, HostError> {
        let state = self.lock()?;
        let tab = state.tabs.get(&tab_id).ok_or(HostError::TabNotFound(tab_id))?;
        let content = tab.content.as_ref().ok_or(HostError::NoReceiver(tab_id))?;
        content
            .send(ContentEvent::Message {
                message: message.clone(),
                reply: None,
            })
            .map_err(|_| HostError::NoReceiver(tab_id))?;
        Ok(None)
    }

    fn current_window(&self) -> Option<WindowId> {
        let state = self.lock().ok()?;
        let focused = state.tabs.values().find(|t| t.active).map(|t| t.window_id);
        focused.or(Some(SCRIPT_WINDOW))
    }

    fn create_tab(&mut self, request: CreateTab) -> Result<TabInfo, HostError> {
        let mut state = self.lock()?;
        Ok(Self::open(&mut state, request.window_id, request.url, request.active))
    }

    fn create_window(&mut self, request: CreateWindow) -> Result<WindowInfo, HostError> {
        let mut state = self.lock()?;
        let id = state.next_window;
        state.next_window += 1;
        debug!(window = id, width = request.width, height = request.height, "opened window");
        let tab = Self::open(&mut state, id, request.url, true);
        Ok(WindowInfo { id, tabs: vec![tab] })
    }
}

struct Page {
    url: String,
    tx: mpsc::UnboundedSender<ContentEvent>,
    task: JoinHandle<PageContext>,
    forwarder: JoinHandle<()>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageReport {
    tab: TabId,
    url: String,
    classification: Classification,
    suggestions: Vec<ShownSuggestion>,
    banner_visible: bool,
    anchors_injected: bool,
}

impl PageReport {
    fn new(tab: TabId, page: &PageContext) -> Self {
        Self {
            tab,
            url: page.page_url().to_string(),
            classification: page.classification(),
            suggestions: page.display().shown().to_vec(),
            banner_visible: !page.document().banners().is_empty(),
            anchors_injected: !page.document().quick_links().is_empty(),
        }
    }
}

#[derive(Serialize)]
struct ResponseRecord {
    step: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    tab: Option<TabId>,
    action: &'static str,
    response: Option<Response>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    generated_at: String,
    speed: f64,
    testing_mode: bool,
    pages: Vec<PageReport>,
    responses: Vec<ResponseRecord>,
    durations: Value,
}

struct Simulator {
    config: Config,
    store: Arc<dyn KvStore>,
    browser: SimBrowser,
    bg_tx: mpsc::UnboundedSender<BackgroundEvent>,
    pages: HashMap<TabId, Page>,
    speed: f64,
    seed: u64,
    loads: u64,
    finished: Vec<PageReport>,
    responses: Vec<ResponseRecord>,
}

impl Simulator {
    fn send_background(&self, event: BackgroundEvent) -> Result<(), Box<dyn std::error::Error>> {
        self.bg_tx
            .send(event)
            .map_err(|_| "background loop stopped".into())
    }

    fn load(&mut self, tab: TabId, url: &str) -> Result<(), Box<dyn std::error::Error>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let page = ContentContext::new(
            url,
            MemoryDocument::new(),
            TokioTimers::new(tx.clone(), ContentEvent::TimerFired).with_speed(self.speed),
            SeededRandom::new(self.seed.wrapping_add(self.loads)),
            self.store.as_ref(),
            &self.config,
        );
        self.loads += 1;
        let forwarder =
            spawn_store_forwarder(self.store.as_ref(), tx.clone(), ContentEvent::StorageChanged);
        let task = tokio::spawn(run_content(page, rx));
        self.browser.load(tab, url, tx.clone())?;
        self.pages.insert(
            tab,
            Page {
                url: url.to_string(),
                tx,
                task,
                forwarder,
            },
        );
        Ok(())
    }

    async fn unload(&mut self, tab: TabId) {
        let Some(page) = self.pages.remove(&tab) else {
            return;
        };
        let _ = page.tx.send(ContentEvent::Unload);
        page.forwarder.abort();
        match page.task.await {
            Ok(ctx) => self.finished.push(PageReport::new(tab, &ctx)),
            Err(e) => warn!(tab, url = %page.url, error = %e, "content loop failed"),
        }
    }

    async fn step(&mut self, index: usize, step: Step) -> Result<(), Box<dyn std::error::Error>> {
        debug!(index, ?step, "running step");
        match step {
            Step::Navigate { tab, url } => {
                self.unload(tab).await;
                self.load(tab, &url)?;
                self.send_background(BackgroundEvent::NavigationCompleted { tab_id: tab, url })?;
            }
            Step::Activate { tab } => {
                self.browser.activate(tab)?;
                self.send_background(BackgroundEvent::TabActivated { tab_id: tab })?;
            }
            Step::Close { tab } => {
                self.unload(tab).await;
                self.browser.close(tab)?;
                self.send_background(BackgroundEvent::TabRemoved { tab_id: tab })?;
            }
            Step::Dismiss { tab } => match self.pages.get(&tab) {
                Some(page) => {
                    let _ = page.tx.send(ContentEvent::DismissClicked);
                }
                None => warn!(tab, "dismiss on a tab without a page"),
            },
            Step::Wait { ms } => {
                tokio::time::sleep(Duration::from_millis(ms).div_f64(self.speed)).await;
            }
            Step::Message { tab, message } => {
                let action = message.action();
                let response = match tab {
                    Some(tab_id) => self.message_page(tab_id, message).await,
                    None => self.message_background(message).await?,
                };
                self.responses.push(ResponseRecord {
                    step: index,
                    tab,
                    action,
                    response,
                });
            }
        }
        Ok(())
    }

    async fn message_page(&self, tab: TabId, message: Message) -> Option<Response> {
        let Some(page) = self.pages.get(&tab) else {
            warn!(tab, "message to a tab without a page");
            return None;
        };
        let (reply, rx) = oneshot::channel();
        page.tx
            .send(ContentEvent::Message {
                message,
                reply: Some(reply),
            })
            .ok()?;
        rx.await.ok()
    }

    async fn message_background(
        &self,
        message: Message,
    ) -> Result<Option<Response>, Box<dyn std::error::Error>> {
        let (reply, rx) = oneshot::channel();
        self.send_background(BackgroundEvent::Message {
            message,
            reply: Some(reply),
        })?;
        Ok(rx.await.ok().flatten())
    }
}

pub fn run(script_path: &Path, speed: f64) -> Result<(), Box<dyn std::error::Error>> {
    if !speed.is_finite() || speed < MIN_SPEED {
        return Err(ValidationError::InvalidValue {
            field: "speed".into(),
            message: format!("must be a number of at least {MIN_SPEED}, got {speed}"),
        }
        .into());
    }
    let content = std::fs::read_to_string(script_path)
        .map_err(|e| format!("cannot read {}: {e}", script_path.display()))?;
    let script: Script = toml::from_str(&content)?;
    let config = Config::load_or_default();

    let report = super::block_on(simulate(script, config, speed))??;
    super::print_json(&report)
}

async fn simulate(
    script: Script,
    config: Config,
    speed: f64,
) -> Result<Report, Box<dyn std::error::Error>> {
    let store: Arc<dyn KvStore> = Arc::new(LocalStore::in_memory());
    store.set_value(keys::IN_TESTING_MODE, Value::Bool(script.testing_mode))?;

    let browser = SimBrowser::new();
    let (bg_tx, bg_rx) = mpsc::unbounded_channel();
    let background = BackgroundContext::new(
        browser.clone(),
        TokioTimers::new(bg_tx.clone(), BackgroundEvent::TimerFired).with_speed(speed),
        store.clone(),
        Arc::new(ScaledClock::new(speed)),
        &config,
    );
    let bg_forwarder =
        spawn_store_forwarder(store.as_ref(), bg_tx.clone(), BackgroundEvent::StorageChanged);
    let bg_task = tokio::spawn(run_background(background, bg_rx));

    let seed = script
        .seed
        .unwrap_or_else(|| (ThreadRandom.next_f64() * u64::MAX as f64) as u64);
    info!(steps = script.steps.len(), speed, seed, "starting simulation");

    let mut sim = Simulator {
        config,
        store,
        browser,
        bg_tx,
        pages: HashMap::new(),
        speed,
        seed,
        loads: 0,
        finished: Vec::new(),
        responses: Vec::new(),
    };

    for (index, step) in script.steps.into_iter().enumerate() {
        sim.step(index, step).await?;
    }

    let mut open: Vec<TabId> = sim.pages.keys().copied().collect();
    open.sort_unstable();
    for tab in open {
        sim.unload(tab).await;
    }

    sim.send_background(BackgroundEvent::Shutdown)?;
    let background = bg_task.await?;
    bg_forwarder.abort();

    Ok(Report {
        generated_at: chrono::Utc::now().to_rfc3339(),
        speed,
        testing_mode: background.testing_mode(),
        pages: sim.finished,
        responses: sim.responses,
        durations: background.tracker().snapshot().to_value(),
    })
}
