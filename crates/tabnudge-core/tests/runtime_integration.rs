//! End-to-end run of a background and a content loop on tokio.
//!
//! Time is paused, so the runtime jumps straight to the next timer.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tabnudge_core::host::{
    CreateTab, CreateWindow, ScriptedRandom, SystemClock, TabHost, TabInfo, WindowId, WindowInfo,
};
use tabnudge_core::runtime::{run_background, run_content, spawn_store_forwarder, TokioTimers};
use tabnudge_core::storage::{keys, Config, KvStore, LocalStore};
use tabnudge_core::suggestion::MemoryDocument;
use tabnudge_core::{
    BackgroundContext, BackgroundEvent, ContentContext, ContentEvent, HostError, Message, Response,
    TabId,
};
use tokio::sync::{mpsc, oneshot};

/// Host that forwards messages into content queues.
struct ChannelBrowser {
    tabs: HashMap<TabId, (String, mpsc::UnboundedSender<ContentEvent>)>,
}

impl TabHost for ChannelBrowser {
    fn tab_exists(&self, tab_id: TabId) -> bool {
        self.tabs.contains_key(&tab_id)
    }

    fn tab_url(&self, tab_id: TabId) -> Option<String> {
        self.tabs.get(&tab_id).map(|(url, _)| url.clone())
    }

    fn send_to_tab(
        &mut self,
        tab_id: TabId,
        message: &Message,
    ) -> Result<Option<Response>, HostError> {
        let (_, tx) = self.tabs.get(&tab_id).ok_or(HostError::TabNotFound(tab_id))?;
        tx.send(ContentEvent::Message {
            message: message.clone(),
            reply: None,
        })
        .map_err(|_| HostError::NoReceiver(tab_id))?;
        Ok(None)
    }

    fn current_window(&self) -> Option<WindowId> {
        None
    }

    fn create_tab(&mut self, _request: CreateTab) -> Result<TabInfo, HostError> {
        Err(HostError::NoWindow)
    }

    fn create_window(&mut self, _request: CreateWindow) -> Result<WindowInfo, HostError> {
        Err(HostError::Rejected("not supported".into()))
    }
}

#[tokio::test(start_paused = true)]
async fn test_navigation_leads_to_banner() {
    let store: Arc<dyn KvStore> = Arc::new(LocalStore::in_memory());
    store.set_value(keys::IN_TESTING_MODE, json!(true)).unwrap();
    let config = Config::default();
    let url = "https://www.youtube.com/watch?v=x";

    let (content_tx, content_rx) = mpsc::unbounded_channel();
    let page = ContentContext::new(
        url,
        MemoryDocument::new(),
        TokioTimers::new(content_tx.clone(), ContentEvent::TimerFired),
        ScriptedRandom::new([0.0]),
        store.as_ref(),
        &config,
    );
    let page_task = tokio::spawn(run_content(page, content_rx));

    let (bg_tx, bg_rx) = mpsc::unbounded_channel();
    let browser = ChannelBrowser {
        tabs: HashMap::from([(1, (url.to_string(), content_tx.clone()))]),
    };
    let background = BackgroundContext::new(
        browser,
        TokioTimers::new(bg_tx.clone(), BackgroundEvent::TimerFired),
        store.clone(),
        Arc::new(SystemClock),
        &config,
    );
    let bg_task = tokio::spawn(run_background(background, bg_rx));

    bg_tx
        .send(BackgroundEvent::NavigationCompleted {
            tab_id: 1,
            url: url.to_string(),
        })
        .unwrap();

    // Suggestion delay is 5s in testing mode; the banner stays for 5s.
    tokio::time::sleep(Duration::from_secs(6)).await;

    let (reply_tx, reply_rx) = oneshot::channel();
    bg_tx
        .send(BackgroundEvent::Message {
            message: Message::GetTabDurations,
            reply: Some(reply_tx),
        })
        .unwrap();
    assert!(matches!(
        reply_rx.await.unwrap(),
        Some(Response::Durations { .. })
    ));

    content_tx.send(ContentEvent::Unload).unwrap();
    bg_tx.send(BackgroundEvent::Shutdown).unwrap();
    let page = page_task.await.unwrap();
    let background = bg_task.await.unwrap();

    assert_eq!(page.display().shown().len(), 1);
    let banners = page.document().banners();
    assert_eq!(banners.len(), 1);
    assert_eq!(banners[0].site_tag, "UNPRODUCTIVE");
    assert!(background.scheduler().pending().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_store_changes_reach_background_loop() {
    let store: Arc<dyn KvStore> = Arc::new(LocalStore::in_memory());
    let (bg_tx, bg_rx) = mpsc::unbounded_channel();
    let forwarder =
        spawn_store_forwarder(store.as_ref(), bg_tx.clone(), BackgroundEvent::StorageChanged);

    let background = BackgroundContext::new(
        ChannelBrowser {
            tabs: HashMap::new(),
        },
        TokioTimers::new(bg_tx.clone(), BackgroundEvent::TimerFired),
        store.clone(),
        Arc::new(SystemClock),
        &Config::default(),
    );
    assert!(!background.testing_mode());
    let bg_task = tokio::spawn(run_background(background, bg_rx));

    store.set_value(keys::IN_TESTING_MODE, json!(true)).unwrap();
    tokio::time::sleep(Duration::from_millis(10)).await;
    bg_tx.send(BackgroundEvent::Shutdown).unwrap();

    let background = bg_task.await.unwrap();
    assert!(background.testing_mode());
    forwarder.abort();
}
