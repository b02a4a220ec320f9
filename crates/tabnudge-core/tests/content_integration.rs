//! Integration tests for the content context of a single page.

use std::sync::Arc;

use serde_json::json;
use tabnudge_core::content::{ContentContext, STATUS_ANCHORS, STATUS_SHOWING, STATUS_UNKNOWN};
use tabnudge_core::host::{Clock, ManualClock, ManualTimers, ScriptedRandom};
use tabnudge_core::runtime::{Context, Control};
use tabnudge_core::storage::{keys, Config, KvStore, LocalStore};
use tabnudge_core::suggestion::{pools, DisplayState, MemoryDocument};
use tabnudge_core::{ContentEvent, Message, Response};

type Page = ContentContext<MemoryDocument, ManualTimers, ScriptedRandom>;

struct PageHarness {
    clock: Arc<ManualClock>,
    page: Page,
}

impl PageHarness {
    fn load(url: &str, store: &LocalStore, doc: MemoryDocument) -> Self {
        let clock = Arc::new(ManualClock::new(0));
        let page = ContentContext::new(
            url,
            doc,
            ManualTimers::new(clock.clone()),
            ScriptedRandom::new([0.0, 0.5]),
            store,
            &Config::default(),
        );
        Self { clock, page }
    }

    fn advance(&mut self, ms: u64) {
        let until = self.clock.now_ms() + ms;
        while let Some(timer) = self.page.timers_mut().pop_due(until) {
            self.page.on_timer(timer);
        }
        self.clock.set(until);
    }

    fn banner_count(&self) -> usize {
        self.page.document().banners().len()
    }
}

fn show(is_productive: bool, testing_mode: bool) -> Message {
    Message::ShowSuggestion {
        is_productive,
        testing_mode,
    }
}

#[test]
fn test_show_suggestion_is_acknowledged_and_rendered() {
    let store = LocalStore::in_memory();
    let mut h = PageHarness::load("https://github.com", &store, MemoryDocument::new());

    let response = h.page.handle_message(&show(true, false));
    assert_eq!(response, Response::ack(STATUS_SHOWING));

    let banners = h.page.document().banners();
    assert_eq!(banners.len(), 1);
    assert_eq!(banners[0].site_tag, "PRODUCTIVE");
    assert!(pools::UNPRODUCTIVE_NUDGES.contains(&banners[0].message.as_str()));
    assert!(banners[0].testing_indicator.is_none());
}

#[test]
fn test_showing_twice_leaves_one_banner() {
    let store = LocalStore::in_memory();
    let mut h = PageHarness::load("https://reddit.com", &store, MemoryDocument::new());

    h.page.handle_message(&show(false, true));
    h.page.handle_message(&show(false, true));

    assert_eq!(h.banner_count(), 1);
    assert_eq!(h.page.display().pending_recurrences(), 2);
}

#[test]
fn test_auto_dismiss_then_recurrence() {
    let store = LocalStore::in_memory();
    let mut h = PageHarness::load("https://reddit.com", &store, MemoryDocument::new());
    h.page.handle_message(&show(false, true));

    // Testing mode: dismiss after 5s, next show at 5s + 0.5 * 5s.
    h.advance(5_000);
    assert_eq!(h.banner_count(), 0);
    h.advance(2_500);
    assert_eq!(h.banner_count(), 1);
    assert_eq!(h.page.display().shown().len(), 2);
}

#[test]
fn test_dismissal_does_not_stop_recurrence() {
    let store = LocalStore::in_memory();
    let mut h = PageHarness::load("https://github.com", &store, MemoryDocument::new());
    h.page.handle_message(&show(true, true));

    assert_eq!(h.page.dispatch(ContentEvent::DismissClicked), Control::Continue);
    assert_eq!(
        h.page.display().state(h.page.document()),
        DisplayState::Idle
    );

    h.advance(10_000);
    assert_eq!(h.banner_count(), 1);
    assert!(h.page.display().shown().len() >= 2);
}

#[test]
fn test_recurrence_chain_repeats_until_unload() {
    let store = LocalStore::in_memory();
    let mut h = PageHarness::load("https://github.com", &store, MemoryDocument::new());
    h.page.handle_message(&show(true, true));

    h.advance(60_000);
    let shown = h.page.display().shown().len();
    assert!(shown >= 7, "only {shown} suggestions in a minute");
    assert!(h.banner_count() <= 1);

    assert_eq!(h.page.dispatch(ContentEvent::Unload), Control::Stop);
}

#[test]
fn test_missing_body_arms_nothing() {
    let store = LocalStore::in_memory();
    let mut h = PageHarness::load("https://github.com", &store, MemoryDocument::without_body());

    let response = h.page.handle_message(&show(true, true));
    assert_eq!(response, Response::ack(STATUS_SHOWING));
    assert_eq!(h.page.timers().pending_count(), 0);
    h.advance(60_000);
    assert!(h.page.display().shown().is_empty());
}

#[test]
fn test_inject_anchors_keeps_single_panel() {
    let store = LocalStore::in_memory();
    let mut h =
        PageHarness::load("https://www.youtube.com/watch?v=1", &store, MemoryDocument::new());

    assert_eq!(
        h.page.handle_message(&Message::InjectAnchors),
        Response::ack(STATUS_ANCHORS)
    );
    h.page.handle_message(&Message::InjectAnchors);

    let panels = h.page.document().quick_links();
    assert_eq!(panels.len(), 1);
    assert!(panels[0].links.contains(&"https://github.com".to_string()));
}

#[test]
fn test_other_messages_get_unknown_ack() {
    let store = LocalStore::in_memory();
    let mut h = PageHarness::load("https://github.com", &store, MemoryDocument::new());
    assert_eq!(
        h.page.handle_message(&Message::GetTabDurations),
        Response::ack(STATUS_UNKNOWN)
    );
}

#[test]
fn test_initial_testing_mode_from_store_and_live_toggle() {
    let store = LocalStore::in_memory();
    store.set_value(keys::IN_TESTING_MODE, json!(true)).unwrap();
    let mut h = PageHarness::load("https://github.com", &store, MemoryDocument::new());
    assert!(h.page.display().testing_mode());

    let mut changes = store.subscribe();
    store.set_value(keys::IN_TESTING_MODE, json!(false)).unwrap();
    h.page
        .dispatch(ContentEvent::StorageChanged(changes.try_recv().unwrap()));
    assert!(!h.page.display().testing_mode());
}

#[test]
fn test_dispatch_replies_through_channel() {
    let store = LocalStore::in_memory();
    let mut h = PageHarness::load("https://github.com", &store, MemoryDocument::new());
    let (tx, mut rx) = tokio::sync::oneshot::channel();
    h.page.dispatch(ContentEvent::Message {
        message: Message::InjectAnchors,
        reply: Some(tx),
    });
    assert_eq!(rx.try_recv().unwrap(), Response::ack(STATUS_ANCHORS));
}

#[test]
fn test_message_handled_when_sender_gone() {
    let store = LocalStore::in_memory();
    let mut h = PageHarness::load("https://github.com", &store, MemoryDocument::new());
    let (tx, rx) = tokio::sync::oneshot::channel();
    drop(rx);

    let control = h.page.dispatch(ContentEvent::Message {
        message: Message::InjectAnchors,
        reply: Some(tx),
    });
    assert_eq!(control, Control::Continue);
    assert_eq!(h.page.document().quick_links().len(), 1);
}
