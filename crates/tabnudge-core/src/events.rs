//! Events consumed by the per-context event loops.

use tokio::sync::oneshot;

use crate::host::TimerId;
use crate::messages::{Message, Response};
use crate::storage::StorageChange;
use crate::tracker::TabId;

#[derive(Debug)]
pub enum BackgroundEvent {
    TabActivated {
        tab_id: TabId,
    },
    TabRemoved {
        tab_id: TabId,
    },
    /// A tab finished loading `url`.
    NavigationCompleted {
        tab_id: TabId,
        url: String,
    },
    TimerFired(TimerId),
    StorageChanged(StorageChange),
    Message {
        message: Message,
        reply: Option<oneshot::Sender<Option<Response>>>,
    },
    Shutdown,
}

#[derive(Debug)]
pub enum ContentEvent {
    Message {
        message: Message,
        reply: Option<oneshot::Sender<Response>>,
    },
    TimerFired(TimerId),
    /// The banner's dismiss control was clicked.
    DismissClicked,
    StorageChanged(StorageChange),
    /// The page is going away.
    Unload,
}
