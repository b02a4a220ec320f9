use serde::{Deserialize, Serialize};

use crate::error::HostError;
use crate::messages::{Message, Response};
use crate::tracker::TabId;

pub type WindowId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabInfo {
    pub id: TabId,
    pub window_id: WindowId,
    pub url: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfo {
    pub id: WindowId,
    pub tabs: Vec<TabInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTab {
    pub window_id: WindowId,
    pub url: String,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateWindow {
    pub url: String,
    pub focused: bool,
    pub width: u32,
    pub height: u32,
}

/// The background context's view of the browser.
pub trait TabHost {
    fn tab_exists(&self, tab_id: TabId) -> bool;

    fn tab_url(&self, tab_id: TabId) -> Option<String>;

    /// Deliver a message to the content context of `tab_id`.
    ///
    /// Hosts that deliver asynchronously return `Ok(None)`.
    fn send_to_tab(
        &mut self,
        tab_id: TabId,
        message: &Message,
    ) -> Result<Option<Response>, HostError>;

    fn current_window(&self) -> Option<WindowId>;

    fn create_tab(&mut self, request: CreateTab) -> Result<TabInfo, HostError>;

    fn create_window(&mut self, request: CreateWindow) -> Result<WindowInfo, HostError>;
}
