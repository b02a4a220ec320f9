//! Cross-context message protocol.
//!
//! Messages travel between the background context, per-tab content
//! contexts and the popup as JSON objects discriminated by `action`.

use serde::{Deserialize, Serialize};

use crate::host::{TabInfo, WindowId};
use crate::tracker::TabDurationLedger;

/// Which host list `switchMode` opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Productive,
    Unproductive,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Productive => "productive",
            Mode::Unproductive => "unproductive",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Message {
    /// background -> content: render a banner now.
    #[serde(rename_all = "camelCase")]
    ShowSuggestion {
        is_productive: bool,
        #[serde(default, alias = "inTestingMode")]
        testing_mode: bool,
    },
    /// popup -> background: snapshot of the tab ledger.
    GetTabDurations,
    /// popup -> content: add the quick-links panel.
    InjectAnchors,
    /// popup -> background: open URLs as tabs in the current window.
    #[serde(rename_all = "camelCase")]
    OpenUrls {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        urls: Option<Vec<String>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        make_first_tab_active: Option<bool>,
    },
    /// popup -> background: open a new window seeded from one host list.
    SwitchMode {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mode: Option<Mode>,
    },
}

impl Message {
    pub fn action(&self) -> &'static str {
        match self {
            Message::ShowSuggestion { .. } => "showSuggestion",
            Message::GetTabDurations => "getTabDurations",
            Message::InjectAnchors => "injectAnchors",
            Message::OpenUrls { .. } => "openUrls",
            Message::SwitchMode { .. } => "switchMode",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    Ack {
        received: bool,
        status: String,
    },
    Durations {
        durations: TabDurationLedger,
    },
    OpenUrls(OpenUrlsResponse),
    SwitchMode(SwitchModeResponse),
}

impl Response {
    pub fn ack(status: &str) -> Self {
        Response::Ack {
            received: true,
            status: status.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenUrlsResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tabs: Option<Vec<TabInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchModeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<Mode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_id: Option<WindowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tabs: Option<Vec<TabInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
