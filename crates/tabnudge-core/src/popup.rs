//! View model behind the popup.

use serde::Serialize;

use crate::error::{Result, StorageError};
use crate::integrations::ApiResponse;
use crate::site::Classification;
use crate::storage::settings::load_current_site_type;
use crate::storage::{KvStore, Settings};
use crate::tracker::TabDurationLedger;

const URL_DISPLAY_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteStatus {
    pub classification: Classification,
    pub headline: &'static str,
    pub hint: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Status block for the current site, read from the stored site type.
pub fn site_status(
    store: &dyn KvStore,
    current_url: Option<&str>,
) -> Result<SiteStatus, StorageError> {
    let classification = load_current_site_type(store)?;
    let (headline, hint) = match classification {
        Classification::Productive => ("Productive", "We'll try to distract you soon!"),
        Classification::Unproductive => ("Unproductive", "We'll try to make you productive soon!"),
        Classification::Neutral => ("Neutral", "This site isn't on our radar."),
    };
    Ok(SiteStatus {
        classification,
        headline,
        hint,
        url: current_url.map(truncate_url),
    })
}

pub fn truncate_url(url: &str) -> String {
    if url.chars().count() > URL_DISPLAY_LIMIT {
        let head: String = url.chars().take(URL_DISPLAY_LIMIT).collect();
        format!("{head}...")
    } else {
        url.to_string()
    }
}

/// Persist both popup settings at once.
pub fn save_settings(
    store: &dyn KvStore,
    suggestion_frequency_minutes: u32,
    in_testing_mode: bool,
) -> Result<Settings, StorageError> {
    let settings = Settings {
        in_testing_mode,
        suggestion_frequency_minutes,
    };
    settings.save(store)?;
    Ok(settings)
}

/// One line per tab, in whole seconds.
pub fn describe_durations(ledger: &TabDurationLedger) -> Vec<String> {
    ledger
        .iter()
        .map(|(tab_id, ms)| format!("Tab {tab_id}: {} seconds", (ms as f64 / 1000.0).round()))
        .collect()
}

/// Text shown after a remote call.
pub fn describe_api_result(result: &Result<ApiResponse>) -> String {
    match result {
        Ok(response) => response.summary(),
        Err(e) => format!("Error: {e}"),
    }
}
