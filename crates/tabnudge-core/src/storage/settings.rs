//! Typed view over the persisted settings keys.

use serde::Serialize;
use serde_json::{Map, Value};

use super::kv::KvStore;
use crate::error::StorageError;
use crate::site::Classification;
use crate::tracker::TabDurationLedger;

/// Storage keys shared by background, content and popup contexts.
pub mod keys {
    pub const IN_TESTING_MODE: &str = "inTestingMode";
    pub const SUGGESTION_FREQUENCY_MINUTES: &str = "suggestionFrequencyMinutes";
    pub const TAB_DURATIONS: &str = "tabDurations";
    pub const CURRENT_SITE_TYPE: &str = "currentSiteType";
}

pub const DEFAULT_SUGGESTION_FREQUENCY_MINUTES: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub in_testing_mode: bool,
    pub suggestion_frequency_minutes: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            in_testing_mode: false,
            suggestion_frequency_minutes: DEFAULT_SUGGESTION_FREQUENCY_MINUTES,
        }
    }
}

impl Settings {
    /// Read both keys; absent or mistyped values fall back to defaults.
    pub fn load(store: &dyn KvStore) -> Result<Self, StorageError> {
        let defaults = Self::default();
        let in_testing_mode = store
            .get(keys::IN_TESTING_MODE)?
            .and_then(|v| v.as_bool())
            .unwrap_or(defaults.in_testing_mode);
        let suggestion_frequency_minutes = store
            .get(keys::SUGGESTION_FREQUENCY_MINUTES)?
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(defaults.suggestion_frequency_minutes);
        Ok(Self {
            in_testing_mode,
            suggestion_frequency_minutes,
        })
    }

    pub fn save(&self, store: &dyn KvStore) -> Result<(), StorageError> {
        if self.suggestion_frequency_minutes == 0 {
            return Err(StorageError::InvalidValue {
                key: keys::SUGGESTION_FREQUENCY_MINUTES.to_string(),
                message: "must be at least 1 minute".to_string(),
            });
        }
        let mut items = Map::new();
        items.insert(
            keys::SUGGESTION_FREQUENCY_MINUTES.to_string(),
            Value::from(self.suggestion_frequency_minutes),
        );
        items.insert(
            keys::IN_TESTING_MODE.to_string(),
            Value::Bool(self.in_testing_mode),
        );
        store.set(items)
    }
}

pub fn load_current_site_type(store: &dyn KvStore) -> Result<Classification, StorageError> {
    Ok(store
        .get(keys::CURRENT_SITE_TYPE)?
        .and_then(|v| v.as_str().and_then(|s| s.parse().ok()))
        .unwrap_or_default())
}

pub fn save_current_site_type(
    store: &dyn KvStore,
    classification: Classification,
) -> Result<(), StorageError> {
    store.set_value(
        keys::CURRENT_SITE_TYPE,
        Value::String(classification.as_str().to_string()),
    )
}

pub fn load_tab_durations(store: &dyn KvStore) -> Result<TabDurationLedger, StorageError> {
    Ok(store
        .get(keys::TAB_DURATIONS)?
        .map(|v| TabDurationLedger::from_value(&v))
        .unwrap_or_default())
}

pub fn save_tab_durations(
    store: &dyn KvStore,
    ledger: &TabDurationLedger,
) -> Result<(), StorageError> {
    store.set_value(keys::TAB_DURATIONS, ledger.to_value())
}
