//! TOML-based application configuration.
//!
//! Stores:
//! - Suggestion timing for normal and testing mode
//! - Extra host substrings for the site lists
//! - Base URLs of the session and focus services
//! - An optional explicit settings-store path
//!
//! Configuration is stored at `~/.config/tabnudge/config.toml`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::error::ConfigError;
use crate::site::SiteClassifier;

/// Delays used by the scheduler and the display loop, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingConfig {
    #[serde(default = "default_suggestion_delay_ms")]
    pub suggestion_delay_ms: u64,
    #[serde(default = "default_testing_suggestion_delay_ms")]
    pub testing_suggestion_delay_ms: u64,
    #[serde(default = "default_dismiss_ms")]
    pub dismiss_ms: u64,
    #[serde(default = "default_testing_dismiss_ms")]
    pub testing_dismiss_ms: u64,
    #[serde(default = "default_next_min_ms")]
    pub next_min_ms: u64,
    #[serde(default = "default_next_max_ms")]
    pub next_max_ms: u64,
    #[serde(default = "default_testing_next_min_ms")]
    pub testing_next_min_ms: u64,
    #[serde(default = "default_testing_next_max_ms")]
    pub testing_next_max_ms: u64,
}

/// User additions to the built-in host lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitesConfig {
    #[serde(default)]
    pub extra_productive: Vec<String>,
    #[serde(default)]
    pub extra_unproductive: Vec<String>,
}

/// Remote collaborator endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_session_base_url")]
    pub session_base_url: String,
    #[serde(default = "default_focus_base_url")]
    pub focus_base_url: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Settings file; defaults to `settings.json` in the data directory.
    #[serde(default)]
    pub path: Option<String>,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/tabnudge/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub sites: SitesConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

// Default functions
fn default_suggestion_delay_ms() -> u64 {
    2 * 60 * 1000
}
fn default_testing_suggestion_delay_ms() -> u64 {
    5 * 1000
}
fn default_dismiss_ms() -> u64 {
    30 * 1000
}
fn default_testing_dismiss_ms() -> u64 {
    5 * 1000
}
fn default_next_min_ms() -> u64 {
    5 * 60 * 1000
}
fn default_next_max_ms() -> u64 {
    10 * 60 * 1000
}
fn default_testing_next_min_ms() -> u64 {
    5 * 1000
}
fn default_testing_next_max_ms() -> u64 {
    10 * 1000
}
fn default_session_base_url() -> String {
    "http://127.0.0.1:5001/api".into()
}
fn default_focus_base_url() -> String {
    "http://127.0.0.1:6363".into()
}
fn default_user_id() -> String {
    "test_user".into()
}
fn default_timeout_secs() -> u64 {
    10
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            suggestion_delay_ms: default_suggestion_delay_ms(),
            testing_suggestion_delay_ms: default_testing_suggestion_delay_ms(),
            dismiss_ms: default_dismiss_ms(),
            testing_dismiss_ms: default_testing_dismiss_ms(),
            next_min_ms: default_next_min_ms(),
            next_max_ms: default_next_max_ms(),
            testing_next_min_ms: default_testing_next_min_ms(),
            testing_next_max_ms: default_testing_next_max_ms(),
        }
    }
}

impl TimingConfig {
    /// Delay between a navigation and the first suggestion.
    pub fn suggestion_delay(&self, testing: bool) -> Duration {
        Duration::from_millis(if testing {
            self.testing_suggestion_delay_ms
        } else {
            self.suggestion_delay_ms
        })
    }

    /// How long a banner stays up before it removes itself.
    pub fn dismiss_after(&self, testing: bool) -> Duration {
        Duration::from_millis(if testing {
            self.testing_dismiss_ms
        } else {
            self.dismiss_ms
        })
    }

    /// Bounds of the randomized re-arm interval, `(min, max)` in ms.
    pub fn next_range_ms(&self, testing: bool) -> (u64, u64) {
        if testing {
            (self.testing_next_min_ms, self.testing_next_max_ms)
        } else {
            (self.next_min_ms, self.next_max_ms)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.next_min_ms > self.next_max_ms {
            return Err(ConfigError::InvalidValue {
                key: "timing.next_min_ms".into(),
                message: format!("{} exceeds next_max_ms {}", self.next_min_ms, self.next_max_ms),
            });
        }
        if self.testing_next_min_ms > self.testing_next_max_ms {
            return Err(ConfigError::InvalidValue {
                key: "timing.testing_next_min_ms".into(),
                message: format!(
                    "{} exceeds testing_next_max_ms {}",
                    self.testing_next_min_ms, self.testing_next_max_ms
                ),
            });
        }
        Ok(())
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            session_base_url: default_session_base_url(),
            focus_base_url: default_focus_base_url(),
            user_id: default_user_id(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(ConfigError::UnknownKey(key.to_string()));
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            let is_leaf = parts.peek().is_none();
            if is_leaf {
                let obj = current
                    .as_object_mut()
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
                let existing = obj
                    .get(part)
                    .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value.parse::<bool>().map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    // Option<String> fields serialize as null until first set.
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current
                .get_mut(part)
                .ok_or_else(|| ConfigError::UnknownKey(key.to_string()))?;
        }

        Err(ConfigError::UnknownKey(key.to_string()))
    }

    fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed,
    /// or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let cfg: Config = toml::from_str(&content).map_err(|e| ConfigError::LoadFailed {
                    path: path.to_path_buf(),
                    message: e.to_string(),
                })?;
                cfg.timing.validate()?;
                Ok(cfg)
            }
            Err(_) => {
                let cfg = Self::default();
                cfg.save_to(path)?;
                Ok(cfg)
            }
        }
    }

    /// Persist to the default location.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be serialized or written to disk.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| save_failed(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting. Returns error if the
    /// key is unknown or the value does not fit the key's type.
    pub fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };
        let mut json = serde_json::to_value(&*self).map_err(|e| invalid(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| invalid(e.to_string()))?;
        updated.timing.validate()?;
        *self = updated;
        Ok(())
    }

    /// Set a config value by key and persist to the default location.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        self.apply(key, value)?;
        self.save()
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_default()
    }

    /// Classifier over the built-in lists plus configured extras.
    pub fn classifier(&self) -> SiteClassifier {
        SiteClassifier::with_extra(&self.sites.extra_productive, &self.sites.extra_unproductive)
    }

    /// Settings file location, honoring `store.path`.
    pub fn store_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.store.path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(data_dir()?.join("settings.json")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let parsed: Config = toml::from_str("[timing]\ndismiss_ms = 1000\n").unwrap();
        assert_eq!(parsed.timing.dismiss_ms, 1000);
        assert_eq!(parsed.timing.suggestion_delay_ms, 120_000);
        assert_eq!(parsed.api.session_base_url, "http://127.0.0.1:5001/api");
    }

    #[test]
    fn timing_selects_by_mode() {
        let timing = TimingConfig::default();
        assert_eq!(timing.suggestion_delay(true), Duration::from_secs(5));
        assert_eq!(timing.suggestion_delay(false), Duration::from_secs(120));
        assert_eq!(timing.dismiss_after(true), Duration::from_secs(5));
        assert_eq!(timing.dismiss_after(false), Duration::from_secs(30));
        assert_eq!(timing.next_range_ms(true), (5_000, 10_000));
        assert_eq!(timing.next_range_ms(false), (300_000, 600_000));
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("timing.dismiss_ms").as_deref(), Some("30000"));
        assert_eq!(cfg.get("api.user_id").as_deref(), Some("test_user"));
        assert!(cfg.get("timing.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn apply_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.apply("timing.testing_dismiss_ms", "2500").unwrap();
        assert_eq!(cfg.timing.testing_dismiss_ms, 2500);
    }

    #[test]
    fn apply_updates_list_and_optional_string() {
        let mut cfg = Config::default();
        cfg.apply("sites.extra_productive", r#"["rust-lang.org"]"#).unwrap();
        assert_eq!(cfg.sites.extra_productive, vec!["rust-lang.org".to_string()]);
        cfg.apply("store.path", "/tmp/tabnudge.json").unwrap();
        assert_eq!(cfg.store.path.as_deref(), Some("/tmp/tabnudge.json"));
    }

    #[test]
    fn apply_rejects_unknown_key_and_bad_type() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.apply("timing.nonexistent", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
        assert!(matches!(
            cfg.apply("timing.dismiss_ms", "soon"),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn apply_rejects_inverted_range() {
        let mut cfg = Config::default();
        let result = cfg.apply("timing.testing_next_min_ms", "60000");
        assert!(result.is_err());
        assert_eq!(cfg.timing.testing_next_min_ms, 5_000);
    }

    #[test]
    fn load_from_missing_file_writes_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg, Config::default());
        assert!(path.exists());

        let mut changed = cfg.clone();
        changed.apply("api.timeout_secs", "3").unwrap();
        changed.save_to(&path).unwrap();
        assert_eq!(Config::load_from(&path).unwrap().api.timeout_secs, 3);
    }

    #[test]
    fn load_from_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "timing = 12").unwrap();
        assert!(matches!(
            Config::load_from(&path),
            Err(ConfigError::LoadFailed { .. })
        ));
    }
}
