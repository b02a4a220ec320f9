mod config;
pub mod kv;
pub mod settings;

pub use config::{ApiConfig, Config, SitesConfig, StoreConfig, TimingConfig};
pub use kv::{KvStore, LocalStore, StorageChange};
pub use settings::{keys, Settings};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/tabnudge[-dev]/` based on TABNUDGE_ENV.
///
/// Set TABNUDGE_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("TABNUDGE_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("tabnudge-dev")
    } else {
        base_dir.join("tabnudge")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
