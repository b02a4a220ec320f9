//! Core error types for tabnudge-core.
//!
//! Errors are split by the collaborator that produced them. Context
//! handlers never return these for transient environment failures (a
//! closed tab, a page without a content script); those are logged and
//! dropped where they happen.

use std::path::PathBuf;
use thiserror::Error;

use crate::tracker::TabId;

/// Core error type for tabnudge-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Settings store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Browser host errors (tabs, windows, message delivery)
    #[error("Host error: {0}")]
    Host(#[from] HostError),

    /// Remote REST service errors
    #[error("{service} request failed: {message}")]
    Api {
        service: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Build an `Api` error without an underlying cause.
    pub fn api(service: &str, message: impl Into<String>) -> Self {
        CoreError::Api {
            service: service.to_string(),
            message: message.into(),
            source: None,
        }
    }
}

/// Settings store errors.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to read the backing file
    #[error("Failed to read store at {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to write the backing file
    #[error("Failed to write store at {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored contents are not a JSON object
    #[error("Store contents are corrupt: {0}")]
    Corrupt(String),

    /// A value could not be encoded or decoded
    #[error("Invalid value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Lock poisoned by a panicking writer
    #[error("Store lock poisoned")]
    Poisoned,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// Unknown configuration key
    #[error("unknown config key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Errors reported by the browser host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The tab was closed or never existed
    #[error("tab {0} no longer exists")]
    TabNotFound(TabId),

    /// No content script is listening in the tab (restricted page, not yet injected)
    #[error("no receiver in tab {0}")]
    NoReceiver(TabId),

    /// There is no window to open tabs in
    #[error("no current window")]
    NoWindow,

    /// The host refused the request
    #[error("{0}")]
    Rejected(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Empty collection
    #[error("Empty collection: {0}")]
    EmptyCollection(String),

    /// Invalid value
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
