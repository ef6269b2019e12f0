//! Core error types for focusguard-core.
//!
//! Storage failures are the only errors the blocking path ever sees, and
//! the analytics boundary swallows those after logging. Everything else
//! (config files, CLI input, messaging) propagates through [`CoreError`].

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for focusguard-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Persisted store errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Background-to-tab messaging errors
    #[error("Messaging error: {0}")]
    Message(#[from] MessageError),
}

/// Errors raised by a [`KvStore`](crate::storage::KvStore) implementation.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Failed to open the backing database
    #[error("Failed to open store at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Database is locked by another writer
    #[error("Store is locked")]
    Locked,

    /// A stored value could not be encoded or decoded
    #[error("Value for '{key}' is not valid JSON: {source}")]
    Encoding {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The store is not reachable (poisoned lock, injected fault, ...)
    #[error("Store unavailable: {0}")]
    Unavailable(String),
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

    /// Key does not exist in the configuration tree
    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// No usable data directory
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Not an ISO `YYYY-MM-DD` date
    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    /// Range end precedes its start
    #[error("Invalid date range: end ({end}) is before start ({start})")]
    InvalidRange { start: String, end: String },

    /// URL could not be parsed
    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

/// Errors delivering a runtime message to a tab.
#[derive(Error, Debug)]
pub enum MessageError {
    /// No content script is listening in the target tab
    #[error("No content script listening in tab {0}")]
    NoReceiver(u32),
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg) => {
                if code.code == rusqlite::ErrorCode::DatabaseLocked
                    || code.code == rusqlite::ErrorCode::DatabaseBusy
                {
                    StorageError::Locked
                } else {
                    StorageError::QueryFailed(err.to_string())
                }
            }
            _ => StorageError::QueryFailed(err.to_string()),
        }
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;
