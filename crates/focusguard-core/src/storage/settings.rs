//! Persisted user settings.
//!
//! Only `extension_enabled` is mutated at runtime (from the stats panel or
//! the CLI). Countdown duration and redirect target are stored with their
//! defaults for a future options page; the blocking path reads them from
//! [`Config`](super::Config).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::keys;
use super::kv::{as_count, KvStore};
use crate::error::StorageError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub extension_enabled: bool,
    pub countdown_duration: u64,
    pub redirect_url: String,
}

/// Read all settings; missing entries fall back to `defaults`.
pub async fn load_settings<S: KvStore>(
    store: &S,
    defaults: &Settings,
) -> Result<Settings, StorageError> {
    let data = store.get_all().await?;
    Ok(Settings {
        extension_enabled: data
            .get(keys::EXTENSION_ENABLED)
            .and_then(Value::as_bool)
            .unwrap_or(defaults.extension_enabled),
        countdown_duration: match data.get(keys::COUNTDOWN_DURATION) {
            Some(v) => as_count(Some(v)),
            None => defaults.countdown_duration,
        },
        redirect_url: data
            .get(keys::REDIRECT_URL)
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| defaults.redirect_url.clone()),
    })
}

/// Master switch. A missing entry counts as enabled, matching the default
/// written by [`initialize`](super::initialize).
pub async fn is_enabled<S: KvStore>(store: &S) -> Result<bool, StorageError> {
    Ok(store
        .get(keys::EXTENSION_ENABLED)
        .await?
        .and_then(|v| v.as_bool())
        .unwrap_or(true))
}

pub async fn set_enabled<S: KvStore>(store: &S, enabled: bool) -> Result<(), StorageError> {
    store.set(keys::EXTENSION_ENABLED, Value::Bool(enabled)).await
}

/// Flip the master switch and return the new state.
pub async fn toggle_enabled<S: KvStore>(store: &S) -> Result<bool, StorageError> {
    let next = !is_enabled(store).await?;
    set_enabled(store, next).await?;
    Ok(next)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn defaults() -> Settings {
        Settings {
            extension_enabled: true,
            countdown_duration: 3,
            redirect_url: "https://www.youtube.com/".into(),
        }
    }

    #[tokio::test]
    async fn missing_settings_use_defaults() {
        let store = MemoryStore::new();
        assert_eq!(load_settings(&store, &defaults()).await.unwrap(), defaults());
    }

    #[tokio::test]
    async fn toggle_flips_and_persists() {
        let store = MemoryStore::new();
        assert!(is_enabled(&store).await.unwrap());
        assert!(!toggle_enabled(&store).await.unwrap());
        assert!(!is_enabled(&store).await.unwrap());
        assert!(toggle_enabled(&store).await.unwrap());
    }
}
