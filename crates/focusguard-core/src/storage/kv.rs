//! Asynchronous key-value store contract and an in-memory implementation.
//!
//! Values are JSON so the same mapping can live in browser-style local
//! storage, in SQLite, or in memory. `increment` is a plain
//! read-modify-write: two overlapping increments on the same key can lose
//! an update. Callers in this crate run on a single cooperative thread, so
//! the race is latent; `MemoryStore` keeps it observable for tests.

use std::sync::Mutex;

use serde_json::{Map, Value};

use crate::error::StorageError;

/// A full or partial view of the persisted mapping.
pub type Record = Map<String, Value>;

/// Persisted key-value store.
///
/// `set_all` merges by key; entries not named in the argument are kept.
#[allow(async_fn_in_trait)]
pub trait KvStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
    async fn get_all(&self) -> Result<Record, StorageError>;
    async fn set_all(&self, entries: Record) -> Result<(), StorageError>;

    /// Add `amount` to a numeric entry, treating a missing or non-numeric
    /// value as 0. Returns the value written.
    async fn increment(&self, key: &str, amount: f64) -> Result<f64, StorageError> {
        let current = self.get(key).await?.and_then(|v| v.as_f64()).unwrap_or(0.0);
        let next = current + amount;
        self.set(key, json_number(next)).await?;
        Ok(next)
    }
}

/// Encode a number, keeping integral values as JSON integers so counters
/// read back through `as_u64`.
pub fn json_number(n: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if n.is_finite() && n.fract() == 0.0 && n.abs() < MAX_EXACT {
        if n >= 0.0 {
            Value::from(n as u64)
        } else {
            Value::from(n as i64)
        }
    } else {
        serde_json::Number::from_f64(n)
            .map(Value::Number)
            .unwrap_or(Value::Null)
    }
}

/// Read a counter, clamping anything missing, negative or malformed to 0.
pub fn as_count(value: Option<&Value>) -> u64 {
    match value {
        Some(v) => v
            .as_u64()
            .or_else(|| v.as_f64().filter(|f| *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        None => 0,
    }
}

/// In-process store.
///
/// Every operation yields to the scheduler once before touching the map,
/// the same way a host storage API completes through a callback.
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing entries.
    pub fn with_entries(entries: Record) -> Self {
        Self {
            data: Mutex::new(entries),
        }
    }

    /// Copy of the current mapping without suspending.
    pub fn snapshot(&self) -> Record {
        self.data.lock().map(|d| d.clone()).unwrap_or_default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Record>, StorageError> {
        self.data
            .lock()
            .map_err(|_| StorageError::Unavailable("memory store lock poisoned".into()))
    }
}

impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        tokio::task::yield_now().await;
        Ok(self.lock()?.get(key).cloned())
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        tokio::task::yield_now().await;
        self.lock()?.insert(key.to_string(), value);
        Ok(())
    }

    async fn get_all(&self) -> Result<Record, StorageError> {
        tokio::task::yield_now().await;
        Ok(self.lock()?.clone())
    }

    async fn set_all(&self, entries: Record) -> Result<(), StorageError> {
        tokio::task::yield_now().await;
        let mut data = self.lock()?;
        for (key, value) in entries {
            data.insert(key, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let store = MemoryStore::new();
        assert!(store.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_all_merges_instead_of_replacing() {
        let store = MemoryStore::new();
        store.set("keep", json!(1)).await.unwrap();

        let mut entries = Record::new();
        entries.insert("added".into(), json!("x"));
        store.set_all(entries).await.unwrap();

        let all = store.get_all().await.unwrap();
        assert_eq!(all.get("keep"), Some(&json!(1)));
        assert_eq!(all.get("added"), Some(&json!("x")));
    }

    #[tokio::test]
    async fn increment_treats_missing_as_zero() {
        let store = MemoryStore::new();
        assert_eq!(store.increment("n", 1.0).await.unwrap(), 1.0);
        assert_eq!(store.increment("n", 1.0).await.unwrap(), 2.0);
        assert_eq!(store.get("n").await.unwrap(), Some(json!(2)));
    }

    #[tokio::test]
    async fn increment_keeps_fractions() {
        let store = MemoryStore::new();
        store.increment("minutes", 0.5).await.unwrap();
        assert_eq!(store.get("minutes").await.unwrap(), Some(json!(0.5)));
        store.increment("minutes", 0.5).await.unwrap();
        assert_eq!(store.get("minutes").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn concurrent_increments_can_lose_an_update() {
        // Read-then-write without compare-and-swap: both reads see 0.
        let store = MemoryStore::new();
        let (a, b) = tokio::join!(store.increment("n", 1.0), store.increment("n", 1.0));
        assert_eq!(a.unwrap(), 1.0);
        assert_eq!(b.unwrap(), 1.0);
        assert_eq!(as_count(store.snapshot().get("n")), 1);
    }

    #[test]
    fn as_count_clamps_bad_values() {
        assert_eq!(as_count(None), 0);
        assert_eq!(as_count(Some(&json!(-3))), 0);
        assert_eq!(as_count(Some(&json!("7"))), 0);
        assert_eq!(as_count(Some(&json!(4.0))), 4);
        assert_eq!(as_count(Some(&json!(9))), 9);
    }

    #[test]
    fn json_number_prefers_integers() {
        assert_eq!(json_number(3.0), json!(3));
        assert_eq!(json_number(-2.0), json!(-2));
        assert_eq!(json_number(1.5), json!(1.5));
    }
}
