//! SQLite-backed persisted store.
//!
//! Holds the same flat JSON mapping the browser keeps in its local
//! storage area, one row per key in a `kv` table.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{params, Connection};
use serde_json::Value;

use super::data_dir;
use super::kv::{KvStore, Record};
use crate::error::StorageError;

/// SQLite database for settings and analytics counters.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `~/.config/focusguard/focusguard.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StorageError> {
        let dir = data_dir().map_err(|e| StorageError::Unavailable(e.to_string()))?;
        Self::open_at(&dir.join("focusguard.db"))
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and dry runs).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("database lock poisoned".into()))
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );",
        )?;
        Ok(())
    }

    /// Get a raw JSON value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(raw) => decode(key, &raw).map(Some),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &Value) -> Result<(), StorageError> {
        let raw = encode(key, value)?;
        self.conn()?.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, raw],
        )?;
        Ok(())
    }

    /// Every entry in the store.
    pub fn kv_all(&self) -> Result<Record, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT key, value FROM kv ORDER BY key")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut record = Record::new();
        for row in rows {
            let (key, raw) = row?;
            let value = decode(&key, &raw)?;
            record.insert(key, value);
        }
        Ok(record)
    }

    /// Upsert several entries in one transaction; other keys are untouched.
    pub fn kv_merge(&self, entries: &Record) -> Result<(), StorageError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare("INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)")?;
            for (key, value) in entries {
                stmt.execute(params![key, encode(key, value)?])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

fn encode(key: &str, value: &Value) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|source| StorageError::Encoding {
        key: key.to_string(),
        source,
    })
}

fn decode(key: &str, raw: &str) -> Result<Value, StorageError> {
    serde_json::from_str(raw).map_err(|source| StorageError::Encoding {
        key: key.to_string(),
        source,
    })
}

impl KvStore for Database {
    async fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.kv_get(key)
    }

    async fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        self.kv_set(key, &value)
    }

    async fn get_all(&self) -> Result<Record, StorageError> {
        self.kv_all()
    }

    async fn set_all(&self, entries: Record) -> Result<(), StorageError> {
        self.kv_merge(&entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kv_store() {
        let db = Database::open_memory().unwrap();
        assert!(db.kv_get("test").unwrap().is_none());
        db.kv_set("test", &json!("hello")).unwrap();
        assert_eq!(db.kv_get("test").unwrap().unwrap(), json!("hello"));
    }

    #[test]
    fn kv_merge_keeps_other_keys() {
        let db = Database::open_memory().unwrap();
        db.kv_set("untouched", &json!(true)).unwrap();

        let mut entries = Record::new();
        entries.insert("a".into(), json!(1));
        entries.insert("by_date".into(), json!({"2024-01-01": 2}));
        db.kv_merge(&entries).unwrap();

        let all = db.kv_all().unwrap();
        assert_eq!(all.len(), 3);
        assert_eq!(all["untouched"], json!(true));
        assert_eq!(all["by_date"]["2024-01-01"], json!(2));
    }

    #[tokio::test]
    async fn increment_through_trait() {
        let db = Database::open_memory().unwrap();
        db.increment("n", 1.0).await.unwrap();
        db.increment("n", 2.0).await.unwrap();
        assert_eq!(db.get("n").await.unwrap(), Some(json!(3)));
    }

    #[test]
    fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("focusguard.db");
        {
            let db = Database::open_at(&path).unwrap();
            db.kv_set("extension_enabled", &json!(false)).unwrap();
        }
        let db = Database::open_at(&path).unwrap();
        assert_eq!(db.kv_get("extension_enabled").unwrap(), Some(json!(false)));
    }

    #[test]
    fn corrupt_value_is_reported_with_key() {
        let db = Database::open_memory().unwrap();
        db.conn()
            .unwrap()
            .execute("INSERT INTO kv (key, value) VALUES ('bad', '{oops')", [])
            .unwrap();
        match db.kv_get("bad") {
            Err(StorageError::Encoding { key, .. }) => assert_eq!(key, "bad"),
            other => panic!("expected encoding error, got {other:?}"),
        }
    }
}
