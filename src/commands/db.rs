use rusqlite::{params, Connection, OptionalExtension, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const DB_SCHEMA_VERSION: i64 = 1;

pub const HANDLE_KEY: &str = "handle";
pub const CACHED_GRID_KEY: &str = "cached_contributions";

/// Flat string storage for the active handle and the cached grid.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, String>;
    fn set(&self, key: &str, value: &str) -> std::result::Result<(), String>;
    fn clear(&self, key: &str) -> std::result::Result<(), String>;
}

pub fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS kv_store (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at INTEGER NOT NULL
        );
        ",
    )
}

/// SQLite-backed store living at `<data_dir>/state.db`.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    pub fn open(data_dir: &Path) -> std::result::Result<Self, String> {
        fs::create_dir_all(data_dir)
            .map_err(|e| format!("Failed to create data directory: {e}"))?;
        let store = Self {
            db_path: data_dir.join("state.db"),
        };
        // Run migrations once up front so later failures are about data, not schema.
        store.connection()?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    fn connection(&self) -> std::result::Result<Connection, String> {
        get_db_connection(&self.db_path).map_err(|e| format!("DB error: {e}"))
    }
}

pub fn get_db_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    initialize_schema(&conn)?;
    Ok(conn)
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, String> {
        let conn = self.connection()?;
        conn.query_row(
            "SELECT value FROM kv_store WHERE key = ?1",
            params![key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| format!("DB read error: {e}"))
    }

    fn set(&self, key: &str, value: &str) -> std::result::Result<(), String> {
        let conn = self.connection()?;
        let now = chrono::Utc::now().timestamp();
        conn.execute(
            "
            INSERT INTO kv_store (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
            params![key, value, now],
        )
        .map_err(|e| format!("DB upsert error: {e}"))?;
        Ok(())
    }

    fn clear(&self, key: &str) -> std::result::Result<(), String> {
        let conn = self.connection()?;
        conn.execute("DELETE FROM kv_store WHERE key = ?1", params![key])
            .map_err(|e| format!("Delete error: {e}"))?;
        Ok(())
    }
}

/// Process-local store, used for ephemeral sessions and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> std::result::Result<Option<String>, String> {
        let lock = self.entries.lock().map_err(|_| "Store lock error".to_string())?;
        Ok(lock.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> std::result::Result<(), String> {
        let mut lock = self.entries.lock().map_err(|_| "Store lock error".to_string())?;
        lock.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&self, key: &str) -> std::result::Result<(), String> {
        let mut lock = self.entries.lock().map_err(|_| "Store lock error".to_string())?;
        lock.remove(key);
        Ok(())
    }
}
