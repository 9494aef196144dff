//! Durable storage using `SQLite`
//!
//! Stores retrodesk state in ~/.config/retrodesk/storage.db

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::StorageBackend;

/// Key-value store backed by `SQLite`.
///
/// The connection is wrapped in a `Mutex` so the store can be shared across
/// async tasks; every operation is a single short statement.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Create or open the store at the default location.
    ///
    /// Location: ~/.config/retrodesk/storage.db
    pub fn new() -> Result<Self> {
        Self::open(&Self::db_path()?)
    }

    /// Create or open the store at a specific path.
    pub fn open(db_path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create storage directory")?;
        }

        let conn = Connection::open(db_path).context("Failed to open storage database")?;

        // Initialize schema
        conn.execute(
            "CREATE TABLE IF NOT EXISTS storage (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER DEFAULT (strftime('%s', 'now'))
            )",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Get the default database path.
    fn db_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("retrodesk").join("storage.db"))
    }
}

impl StorageBackend for SqliteStorage {
    fn get(&self, key: &str) -> Option<String> {
        let conn = self.conn.lock().ok()?;
        conn.query_row("SELECT value FROM storage WHERE key = ?", [key], |row| {
            row.get(0)
        })
        .ok()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?;
        conn.execute(
            "INSERT OR REPLACE INTO storage (key, value, updated_at)
             VALUES (?, ?, strftime('%s', 'now'))",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| anyhow::anyhow!("storage lock poisoned"))?;
        conn.execute("DELETE FROM storage WHERE key = ?", [key])?;
        Ok(())
    }
}
