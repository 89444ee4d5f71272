//! Device-local fallback store.
//!
//! # Responsibility
//! - Provide the synchronous, always-available key-value tier.
//! - Back it with the migrated SQLite `kv` table.
//!
//! # Invariants
//! - `set` exposes no failure mode to callers; a failed local write is
//!   logged and otherwise unrecoverable (named limitation of the design).
//! - `get` answers `None` for both absent keys and read failures.

use crate::db::{open_db, open_db_in_memory, DbResult};
use log::error;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

/// Synchronous key-value contract of the local tier.
pub trait LocalStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
}

impl<'a, T: LocalStore + ?Sized> LocalStore for &'a T {
    fn get(&self, key: &str) -> Option<String> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) {
        (**self).set(key, value)
    }
}

/// SQLite-backed local store over the migrated `kv` table.
pub struct SqliteLocalStore {
    conn: Mutex<Connection>,
}

impl SqliteLocalStore {
    /// Wraps an already-bootstrapped connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Opens (and migrates) the fallback database at `path`.
    pub fn open(path: impl AsRef<Path>) -> DbResult<Self> {
        Ok(Self::new(open_db(path)?))
    }

    /// In-memory store for tests and probes.
    pub fn in_memory() -> DbResult<Self> {
        Ok(Self::new(open_db_in_memory()?))
    }
}

impl LocalStore for SqliteLocalStore {
    fn get(&self, key: &str) -> Option<String> {
        let conn = match self.conn.lock() {
            Ok(conn) => conn,
            Err(_) => {
                error!("event=local_get module=storage status=error key={key} error_code=lock_poisoned");
                return None;
            }
        };

        match conn
            .query_row("SELECT value FROM kv WHERE key = ?1;", [key], |row| {
                row.get::<_, String>(0)
            })
            .optional()
        {
            Ok(value) => value,
            Err(err) => {
                error!("event=local_get module=storage status=error key={key} error={err}");
                None
            }
        }
    }

    fn set(&self, key: &str, value: &str) {
        let conn = match self.conn.lock() {
            Ok(conn) => conn,
            Err(_) => {
                error!("event=local_set module=storage status=error key={key} error_code=lock_poisoned");
                return;
            }
        };

        let written = conn.execute(
            "INSERT INTO kv (key, value, updated_at)
             VALUES (?1, ?2, strftime('%s', 'now') * 1000)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        );
        if let Err(err) = written {
            error!("event=local_set module=storage status=error key={key} error={err}");
        }
    }
}
