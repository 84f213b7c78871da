//! Durable SQLite-backed row store: the single source of truth across
//! process restarts.
//!
//! One store file per namespace holds an `entries` table (key, envelope,
//! size, recency, tombstone) and a one-row `meta` table carrying the
//! namespace name and cache format version. Writes commit with
//! `synchronous=FULL`, so a successful mutation is on disk before the call
//! returns.

use crate::errors::StoreError;
use rusqlite::{Connection, OptionalExtension, params};
use std::path::{Path, PathBuf};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS entries (
    key       TEXT PRIMARY KEY,
    payload   BLOB NOT NULL,
    size      INTEGER NOT NULL,
    recency   INTEGER NOT NULL,
    tombstone INTEGER NOT NULL DEFAULT 0
);
CREATE INDEX IF NOT EXISTS idx_entries_recency ON entries(recency);
CREATE TABLE IF NOT EXISTS meta (
    namespace  TEXT PRIMARY KEY,
    version    INTEGER NOT NULL,
    created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
);
";

/// One persisted row, as returned by point lookups.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub payload: Vec<u8>,
    pub size: u64,
    pub recency: u64,
    pub tombstone: bool,
}

/// One persisted row, as returned by the cold-start scan.
#[derive(Debug, Clone)]
pub struct ScannedRow {
    pub key: String,
    pub payload: Vec<u8>,
    pub size: u64,
    pub recency: u64,
    pub tombstone: bool,
}

/// Handle to one namespace's store file.
pub struct SqliteStore {
    conn: Connection,
    path: PathBuf,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").field("path", &self.path).finish()
    }
}

impl SqliteStore {
    /// Open (or create) the store file and its schema.
    ///
    /// # Errors
    /// Fails if the file cannot be opened or the schema cannot be applied;
    /// such a cache instance must not be used (fail closed).
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.pragma_update_and_check(None, "journal_mode", "WAL", |_row| Ok(()))?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, path: path.to_path_buf() })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reconcile the persisted version marker with the requested one.
    ///
    /// First open records the marker. A version mismatch wipes every entry
    /// and updates the marker, all in one transaction; returns `true` when it
    /// wiped. A namespace mismatch means two namespaces sanitized to the same
    /// file name and is an error rather than a silent wipe.
    pub fn ensure_version(&mut self, namespace: &str, version: u32) -> Result<bool, StoreError> {
        let tx = self.conn.transaction()?;
        let existing: Option<(String, i64)> = tx
            .query_row("SELECT namespace, version FROM meta LIMIT 1", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()?;

        let wiped = match existing {
            None => {
                tx.execute(
                    "INSERT INTO meta (namespace, version) VALUES (?1, ?2)",
                    params![namespace, i64::from(version)],
                )?;
                false
            }
            Some((found, _)) if found != namespace => {
                return Err(StoreError::NamespaceMismatch {
                    found,
                    requested: namespace.to_owned(),
                });
            }
            Some((_, recorded)) if recorded == i64::from(version) => false,
            Some(_) => {
                tx.execute("DELETE FROM entries", [])?;
                tx.execute(
                    "UPDATE meta SET version = ?1 WHERE namespace = ?2",
                    params![i64::from(version), namespace],
                )?;
                true
            }
        };
        tx.commit()?;
        Ok(wiped)
    }

    /// Idempotent upsert; replaces any existing row for the key.
    pub fn put(
        &self,
        key: &str,
        payload: &[u8],
        size: u64,
        recency: u64,
        tombstone: bool,
    ) -> Result<(), StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "INSERT OR REPLACE INTO entries (key, payload, size, recency, tombstone)
             VALUES (?1, ?2, ?3, ?4, ?5)",
        )?;
        stmt.execute(params![key, payload, to_i64(size), to_i64(recency), tombstone])?;
        Ok(())
    }

    /// Point lookup. An absent row is `Ok(None)`, not an error.
    pub fn get(&self, key: &str) -> Result<Option<StoredEntry>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT payload, size, recency, tombstone FROM entries WHERE key = ?1",
        )?;
        let entry = stmt
            .query_row(params![key], |row| {
                Ok(StoredEntry {
                    payload: row.get(0)?,
                    size: to_u64(row.get(1)?),
                    recency: to_u64(row.get(2)?),
                    tombstone: row.get(3)?,
                })
            })
            .optional()?;
        Ok(entry)
    }

    /// Update only the recency column, e.g. when a row is promoted into the
    /// in-memory index.
    pub fn touch(&self, key: &str, recency: u64) -> Result<(), StoreError> {
        let mut stmt =
            self.conn.prepare_cached("UPDATE entries SET recency = ?2 WHERE key = ?1")?;
        stmt.execute(params![key, to_i64(recency)])?;
        Ok(())
    }

    /// Presence check without reading the payload.
    pub fn exists(&self, key: &str) -> Result<bool, StoreError> {
        let mut stmt = self.conn.prepare_cached("SELECT 1 FROM entries WHERE key = ?1")?;
        let found = stmt.query_row(params![key], |_row| Ok(())).optional()?;
        Ok(found.is_some())
    }

    /// Delete one row. Returns whether a row was present.
    pub fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut stmt = self.conn.prepare_cached("DELETE FROM entries WHERE key = ?1")?;
        let changed = stmt.execute(params![key])?;
        Ok(changed > 0)
    }

    /// Clear every entry in the namespace.
    pub fn delete_all(&self) -> Result<(), StoreError> {
        self.conn.execute("DELETE FROM entries", [])?;
        Ok(())
    }

    /// Delete every row at or below the given recency token. Used for eager
    /// pruning when budgets shrank across restarts.
    pub fn delete_up_to(&self, recency: u64) -> Result<usize, StoreError> {
        let mut stmt = self.conn.prepare_cached("DELETE FROM entries WHERE recency <= ?1")?;
        let changed = stmt.execute(params![to_i64(recency)])?;
        Ok(changed)
    }

    /// Cold-start snapshot of every row, newest first. Called once at open to
    /// rehydrate the in-memory index.
    pub fn scan_by_recency(&self) -> Result<Vec<ScannedRow>, StoreError> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT key, payload, size, recency, tombstone FROM entries ORDER BY recency DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ScannedRow {
                key: row.get(0)?,
                payload: row.get(1)?,
                size: to_u64(row.get(2)?),
                recency: to_u64(row.get(3)?),
                tombstone: row.get(4)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Close the connection and hand back the file path (teardown support).
    pub fn into_path(self) -> PathBuf {
        let Self { conn, path } = self;
        if let Err((_conn, err)) = conn.close() {
            log::warn!("closing store {} reported: {err}", path.display());
        }
        path
    }
}

// SQLite INTEGER is i64; tokens and sizes never realistically reach the
// saturation points.
fn to_i64(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn to_u64(v: i64) -> u64 {
    u64::try_from(v).unwrap_or(0)
}
