// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database connection management with PRAGMA setup, WAL mode, and migrations.
//!
//! All statements run on tokio-rusqlite's single background thread, so
//! writes are serialized without client-side locking.

use std::path::Path;
use std::time::Duration;

use pitwall_core::PitwallError;
use tracing::debug;

use crate::migrations::run_migrations;

/// Convert a tokio-rusqlite error into `PitwallError::Storage`.
pub fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> PitwallError {
    PitwallError::Storage {
        source: Box::new(e),
    }
}

/// Convert a plain rusqlite error into `PitwallError::Storage`.
pub fn storage_err(e: rusqlite::Error) -> PitwallError {
    PitwallError::Storage {
        source: Box::new(e),
    }
}

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// An open, migrated SQLite database.
pub struct Database {
    conn: tokio_rusqlite::Connection,
}

impl Database {
    /// Opens (creating if needed) the database at `path` and applies migrations.
    ///
    /// Migrations run on a short-lived synchronous connection inside
    /// `spawn_blocking`; the long-lived async connection is opened afterwards.
    pub async fn open(path: &str, wal_mode: bool) -> Result<Self, PitwallError> {
        if let Some(parent) = Path::new(path).parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| PitwallError::Storage {
                source: Box::new(e),
            })?;
        }

        let migrate_path = path.to_string();
        tokio::task::spawn_blocking(move || -> Result<(), PitwallError> {
            let mut conn = rusqlite::Connection::open(&migrate_path).map_err(storage_err)?;
            if wal_mode {
                let mode: String = conn
                    .query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))
                    .map_err(storage_err)?;
                debug!(journal_mode = %mode, "journal mode set");
            }
            run_migrations(&mut conn)
        })
        .await
        .map_err(|e| PitwallError::Internal(format!("migration task failed: {e}")))??;

        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| PitwallError::Storage {
                source: Box::new(e),
            })?;

        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.busy_timeout(BUSY_TIMEOUT)?;
            conn.execute_batch("PRAGMA synchronous = NORMAL; PRAGMA foreign_keys = ON;")?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        debug!(path, wal_mode, "database opened");
        Ok(Self { conn })
    }

    /// Returns the async connection handle.
    pub fn connection(&self) -> &tokio_rusqlite::Connection {
        &self.conn
    }

    /// Checkpoints the WAL so the main database file is self-contained.
    pub async fn checkpoint(&self) -> Result<(), PitwallError> {
        self.conn
            .call(|conn| -> Result<(), rusqlite::Error> {
                conn.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn open_creates_file_and_tables() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("nested").join("pitwall.db");
        let db = Database::open(db_path.to_str().unwrap(), true).await.unwrap();
        assert!(db_path.exists());

        let tables: Vec<String> = db
            .connection()
            .call(|conn| -> Result<Vec<String>, rusqlite::Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
                )?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                rows.collect()
            })
            .await
            .unwrap();
        assert!(tables.contains(&"usage_events".to_string()));
        assert!(tables.contains(&"knowledge_entries".to_string()));
    }

    #[tokio::test]
    async fn reopen_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("pitwall.db");
        let path = db_path.to_str().unwrap();
        Database::open(path, true).await.unwrap();
        let db = Database::open(path, true).await.unwrap();
        db.checkpoint().await.unwrap();
    }
}
