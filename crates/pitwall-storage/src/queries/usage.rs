// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage event log operations.
//!
//! Time ranges are half-open: `after_ms` exclusive, `until_ms` inclusive.

use pitwall_core::PitwallError;
use rusqlite::params;

use crate::database::{Database, map_tr_err};
use crate::models::UsageEvent;

/// Insert an event. An existing id is left untouched.
pub async fn insert_event(db: &Database, event: &UsageEvent) -> Result<(), PitwallError> {
    let event = event.clone();
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT OR IGNORE INTO usage_events (id, subject_id, action, occurred_at)
                 VALUES (?1, ?2, ?3, ?4)",
                params![event.id, event.subject_id, event.action, event.occurred_at],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn count_events(
    db: &Database,
    subject_id: &str,
    action: &str,
    after_ms: i64,
    until_ms: i64,
) -> Result<u64, PitwallError> {
    let subject_id = subject_id.to_string();
    let action = action.to_string();
    let count: i64 = db
        .connection()
        .call(move |conn| -> Result<i64, rusqlite::Error> {
            conn.query_row(
                "SELECT COUNT(*) FROM usage_events
                 WHERE subject_id = ?1 AND action = ?2
                   AND occurred_at > ?3 AND occurred_at <= ?4",
                params![subject_id, action, after_ms, until_ms],
                |row| row.get(0),
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(count.max(0) as u64)
}

/// Events in the range, oldest first.
pub async fn list_events(
    db: &Database,
    subject_id: &str,
    action: &str,
    after_ms: i64,
    until_ms: i64,
) -> Result<Vec<UsageEvent>, PitwallError> {
    let subject_id = subject_id.to_string();
    let action = action.to_string();
    db.connection()
        .call(move |conn| -> Result<Vec<UsageEvent>, rusqlite::Error> {
            let mut stmt = conn.prepare(
                "SELECT id, subject_id, action, occurred_at FROM usage_events
                 WHERE subject_id = ?1 AND action = ?2
                   AND occurred_at > ?3 AND occurred_at <= ?4
                 ORDER BY occurred_at ASC, id ASC",
            )?;
            let rows = stmt.query_map(params![subject_id, action, after_ms, until_ms], |row| {
                Ok(UsageEvent {
                    id: row.get(0)?,
                    subject_id: row.get(1)?,
                    action: row.get(2)?,
                    occurred_at: row.get(3)?,
                })
            })?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)
}
