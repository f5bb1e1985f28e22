// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Knowledge corpus CRUD operations.

use pitwall_core::{KnowledgeEntry, KnowledgeType, PitwallError};
use rusqlite::{OptionalExtension, Row, params};

use crate::database::{Database, map_tr_err};
use crate::models::KnowledgeRow;

const COLUMNS: &str = "kind, id, title, content, keywords, metadata, created_at, updated_at";

fn read_row(row: &Row<'_>) -> Result<KnowledgeRow, rusqlite::Error> {
    Ok(KnowledgeRow {
        kind: row.get(0)?,
        id: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        keywords: row.get(4)?,
        metadata: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

/// Insert or replace the entry keyed by (kind, id).
pub async fn upsert_knowledge(db: &Database, entry: &KnowledgeEntry) -> Result<(), PitwallError> {
    let row = KnowledgeRow::encode(entry)?;
    db.connection()
        .call(move |conn| -> Result<(), rusqlite::Error> {
            conn.execute(
                "INSERT INTO knowledge_entries (kind, id, title, content, keywords, metadata, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                 ON CONFLICT (kind, id) DO UPDATE SET
                    title = excluded.title,
                    content = excluded.content,
                    keywords = excluded.keywords,
                    metadata = excluded.metadata,
                    updated_at = excluded.updated_at",
                params![
                    row.kind,
                    row.id,
                    row.title,
                    row.content,
                    row.keywords,
                    row.metadata,
                    row.created_at,
                    row.updated_at,
                ],
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)
}

pub async fn get_knowledge(
    db: &Database,
    kind: KnowledgeType,
    id: &str,
) -> Result<Option<KnowledgeEntry>, PitwallError> {
    let kind = kind.to_string();
    let id = id.to_string();
    let row = db
        .connection()
        .call(move |conn| -> Result<Option<KnowledgeRow>, rusqlite::Error> {
            conn.query_row(
                &format!("SELECT {COLUMNS} FROM knowledge_entries WHERE kind = ?1 AND id = ?2"),
                params![kind, id],
                read_row,
            )
            .optional()
        })
        .await
        .map_err(map_tr_err)?;
    row.map(KnowledgeEntry::try_from).transpose()
}

/// Returns whether a row was removed.
pub async fn delete_knowledge(
    db: &Database,
    kind: KnowledgeType,
    id: &str,
) -> Result<bool, PitwallError> {
    let kind = kind.to_string();
    let id = id.to_string();
    let removed = db
        .connection()
        .call(move |conn| -> Result<usize, rusqlite::Error> {
            conn.execute(
                "DELETE FROM knowledge_entries WHERE kind = ?1 AND id = ?2",
                params![kind, id],
            )
        })
        .await
        .map_err(map_tr_err)?;
    Ok(removed > 0)
}

/// All entries ordered by kind then id.
pub async fn list_knowledge(db: &Database) -> Result<Vec<KnowledgeEntry>, PitwallError> {
    let rows = db
        .connection()
        .call(|conn| -> Result<Vec<KnowledgeRow>, rusqlite::Error> {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COLUMNS} FROM knowledge_entries ORDER BY kind ASC, id ASC"
            ))?;
            let rows = stmt.query_map([], read_row)?;
            rows.collect()
        })
        .await
        .map_err(map_tr_err)?;
    rows.into_iter().map(KnowledgeEntry::try_from).collect()
}
