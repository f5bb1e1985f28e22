// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for storage entities.
//!
//! The canonical types live in `pitwall-core::types`. Knowledge rows carry
//! JSON columns, so they are read raw here and decoded outside the
//! database thread.

use std::str::FromStr;

use pitwall_core::{KnowledgeEntry, KnowledgeType, PitwallError};

pub use pitwall_core::types::UsageEvent;

/// A `knowledge_entries` row before JSON decoding.
#[derive(Debug, Clone)]
pub struct KnowledgeRow {
    pub kind: String,
    pub id: String,
    pub title: String,
    pub content: String,
    pub keywords: String,
    pub metadata: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl KnowledgeRow {
    /// Encodes an entry for insertion.
    pub fn encode(entry: &KnowledgeEntry) -> Result<Self, PitwallError> {
        Ok(Self {
            kind: entry.kind.to_string(),
            id: entry.id.clone(),
            title: entry.title.clone(),
            content: entry.content.clone(),
            keywords: serde_json::to_string(&entry.keywords)?,
            metadata: serde_json::to_string(&entry.metadata)?,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        })
    }
}

impl TryFrom<KnowledgeRow> for KnowledgeEntry {
    type Error = PitwallError;

    fn try_from(row: KnowledgeRow) -> Result<Self, Self::Error> {
        let kind = KnowledgeType::from_str(&row.kind).map_err(|_| PitwallError::Storage {
            source: format!("unknown knowledge type `{}` in row {}", row.kind, row.id).into(),
        })?;
        Ok(KnowledgeEntry {
            id: row.id,
            kind,
            title: row.title,
            content: row.content,
            keywords: serde_json::from_str(&row.keywords)?,
            metadata: serde_json::from_str(&row.metadata)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
