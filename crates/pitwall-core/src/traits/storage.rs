// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable store traits: the usage event log and the knowledge corpus.

use async_trait::async_trait;

use crate::error::PitwallError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{KnowledgeEntry, KnowledgeType, UsageEvent};

/// Persistent log of admitted billable actions.
///
/// Time ranges are half-open: `after_ms` is exclusive, `until_ms` inclusive.
#[async_trait]
pub trait UsageStore: PluginAdapter {
    /// Appends one usage event. Re-inserting an existing id is a no-op.
    async fn insert_event(&self, event: &UsageEvent) -> Result<(), PitwallError>;

    /// Counts events for (subject, action) with `after_ms < occurred_at <= until_ms`.
    async fn count_events(
        &self,
        subject_id: &str,
        action: &str,
        after_ms: i64,
        until_ms: i64,
    ) -> Result<u64, PitwallError>;

    /// Lists events for (subject, action) with `after_ms < occurred_at <= until_ms`,
    /// oldest first.
    async fn list_events(
        &self,
        subject_id: &str,
        action: &str,
        after_ms: i64,
        until_ms: i64,
    ) -> Result<Vec<UsageEvent>, PitwallError>;
}

/// Persistent copy of the knowledge corpus.
#[async_trait]
pub trait KnowledgeStore: PluginAdapter {
    /// Inserts or replaces the entry with the same (type, id).
    async fn upsert_knowledge(&self, entry: &KnowledgeEntry) -> Result<(), PitwallError>;

    async fn get_knowledge(
        &self,
        kind: KnowledgeType,
        id: &str,
    ) -> Result<Option<KnowledgeEntry>, PitwallError>;

    /// Removes the entry. Returns whether a row was deleted.
    async fn delete_knowledge(&self, kind: KnowledgeType, id: &str) -> Result<bool, PitwallError>;

    /// All entries, ordered by type then id.
    async fn list_knowledge(&self) -> Result<Vec<KnowledgeEntry>, PitwallError>;
}
