// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local conversation buffer used while the cache is unreachable.
//!
//! Not durable: contents are lost on restart. Records older than the
//! retention window are treated as absent, matching the cache TTL, and are
//! pruned from the map on every write and listing.

use std::time::Duration;

use dashmap::DashMap;

use crate::types::ConversationRecord;

type Key = (String, String);

pub struct LocalFallbackStore {
    records: DashMap<Key, ConversationRecord>,
    retention_ms: i64,
}

impl LocalFallbackStore {
    pub fn new(retention: Duration) -> Self {
        Self {
            records: DashMap::new(),
            retention_ms: i64::try_from(retention.as_millis()).unwrap_or(i64::MAX),
        }
    }

    fn key(subject_id: &str, conversation_id: &str) -> Key {
        (subject_id.to_string(), conversation_id.to_string())
    }

    fn is_live(&self, record: &ConversationRecord, now_ms: i64) -> bool {
        now_ms.saturating_sub(record.last_updated) < self.retention_ms
    }

    pub fn get(
        &self,
        subject_id: &str,
        conversation_id: &str,
        now_ms: i64,
    ) -> Option<ConversationRecord> {
        let key = Self::key(subject_id, conversation_id);
        let record = self.records.get(&key)?.value().clone();
        if self.is_live(&record, now_ms) {
            Some(record)
        } else {
            self.records.remove(&key);
            None
        }
    }

    /// Stores `record`, pruning every stale record first.
    pub fn put(&self, record: ConversationRecord, now_ms: i64) {
        self.prune(now_ms);
        let key = Self::key(&record.subject_id, &record.conversation_id);
        self.records.insert(key, record);
    }

    /// Drops every record past retention.
    pub fn prune(&self, now_ms: i64) {
        self.records.retain(|_, record| self.is_live(record, now_ms));
    }

    pub fn remove(&self, subject_id: &str, conversation_id: &str) -> Option<ConversationRecord> {
        self.records
            .remove(&Self::key(subject_id, conversation_id))
            .map(|(_, record)| record)
    }

    pub fn remove_subject(&self, subject_id: &str) {
        self.records.retain(|(subject, _), _| subject != subject_id);
    }

    /// Live conversation ids of the subject, most recently written first.
    pub fn conversation_ids(&self, subject_id: &str, now_ms: i64) -> Vec<String> {
        self.prune(now_ms);
        let mut live: Vec<(i64, String)> = self
            .records
            .iter()
            .filter(|e| e.key().0 == subject_id)
            .map(|e| (e.value().last_updated, e.key().1.clone()))
            .collect();
        live.sort_by(|a, b| b.cmp(a));
        live.into_iter().map(|(_, id)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use pitwall_core::Metadata;

    use super::*;

    fn record(subject: &str, cid: &str, at: i64) -> ConversationRecord {
        ConversationRecord::new(subject, cid, Metadata::new(), at)
    }

    #[test]
    fn put_get_remove() {
        let store = LocalFallbackStore::new(Duration::from_secs(60));
        store.put(record("u1", "c1", 1_000), 1_000);
        assert!(store.get("u1", "c1", 2_000).is_some());
        assert!(store.get("u2", "c1", 2_000).is_none());
        assert!(store.remove("u1", "c1").is_some());
        assert!(store.is_empty());
    }

    #[test]
    fn stale_records_are_dropped_on_read() {
        let store = LocalFallbackStore::new(Duration::from_secs(60));
        store.put(record("u1", "c1", 1_000), 1_000);
        assert!(store.get("u1", "c1", 61_000).is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn conversation_ids_by_recency() {
        let store = LocalFallbackStore::new(Duration::from_secs(60));
        store.put(record("u1", "a", 1_000), 1_000);
        store.put(record("u1", "b", 3_000), 3_000);
        store.put(record("u2", "c", 2_000), 3_000);
        assert_eq!(store.conversation_ids("u1", 4_000), vec!["b", "a"]);

        store.remove_subject("u1");
        assert!(store.conversation_ids("u1", 4_000).is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn writes_and_listings_prune_untouched_records() {
        let store = LocalFallbackStore::new(Duration::from_secs(60));
        store.put(record("u1", "old", 1_000), 1_000);
        store.put(record("u2", "idle", 5_000), 5_000);
        assert_eq!(store.len(), 2);

        // neither stale key is read again; a write elsewhere evicts the first
        store.put(record("u3", "new", 62_000), 62_000);
        assert_eq!(store.len(), 2);
        assert!(store.conversation_ids("u1", 62_000).is_empty());

        // listing another subject evicts the second
        assert_eq!(store.conversation_ids("u3", 66_000), vec!["new"]);
        assert_eq!(store.len(), 1);
    }
}
