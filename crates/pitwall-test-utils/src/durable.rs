// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory durable store with call counters and an outage switch.

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;

use pitwall_core::{
    AdapterType, HealthStatus, KnowledgeEntry, KnowledgeStore, KnowledgeType, PitwallError,
    PluginAdapter, UsageEvent, UsageStore,
};

/// A [`UsageStore`] and [`KnowledgeStore`] backed by plain collections.
#[derive(Default)]
pub struct MemoryDurableStore {
    events: Mutex<Vec<UsageEvent>>,
    knowledge: Mutex<BTreeMap<(KnowledgeType, String), KnowledgeEntry>>,
    failing: AtomicBool,
    list_calls: AtomicUsize,
    count_calls: AtomicUsize,
}

impl MemoryDurableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of `list_events` calls (hydration queries).
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of `count_events` calls (fallback counts).
    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().map(|e| e.len()).unwrap_or(0)
    }

    fn check(&self) -> Result<(), PitwallError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PitwallError::Storage {
                source: "injected durable store outage".into(),
            });
        }
        Ok(())
    }

    fn poisoned() -> PitwallError {
        PitwallError::Internal("durable store lock poisoned".into())
    }

    fn matching(
        &self,
        subject_id: &str,
        action: &str,
        after_ms: i64,
        until_ms: i64,
    ) -> Result<Vec<UsageEvent>, PitwallError> {
        let events = self.events.lock().map_err(|_| Self::poisoned())?;
        let mut found: Vec<UsageEvent> = events
            .iter()
            .filter(|e| {
                e.subject_id == subject_id
                    && e.action == action
                    && e.occurred_at > after_ms
                    && e.occurred_at <= until_ms
            })
            .cloned()
            .collect();
        found.sort_by(|a, b| (a.occurred_at, &a.id).cmp(&(b.occurred_at, &b.id)));
        Ok(found)
    }
}

#[async_trait]
impl PluginAdapter for MemoryDurableStore {
    fn name(&self) -> &str {
        "memory-durable"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Storage
    }

    async fn health_check(&self) -> Result<HealthStatus, PitwallError> {
        if self.failing.load(Ordering::SeqCst) {
            Ok(HealthStatus::Unhealthy("injected outage".into()))
        } else {
            Ok(HealthStatus::Healthy)
        }
    }

    async fn shutdown(&self) -> Result<(), PitwallError> {
        Ok(())
    }
}

#[async_trait]
impl UsageStore for MemoryDurableStore {
    async fn insert_event(&self, event: &UsageEvent) -> Result<(), PitwallError> {
        self.check()?;
        let mut events = self.events.lock().map_err(|_| Self::poisoned())?;
        if !events.iter().any(|e| e.id == event.id) {
            events.push(event.clone());
        }
        Ok(())
    }

    async fn count_events(
        &self,
        subject_id: &str,
        action: &str,
        after_ms: i64,
        until_ms: i64,
    ) -> Result<u64, PitwallError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.matching(subject_id, action, after_ms, until_ms)?.len() as u64)
    }

    async fn list_events(
        &self,
        subject_id: &str,
        action: &str,
        after_ms: i64,
        until_ms: i64,
    ) -> Result<Vec<UsageEvent>, PitwallError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.matching(subject_id, action, after_ms, until_ms)
    }
}

#[async_trait]
impl KnowledgeStore for MemoryDurableStore {
    async fn upsert_knowledge(&self, entry: &KnowledgeEntry) -> Result<(), PitwallError> {
        self.check()?;
        let mut knowledge = self.knowledge.lock().map_err(|_| Self::poisoned())?;
        knowledge.insert((entry.kind, entry.id.clone()), entry.clone());
        Ok(())
    }

    async fn get_knowledge(
        &self,
        kind: KnowledgeType,
        id: &str,
    ) -> Result<Option<KnowledgeEntry>, PitwallError> {
        self.check()?;
        let knowledge = self.knowledge.lock().map_err(|_| Self::poisoned())?;
        Ok(knowledge.get(&(kind, id.to_string())).cloned())
    }

    async fn delete_knowledge(&self, kind: KnowledgeType, id: &str) -> Result<bool, PitwallError> {
        self.check()?;
        let mut knowledge = self.knowledge.lock().map_err(|_| Self::poisoned())?;
        Ok(knowledge.remove(&(kind, id.to_string())).is_some())
    }

    async fn list_knowledge(&self) -> Result<Vec<KnowledgeEntry>, PitwallError> {
        self.check()?;
        let knowledge = self.knowledge.lock().map_err(|_| Self::poisoned())?;
        Ok(knowledge.values().cloned().collect())
    }
}
