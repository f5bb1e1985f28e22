// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! TTL-scoped conversation and context storage in the cache.
//!
//! Cache layout per subject:
//! - `conversation:{subject}:{conversation}`: record JSON, sliding TTL
//! - `user:{subject}:conversations`: sorted set of conversation ids by last write
//! - `context:{subject}:{context}`: context JSON, sliding TTL
//! - `user:{subject}:contexts`: set of context ids
//!
//! Every round-trip is bounded by the configured deadline.

use std::sync::Arc;
use std::time::Duration;

use pitwall_cache::{single, time_bound};
use pitwall_core::{CacheReply, CacheStore, PitwallError, Pipeline};
use tracing::debug;

use crate::types::{ContextEntry, ConversationRecord};

fn conversation_key(subject_id: &str, conversation_id: &str) -> String {
    format!("conversation:{subject_id}:{conversation_id}")
}

fn conversations_key(subject_id: &str) -> String {
    format!("user:{subject_id}:conversations")
}

fn context_key(subject_id: &str, context_id: &str) -> String {
    format!("context:{subject_id}:{context_id}")
}

fn contexts_key(subject_id: &str) -> String {
    format!("user:{subject_id}:contexts")
}

/// Conversation records and contexts kept in the cache.
pub struct MemoryCache {
    cache: Arc<dyn CacheStore>,
    deadline: Duration,
    retention: Duration,
}

impl MemoryCache {
    pub fn new(cache: Arc<dyn CacheStore>, deadline: Duration, retention: Duration) -> Self {
        Self {
            cache,
            deadline,
            retention,
        }
    }

    pub fn retention(&self) -> Duration {
        self.retention
    }

    async fn run(&self, pipeline: Pipeline) -> Result<Vec<CacheReply>, PitwallError> {
        time_bound(self.deadline, self.cache.execute(pipeline)).await
    }

    pub async fn load(
        &self,
        subject_id: &str,
        conversation_id: &str,
    ) -> Result<Option<ConversationRecord>, PitwallError> {
        let replies = self
            .run(Pipeline::new().get(conversation_key(subject_id, conversation_id)))
            .await?;
        match single(replies)?.into_text()? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Writes the record, resets its TTL and bumps it in the subject's index.
    pub async fn save(&self, record: &ConversationRecord) -> Result<(), PitwallError> {
        let index = conversations_key(&record.subject_id);
        let pipeline = Pipeline::new()
            .set(
                conversation_key(&record.subject_id, &record.conversation_id),
                serde_json::to_string(record)?,
                Some(self.retention),
            )
            .zadd(
                index.clone(),
                vec![(record.conversation_id.clone(), record.last_updated as f64)],
            )
            .expire(index, self.retention);
        self.run(pipeline).await?;
        Ok(())
    }

    pub async fn remove(&self, subject_id: &str, conversation_id: &str) -> Result<(), PitwallError> {
        let pipeline = Pipeline::new()
            .del(conversation_key(subject_id, conversation_id))
            .zrem(conversations_key(subject_id), conversation_id);
        self.run(pipeline).await?;
        Ok(())
    }

    /// Up to `limit` conversation ids, most recently written first.
    pub async fn conversation_ids(
        &self,
        subject_id: &str,
        limit: usize,
    ) -> Result<Vec<String>, PitwallError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let stop = i64::try_from(limit).unwrap_or(i64::MAX) - 1;
        let replies = self
            .run(Pipeline::new().zrevrange(conversations_key(subject_id), 0, stop))
            .await?;
        single(replies)?.into_list()
    }

    pub async fn put_context(&self, entry: &ContextEntry) -> Result<(), PitwallError> {
        let index = contexts_key(&entry.subject_id);
        let pipeline = Pipeline::new()
            .set(
                context_key(&entry.subject_id, &entry.context_id),
                serde_json::to_string(entry)?,
                Some(self.retention),
            )
            .sadd(index.clone(), entry.context_id.clone())
            .expire(index, self.retention);
        self.run(pipeline).await?;
        Ok(())
    }

    /// Every live context of the subject.
    ///
    /// Ids whose context has expired are pruned from the subject's set.
    pub async fn contexts(&self, subject_id: &str) -> Result<Vec<ContextEntry>, PitwallError> {
        let index = contexts_key(subject_id);
        let ids = single(self.run(Pipeline::new().smembers(index.clone())).await?)?.into_list()?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let reads = ids
            .iter()
            .fold(Pipeline::new(), |p, id| p.get(context_key(subject_id, id)));
        let replies = self.run(reads).await?;

        let mut entries = Vec::with_capacity(ids.len());
        let mut stale = Pipeline::new();
        for (id, reply) in ids.iter().zip(replies) {
            match reply.into_text()? {
                Some(raw) => entries.push(serde_json::from_str::<ContextEntry>(&raw)?),
                None => stale = stale.srem(index.clone(), id.clone()),
            }
        }
        if !stale.is_empty() {
            debug!(subject_id, pruned = stale.len(), "pruning expired context ids");
            self.run(stale).await?;
        }
        Ok(entries)
    }

    /// Deletes every conversation and context of the subject, and both indexes.
    pub async fn clear_subject(&self, subject_id: &str) -> Result<(), PitwallError> {
        let conversations = conversations_key(subject_id);
        let contexts = contexts_key(subject_id);

        let mut replies = self
            .run(
                Pipeline::new()
                    .zrevrange(conversations.clone(), 0, -1)
                    .smembers(contexts.clone()),
            )
            .await?
            .into_iter();
        let conversation_ids = replies.next().map_or(Ok(Vec::new()), CacheReply::into_list)?;
        let context_ids = replies.next().map_or(Ok(Vec::new()), CacheReply::into_list)?;

        let mut pipeline = Pipeline::new();
        for id in &conversation_ids {
            pipeline = pipeline.del(conversation_key(subject_id, id));
        }
        for id in &context_ids {
            pipeline = pipeline.del(context_key(subject_id, id));
        }
        pipeline = pipeline.del(conversations).del(contexts);
        self.run(pipeline).await?;

        debug!(
            subject_id,
            conversations = conversation_ids.len(),
            contexts = context_ids.len(),
            "subject memory cleared"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pitwall_cache::InMemoryCache;
    use pitwall_core::{Clock, Metadata, SharedClock};
    use std::sync::atomic::{AtomicI64, Ordering};

    use super::*;
    use crate::types::{Message, Role};

    struct FixedClock(AtomicI64);

    impl Clock for FixedClock {
        fn now_ms(&self) -> i64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    fn setup() -> (Arc<FixedClock>, MemoryCache) {
        let clock = Arc::new(FixedClock(AtomicI64::new(1_700_000_000_000)));
        let shared: SharedClock = clock.clone();
        let cache = Arc::new(InMemoryCache::new(shared));
        let store = MemoryCache::new(cache, Duration::from_millis(200), Duration::from_secs(60));
        (clock, store)
    }

    fn record(cid: &str, at: i64) -> ConversationRecord {
        let mut r = ConversationRecord::new("u1", cid, Metadata::new(), at);
        r.push(Message {
            role: Role::User,
            content: "hi".into(),
            timestamp: at,
        });
        r
    }

    #[tokio::test]
    async fn save_then_load() {
        let (_, store) = setup();
        let r = record("c1", 1_700_000_000_000);
        store.save(&r).await.unwrap();
        assert_eq!(store.load("u1", "c1").await.unwrap(), Some(r));
        assert_eq!(store.load("u1", "c2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn conversation_ids_most_recent_first() {
        let (_, store) = setup();
        store.save(&record("old", 1_700_000_000_000)).await.unwrap();
        store.save(&record("new", 1_700_000_005_000)).await.unwrap();
        store.save(&record("mid", 1_700_000_002_000)).await.unwrap();

        assert_eq!(
            store.conversation_ids("u1", 10).await.unwrap(),
            vec!["new", "mid", "old"]
        );
        assert_eq!(store.conversation_ids("u1", 1).await.unwrap(), vec!["new"]);
        assert!(store.conversation_ids("u1", 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_contexts_are_pruned() {
        let (clock, store) = setup();
        let ctx = ContextEntry {
            subject_id: "u1".into(),
            context_id: "c1_1".into(),
            text: "Q: a\nA: b".into(),
            embedding: vec![1.0, 0.0],
            metadata: Metadata::new(),
            timestamp: 1_700_000_000_000,
        };
        store.put_context(&ctx).await.unwrap();
        assert_eq!(store.contexts("u1").await.unwrap(), vec![ctx]);

        clock.0.fetch_add(61_000, Ordering::SeqCst);
        assert!(store.contexts("u1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn clear_subject_removes_everything() {
        let (_, store) = setup();
        store.save(&record("c1", 1_700_000_000_000)).await.unwrap();
        store.save(&record("c2", 1_700_000_000_001)).await.unwrap();

        store.clear_subject("u1").await.unwrap();
        assert_eq!(store.load("u1", "c1").await.unwrap(), None);
        assert!(store.conversation_ids("u1", 10).await.unwrap().is_empty());
        assert!(store.contexts("u1").await.unwrap().is_empty());
    }
}
