// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-subject conversational memory.
//!
//! Records live in the cache with a sliding TTL. While the cache is
//! unreachable, appends land in a [`LocalFallbackStore`]; the buffered
//! messages are folded back into the cached record on the next successful
//! write. A failed completion leaves the conversation untouched.

use std::sync::Arc;
use std::time::Duration;

use pitwall_config::MemoryConfig;
use pitwall_core::{CacheStore, CompletionOracle, Metadata, PitwallError, SharedClock};
use pitwall_knowledge::{KnowledgeIndex, NO_KNOWLEDGE};
use tracing::{debug, error, warn};

use crate::embedding::Embedder;
use crate::fallback::LocalFallbackStore;
use crate::prompt::{PromptParts, compose_prompt};
use crate::similarity::rank_contexts;
use crate::store::MemoryCache;
use crate::types::{ContextEntry, ConversationRecord, ConversationStats, Message, Role, ScoredContext};

/// Orchestrates memory reads and writes around a chat turn.
pub struct ConversationMemory {
    cache: MemoryCache,
    fallback: LocalFallbackStore,
    knowledge: Arc<KnowledgeIndex>,
    oracle: Arc<dyn CompletionOracle>,
    embedder: Embedder,
    clock: SharedClock,
    config: MemoryConfig,
}

impl ConversationMemory {
    /// `deadline` bounds every cache round-trip.
    pub fn new(
        cache: Arc<dyn CacheStore>,
        knowledge: Arc<KnowledgeIndex>,
        oracle: Arc<dyn CompletionOracle>,
        embedder: Embedder,
        clock: SharedClock,
        config: MemoryConfig,
        deadline: Duration,
    ) -> Self {
        let retention = config.retention();
        Self {
            cache: MemoryCache::new(cache, deadline, retention),
            fallback: LocalFallbackStore::new(retention),
            knowledge,
            oracle,
            embedder,
            clock,
            config,
        }
    }

    pub fn fallback(&self) -> &LocalFallbackStore {
        &self.fallback
    }

    pub async fn append(
        &self,
        subject_id: &str,
        conversation_id: &str,
        role: Role,
        content: &str,
    ) -> Message {
        self.append_with_metadata(subject_id, conversation_id, role, content, Metadata::new())
            .await
    }

    /// Appends one message. `metadata` is only used when the record is created.
    ///
    /// Never fails: when the cache cannot be read or written the message is
    /// kept in the local fallback store instead.
    pub async fn append_with_metadata(
        &self,
        subject_id: &str,
        conversation_id: &str,
        role: Role,
        content: &str,
        metadata: Metadata,
    ) -> Message {
        let now = self.clock.now_ms();
        let message = Message {
            role,
            content: content.to_string(),
            timestamp: now,
        };
        let buffered = self.fallback.get(subject_id, conversation_id, now);

        let cached = match self.cache.load(subject_id, conversation_id).await {
            Ok(cached) => cached,
            Err(e) => {
                warn!(
                    subject_id = %subject_id,
                    conversation_id = %conversation_id,
                    error = %e,
                    "conversation cache unavailable, appending to local fallback"
                );
                let mut record = buffered.unwrap_or_else(|| {
                    ConversationRecord::new(subject_id, conversation_id, metadata, now)
                });
                record.push(message.clone());
                self.fallback.put(record, now);
                return message;
            }
        };

        let mut record = merge(cached, buffered)
            .unwrap_or_else(|| ConversationRecord::new(subject_id, conversation_id, metadata, now));
        record.push(message.clone());

        match self.cache.save(&record).await {
            Ok(()) => {
                if self.fallback.remove(subject_id, conversation_id).is_some() {
                    debug!(
                        subject_id = %subject_id,
                        conversation_id = %conversation_id,
                        "local fallback folded back into cache"
                    );
                }
            }
            Err(e) => {
                warn!(
                    subject_id = %subject_id,
                    conversation_id = %conversation_id,
                    error = %e,
                    "conversation cache write failed, keeping record in local fallback"
                );
                self.fallback.put(record, now);
            }
        }
        message
    }

    /// The full record, from the cache and any locally buffered messages.
    pub async fn conversation(
        &self,
        subject_id: &str,
        conversation_id: &str,
    ) -> Option<ConversationRecord> {
        let buffered = self
            .fallback
            .get(subject_id, conversation_id, self.clock.now_ms());
        match self.cache.load(subject_id, conversation_id).await {
            Ok(cached) => merge(cached, buffered),
            Err(e) => {
                warn!(
                    subject_id = %subject_id,
                    conversation_id = %conversation_id,
                    error = %e,
                    "conversation cache unavailable, reading local fallback"
                );
                buffered
            }
        }
    }

    /// The last `n` messages in append order.
    pub async fn recent(&self, subject_id: &str, conversation_id: &str, n: usize) -> Vec<Message> {
        self.conversation(subject_id, conversation_id)
            .await
            .map(|record| record.tail(n).to_vec())
            .unwrap_or_default()
    }

    pub async fn stats(&self, subject_id: &str, conversation_id: &str) -> ConversationStats {
        self.conversation(subject_id, conversation_id)
            .await
            .map(|record| ConversationStats::from(&record))
            .unwrap_or_default()
    }

    /// Up to `limit` conversation ids, most recently written first.
    pub async fn conversations(&self, subject_id: &str, limit: usize) -> Vec<String> {
        match self.cache.conversation_ids(subject_id, limit).await {
            Ok(ids) => ids,
            Err(e) => {
                warn!(subject_id = %subject_id, error = %e, "conversation index unavailable, listing local fallback");
                let mut ids = self.fallback.conversation_ids(subject_id, self.clock.now_ms());
                ids.truncate(limit);
                ids
            }
        }
    }

    /// Stores one exchange with a freshly computed embedding.
    pub async fn store_context(
        &self,
        subject_id: &str,
        context_id: &str,
        text: &str,
        metadata: Metadata,
    ) -> Result<ContextEntry, PitwallError> {
        let entry = ContextEntry {
            subject_id: subject_id.to_string(),
            context_id: context_id.to_string(),
            text: text.to_string(),
            embedding: self.embedder.embed(text).await,
            metadata,
            timestamp: self.clock.now_ms(),
        };
        self.cache.put_context(&entry).await?;
        Ok(entry)
    }

    /// The subject's stored contexts most similar to `query`.
    pub async fn similar(
        &self,
        subject_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<ScoredContext>, PitwallError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let contexts = self.cache.contexts(subject_id).await?;
        if contexts.is_empty() {
            return Ok(Vec::new());
        }
        let query = self.embedder.embed(query).await;
        Ok(rank_contexts(&query, contexts, limit))
    }

    /// Runs one chat turn and returns the reply.
    ///
    /// On completion failure the configured apology is returned and nothing
    /// is written.
    pub async fn respond(&self, subject_id: &str, conversation_id: &str, message: &str) -> String {
        let knowledge = match self
            .knowledge
            .relevant_block(message, self.config.knowledge_results)
            .await
        {
            Ok(block) => block,
            Err(e) => {
                warn!(error = %e, "knowledge lookup failed, continuing without it");
                NO_KNOWLEDGE.to_string()
            }
        };

        let history = self
            .recent(subject_id, conversation_id, self.config.recent_messages)
            .await;

        let similar: Vec<String> = match self
            .similar(subject_id, message, self.config.similar_contexts)
            .await
        {
            Ok(found) => found.into_iter().map(|c| c.text).collect(),
            Err(e) => {
                warn!(subject_id = %subject_id, error = %e, "similar context search failed");
                Vec::new()
            }
        };

        let prompt = compose_prompt(&PromptParts {
            persona: &self.config.persona,
            knowledge: &knowledge,
            similar: &similar,
            history: &history,
            message,
        });

        let reply = match self.oracle.complete(&prompt).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(
                    subject_id = %subject_id,
                    conversation_id = %conversation_id,
                    error = %e,
                    "completion failed, returning apology"
                );
                return self.config.apology.clone();
            }
        };

        self.append(subject_id, conversation_id, Role::User, message).await;
        self.append(subject_id, conversation_id, Role::Assistant, &reply).await;

        let now = self.clock.now_ms();
        let mut metadata = Metadata::new();
        metadata.insert("conversation_id".into(), conversation_id.into());
        metadata.insert("timestamp".into(), now.into());
        let context_id = format!("{conversation_id}_{now}_{:08x}", rand::random::<u32>());
        if let Err(e) = self
            .store_context(subject_id, &context_id, &format!("Q: {message}\nA: {reply}"), metadata)
            .await
        {
            warn!(subject_id = %subject_id, error = %e, "failed to store exchange context");
        }

        reply
    }

    /// Removes the record, its index entry and any local copy.
    pub async fn clear_conversation(
        &self,
        subject_id: &str,
        conversation_id: &str,
    ) -> Result<(), PitwallError> {
        self.fallback.remove(subject_id, conversation_id);
        self.cache.remove(subject_id, conversation_id).await
    }

    /// Removes every conversation and context of the subject.
    pub async fn clear_subject(&self, subject_id: &str) -> Result<(), PitwallError> {
        self.fallback.remove_subject(subject_id);
        self.cache.clear_subject(subject_id).await
    }
}

fn merge(
    cached: Option<ConversationRecord>,
    buffered: Option<ConversationRecord>,
) -> Option<ConversationRecord> {
    match (cached, buffered) {
        (Some(mut cached), Some(buffered)) => {
            cached.absorb(buffered);
            Some(cached)
        }
        (cached, buffered) => cached.or(buffered),
    }
}
