// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Keyword-indexed knowledge corpus kept in the cache.
//!
//! Cache layout:
//! - `knowledge:{type}:{id}`: the entry as JSON, no TTL
//! - `knowledge:index:{type}`: set of ids of that type
//! - `knowledge:keyword:{keyword}`: set of `{type}:{id}` refs
//!
//! When a durable [`KnowledgeStore`] is attached, writes go to it first and
//! the cache indexes can be rebuilt from it. Every cache round-trip is bound
//! by the deadline given at construction.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::time::Duration;

use pitwall_cache::{CacheExt, time_bound};
use pitwall_core::{
    CacheReply, CacheStore, KnowledgeEntry, KnowledgeStore, KnowledgeType, PitwallError, Pipeline,
    SharedClock,
};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Rendered by [`KnowledgeIndex::relevant_block`] when nothing matches.
pub const NO_KNOWLEDGE: &str = "No specific knowledge found for this query.";

const BLOCK_SEPARATOR: &str = "\n\n---\n\n";

fn entry_key(kind: KnowledgeType, id: &str) -> String {
    format!("knowledge:{kind}:{id}")
}

fn type_key(kind: KnowledgeType) -> String {
    format!("knowledge:index:{kind}")
}

fn keyword_key(keyword: &str) -> String {
    format!("knowledge:keyword:{keyword}")
}

fn entry_ref(kind: KnowledgeType, id: &str) -> String {
    format!("{kind}:{id}")
}

fn parse_ref(r: &str) -> Option<(KnowledgeType, &str)> {
    let (kind, id) = r.split_once(':')?;
    Some((kind.parse().ok()?, id))
}

/// Lowercased whitespace tokens with edge punctuation stripped, first occurrence kept.
pub fn tokenize(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    query
        .to_lowercase()
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}

/// Trimmed, lowercased, non-empty keywords.
fn normalize_keywords<'a>(keywords: impl IntoIterator<Item = &'a String>) -> BTreeSet<String> {
    keywords
        .into_iter()
        .map(|k| k.trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect()
}

/// Entry counts for the whole corpus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KnowledgeStats {
    pub total: u64,
    pub by_type: BTreeMap<KnowledgeType, u64>,
}

/// The global, subject-independent knowledge corpus.
pub struct KnowledgeIndex {
    cache: Arc<dyn CacheStore>,
    store: Option<Arc<dyn KnowledgeStore>>,
    clock: SharedClock,
    deadline: Duration,
}

impl KnowledgeIndex {
    /// A cache-only index. `deadline` bounds every cache round-trip.
    pub fn new(cache: Arc<dyn CacheStore>, clock: SharedClock, deadline: Duration) -> Self {
        Self {
            cache,
            store: None,
            clock,
            deadline,
        }
    }

    /// Writes entries through to `store` and allows [`rebuild`](Self::rebuild).
    pub fn with_store(mut self, store: Arc<dyn KnowledgeStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Adds or replaces the entry with the same (type, id).
    ///
    /// Keywords are trimmed and lowercased before indexing. Postings of the
    /// previous version are removed first. `created_at` is kept from the
    /// previous version; `updated_at` is set to now.
    pub async fn add(&self, entry: KnowledgeEntry) -> Result<KnowledgeEntry, PitwallError> {
        let now = self.clock.now_ms();
        let previous = self.cached(entry.kind, &entry.id).await?;

        let mut entry = entry;
        entry.keywords = normalize_keywords(&entry.keywords);
        entry.created_at = previous.as_ref().map_or(now, |p| p.created_at);
        entry.updated_at = now;

        if let Some(store) = &self.store {
            store.upsert_knowledge(&entry).await?;
        }
        self.index(&entry, previous.as_ref()).await?;

        info!(kind = %entry.kind, id = %entry.id, keywords = entry.keywords.len(), "knowledge added");
        Ok(entry)
    }

    /// Looks an entry up by type and id.
    ///
    /// Falls back to the durable store on a cache miss or cache failure when
    /// one is attached.
    pub async fn get(
        &self,
        kind: KnowledgeType,
        id: &str,
    ) -> Result<Option<KnowledgeEntry>, PitwallError> {
        match (self.cached(kind, id).await, &self.store) {
            (Ok(Some(entry)), _) => Ok(Some(entry)),
            (Ok(None), Some(store)) => store.get_knowledge(kind, id).await,
            (Ok(None), None) => Ok(None),
            (Err(e), Some(store)) => {
                warn!(kind = %kind, id, error = %e, "knowledge cache unavailable, reading durable store");
                store.get_knowledge(kind, id).await
            }
            (Err(e), None) => Err(e),
        }
    }

    /// Removes an entry and every posting recorded for it. Returns whether it existed.
    pub async fn delete(&self, kind: KnowledgeType, id: &str) -> Result<bool, PitwallError> {
        let previous = self.cached(kind, id).await?;
        let r = entry_ref(kind, id);

        let mut pipeline = Pipeline::new();
        if let Some(prev) = &previous {
            for keyword in &prev.keywords {
                pipeline = pipeline.srem(keyword_key(keyword), r.clone());
            }
        }
        pipeline = pipeline.del(entry_key(kind, id)).srem(type_key(kind), id);
        self.run(pipeline).await?;

        let durable = match &self.store {
            Some(store) => store.delete_knowledge(kind, id).await?,
            None => false,
        };

        debug!(kind = %kind, id, "knowledge deleted");
        Ok(previous.is_some() || durable)
    }

    /// Entries whose keywords intersect any query token.
    ///
    /// Unscored: the first `limit` refs found while scanning tokens in query
    /// order, each posting read in sorted order.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<KnowledgeEntry>, PitwallError> {
        let tokens = tokenize(query);
        if limit == 0 || tokens.is_empty() {
            return Ok(Vec::new());
        }

        let pipeline = tokens
            .iter()
            .fold(Pipeline::new(), |p, t| p.smembers(keyword_key(t)));
        let postings = self.run(pipeline).await?;

        let mut seen = HashSet::new();
        let mut refs = Vec::new();
        'scan: for posting in postings {
            let mut members = posting.into_list()?;
            members.sort();
            for member in members {
                if seen.insert(member.clone()) {
                    refs.push(member);
                    if refs.len() == limit {
                        break 'scan;
                    }
                }
            }
        }

        let targets: Vec<(KnowledgeType, String)> = refs
            .iter()
            .filter_map(|r| parse_ref(r).map(|(kind, id)| (kind, id.to_string())))
            .collect();
        self.load(&targets).await
    }

    /// All entries of one type, ordered by id.
    pub async fn by_type(&self, kind: KnowledgeType) -> Result<Vec<KnowledgeEntry>, PitwallError> {
        let mut ids = time_bound(self.deadline, self.cache.smembers(&type_key(kind))).await?;
        ids.sort();
        let targets: Vec<(KnowledgeType, String)> = ids.into_iter().map(|id| (kind, id)).collect();
        self.load(&targets).await
    }

    pub async fn stats(&self) -> Result<KnowledgeStats, PitwallError> {
        let pipeline = KnowledgeType::ALL
            .iter()
            .fold(Pipeline::new(), |p, kind| p.scard(type_key(*kind)));
        let replies = self.run(pipeline).await?;

        let mut by_type = BTreeMap::new();
        for (kind, reply) in KnowledgeType::ALL.into_iter().zip(replies) {
            by_type.insert(kind, reply.into_int()?.max(0) as u64);
        }
        Ok(KnowledgeStats {
            total: by_type.values().sum(),
            by_type,
        })
    }

    /// Renders the top matches as a prompt block.
    pub async fn relevant_block(&self, query: &str, limit: usize) -> Result<String, PitwallError> {
        let entries = self.search(query, limit).await?;
        Ok(render_block(&entries))
    }

    /// Re-indexes every entry of the durable store into the cache.
    ///
    /// Returns the number of entries indexed. A cache-only index has nothing
    /// to rebuild from and returns 0.
    pub async fn rebuild(&self) -> Result<usize, PitwallError> {
        let Some(store) = &self.store else {
            warn!("knowledge rebuild requested without a durable store");
            return Ok(0);
        };
        let entries = store.list_knowledge().await?;
        for entry in &entries {
            let previous = self.cached(entry.kind, &entry.id).await?;
            self.index(entry, previous.as_ref()).await?;
        }
        info!(entries = entries.len(), "knowledge index rebuilt from durable store");
        Ok(entries.len())
    }

    async fn cached(
        &self,
        kind: KnowledgeType,
        id: &str,
    ) -> Result<Option<KnowledgeEntry>, PitwallError> {
        time_bound(self.deadline, self.cache.get_json(&entry_key(kind, id))).await
    }

    async fn run(&self, pipeline: Pipeline) -> Result<Vec<CacheReply>, PitwallError> {
        time_bound(self.deadline, self.cache.execute(pipeline)).await
    }

    async fn index(
        &self,
        entry: &KnowledgeEntry,
        previous: Option<&KnowledgeEntry>,
    ) -> Result<(), PitwallError> {
        let r = entry_ref(entry.kind, &entry.id);

        let mut pipeline = Pipeline::new();
        if let Some(prev) = previous {
            for keyword in &prev.keywords {
                pipeline = pipeline.srem(keyword_key(keyword), r.clone());
            }
        }
        pipeline = pipeline
            .set(entry_key(entry.kind, &entry.id), serde_json::to_string(entry)?, None)
            .sadd(type_key(entry.kind), entry.id.clone());
        for keyword in &entry.keywords {
            pipeline = pipeline.sadd(keyword_key(keyword), r.clone());
        }

        self.run(pipeline).await?;
        Ok(())
    }

    /// Fetches entries in the given order, skipping any that vanished.
    async fn load(&self, targets: &[(KnowledgeType, String)]) -> Result<Vec<KnowledgeEntry>, PitwallError> {
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        let pipeline = targets
            .iter()
            .fold(Pipeline::new(), |p, (kind, id)| p.get(entry_key(*kind, id)));
        let replies = self.run(pipeline).await?;

        let mut entries: Vec<KnowledgeEntry> = Vec::with_capacity(replies.len());
        for reply in replies {
            match reply {
                CacheReply::Text(raw) => entries.push(serde_json::from_str(&raw)?),
                CacheReply::Nil => {}
                other => return Err(PitwallError::cache(format!("unexpected reply {other:?}"))),
            }
        }
        Ok(entries)
    }
}

/// `[TYPE] title:\ncontent` blocks joined by a rule, or [`NO_KNOWLEDGE`].
pub fn render_block(entries: &[KnowledgeEntry]) -> String {
    if entries.is_empty() {
        return NO_KNOWLEDGE.to_string();
    }
    entries
        .iter()
        .map(|e| {
            format!(
                "[{}] {}:\n{}",
                e.kind.to_string().to_uppercase(),
                e.title,
                e.content
            )
        })
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}
