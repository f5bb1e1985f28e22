// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness wiring every component over in-process fakes.
//!
//! `TestHarness` assembles the rate limiter, knowledge index and
//! conversation memory on top of an [`InMemoryCache`] wrapped in a
//! [`FlakyCache`], a [`MemoryDurableStore`] and scripted oracles, all
//! reading the same [`ManualClock`].

use std::sync::Arc;
use std::time::Duration;

use pitwall_cache::InMemoryCache;
use pitwall_config::{MemoryConfig, RateLimitConfig};
use pitwall_core::{CacheStore, EmbeddingOracle, SharedClock};
use pitwall_knowledge::KnowledgeIndex;
use pitwall_memory::{ConversationMemory, Embedder};
use pitwall_ratelimit::RateLimiter;

use crate::clock::ManualClock;
use crate::durable::MemoryDurableStore;
use crate::flaky_cache::FlakyCache;
use crate::mock_oracle::{MockEmbedder, MockOracle};

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    replies: Vec<String>,
    fail_open: bool,
    deadline: Duration,
    embedder: Option<MockEmbedder>,
    memory: MemoryConfig,
    start_ms: i64,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            replies: Vec::new(),
            fail_open: true,
            deadline: Duration::from_millis(200),
            embedder: None,
            memory: MemoryConfig {
                persona: "You are a test assistant.".to_string(),
                ..MemoryConfig::default()
            },
            start_ms: ManualClock::DEFAULT_START_MS,
        }
    }

    /// Queue completion replies.
    pub fn with_replies(mut self, replies: Vec<String>) -> Self {
        self.replies = replies;
        self
    }

    pub fn with_fail_open(mut self, fail_open: bool) -> Self {
        self.fail_open = fail_open;
        self
    }

    /// Per-round-trip cache deadline.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Route embeddings through `embedder` instead of pseudo-embeddings only.
    pub fn with_embedder(mut self, embedder: MockEmbedder) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_memory_config(mut self, memory: MemoryConfig) -> Self {
        self.memory = memory;
        self
    }

    pub fn with_start_ms(mut self, start_ms: i64) -> Self {
        self.start_ms = start_ms;
        self
    }

    pub fn build(self) -> TestHarness {
        let clock = Arc::new(ManualClock::new(self.start_ms));
        let shared_clock: SharedClock = clock.clone();

        let backing = Arc::new(InMemoryCache::new(shared_clock.clone()));
        let cache = Arc::new(FlakyCache::new(backing.clone()));
        let cache_dyn: Arc<dyn CacheStore> = cache.clone();

        let durable = Arc::new(MemoryDurableStore::new());
        let oracle = Arc::new(MockOracle::with_replies(self.replies));

        let knowledge = Arc::new(
            KnowledgeIndex::new(cache_dyn.clone(), shared_clock.clone(), self.deadline)
                .with_store(durable.clone()),
        );

        let rate_config = RateLimitConfig {
            fail_open: self.fail_open,
            ..RateLimitConfig::default()
        };
        let limiter = RateLimiter::new(
            cache_dyn.clone(),
            durable.clone(),
            shared_clock.clone(),
            &rate_config,
            self.deadline,
        );

        let embedder_mock = self.embedder.map(Arc::new);
        let embedder = Embedder::new(
            embedder_mock
                .clone()
                .map(|e| e as Arc<dyn EmbeddingOracle>),
            self.memory.embedding_dimensions,
        );
        let memory = ConversationMemory::new(
            cache_dyn,
            knowledge.clone(),
            oracle.clone(),
            embedder,
            shared_clock,
            self.memory,
            self.deadline,
        );

        TestHarness {
            clock,
            backing,
            cache,
            durable,
            oracle,
            embedder: embedder_mock,
            knowledge,
            limiter,
            memory,
        }
    }
}

/// A fully wired set of components plus handles to every fake.
pub struct TestHarness {
    pub clock: Arc<ManualClock>,
    /// The cache behind the fault injector.
    pub backing: Arc<InMemoryCache>,
    pub cache: Arc<FlakyCache>,
    pub durable: Arc<MemoryDurableStore>,
    pub oracle: Arc<MockOracle>,
    pub embedder: Option<Arc<MockEmbedder>>,
    pub knowledge: Arc<KnowledgeIndex>,
    pub limiter: RateLimiter,
    pub memory: ConversationMemory,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// Default harness: fail-open, 200 ms deadline, pseudo-embeddings.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Inserts a usage event durably at the current time, then records it
    /// in the rate window, the way a caller does after admission.
    pub async fn admit(&self, subject_id: &str, action: &str, window: Duration) {
        use pitwall_core::{Clock, UsageEvent, UsageStore};

        let event = UsageEvent::new(subject_id, action, self.clock.now_ms());
        if let Err(e) = self.durable.insert_event(&event).await {
            tracing::warn!(error = %e, "harness durable insert failed");
        }
        self.limiter.record(subject_id, action, window).await;
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
