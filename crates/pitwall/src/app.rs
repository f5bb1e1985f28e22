// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-wide clients, built once from configuration and handed to commands.

use std::sync::Arc;

use pitwall_cache::build_cache;
use pitwall_config::PitwallConfig;
use pitwall_core::{CacheStore, PitwallError, PluginAdapter, SharedClock, system_clock};
use pitwall_knowledge::KnowledgeIndex;
use pitwall_memory::MemoryCache;
use pitwall_ratelimit::RateLimiter;
use pitwall_storage::SqliteStore;
use tracing::{debug, warn};

pub struct App {
    pub config: PitwallConfig,
    pub clock: SharedClock,
    pub cache: Arc<dyn CacheStore>,
    pub store: Arc<SqliteStore>,
    pub knowledge: KnowledgeIndex,
    pub limiter: RateLimiter,
    pub memory: MemoryCache,
}

impl App {
    /// Wires every component. Nothing connects until first use.
    pub fn open(config: PitwallConfig) -> Result<Self, PitwallError> {
        Self::with_clock(config, system_clock())
    }

    pub fn with_clock(config: PitwallConfig, clock: SharedClock) -> Result<Self, PitwallError> {
        let cache = build_cache(&config.cache, clock.clone())?;
        let store = Arc::new(SqliteStore::new(config.storage.clone()));
        let deadline = config.cache.operation_timeout();

        let knowledge =
            KnowledgeIndex::new(cache.clone(), clock.clone(), deadline).with_store(store.clone());
        let limiter = RateLimiter::new(
            cache.clone(),
            store.clone(),
            clock.clone(),
            &config.rate_limit,
            deadline,
        );
        let memory = MemoryCache::new(cache.clone(), deadline, config.memory.retention());

        debug!(database = %config.storage.database_path, "application wired");
        Ok(Self {
            config,
            clock,
            cache,
            store,
            knowledge,
            limiter,
            memory,
        })
    }

    pub async fn shutdown(&self) {
        if let Err(e) = self.cache.shutdown().await {
            warn!(error = %e, "cache shutdown failed");
        }
        if let Err(e) = self.store.shutdown().await {
            warn!(error = %e, "durable store shutdown failed");
        }
    }
}
