// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builds the configured cache backend.

use std::sync::Arc;

use pitwall_config::{CacheBackend, CacheConfig};
use pitwall_core::{CacheStore, PitwallError, SharedClock};
use tracing::info;

use crate::{InMemoryCache, RedisCache};

/// Constructs the backend named by `config.backend`.
///
/// The redis backend connects lazily, so this never touches the network.
pub fn build_cache(
    config: &CacheConfig,
    clock: SharedClock,
) -> Result<Arc<dyn CacheStore>, PitwallError> {
    match config.backend {
        CacheBackend::Memory => {
            info!(backend = "memory", "cache backend selected");
            Ok(Arc::new(InMemoryCache::new(clock)))
        }
        CacheBackend::Redis => {
            info!(backend = "redis", url = %config.url, "cache backend selected");
            Ok(Arc::new(RedisCache::new(&config.url)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use pitwall_core::system_clock;

    use super::*;

    #[test]
    fn builds_memory_backend_by_default() {
        let cache = build_cache(&CacheConfig::default(), system_clock()).unwrap();
        assert_eq!(cache.name(), "memory-cache");
    }

    #[test]
    fn builds_redis_backend_without_connecting() {
        let config = CacheConfig {
            backend: CacheBackend::Redis,
            ..CacheConfig::default()
        };
        let cache = build_cache(&config, system_clock()).unwrap();
        assert_eq!(cache.name(), "redis-cache");
    }
}
