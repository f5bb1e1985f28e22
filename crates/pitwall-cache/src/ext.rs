// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed single-command helpers over [`CacheStore`].

use std::time::Duration;

use async_trait::async_trait;
use pitwall_core::{CacheReply, CacheStore, PitwallError, Pipeline};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Takes the only reply of a one-command pipeline.
pub fn single(replies: Vec<CacheReply>) -> Result<CacheReply, PitwallError> {
    replies
        .into_iter()
        .next()
        .ok_or_else(|| PitwallError::cache("empty reply from cache"))
}

/// Convenience methods available on every cache backend.
#[async_trait]
pub trait CacheExt: CacheStore {
    async fn get_text(&self, key: &str) -> Result<Option<String>, PitwallError> {
        single(self.execute(Pipeline::new().get(key)).await?)?.into_text()
    }

    async fn set_text(
        &self,
        key: &str,
        value: String,
        ttl: Option<Duration>,
    ) -> Result<(), PitwallError> {
        self.execute(Pipeline::new().set(key, value, ttl)).await?;
        Ok(())
    }

    /// Reads and decodes a JSON value.
    async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, PitwallError> {
        match self.get_text(key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Encodes and writes a JSON value.
    async fn set_json<T: Serialize + Sync>(
        &self,
        key: &str,
        value: &T,
        ttl: Option<Duration>,
    ) -> Result<(), PitwallError> {
        let raw = serde_json::to_string(value)?;
        self.set_text(key, raw, ttl).await
    }

    async fn exists(&self, key: &str) -> Result<bool, PitwallError> {
        Ok(single(self.execute(Pipeline::new().exists(key)).await?)?.into_int()? > 0)
    }

    async fn del(&self, key: &str) -> Result<bool, PitwallError> {
        Ok(single(self.execute(Pipeline::new().del(key)).await?)?.into_int()? > 0)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>, PitwallError> {
        single(self.execute(Pipeline::new().smembers(key)).await?)?.into_list()
    }
}

impl<C: CacheStore + ?Sized> CacheExt for C {}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pitwall_core::system_clock;
    use serde::Deserialize;

    use super::*;
    use crate::InMemoryCache;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Lap {
        number: u32,
        driver: String,
    }

    #[tokio::test]
    async fn json_values_through_trait_object() {
        let cache: Arc<dyn CacheStore> = Arc::new(InMemoryCache::new(system_clock()));
        let lap = Lap {
            number: 12,
            driver: "u1".into(),
        };
        cache.set_json("lap", &lap, None).await.unwrap();
        assert_eq!(cache.get_json::<Lap>("lap").await.unwrap(), Some(lap));
        assert!(cache.exists("lap").await.unwrap());
        assert!(cache.del("lap").await.unwrap());
        assert_eq!(cache.get_json::<Lap>("lap").await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_json_is_a_serialization_error() {
        let cache = InMemoryCache::new(system_clock());
        cache.set_text("bad", "{not json".into(), None).await.unwrap();
        let err = cache.get_json::<Lap>("bad").await.unwrap_err();
        assert!(matches!(err, PitwallError::Serialization { .. }));
    }
}
