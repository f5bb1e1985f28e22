// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Sorted-set window counters kept in the cache.
//!
//! One sorted set per `subject:action`. Members are event ids scored by
//! their epoch-ms timestamp. A key hydrated from an empty history holds
//! only [`SENTINEL`] at score 0, which eviction never touches because it
//! starts at score 1.

use std::sync::Arc;
use std::time::Duration;

use pitwall_cache::time_bound;
use pitwall_core::{CacheStore, PitwallError, Pipeline, ScoreBound, UsageEvent};
use tracing::debug;

/// Member marking "hydrated, no events".
pub const SENTINEL: &str = "INIT";

/// Cache key for one (subject, action) counter.
pub fn window_key(subject_id: &str, action: &str) -> String {
    format!("{subject_id}:{action}")
}

/// Exclusive lower edge of the window ending at `now_ms`.
///
/// Clamped at zero so the sentinel is never counted.
pub fn window_floor(now_ms: i64, window: Duration) -> i64 {
    let window_ms = i64::try_from(window.as_millis()).unwrap_or(i64::MAX);
    now_ms.saturating_sub(window_ms).max(0)
}

/// Time-bound access to the window counters.
pub struct RateLimitCache {
    cache: Arc<dyn CacheStore>,
    deadline: Duration,
}

impl RateLimitCache {
    pub fn new(cache: Arc<dyn CacheStore>, deadline: Duration) -> Self {
        Self { cache, deadline }
    }

    async fn run(&self, pipeline: Pipeline) -> Result<Vec<pitwall_core::CacheReply>, PitwallError> {
        time_bound(self.deadline, self.cache.execute(pipeline)).await
    }

    /// Whether the key exists (hydrated and not expired).
    pub async fn is_hydrated(&self, key: &str) -> Result<bool, PitwallError> {
        let replies = self.run(Pipeline::new().exists(key)).await?;
        Ok(pitwall_cache::single(replies)?.into_int()? > 0)
    }

    /// Loads historical events into the key, or the sentinel when there are none.
    pub async fn hydrate(
        &self,
        key: &str,
        events: &[UsageEvent],
        window: Duration,
    ) -> Result<(), PitwallError> {
        let members: Vec<(String, f64)> = if events.is_empty() {
            vec![(SENTINEL.to_string(), 0.0)]
        } else {
            events
                .iter()
                .map(|e| (e.id.clone(), e.occurred_at as f64))
                .collect()
        };
        debug!(key, members = members.len(), "hydrating rate window");
        self.run(Pipeline::new().zadd(key, members).expire(key, window))
            .await?;
        Ok(())
    }

    /// Evicts expired members, counts the live ones and refreshes the TTL.
    pub async fn count(&self, key: &str, now_ms: i64, window: Duration) -> Result<u64, PitwallError> {
        let floor = window_floor(now_ms, window) as f64;
        let replies = self
            .run(
                Pipeline::new()
                    .zrem_range_by_score(key, ScoreBound::Inclusive(1.0), ScoreBound::Inclusive(floor))
                    .zcount(key, ScoreBound::Exclusive(floor), ScoreBound::PosInf)
                    .expire(key, window),
            )
            .await?;
        let mut replies = replies.into_iter();
        let evicted = replies.next().map(|r| r.into_int()).transpose()?.unwrap_or(0);
        let count = replies
            .next()
            .ok_or_else(|| PitwallError::cache("missing ZCOUNT reply"))?
            .into_int()?;
        if evicted > 0 {
            debug!(key, evicted, "evicted expired window members");
        }
        Ok(count.max(0) as u64)
    }

    /// Adds one member when the key is hydrated. Returns whether it was added.
    ///
    /// An absent key is left absent: the next check hydrates it from the
    /// durable log, which already holds the event.
    pub async fn append(
        &self,
        key: &str,
        member: String,
        score: i64,
        window: Duration,
    ) -> Result<bool, PitwallError> {
        if !self.is_hydrated(key).await? {
            return Ok(false);
        }
        self.run(
            Pipeline::new()
                .zadd(key, vec![(member, score as f64)])
                .expire(key, window),
        )
        .await?;
        Ok(true)
    }
}
