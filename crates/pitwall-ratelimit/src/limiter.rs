// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Admission control for billable actions.
//!
//! [`RateLimiter::allow`] answers "may this subject perform this action
//! now?" from a sliding window `(now - window, now]`. The cache counter is
//! tried first; any cache failure or timeout drops to a count over the
//! durable usage log; if that fails too the configured `fail_open` policy
//! decides. [`RateLimiter::record`] is called separately, after the caller
//! has written the usage event durably.

use std::sync::Arc;
use std::time::Duration;

use pitwall_config::RateLimitConfig;
use pitwall_core::{CacheStore, PitwallError, SharedClock, UsageStore};
use tracing::{debug, error, warn};

use crate::window::{RateLimitCache, window_floor, window_key};

/// Sliding-window rate limiter over a cache and a durable usage log.
pub struct RateLimiter {
    windows: RateLimitCache,
    store: Arc<dyn UsageStore>,
    clock: SharedClock,
    fail_open: bool,
    default_limit: u64,
    default_window: Duration,
}

impl RateLimiter {
    /// `deadline` bounds every individual cache round-trip.
    pub fn new(
        cache: Arc<dyn CacheStore>,
        store: Arc<dyn UsageStore>,
        clock: SharedClock,
        config: &RateLimitConfig,
        deadline: Duration,
    ) -> Self {
        Self {
            windows: RateLimitCache::new(cache, deadline),
            store,
            clock,
            fail_open: config.fail_open,
            default_limit: config.default_limit,
            default_window: Duration::from_secs(config.default_window_secs),
        }
    }

    pub fn fail_open(&self) -> bool {
        self.fail_open
    }

    pub fn default_limit(&self) -> u64 {
        self.default_limit
    }

    pub fn default_window(&self) -> Duration {
        self.default_window
    }

    /// Whether one more `action` by `subject_id` fits under `limit` for the trailing `window`.
    ///
    /// Never returns an error. `count == limit` denies.
    pub async fn allow(&self, subject_id: &str, action: &str, limit: u64, window: Duration) -> bool {
        let now = self.clock.now_ms();

        match self.count_cached(subject_id, action, now, window).await {
            Ok(count) => return count < limit,
            Err(e) => warn!(
                subject_id = %subject_id,
                action = %action,
                error = %e,
                "rate window cache unavailable, counting from durable store"
            ),
        }

        let floor = window_floor(now, window);
        match self.store.count_events(subject_id, action, floor, now).await {
            Ok(count) => count < limit,
            Err(e) => {
                if self.fail_open {
                    error!(
                        alarm = "rate_limit_fail_open",
                        subject_id = %subject_id,
                        action = %action,
                        error = %e,
                        "cache and durable store unavailable, admitting request"
                    );
                } else {
                    error!(
                        alarm = "rate_limit_fail_closed",
                        subject_id = %subject_id,
                        action = %action,
                        error = %e,
                        "cache and durable store unavailable, denying request"
                    );
                }
                self.fail_open
            }
        }
    }

    /// [`allow`](Self::allow) with the configured default limit and window.
    pub async fn allow_default(&self, subject_id: &str, action: &str) -> bool {
        self.allow(subject_id, action, self.default_limit, self.default_window)
            .await
    }

    /// Notes one admitted action in the cache counter.
    ///
    /// Failures are logged and swallowed: the durable write the caller
    /// already made is authoritative.
    pub async fn record(&self, subject_id: &str, action: &str, window: Duration) {
        let now = self.clock.now_ms();
        let key = window_key(subject_id, action);
        let member = format!("{now}-{:016x}", rand::random::<u64>());

        match self.windows.append(&key, member, now, window).await {
            Ok(true) => {}
            Ok(false) => debug!(key = %key, "rate window not hydrated, record deferred to hydration"),
            Err(e) => warn!(
                subject_id = %subject_id,
                action = %action,
                error = %e,
                "failed to record usage in rate window cache"
            ),
        }
    }

    async fn count_cached(
        &self,
        subject_id: &str,
        action: &str,
        now: i64,
        window: Duration,
    ) -> Result<u64, PitwallError> {
        let key = window_key(subject_id, action);

        if !self.windows.is_hydrated(&key).await? {
            let floor = window_floor(now, window);
            let events = self.store.list_events(subject_id, action, floor, now).await?;
            self.windows.hydrate(&key, &events, window).await?;
        }

        self.windows.count(&key, now, window).await
    }
}
