// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Rate limiter behavior over the in-memory cache, with injected faults.

use std::time::Duration;

use pitwall_core::{CacheReply, CacheStore, Clock, Pipeline, UsageEvent, UsageStore};
use pitwall_ratelimit::{SENTINEL, window_key};
use pitwall_test_utils::{FaultMode, ManualClock, TestHarness};
use proptest::prelude::*;
use tracing_test::traced_test;

const BASE: i64 = ManualClock::DEFAULT_START_MS;
const ACTION: &str = "GENERATE_ARTICLE";
const MINUTE: Duration = Duration::from_secs(60);

async fn members(h: &TestHarness, key: &str) -> Vec<String> {
    let replies = h
        .backing
        .execute(Pipeline::new().zrevrange(key, 0, -1))
        .await
        .unwrap();
    match replies.into_iter().next() {
        Some(CacheReply::List(items)) => items,
        other => panic!("unexpected reply {other:?}"),
    }
}

async fn seed_durable(h: &TestHarness, subject: &str, at: &[i64]) {
    for ts in at {
        h.durable
            .insert_event(&UsageEvent::new(subject, ACTION, *ts))
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn three_records_fill_a_limit_of_three() {
    let h = TestHarness::new();

    for offset in [0, 10_000, 20_000] {
        h.clock.set(BASE + offset);
        assert!(h.limiter.allow("u1", ACTION, 3, MINUTE).await);
        h.admit("u1", ACTION, MINUTE).await;
    }

    h.clock.set(BASE + 25_000);
    assert!(!h.limiter.allow("u1", ACTION, 3, MINUTE).await);

    // the event at +0 has left the window
    h.clock.set(BASE + 61_000);
    assert!(h.limiter.allow("u1", ACTION, 3, MINUTE).await);

    // every event has left the window; the sentinel stays
    h.clock.set(BASE + 81_000);
    assert!(h.limiter.allow("u1", ACTION, 1, MINUTE).await);
    assert_eq!(members(&h, &window_key("u1", ACTION)).await, vec![SENTINEL]);
}

#[tokio::test]
async fn cold_key_without_history_hydrates_sentinel_only() {
    let h = TestHarness::new();

    assert!(h.limiter.allow("u1", ACTION, 5, MINUTE).await);
    assert_eq!(members(&h, &window_key("u1", ACTION)).await, vec![SENTINEL]);
}

#[tokio::test]
async fn sentinel_hydration_queries_durable_store_once() {
    let h = TestHarness::new();

    for _ in 0..3 {
        assert!(h.limiter.allow("u1", ACTION, 5, MINUTE).await);
    }
    assert_eq!(h.durable.list_calls(), 1);
    assert_eq!(h.durable.count_calls(), 0);
}

#[tokio::test]
async fn hydration_loads_durable_history() {
    let h = TestHarness::new();
    h.clock.set(BASE + 30_000);
    seed_durable(&h, "u1", &[BASE, BASE + 10_000, BASE + 20_000]).await;

    assert!(!h.limiter.allow("u1", ACTION, 3, MINUTE).await);
    assert!(h.limiter.allow("u1", ACTION, 4, MINUTE).await);
    assert_eq!(h.durable.list_calls(), 1);
}

#[tokio::test]
async fn concurrent_cold_key_hydrations_do_not_double_count() {
    let h = TestHarness::new();
    h.clock.set(BASE + 30_000);
    seed_durable(&h, "u1", &[BASE, BASE + 10_000, BASE + 20_000]).await;

    let (first, second) = tokio::join!(
        h.limiter.allow("u1", ACTION, 10, MINUTE),
        h.limiter.allow("u1", ACTION, 10, MINUTE),
    );
    assert!(first && second);
    assert!((1..=2).contains(&h.durable.list_calls()));

    let mut held = members(&h, &window_key("u1", ACTION)).await;
    held.sort();
    let mut seeded: Vec<String> = h
        .durable
        .list_events("u1", ACTION, 0, BASE + 30_000)
        .await
        .unwrap()
        .into_iter()
        .map(|e| e.id)
        .collect();
    seeded.sort();
    assert_eq!(held, seeded);

    assert!(!h.limiter.allow("u1", ACTION, 3, MINUTE).await);
    assert!(h.limiter.allow("u1", ACTION, 4, MINUTE).await);
}

#[tokio::test]
async fn cache_outage_counts_from_durable_store() {
    let h = TestHarness::new();
    h.clock.set(BASE + 30_000);
    seed_durable(&h, "u1", &[BASE, BASE + 1, BASE + 2, BASE + 3, BASE + 4]).await;
    h.cache.set_mode(FaultMode::Failing);

    assert!(!h.limiter.allow("u1", ACTION, 5, MINUTE).await);
    assert!(h.limiter.allow("u1", ACTION, 6, MINUTE).await);
    assert_eq!(h.durable.count_calls(), 2);
}

#[tokio::test]
async fn count_equal_to_limit_denies() {
    let h = TestHarness::new();
    assert!(h.limiter.allow("u1", ACTION, 2, MINUTE).await);
    h.admit("u1", ACTION, MINUTE).await;
    assert!(h.limiter.allow("u1", ACTION, 2, MINUTE).await);
    h.admit("u1", ACTION, MINUTE).await;
    assert!(!h.limiter.allow("u1", ACTION, 2, MINUTE).await);
}

#[tokio::test]
async fn event_at_window_start_is_excluded_on_cache_path() {
    let h = TestHarness::new();
    assert!(h.limiter.allow("u1", ACTION, 1, MINUTE).await);
    h.admit("u1", ACTION, MINUTE).await;

    h.clock.set(BASE + 59_999);
    assert!(!h.limiter.allow("u1", ACTION, 1, MINUTE).await);

    h.clock.set(BASE + 60_000);
    assert!(h.limiter.allow("u1", ACTION, 1, MINUTE).await);
}

#[tokio::test]
async fn event_at_window_start_is_excluded_on_fallback_path() {
    let h = TestHarness::new();
    seed_durable(&h, "u1", &[BASE]).await;
    h.cache.set_mode(FaultMode::Failing);

    h.clock.set(BASE + 59_999);
    assert!(!h.limiter.allow("u1", ACTION, 1, MINUTE).await);

    h.clock.set(BASE + 60_000);
    assert!(h.limiter.allow("u1", ACTION, 1, MINUTE).await);
}

#[tokio::test]
async fn subjects_and_actions_are_isolated() {
    let h = TestHarness::new();
    assert!(h.limiter.allow("u1", ACTION, 1, MINUTE).await);
    h.admit("u1", ACTION, MINUTE).await;

    assert!(!h.limiter.allow("u1", ACTION, 1, MINUTE).await);
    assert!(h.limiter.allow("u2", ACTION, 1, MINUTE).await);
    assert!(h.limiter.allow("u1", "CHAT", 1, MINUTE).await);
}

#[tokio::test]
async fn record_on_cold_key_defers_to_hydration() {
    let h = TestHarness::new();
    h.admit("u1", ACTION, MINUTE).await;
    assert!(h.backing.is_empty());

    // hydration picks the event up from the durable log exactly once
    assert!(!h.limiter.allow("u1", ACTION, 1, MINUTE).await);
    assert_eq!(members(&h, &window_key("u1", ACTION)).await.len(), 1);
}

#[tokio::test]
async fn record_failure_is_swallowed() {
    let h = TestHarness::new();
    assert!(h.limiter.allow("u1", ACTION, 1, MINUTE).await);
    h.cache.set_mode(FaultMode::Failing);
    h.limiter.record("u1", ACTION, MINUTE).await;
    h.cache.set_mode(FaultMode::Healthy);
    assert!(h.limiter.allow("u1", ACTION, 1, MINUTE).await);
}

#[tokio::test]
async fn window_key_expires_after_idle_window() {
    let h = TestHarness::new();
    assert!(h.limiter.allow("u1", ACTION, 5, MINUTE).await);
    h.clock.advance(MINUTE + Duration::from_millis(1));
    assert!(h.backing.is_empty() || members(&h, &window_key("u1", ACTION)).await.is_empty());

    assert!(h.limiter.allow("u1", ACTION, 5, MINUTE).await);
    assert_eq!(h.durable.list_calls(), 2);
}

#[tokio::test]
async fn default_limit_and_window_come_from_config() {
    let h = TestHarness::new();
    assert_eq!(h.limiter.default_limit(), 10);
    assert_eq!(h.limiter.default_window(), Duration::from_secs(3600));
    assert!(h.limiter.fail_open());

    for _ in 0..10 {
        assert!(h.limiter.allow_default("u1", ACTION).await);
        h.admit("u1", ACTION, h.limiter.default_window()).await;
    }
    assert!(!h.limiter.allow_default("u1", ACTION).await);
}

#[tokio::test]
#[traced_test]
async fn total_outage_fails_open_with_alarm() {
    let h = TestHarness::new();
    h.cache.set_mode(FaultMode::Failing);
    h.durable.set_failing(true);

    assert!(h.limiter.allow("u1", ACTION, 1, MINUTE).await);
    assert!(logs_contain("rate_limit_fail_open"));
}

#[tokio::test]
#[traced_test]
async fn total_outage_fails_closed_when_configured() {
    let h = TestHarness::builder().with_fail_open(false).build();
    h.cache.set_mode(FaultMode::Failing);
    h.durable.set_failing(true);

    assert!(!h.limiter.allow("u1", ACTION, 1, MINUTE).await);
    assert!(logs_contain("rate_limit_fail_closed"));
}

#[tokio::test(start_paused = true)]
async fn hanging_cache_times_out_into_fallback() {
    let h = TestHarness::builder()
        .with_deadline(Duration::from_millis(200))
        .build();
    h.clock.set(BASE + 1_000);
    seed_durable(&h, "u1", &[BASE]).await;
    h.cache.set_mode(FaultMode::Hanging);

    let started = tokio::time::Instant::now();
    assert!(!h.limiter.allow("u1", ACTION, 1, MINUTE).await);
    assert!(started.elapsed() >= Duration::from_millis(200));
    assert_eq!(h.durable.count_calls(), 1);
}

fn expected_allow(timestamps: &[i64], now: i64, window_ms: i64, limit: u64) -> bool {
    let count = timestamps
        .iter()
        .filter(|ts| **ts > now - window_ms && **ts <= now)
        .count() as u64;
    count < limit
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn window_count_matches_recorded_history(
        mut offsets in prop::collection::vec(0i64..180_000, 0..20),
        check_after in 0i64..90_000,
        limit in 1u64..8,
    ) {
        offsets.sort_unstable();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();

        runtime.block_on(async {
            let h = TestHarness::new();
            let window_ms = 60_000;

            h.limiter.allow("u1", ACTION, u64::MAX, MINUTE).await;
            let mut recorded = Vec::new();
            for offset in &offsets {
                h.clock.set(BASE + offset);
                h.admit("u1", ACTION, MINUTE).await;
                recorded.push(BASE + offset);
            }

            let now = BASE + offsets.last().copied().unwrap_or(0) + check_after;
            h.clock.set(now);
            let expected = expected_allow(&recorded, now, window_ms, limit);

            assert_eq!(h.limiter.allow("u1", ACTION, limit, MINUTE).await, expected);

            h.cache.set_mode(FaultMode::Failing);
            assert_eq!(h.limiter.allow("u1", ACTION, limit, MINUTE).await, expected);
            assert_eq!(h.clock.now_ms(), now);
        });
    }
}
