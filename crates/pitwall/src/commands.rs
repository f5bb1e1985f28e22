// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Operational subcommands other than `status`.

use std::time::Duration;

use pitwall_core::{PitwallError, UsageEvent, UsageStore};
use pitwall_knowledge::seed;
use serde::Serialize;
use tracing::info;

use crate::app::App;

/// Run the `pitwall seed-knowledge` command.
pub async fn run_seed(app: &App) -> Result<(), PitwallError> {
    let count = seed(&app.knowledge).await?;
    println!("seeded {count} knowledge entries");
    Ok(())
}

/// Re-indexes the cache from the durable store when the cache holds no entries,
/// as after a restart of the memory backend.
async fn ensure_indexed(app: &App) -> Result<(), PitwallError> {
    if app.knowledge.stats().await?.total == 0 {
        let rebuilt = app.knowledge.rebuild().await?;
        info!(entries = rebuilt, "knowledge index was empty, rebuilt");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct SearchHit {
    kind: String,
    id: String,
    title: String,
}

/// Run the `pitwall search-knowledge` command.
pub async fn run_search(app: &App, query: &str, limit: usize, json: bool) -> Result<(), PitwallError> {
    ensure_indexed(app).await?;
    let hits: Vec<SearchHit> = app
        .knowledge
        .search(query, limit)
        .await?
        .into_iter()
        .map(|e| SearchHit {
            kind: e.kind.to_string(),
            id: e.id,
            title: e.title,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&hits)?);
    } else if hits.is_empty() {
        println!("no matches for {query:?}");
    } else {
        for hit in &hits {
            println!("[{}] {}: {}", hit.kind, hit.id, hit.title);
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct LimitDecision<'a> {
    subject_id: &'a str,
    action: &'a str,
    limit: u64,
    window_secs: u64,
    allowed: bool,
}

/// Run the `pitwall limit-check` command. Returns whether the action is allowed.
pub async fn run_limit_check(
    app: &App,
    subject_id: &str,
    action: &str,
    limit: Option<u64>,
    window_secs: Option<u64>,
    json: bool,
) -> Result<bool, PitwallError> {
    let limit = limit.unwrap_or_else(|| app.limiter.default_limit());
    let window = window_secs.map_or_else(|| app.limiter.default_window(), Duration::from_secs);
    let allowed = app.limiter.allow(subject_id, action, limit, window).await;

    if json {
        let decision = LimitDecision {
            subject_id,
            action,
            limit,
            window_secs: window.as_secs(),
            allowed,
        };
        println!("{}", serde_json::to_string_pretty(&decision)?);
    } else {
        let verdict = if allowed { "allowed" } else { "denied" };
        println!("{subject_id}:{action} {verdict} (limit {limit} per {}s)", window.as_secs());
    }
    Ok(allowed)
}

/// Run the `pitwall limit-record` command: durable insert, then cache record.
pub async fn run_limit_record(
    app: &App,
    subject_id: &str,
    action: &str,
    window_secs: Option<u64>,
) -> Result<(), PitwallError> {
    let window = window_secs.map_or_else(|| app.limiter.default_window(), Duration::from_secs);
    let event = UsageEvent::new(subject_id, action, app.clock.now_ms());
    app.store.insert_event(&event).await?;
    app.limiter.record(subject_id, action, window).await;
    println!("recorded {} for {subject_id}:{action}", event.id);
    Ok(())
}

/// Run the `pitwall history` command.
pub async fn run_history(
    app: &App,
    subject_id: &str,
    conversation_id: &str,
    n: usize,
    json: bool,
) -> Result<(), PitwallError> {
    let messages = app
        .memory
        .load(subject_id, conversation_id)
        .await?
        .map(|record| record.tail(n).to_vec())
        .unwrap_or_default();

    if json {
        println!("{}", serde_json::to_string_pretty(&messages)?);
    } else if messages.is_empty() {
        println!("no messages for {subject_id}/{conversation_id}");
    } else {
        for m in &messages {
            println!("{}: {}", m.role, m.content);
        }
    }
    Ok(())
}
