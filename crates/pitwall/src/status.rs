// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pitwall status` command implementation.
//!
//! Runs the cache and durable-store health checks and summarizes the
//! knowledge corpus. Unreachable backends are reported, not raised.

use pitwall_cache::time_bound;
use pitwall_config::CacheBackend;
use pitwall_core::{HealthStatus, PitwallError, PluginAdapter};
use pitwall_knowledge::KnowledgeStats;
use serde::Serialize;

use crate::app::App;

/// One adapter's health, as printed.
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub name: String,
    pub state: String,
    pub detail: Option<String>,
}

impl ComponentStatus {
    fn from_check(name: &str, check: Result<HealthStatus, PitwallError>) -> Self {
        let (state, detail) = match check {
            Ok(HealthStatus::Healthy) => ("healthy", None),
            Ok(HealthStatus::Degraded(why)) => ("degraded", Some(why)),
            Ok(HealthStatus::Unhealthy(why)) => ("unhealthy", Some(why)),
            Err(e) => ("unhealthy", Some(e.to_string())),
        };
        Self {
            name: name.to_string(),
            state: state.to_string(),
            detail,
        }
    }

    fn is_healthy(&self) -> bool {
        self.state == "healthy"
    }
}

/// Structured status output for `--json` mode.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub cache: ComponentStatus,
    pub storage: ComponentStatus,
    pub knowledge: Option<KnowledgeStats>,
}

pub async fn collect_status(app: &App) -> StatusResponse {
    let deadline = app.config.cache.operation_timeout();
    let cache = ComponentStatus::from_check(
        app.cache.name(),
        time_bound(deadline, app.cache.health_check()).await,
    );
    let storage = ComponentStatus::from_check(app.store.name(), app.store.health_check().await);
    let knowledge = if cache.is_healthy() {
        app.knowledge.stats().await.ok()
    } else {
        None
    };
    StatusResponse {
        cache,
        storage,
        knowledge,
    }
}

/// Run the `pitwall status` command.
pub async fn run_status(app: &App, json: bool) -> Result<(), PitwallError> {
    let status = collect_status(app).await;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("  pitwall status");
    println!("  {}", "-".repeat(35));
    print_component("Cache", &status.cache);
    print_component("Storage", &status.storage);
    if app.config.cache.backend == CacheBackend::Memory {
        println!("    Note:     memory cache is process-local");
    }
    match &status.knowledge {
        Some(stats) => {
            let by_type = stats
                .by_type
                .iter()
                .filter(|(_, n)| **n > 0)
                .map(|(kind, n)| format!("{kind}={n}"))
                .collect::<Vec<_>>()
                .join(", ");
            println!("    Knowledge: {} entries ({by_type})", stats.total);
        }
        None => println!("    Knowledge: unavailable"),
    }
    println!();
    Ok(())
}

fn print_component(label: &str, status: &ComponentStatus) {
    let mark = if status.is_healthy() { "[OK]" } else { "[FAIL]" };
    match &status.detail {
        Some(detail) => println!("    {label:<9} {mark} {} ({}): {detail}", status.state, status.name),
        None => println!("    {label:<9} {mark} {} ({})", status.state, status.name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_status_from_checks() {
        let ok = ComponentStatus::from_check("memory", Ok(HealthStatus::Healthy));
        assert!(ok.is_healthy());
        assert_eq!(ok.detail, None);

        let down = ComponentStatus::from_check("redis", Err(PitwallError::cache("refused")));
        assert!(!down.is_healthy());
        assert_eq!(down.detail.as_deref(), Some("cache error: refused"));
    }

    #[test]
    fn status_response_serializes() {
        let resp = StatusResponse {
            cache: ComponentStatus::from_check("memory", Ok(HealthStatus::Healthy)),
            storage: ComponentStatus::from_check(
                "sqlite",
                Ok(HealthStatus::Unhealthy("locked".into())),
            ),
            knowledge: None,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("\"state\":\"healthy\""));
        assert!(json.contains("\"detail\":\"locked\""));
        assert!(json.contains("\"knowledge\":null"));
    }
}
