// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fault-injecting cache wrapper.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

use async_trait::async_trait;

use pitwall_core::{
    AdapterType, CacheReply, CacheStore, HealthStatus, PitwallError, Pipeline, PluginAdapter,
};

/// How a [`FlakyCache`] answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultMode {
    /// Forward to the inner cache.
    Healthy,
    /// Reject every pipeline with a cache error.
    Failing,
    /// Never answer.
    Hanging,
}

impl FaultMode {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => FaultMode::Failing,
            2 => FaultMode::Hanging,
            _ => FaultMode::Healthy,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            FaultMode::Healthy => 0,
            FaultMode::Failing => 1,
            FaultMode::Hanging => 2,
        }
    }
}

/// Wraps a cache and fails or stalls on demand, counting pipelines seen.
pub struct FlakyCache {
    inner: Arc<dyn CacheStore>,
    mode: AtomicU8,
    calls: AtomicUsize,
}

impl FlakyCache {
    pub fn new(inner: Arc<dyn CacheStore>) -> Self {
        Self {
            inner,
            mode: AtomicU8::new(FaultMode::Healthy.as_u8()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn set_mode(&self, mode: FaultMode) {
        self.mode.store(mode.as_u8(), Ordering::SeqCst);
    }

    pub fn mode(&self) -> FaultMode {
        FaultMode::from_u8(self.mode.load(Ordering::SeqCst))
    }

    /// Pipelines received, whatever the mode.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PluginAdapter for FlakyCache {
    fn name(&self) -> &str {
        "flaky-cache"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Cache
    }

    async fn health_check(&self) -> Result<HealthStatus, PitwallError> {
        match self.mode() {
            FaultMode::Healthy => self.inner.health_check().await,
            FaultMode::Failing => Ok(HealthStatus::Unhealthy("injected failure".into())),
            FaultMode::Hanging => Ok(HealthStatus::Degraded("injected stall".into())),
        }
    }

    async fn shutdown(&self) -> Result<(), PitwallError> {
        self.inner.shutdown().await
    }
}

#[async_trait]
impl CacheStore for FlakyCache {
    async fn execute(&self, pipeline: Pipeline) -> Result<Vec<CacheReply>, PitwallError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode() {
            FaultMode::Healthy => self.inner.execute(pipeline).await,
            FaultMode::Failing => Err(PitwallError::cache("injected failure")),
            FaultMode::Hanging => std::future::pending().await,
        }
    }
}
