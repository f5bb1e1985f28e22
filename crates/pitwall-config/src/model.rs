// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Pitwall state access layer.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level Pitwall configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PitwallConfig {
    /// Process-level settings.
    #[serde(default)]
    pub service: ServiceConfig,

    /// Durable store settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Low-latency cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Rate limiter settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Conversational memory settings.
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Durable store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("pitwall").join("pitwall.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("pitwall.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Which cache backend to construct at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackend {
    /// Process-local B-tree backed cache (single node, lost on restart).
    Memory,
    /// Redis or a protocol-compatible server.
    Redis,
}

/// Low-latency cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Backend selection.
    #[serde(default = "default_cache_backend")]
    pub backend: CacheBackend,

    /// Connection URL for the redis backend.
    #[serde(default = "default_cache_url")]
    pub url: String,

    /// Hard deadline for every cache round-trip, in milliseconds.
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,
}

impl CacheConfig {
    /// The per-operation deadline as a [`Duration`].
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: default_cache_backend(),
            url: default_cache_url(),
            operation_timeout_ms: default_operation_timeout_ms(),
        }
    }
}

fn default_cache_backend() -> CacheBackend {
    CacheBackend::Memory
}

fn default_cache_url() -> String {
    "redis://127.0.0.1:6379/0".to_string()
}

fn default_operation_timeout_ms() -> u64 {
    200
}

/// Rate limiter configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Admit the action when both the cache and the durable store are unreachable.
    #[serde(default = "default_fail_open")]
    pub fail_open: bool,

    /// Limit used by callers that do not pass one explicitly.
    #[serde(default = "default_limit")]
    pub default_limit: u64,

    /// Window used by callers that do not pass one explicitly, in seconds.
    #[serde(default = "default_window_secs")]
    pub default_window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            fail_open: default_fail_open(),
            default_limit: default_limit(),
            default_window_secs: default_window_secs(),
        }
    }
}

fn default_fail_open() -> bool {
    true
}

fn default_limit() -> u64 {
    10
}

fn default_window_secs() -> u64 {
    3600
}

/// Conversational memory configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Sliding retention for conversation records and stored contexts, in seconds.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,

    /// Number of recent messages included in each prompt.
    #[serde(default = "default_recent_messages")]
    pub recent_messages: usize,

    /// Number of knowledge entries included in each prompt.
    #[serde(default = "default_knowledge_results")]
    pub knowledge_results: usize,

    /// Number of similar past exchanges included in each prompt.
    #[serde(default = "default_similar_contexts")]
    pub similar_contexts: usize,

    /// Length of the pseudo-embedding used when the embedding oracle fails.
    #[serde(default = "default_embedding_dimensions")]
    pub embedding_dimensions: usize,

    /// Assistant persona placed at the top of every prompt.
    #[serde(default = "default_persona")]
    pub persona: String,

    /// Reply returned to the caller when the completion oracle fails.
    #[serde(default = "default_apology")]
    pub apology: String,
}

impl MemoryConfig {
    /// The retention window as a [`Duration`].
    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_secs)
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention_secs(),
            recent_messages: default_recent_messages(),
            knowledge_results: default_knowledge_results(),
            similar_contexts: default_similar_contexts(),
            embedding_dimensions: default_embedding_dimensions(),
            persona: default_persona(),
            apology: default_apology(),
        }
    }
}

fn default_retention_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_recent_messages() -> usize {
    10
}

fn default_knowledge_results() -> usize {
    3
}

fn default_similar_contexts() -> usize {
    2
}

fn default_embedding_dimensions() -> usize {
    768
}

fn default_persona() -> String {
    "You are a helpful AI assistant for a vehicle service center.".to_string()
}

fn default_apology() -> String {
    "I apologize, but I encountered an error. Please try again or contact our support team."
        .to_string()
}
