// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Pitwall state access layer.

use thiserror::Error;

/// The primary error type used across all Pitwall adapter traits and core operations.
#[derive(Debug, Error)]
pub enum PitwallError {
    /// Configuration values rejected while wiring a component (e.g. a malformed cache URL).
    #[error("configuration error: {0}")]
    Config(String),

    /// Durable store errors (database connection, query failure, migration failure).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Low-latency cache errors (connection refused, protocol error, unexpected reply).
    #[error("cache error: {message}")]
    Cache {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Text-completion oracle errors.
    #[error("oracle error: {message}")]
    Oracle {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Embedding oracle errors.
    #[error("embedding error: {message}")]
    Embedding {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Operation did not finish before its deadline.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Encoding or decoding a cached value failed.
    #[error("serialization error: {source}")]
    Serialization {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PitwallError {
    /// Shorthand for a cache error without an underlying source.
    pub fn cache(message: impl Into<String>) -> Self {
        PitwallError::Cache {
            message: message.into(),
            source: None,
        }
    }

    /// Whether this error came from the cache layer (including deadline expiry).
    ///
    /// These are the transient failures that components recover from locally.
    pub fn is_transient_cache(&self) -> bool {
        matches!(self, PitwallError::Cache { .. } | PitwallError::Timeout { .. })
    }
}

impl From<serde_json::Error> for PitwallError {
    fn from(e: serde_json::Error) -> Self {
        PitwallError::Serialization {
            source: Box::new(e),
        }
    }
}
