// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Opaque AI service traits. No wire protocol is assumed.

use async_trait::async_trait;

use crate::error::PitwallError;

/// Single-shot text completion.
#[async_trait]
pub trait CompletionOracle: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, PitwallError>;
}

/// Text embedding generation.
#[async_trait]
pub trait EmbeddingOracle: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PitwallError>;
}
