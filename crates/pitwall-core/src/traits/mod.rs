// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! Backend adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod cache;
pub mod oracle;
pub mod storage;

pub use adapter::PluginAdapter;
pub use cache::CacheStore;
pub use oracle::{CompletionOracle, EmbeddingOracle};
pub use storage::{KnowledgeStore, UsageStore};
