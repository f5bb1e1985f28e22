// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversational memory for Pitwall.
//!
//! ## Architecture
//!
//! - **MemoryCache**: conversation records, per-subject index and contexts in the cache
//! - **LocalFallbackStore**: process-local buffer while the cache is down
//! - **Embedder**: oracle embeddings with a deterministic pseudo-embedding fallback
//! - **ConversationMemory**: append/read, similarity search and the chat turn

pub mod conversation;
pub mod embedding;
pub mod fallback;
pub mod prompt;
pub mod similarity;
pub mod store;
pub mod types;

pub use conversation::ConversationMemory;
pub use embedding::{Embedder, cosine_similarity, pseudo_embedding, text_hash};
pub use fallback::LocalFallbackStore;
pub use prompt::{NO_HISTORY, PromptParts, compose_prompt};
pub use similarity::rank_contexts;
pub use store::MemoryCache;
pub use types::*;
