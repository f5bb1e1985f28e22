// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Global knowledge corpus for grounding AI replies.
//!
//! Entries are looked up by (type, id) or by keyword overlap with a free
//! text query. Matching is unscored on purpose: see [`KnowledgeIndex::search`].

pub mod index;
pub mod seed;

pub use index::{KnowledgeIndex, KnowledgeStats, NO_KNOWLEDGE, render_block, tokenize};
pub use pitwall_core::{KnowledgeEntry, KnowledgeType};
pub use seed::{default_corpus, seed};
