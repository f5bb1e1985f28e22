// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Pitwall resilient state access layer.
//!
//! This crate provides the foundational trait definitions, error types, and
//! common types used throughout the Pitwall workspace. Cache backends,
//! durable stores, and AI oracles all implement traits defined here, and
//! components receive them as injected `Arc<dyn Trait>` handles.

pub mod cache;
pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use cache::{CacheCommand, CacheReply, Pipeline, ScoreBound};
pub use clock::{Clock, SharedClock, SystemClock, system_clock};
pub use error::PitwallError;
pub use types::{
    AdapterType, HealthStatus, KnowledgeEntry, KnowledgeType, Metadata, UsageEvent,
};

// Re-export all adapter traits at crate root.
pub use traits::{
    CacheStore, CompletionOracle, EmbeddingOracle, KnowledgeStore, PluginAdapter, UsageStore,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitwall_error_has_all_variants() {
        let _config = PitwallError::Config("test".into());
        let _storage = PitwallError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _cache = PitwallError::cache("test");
        let _oracle = PitwallError::Oracle {
            message: "test".into(),
            source: None,
        };
        let _embedding = PitwallError::Embedding {
            message: "test".into(),
            source: None,
        };
        let _timeout = PitwallError::Timeout {
            duration: std::time::Duration::from_millis(200),
        };
        let _internal = PitwallError::Internal("test".into());
    }

    #[test]
    fn transient_cache_classification() {
        assert!(PitwallError::cache("down").is_transient_cache());
        assert!(
            PitwallError::Timeout {
                duration: std::time::Duration::from_millis(200)
            }
            .is_transient_cache()
        );
        assert!(!PitwallError::Internal("x".into()).is_transient_cache());
    }

    #[test]
    fn knowledge_type_display_and_parse() {
        use std::str::FromStr;

        for kind in KnowledgeType::ALL {
            let s = kind.to_string();
            assert_eq!(s, s.to_lowercase());
            assert_eq!(KnowledgeType::from_str(&s).unwrap(), kind);
        }
    }

    #[test]
    fn knowledge_entry_normalizes_keywords() {
        let entry = KnowledgeEntry::new(
            KnowledgeType::Faq,
            "oil-change-frequency",
            "How often?",
            "Every 10,000 km.",
            ["Oil", "oil", " Change ", ""],
        );
        let keywords: Vec<&str> = entry.keywords.iter().map(String::as_str).collect();
        assert_eq!(keywords, vec!["change", "oil"]);
    }

    #[test]
    fn knowledge_entry_serializes_type_field() {
        let entry = KnowledgeEntry::new(KnowledgeType::Policy, "p", "t", "c", ["warranty"]);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["type"], "policy");
        let back: KnowledgeEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn usage_events_get_distinct_ids() {
        let a = UsageEvent::new("u1", "GENERATE_ARTICLE", 1);
        let b = UsageEvent::new("u1", "GENERATE_ARTICLE", 1);
        assert_ne!(a.id, b.id);
    }
}
