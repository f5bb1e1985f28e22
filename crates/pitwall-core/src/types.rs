// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Pitwall components.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Free-form metadata attached to records and entries.
pub type Metadata = BTreeMap<String, serde_json::Value>;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Cache,
    Storage,
    Completion,
    Embedding,
}

/// A single admitted billable action, as recorded in the durable store.
///
/// Immutable once written; the durable store's usage log is the source of
/// truth for rate limiting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageEvent {
    /// Unique event identifier; doubles as the sorted-set member in the cache.
    pub id: String,
    pub subject_id: String,
    pub action: String,
    /// Epoch milliseconds.
    pub occurred_at: i64,
}

impl UsageEvent {
    /// Creates an event with a fresh random id.
    pub fn new(subject_id: impl Into<String>, action: impl Into<String>, occurred_at: i64) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            subject_id: subject_id.into(),
            action: action.into(),
            occurred_at,
        }
    }
}

/// Category of a knowledge corpus entry.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum KnowledgeType {
    Service,
    Vehicle,
    Faq,
    Skill,
    Policy,
    Product,
}

impl KnowledgeType {
    /// Every type, in the order lookups probe them.
    pub const ALL: [KnowledgeType; 6] = [
        KnowledgeType::Service,
        KnowledgeType::Vehicle,
        KnowledgeType::Faq,
        KnowledgeType::Skill,
        KnowledgeType::Policy,
        KnowledgeType::Product,
    ];
}

/// A global, subject-independent knowledge corpus entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: KnowledgeType,
    pub title: String,
    pub content: String,
    /// Lowercased keyword set used for the posting index.
    pub keywords: BTreeSet<String>,
    #[serde(default)]
    pub metadata: Metadata,
    /// Epoch milliseconds; set by the index on add.
    #[serde(default)]
    pub created_at: i64,
    /// Epoch milliseconds; set by the index on add.
    #[serde(default)]
    pub updated_at: i64,
}

impl KnowledgeEntry {
    /// Builds an entry, lowercasing and de-duplicating its keywords.
    pub fn new<I, S>(
        kind: KnowledgeType,
        id: impl Into<String>,
        title: impl Into<String>,
        content: impl Into<String>,
        keywords: I,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            id: id.into(),
            kind,
            title: title.into(),
            content: content.into(),
            keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            metadata: Metadata::new(),
            created_at: 0,
            updated_at: 0,
        }
    }

    /// Attaches a metadata value.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
