// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation and context records as stored in the cache.

use pitwall_core::Metadata;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Speaker label used when rendering history into a prompt.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            Role::User => "Customer",
            Role::Assistant | Role::System => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

/// One (subject, conversation) message log.
///
/// `messages` only ever grows at the end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub subject_id: String,
    pub conversation_id: String,
    pub messages: Vec<Message>,
    #[serde(default)]
    pub metadata: Metadata,
    pub last_updated: i64,
}

impl ConversationRecord {
    pub fn new(
        subject_id: impl Into<String>,
        conversation_id: impl Into<String>,
        metadata: Metadata,
        now_ms: i64,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            conversation_id: conversation_id.into(),
            messages: Vec::new(),
            metadata,
            last_updated: now_ms,
        }
    }

    pub fn push(&mut self, message: Message) {
        self.last_updated = self.last_updated.max(message.timestamp);
        self.messages.push(message);
    }

    /// The last `n` messages, oldest first.
    pub fn tail(&self, n: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(n);
        &self.messages[start..]
    }

    /// Appends the messages of `other` that are newer than this record.
    ///
    /// Used to fold a locally buffered copy back into the cached one.
    pub fn absorb(&mut self, other: ConversationRecord) {
        let newest = self.messages.last().map_or(i64::MIN, |m| m.timestamp);
        for message in other.messages {
            if message.timestamp > newest {
                self.push(message);
            }
        }
        for (key, value) in other.metadata {
            self.metadata.entry(key).or_insert(value);
        }
    }
}

/// A stored exchange with its embedding, used for similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    pub subject_id: String,
    pub context_id: String,
    pub text: String,
    pub embedding: Vec<f32>,
    #[serde(default)]
    pub metadata: Metadata,
    pub timestamp: i64,
}

/// A context returned by similarity search.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredContext {
    pub context_id: String,
    pub text: String,
    pub score: f32,
}

/// Summary of one conversation. All zeros when the conversation is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversationStats {
    pub message_count: usize,
    /// Milliseconds between the first and last message.
    pub duration_ms: i64,
    pub last_active: i64,
}

impl From<&ConversationRecord> for ConversationStats {
    fn from(record: &ConversationRecord) -> Self {
        let duration_ms = match (record.messages.first(), record.messages.last()) {
            (Some(first), Some(last)) => last.timestamp - first.timestamp,
            _ => 0,
        };
        Self {
            message_count: record.messages.len(),
            duration_ms,
            last_active: record.last_updated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn msg(role: Role, content: &str, timestamp: i64) -> Message {
        Message {
            role,
            content: content.to_string(),
            timestamp,
        }
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
        assert_eq!(Role::User.to_string(), "user");
        assert_eq!("system".parse::<Role>().unwrap(), Role::System);
    }

    #[test]
    fn tail_returns_last_n_in_order() {
        let mut record = ConversationRecord::new("u1", "c1", Metadata::new(), 0);
        for i in 0..5 {
            record.push(msg(Role::User, &format!("m{i}"), i));
        }
        let tail: Vec<&str> = record.tail(2).iter().map(|m| m.content.as_str()).collect();
        assert_eq!(tail, vec!["m3", "m4"]);
        assert_eq!(record.tail(50).len(), 5);
        assert_eq!(record.last_updated, 4);
    }

    #[test]
    fn absorb_skips_messages_already_present() {
        let mut cached = ConversationRecord::new("u1", "c1", Metadata::new(), 0);
        cached.push(msg(Role::User, "hi", 10));

        let mut local = cached.clone();
        local.push(msg(Role::Assistant, "hello", 20));

        cached.absorb(local);
        let contents: Vec<&str> = cached.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["hi", "hello"]);
        assert_eq!(cached.last_updated, 20);
    }

    #[test]
    fn stats_for_record() {
        let mut record = ConversationRecord::new("u1", "c1", Metadata::new(), 100);
        record.push(msg(Role::User, "a", 100));
        record.push(msg(Role::Assistant, "b", 350));
        let stats = ConversationStats::from(&record);
        assert_eq!(stats.message_count, 2);
        assert_eq!(stats.duration_ms, 250);
        assert_eq!(stats.last_active, 350);
    }
}
