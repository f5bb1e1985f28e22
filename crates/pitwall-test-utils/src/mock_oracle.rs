// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted completion and embedding oracles.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use pitwall_core::{CompletionOracle, EmbeddingOracle, PitwallError};

/// A completion oracle that replays queued replies.
///
/// Replies are popped from a FIFO queue. When the queue is empty, a default
/// "mock reply" text is returned. Every prompt received is kept.
pub struct MockOracle {
    replies: Arc<Mutex<VecDeque<Result<String, String>>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    failing: AtomicBool,
}

impl MockOracle {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            failing: AtomicBool::new(false),
        }
    }

    pub fn with_replies(replies: Vec<String>) -> Self {
        Self {
            replies: Arc::new(Mutex::new(replies.into_iter().map(Ok).collect())),
            ..Self::new()
        }
    }

    pub async fn push_reply(&self, text: impl Into<String>) {
        self.replies.lock().await.push_back(Ok(text.into()));
    }

    /// Queues one failed completion.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.replies.lock().await.push_back(Err(message.into()));
    }

    /// Makes every subsequent call fail until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.prompts.lock().await.len()
    }
}

impl Default for MockOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionOracle for MockOracle {
    async fn complete(&self, prompt: &str) -> Result<String, PitwallError> {
        self.prompts.lock().await.push(prompt.to_string());
        if self.failing.load(Ordering::SeqCst) {
            return Err(PitwallError::Oracle {
                message: "mock oracle unavailable".into(),
                source: None,
            });
        }
        match self.replies.lock().await.pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(PitwallError::Oracle {
                message,
                source: None,
            }),
            None => Ok("mock reply".to_string()),
        }
    }
}

/// An embedding oracle with fixed vectors per text.
///
/// Texts without a registered vector fail, as does every call while failing.
pub struct MockEmbedder {
    vectors: std::sync::Mutex<HashMap<String, Vec<f32>>>,
    failing: AtomicBool,
}

impl MockEmbedder {
    pub fn new() -> Self {
        Self {
            vectors: std::sync::Mutex::new(HashMap::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// An embedder that always fails.
    pub fn failing() -> Self {
        let embedder = Self::new();
        embedder.set_failing(true);
        embedder
    }

    pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.insert(text, vector);
        self
    }

    pub fn insert(&self, text: impl Into<String>, vector: Vec<f32>) {
        if let Ok(mut vectors) = self.vectors.lock() {
            vectors.insert(text.into(), vector);
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingOracle for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, PitwallError> {
        let err = |message: &str| PitwallError::Embedding {
            message: message.to_string(),
            source: None,
        };
        if self.failing.load(Ordering::SeqCst) {
            return Err(err("mock embedder unavailable"));
        }
        let vectors = self
            .vectors
            .lock()
            .map_err(|_| err("mock embedder lock poisoned"))?;
        vectors
            .get(text)
            .cloned()
            .ok_or_else(|| err("no vector registered for text"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn oracle_replays_queue_then_default() {
        let oracle = MockOracle::with_replies(vec!["one".into()]);
        oracle.push_failure("boom").await;
        assert_eq!(oracle.complete("p1").await.unwrap(), "one");
        assert!(oracle.complete("p2").await.is_err());
        assert_eq!(oracle.complete("p3").await.unwrap(), "mock reply");
        assert_eq!(oracle.prompts().await, vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn embedder_fails_for_unknown_text() {
        let embedder = MockEmbedder::new().with_vector("a", vec![1.0, 0.0]);
        assert_eq!(embedder.embed("a").await.unwrap(), vec![1.0, 0.0]);
        assert!(embedder.embed("b").await.is_err());
        embedder.set_failing(true);
        assert!(embedder.embed("a").await.is_err());
    }
}
