// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text embeddings with a deterministic fallback.
//!
//! [`Embedder::embed`] asks the embedding oracle first. Any failure (or an
//! empty vector) is replaced by [`pseudo_embedding`], so callers always get
//! a vector. Pseudo-embeddings are stable but carry no meaning.

use std::sync::Arc;

use pitwall_core::EmbeddingOracle;
use tracing::warn;

/// 32-bit rolling hash over UTF-16 code units (`h = h * 31 + c`, wrapping).
pub fn text_hash(text: &str) -> i32 {
    text.encode_utf16().fold(0i32, |acc, unit| {
        acc.wrapping_shl(5)
            .wrapping_sub(acc)
            .wrapping_add(i32::from(unit))
    })
}

/// `sin(hash + i) * 0.5 + 0.5` for each index `i`.
pub fn pseudo_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let hash = f64::from(text_hash(text));
    (0..dimensions)
        .map(|i| ((hash + i as f64).sin() * 0.5 + 0.5) as f32)
        .collect()
}

/// Cosine similarity. Zero when either vector has zero norm or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut norm_a, mut norm_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b) {
        let (x, y) = (f64::from(*x), f64::from(*y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom == 0.0 || !denom.is_finite() {
        return 0.0;
    }
    (dot / denom) as f32
}

/// Produces embeddings, falling back to [`pseudo_embedding`].
pub struct Embedder {
    oracle: Option<Arc<dyn EmbeddingOracle>>,
    dimensions: usize,
}

impl Embedder {
    pub fn new(oracle: Option<Arc<dyn EmbeddingOracle>>, dimensions: usize) -> Self {
        Self { oracle, dimensions }
    }

    /// Pseudo-embeddings only.
    pub fn offline(dimensions: usize) -> Self {
        Self::new(None, dimensions)
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub async fn embed(&self, text: &str) -> Vec<f32> {
        if let Some(oracle) = &self.oracle {
            match oracle.embed(text).await {
                Ok(vector) if !vector.is_empty() => return vector,
                Ok(_) => warn!("embedding oracle returned an empty vector, using pseudo-embedding"),
                Err(e) => warn!(error = %e, "embedding oracle failed, using pseudo-embedding"),
            }
        }
        pseudo_embedding(text, self.dimensions)
    }
}
