// SPDX-FileCopyrightText: 2026 Pitwall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::embedding::cosine_similarity;
use crate::types::{ContextEntry, ScoredContext};

/// Scores every context against `query`, best first, keeping at most `limit`.
pub fn rank_contexts(query: &[f32], contexts: Vec<ContextEntry>, limit: usize) -> Vec<ScoredContext> {
    let mut scored: Vec<ScoredContext> = contexts
        .into_iter()
        .map(|c| ScoredContext {
            score: cosine_similarity(query, &c.embedding),
            context_id: c.context_id,
            text: c.text,
        })
        .collect();
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(limit);
    scored
}

#[cfg(test)]
mod tests {
    use pitwall_core::Metadata;

    use super::*;

    fn ctx(id: &str, embedding: Vec<f32>) -> ContextEntry {
        ContextEntry {
            subject_id: "u1".into(),
            context_id: id.into(),
            text: format!("text {id}"),
            embedding,
            metadata: Metadata::new(),
            timestamp: 0,
        }
    }

    #[test]
    fn ranks_by_cosine_descending_and_truncates() {
        let query = [1.0, 0.0];
        let contexts = vec![
            ctx("far", vec![0.0, 1.0]),
            ctx("near", vec![1.0, 0.1]),
            ctx("mid", vec![1.0, 1.0]),
        ];
        let ranked = rank_contexts(&query, contexts, 2);
        let ids: Vec<&str> = ranked.iter().map(|c| c.context_id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid"]);
        assert!(ranked[0].score >= ranked[1].score);
    }

    #[test]
    fn zero_vector_scores_zero() {
        let ranked = rank_contexts(&[1.0, 0.0], vec![ctx("z", vec![0.0, 0.0])], 5);
        assert_eq!(ranked[0].score, 0.0);
    }
}
