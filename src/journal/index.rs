//! Similarity search over a user's prior entries.

use super::types::{CorpusEntry, SimilarityMatch};

/// Default score a prior entry must exceed to be surfaced as a reflection.
pub const DEFAULT_SIMILARITY_THRESHOLD: f32 = 0.70;

/// Cosine similarity of two vectors. Zero when either is all-zero or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (dot / (norm_a * norm_b)).clamp(-1.0, 1.0)
}

/// Most recent prior entry whose similarity to `query` is strictly above `threshold`.
///
/// `corpus` is in chronological order and is scanned newest-first; the first
/// entry that clears the threshold is returned even if an older one would
/// score higher. Recent reflections are more useful than the single closest
/// memory, which may be years old, so do not turn this into a global argmax.
///
/// Cost is one similarity per entry, O(n). That is fine for a personal journal
/// (hundreds to low thousands of entries). Much larger corpora need an
/// approximate-nearest-neighbor index behind this same signature.
pub fn most_similar(
    query: &[f32],
    corpus: &[CorpusEntry],
    threshold: f32,
) -> Option<SimilarityMatch> {
    corpus.iter().rev().find_map(|candidate| {
        let score = cosine_similarity(query, &candidate.embedding);
        (score > threshold).then(|| SimilarityMatch {
            entry_id: candidate.id.clone(),
            score,
        })
    })
}
