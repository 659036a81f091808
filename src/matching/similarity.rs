// src/matching/similarity.rs
use log::{debug, warn};
use std::cmp::Ordering;

use crate::utils::candle::cosine_similarity_candle;

#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateMatch<I> {
    pub existing_id: I,
    pub similarity: f64,
}

/// Similarity of two vectors, or `None` when it is undefined or the vectors
/// cannot be compared. Such candidates are left out of duplicate checks and
/// rankings.
fn comparable_similarity(query: &[f32], candidate: &[f32]) -> Option<f64> {
    match cosine_similarity_candle(query, candidate) {
        Ok(sim) => sim,
        Err(e) => {
            warn!("Skipping candidate in similarity comparison: {}", e);
            None
        }
    }
}

/// Returns the first existing entity whose embedding similarity to
/// `new_embedding` is strictly greater than `threshold`.
///
/// Iteration order decides which duplicate is reported when several qualify;
/// candidates without an embedding are skipped.
pub fn check_duplicate<I: Clone>(
    new_embedding: &[f32],
    existing: &[(I, Option<&[f32]>)],
    threshold: f64,
) -> Option<DuplicateMatch<I>> {
    for (entity_id, embedding) in existing {
        let Some(embedding) = embedding else {
            continue;
        };
        if let Some(similarity) = comparable_similarity(new_embedding, embedding) {
            if similarity > threshold {
                return Some(DuplicateMatch {
                    existing_id: entity_id.clone(),
                    similarity,
                });
            }
        }
    }
    None
}

/// Scores every candidate that has an embedding against `query`, sorts by
/// similarity descending (stable, so ties keep input order) and keeps `top_k`.
pub fn rank_by_similarity<I: Clone>(
    query: &[f32],
    candidates: &[(I, Option<&[f32]>)],
    top_k: usize,
) -> Vec<(I, f64)> {
    let mut scored: Vec<(I, f64)> = candidates
        .iter()
        .filter_map(|(id, embedding)| {
            let embedding = embedding.as_ref()?;
            comparable_similarity(query, embedding).map(|sim| (id.clone(), sim))
        })
        .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    scored.truncate(top_k);
    debug!(
        "Ranked {} of {} candidates by similarity",
        scored.len(),
        candidates.len()
    );
    scored
}
