// src/matching/mod.rs
pub mod priority;
pub mod prompts;
pub mod service;
pub mod similarity;

use thiserror::Error;

use crate::ai::AiError;
use crate::models::EntityId;

pub use priority::calculate_priority_score;
pub use service::{Classification, EntityMatchingService, RelevanceAssessment, Rescore};
pub use similarity::{check_duplicate, rank_by_similarity, DuplicateMatch};

/// Outcomes the caller must be able to tell apart.
#[derive(Debug, Error)]
pub enum MatchingError {
    #[error("duplicate entity detected (similar to entity {existing_id}, similarity {similarity:.3})")]
    Duplicate {
        existing_id: EntityId,
        similarity: f64,
    },
    #[error("entity {0} not found")]
    NotFound(EntityId),
    #[error("embedding has dimension {actual}, expected {expected}")]
    InvalidEmbedding { expected: usize, actual: usize },
    #[error(transparent)]
    Ai(#[from] AiError),
}
