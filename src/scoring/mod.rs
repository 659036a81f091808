// src/scoring/mod.rs
pub mod capability;
pub mod labels;

use thiserror::Error;

pub use capability::{CapabilityModel, CapabilityScorer, TrainingOptions};
pub use labels::{bootstrap_label, CAPABILITY_KEYWORDS};

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("embedding has dimension {actual}, model expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("no training samples")]
    EmptyCorpus,
    #[error("model file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("model (de)serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
