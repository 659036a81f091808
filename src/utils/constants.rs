// src/utils/constants.rs

/// Cosine similarity above which a new entity is reported as a duplicate.
pub const DUPLICATE_SIMILARITY_THRESHOLD: f64 = 0.92;

/// Number of NGOs returned by semantic program matching.
pub const SEMANTIC_MATCH_TOP_K: usize = 10;

/// NGO and facility must be within this many kilometers for a CARE_CHAIN edge.
pub const CARE_CHAIN_MAX_KM: f64 = 60.0;

pub const SUBGRAPH_MAX_NGOS: usize = 5;
pub const SUBGRAPH_MAX_FACILITIES: usize = 3;

/// Dimension of the vectors produced by the embedding service.
pub const EMBEDDING_DIM: usize = 1536;

/// Text longer than this is truncated before embedding.
pub const EMBEDDING_MAX_CHARS: usize = 8000;

/// Relevance score used when the language model cannot score an entity.
pub const DEFAULT_RELEVANCE_SCORE: f64 = 70.0;

/// Entities at or above this priority are counted as high-priority leads.
pub const HIGH_PRIORITY_THRESHOLD: f64 = 85.0;

/// Size of the unified priority ranking.
pub const PRIORITY_RANKING_LIMIT: usize = 50;
