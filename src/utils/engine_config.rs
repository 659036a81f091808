// src/utils/engine_config.rs
use log::info;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use super::constants::{
    CARE_CHAIN_MAX_KM, DUPLICATE_SIMILARITY_THRESHOLD, EMBEDDING_DIM, SEMANTIC_MATCH_TOP_K,
    SUBGRAPH_MAX_FACILITIES, SUBGRAPH_MAX_NGOS,
};

/// Runtime knobs for the matching, scoring and graph components.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub duplicate_threshold: f64,
    pub semantic_top_k: usize,
    pub care_chain_max_km: f64,
    pub subgraph_max_ngos: usize,
    pub subgraph_max_facilities: usize,
    pub embedding_dim: usize,
    /// Capability score assigned to records that have no usable embedding.
    pub default_capability_score: f64,
    pub capability_model_path: PathBuf,
    pub ollama_url: String,
    pub ollama_model: String,
    pub ollama_embed_model: String,
    pub ai_request_timeout_secs: u64,
    pub ai_max_retries: usize,
    pub embedding_cache_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            duplicate_threshold: DUPLICATE_SIMILARITY_THRESHOLD,
            semantic_top_k: SEMANTIC_MATCH_TOP_K,
            care_chain_max_km: CARE_CHAIN_MAX_KM,
            subgraph_max_ngos: SUBGRAPH_MAX_NGOS,
            subgraph_max_facilities: SUBGRAPH_MAX_FACILITIES,
            embedding_dim: EMBEDDING_DIM,
            default_capability_score: 0.0,
            capability_model_path: PathBuf::from("data/capability_model.json"),
            ollama_url: "http://localhost:11434".to_string(),
            ollama_model: "llama3.1".to_string(),
            ollama_embed_model: "nomic-embed-text".to_string(),
            ai_request_timeout_secs: 120,
            ai_max_retries: 3,
            embedding_cache_size: 1000,
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

impl EngineConfig {
    /// Create configuration from environment variables, keeping the default for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            duplicate_threshold: env_or("DUPLICATE_THRESHOLD", d.duplicate_threshold),
            semantic_top_k: env_or("SEMANTIC_TOP_K", d.semantic_top_k),
            care_chain_max_km: env_or("CARE_CHAIN_MAX_KM", d.care_chain_max_km),
            subgraph_max_ngos: env_or("SUBGRAPH_MAX_NGOS", d.subgraph_max_ngos),
            subgraph_max_facilities: env_or("SUBGRAPH_MAX_FACILITIES", d.subgraph_max_facilities),
            embedding_dim: env_or("EMBEDDING_DIM", d.embedding_dim),
            default_capability_score: env_or(
                "DEFAULT_CAPABILITY_SCORE",
                d.default_capability_score,
            ),
            capability_model_path: env::var("CAPABILITY_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.capability_model_path),
            ollama_url: env::var("OLLAMA_URL").unwrap_or(d.ollama_url),
            ollama_model: env::var("OLLAMA_MODEL").unwrap_or(d.ollama_model),
            ollama_embed_model: env::var("OLLAMA_EMBED_MODEL").unwrap_or(d.ollama_embed_model),
            ai_request_timeout_secs: env_or("AI_REQUEST_TIMEOUT_SECS", d.ai_request_timeout_secs),
            ai_max_retries: env_or("AI_MAX_RETRIES", d.ai_max_retries).max(1),
            embedding_cache_size: env_or("EMBEDDING_CACHE_SIZE", d.embedding_cache_size),
        }
    }

    pub fn log_config(&self) {
        info!("⚙️ Engine configuration");
        info!(
            "   Duplicate threshold: {:.2}, semantic top-k: {}",
            self.duplicate_threshold, self.semantic_top_k
        );
        info!(
            "   CARE_CHAIN cutoff: {:.1} km, district view: {} NGOs / {} facilities",
            self.care_chain_max_km, self.subgraph_max_ngos, self.subgraph_max_facilities
        );
        info!(
            "   Embedding dim: {}, capability model: {}",
            self.embedding_dim,
            self.capability_model_path.display()
        );
        info!(
            "   Ollama: {} (generate: {}, embed: {}), timeout {}s, retries {}",
            self.ollama_url,
            self.ollama_model,
            self.ollama_embed_model,
            self.ai_request_timeout_secs,
            self.ai_max_retries
        );
    }
}
