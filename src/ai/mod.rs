// src/ai/mod.rs
//
// Seams to the two external capabilities the engine consumes: structured
// JSON generation and text embedding.
pub mod cache;
pub mod ollama;
pub mod responses;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use thiserror::Error;

pub use cache::CachedEmbeddingProvider;
pub use ollama::OllamaClient;
pub use responses::{request_structured, StructuredResponse};

#[derive(Debug, Error)]
pub enum AiError {
    #[error("request to language service failed: {0}")]
    Http(String),
    #[error("language service returned status {0}")]
    Status(u16),
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("response missing required field '{0}'")]
    MissingField(String),
    #[error("invalid value in response: {0}")]
    InvalidValue(String),
    #[error("configuration error: {0}")]
    Config(String),
}

/// Produces a JSON object that conforms to `response_schema` for the given prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn generate_structured_completion(
        &self,
        prompt: &str,
        response_schema: &JsonValue,
    ) -> Result<JsonValue, AiError>;
}

/// Produces a fixed-length embedding for a piece of text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, AiError>;
}

#[cfg(test)]
pub(crate) mod testing {
    //! Canned collaborators shared by the unit tests.
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Answers every prompt with the first canned response whose key occurs in
    /// the prompt, or fails when none does.
    pub struct FakeLanguageModel {
        responses: Vec<(String, JsonValue)>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl FakeLanguageModel {
        pub fn new() -> Self {
            Self {
                responses: Vec::new(),
                prompts: Mutex::new(Vec::new()),
            }
        }

        pub fn respond_to(mut self, prompt_fragment: &str, response: JsonValue) -> Self {
            self.responses.push((prompt_fragment.to_string(), response));
            self
        }

        pub fn failing() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl LanguageModel for FakeLanguageModel {
        async fn generate_structured_completion(
            &self,
            prompt: &str,
            _response_schema: &JsonValue,
        ) -> Result<JsonValue, AiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.responses
                .iter()
                .find(|(key, _)| prompt.contains(key.as_str()))
                .map(|(_, v)| v.clone())
                .ok_or_else(|| AiError::Http("connection refused".into()))
        }
    }

    /// Looks embeddings up by exact text; unknown text fails.
    pub struct FakeEmbedder {
        vectors: HashMap<String, Vec<f32>>,
        pub calls: AtomicUsize,
    }

    impl FakeEmbedder {
        pub fn new() -> Self {
            Self {
                vectors: HashMap::new(),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with(mut self, text: &str, vector: Vec<f32>) -> Self {
            self.vectors.insert(text.to_string(), vector);
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FakeEmbedder {
        async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, AiError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.vectors
                .get(text)
                .cloned()
                .ok_or_else(|| AiError::Http("embedding service unavailable".into()))
        }
    }
}
