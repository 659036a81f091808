// src/ai/ollama.rs
//
// Ollama-backed implementation of both collaborator traits, with the same
// retry and JSON recovery approach the pair validator uses.
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::time::Duration;

use super::{AiError, EmbeddingProvider, LanguageModel};
use crate::utils::constants::EMBEDDING_MAX_CHARS;
use crate::utils::engine_config::EngineConfig;

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    format: &'a JsonValue,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct OllamaClient {
    http_client: Client,
    base_url: String,
    model: String,
    embed_model: String,
    max_retries: usize,
    temperature: f32,
}

impl OllamaClient {
    pub fn from_config(config: &EngineConfig) -> Result<Self, AiError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.ai_request_timeout_secs))
            .build()
            .map_err(|e| AiError::Config(e.to_string()))?;
        Ok(Self {
            http_client,
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            model: config.ollama_model.clone(),
            embed_model: config.ollama_embed_model.clone(),
            max_retries: config.ai_max_retries.max(1),
            temperature: 0.1,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn attempt_generate(&self, prompt: &str, schema: &JsonValue) -> Result<JsonValue, AiError> {
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            format: schema,
            stream: false,
            options: OllamaOptions {
                temperature: self.temperature,
                top_p: 0.9,
            },
        };
        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AiError::Status(response.status().as_u16()));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| AiError::Malformed(format!("Failed to parse Ollama response: {}", e)))?;
        debug!("Raw model response: {}", ollama_response.response);
        parse_json_object(&ollama_response.response)
    }

    async fn attempt_embed(&self, text: &str) -> Result<Vec<f32>, AiError> {
        let request = EmbeddingRequest {
            model: &self.embed_model,
            prompt: text,
        };
        let response = self
            .http_client
            .post(format!("{}/api/embeddings", self.base_url))
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AiError::Status(response.status().as_u16()));
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| AiError::Malformed(format!("Failed to parse embedding response: {}", e)))?;
        if parsed.embedding.is_empty() {
            return Err(AiError::Malformed("empty embedding".into()));
        }
        Ok(parsed.embedding)
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn generate_structured_completion(
        &self,
        prompt: &str,
        response_schema: &JsonValue,
    ) -> Result<JsonValue, AiError> {
        let mut last_error = AiError::Config("no attempts made".into());
        for attempt in 1..=self.max_retries {
            match self.attempt_generate(prompt, response_schema).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    if attempt < self.max_retries {
                        debug!("Generation attempt {} failed ({}), retrying...", attempt, e);
                        tokio::time::sleep(Duration::from_millis(1000 * attempt as u64)).await;
                    }
                    last_error = e;
                }
            }
        }
        warn!("Generation failed after {} attempts: {}", self.max_retries, last_error);
        Err(last_error)
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, AiError> {
        let truncated = truncate_chars(text, EMBEDDING_MAX_CHARS);
        let mut last_error = AiError::Config("no attempts made".into());
        for attempt in 1..=self.max_retries {
            match self.attempt_embed(truncated).await {
                Ok(v) => return Ok(v),
                Err(e) => {
                    if attempt < self.max_retries {
                        debug!("Embedding attempt {} failed ({}), retrying...", attempt, e);
                        tokio::time::sleep(Duration::from_millis(1000 * attempt as u64)).await;
                    }
                    last_error = e;
                }
            }
        }
        warn!("Embedding failed after {} attempts: {}", self.max_retries, last_error);
        Err(last_error)
    }
}

fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Parses a JSON object out of raw model text: first as-is, then by extracting
/// the first balanced `{...}` block, then after stripping code fences and
/// trailing commas. Anything that is still not an object is malformed.
pub(crate) fn parse_json_object(response: &str) -> Result<JsonValue, AiError> {
    let candidates = [
        Some(response.trim().to_string()),
        extract_json_from_text(response),
        Some(clean_json_response(response)),
    ];
    for candidate in candidates.iter().flatten() {
        if let Ok(value @ JsonValue::Object(_)) = serde_json::from_str::<JsonValue>(candidate) {
            return Ok(value);
        }
    }
    Err(AiError::Malformed(format!(
        "no JSON object in response: {}",
        truncate_chars(response, 200)
    )))
}

fn extract_json_from_text(text: &str) -> Option<String> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in text[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' => escape_next = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(text[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }
    None
}

fn clean_json_response(response: &str) -> String {
    response
        .trim()
        .replace("```json", "")
        .replace("```", "")
        .replace(",\n}", "\n}")
        .replace(",}", "}")
        .replace(",\n]", "\n]")
        .replace(",]", "]")
        .trim()
        .to_string()
}
