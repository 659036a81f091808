// src/ai/cache.rs
use async_trait::async_trait;
use log::{debug, info};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Mutex;

use super::{AiError, EmbeddingProvider};

const DEFAULT_CACHE_SIZE: usize = 1000;

/// Memoizes embeddings of repeated texts (program descriptions, query
/// strings) in front of another provider. Failures are never cached.
pub struct CachedEmbeddingProvider<P> {
    inner: P,
    cache: Mutex<LruCache<String, Vec<f32>>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl<P: EmbeddingProvider> CachedEmbeddingProvider<P> {
    pub fn new(inner: P, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity)
            .or_else(|| NonZeroUsize::new(DEFAULT_CACHE_SIZE))
            .unwrap_or(NonZeroUsize::MIN);
        info!("Initializing embedding cache with capacity: {}", capacity);
        Self {
            inner,
            cache: Mutex::new(LruCache::new(capacity)),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn stats(&self) -> (usize, usize) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedEmbeddingProvider<P> {
    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>, AiError> {
        if let Some(v) = self.cache.lock().await.get(text) {
            let hits = self.hits.fetch_add(1, Ordering::Relaxed) + 1;
            if hits % 100 == 0 {
                let misses = self.misses.load(Ordering::Relaxed);
                debug!("Embedding cache hits: {}, misses: {}", hits, misses);
            }
            return Ok(v.clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let embedding = self.inner.generate_embedding(text).await?;
        self.cache
            .lock()
            .await
            .put(text.to_string(), embedding.clone());
        Ok(embedding)
    }
}
