//! Embedding provider trait and mock implementation.
//!
//! The `EmbeddingProvider` trait abstracts over text-embedding backends.
//! The index core consumes it as a black box: text in, fixed-length vector
//! out. Provider failures surface as `Error::Embedding`.

use async_trait::async_trait;
use vellum_core::Result;

/// Trait for generating text embeddings.
///
/// Implementations wrap a concrete embedding model or service and provide a
/// uniform async interface. `Send + Sync` so one provider can be shared
/// across concurrent per-document embedding calls during a rebuild.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Generate embeddings for a batch of texts.
    ///
    /// Default implementation calls `embed` for each text sequentially.
    /// Providers with native batching should override this.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// The embedding dimension.
    fn dimension(&self) -> usize;

    /// The provider name for diagnostics.
    fn name(&self) -> &str;
}

/// A deterministic embedding provider for tests.
///
/// Folds the text bytes into each vector component and unit-normalizes the
/// result, so identical texts embed identically and nearby texts do not.
pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl MockEmbeddingProvider {
    /// Create a new mock provider with the given dimension.
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn fold_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimension];
        if self.dimension == 0 {
            return embedding;
        }

        for (pos, byte) in text.bytes().enumerate() {
            let slot = pos % self.dimension;
            embedding[slot] += f32::from(byte) * (1.0 + (pos / self.dimension) as f32 * 0.01);
        }

        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for val in &mut embedding {
                *val /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.fold_embedding(text))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.fold_embedding(t)).collect())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn name(&self) -> &str {
        "mock"
    }
}

// ============================================================================
// Tests
// ============================================================================
