use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
#[cfg(feature = "local-embeddings")]
use umbra_core::config::LOCAL_EMBEDDING_DIMENSION;
use umbra_core::config::{EmbeddingConfig, EmbeddingProvider};
use umbra_core::Embedder;

pub type Embedding = Vec<f32>;

/// Embeddings from an OpenAI-compatible `/embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

impl OpenAiEmbedder {
    pub fn new(api_key: &str, base_url: &str, model: &str) -> Result<Self> {
        Ok(Self {
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "input": [text],
                "model": self.model,
            }))
            .send()
            .await
            .context("Embedding request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!(
                "Embedding API error ({}): {}",
                status,
                body.chars().take(200).collect::<String>()
            );
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .context("Failed to parse embedding response")?;
        parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| anyhow::anyhow!("Embedding response contained no vectors"))
    }
}

/// On-device embeddings via fastembed.
#[cfg(feature = "local-embeddings")]
#[derive(Clone)]
pub struct LocalEmbedder {
    model: Arc<fastembed::TextEmbedding>,
}

#[cfg(feature = "local-embeddings")]
impl LocalEmbedder {
    pub fn new() -> Result<Self> {
        use fastembed::{EmbeddingModel as FastEmbedModel, InitOptions, TextEmbedding};

        // multilingual-e5-small (384 dimensions) copes with mixed-language feeds
        let mut options = InitOptions::default();
        options.model_name = FastEmbedModel::MultilingualE5Small;
        options.show_download_progress = true;

        let model = TextEmbedding::try_new(options)?;
        Ok(Self {
            model: Arc::new(model),
        })
    }
}

#[cfg(feature = "local-embeddings")]
#[async_trait]
impl Embedder for LocalEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        let model = self.model.clone();
        let text = text.to_string();
        // Inference is CPU-bound; keep it off the async workers
        tokio::task::spawn_blocking(move || {
            model
                .embed(vec![text], None)?
                .into_iter()
                .next()
                .ok_or_else(|| anyhow::anyhow!("Failed to generate embedding"))
        })
        .await
        .context("Embedding task panicked")?
    }
}

/// Build the configured embedding provider.
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    match config.provider {
        EmbeddingProvider::Openai => {
            let api_key = std::env::var("OPENAI_API_KEY")
                .context("OPENAI_API_KEY is required for memory embeddings")?;
            Ok(Arc::new(OpenAiEmbedder::new(&api_key, &config.base_url, &config.model)?))
        }
        #[cfg(feature = "local-embeddings")]
        EmbeddingProvider::Local => {
            if config.dimension != LOCAL_EMBEDDING_DIMENSION {
                anyhow::bail!(
                    "local embeddings have {} dimensions, embedding.dimension is {}",
                    LOCAL_EMBEDDING_DIMENSION,
                    config.dimension
                );
            }
            Ok(Arc::new(LocalEmbedder::new()?))
        }
        #[cfg(not(feature = "local-embeddings"))]
        EmbeddingProvider::Local => {
            anyhow::bail!("embedding.provider = \"local\" requires the local-embeddings feature")
        }
    }
}

/// Calculate cosine similarity between two vectors
/// Returns a value between -1.0 and 1.0 (1.0 = identical direction)
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

/// `1 - cosine_similarity`: 0.0 for identical direction, 2.0 for opposite.
/// Zero vectors sit at distance 1.0 from everything.
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    1.0 - cosine_similarity(a, b)
}
