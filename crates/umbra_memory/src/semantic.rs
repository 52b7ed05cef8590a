//! Long-term semantic memory: embed on write, nearest-neighbour on read.
//!
//! Neither path blocks the action pipeline. A failed or malformed embedding
//! on write is replaced by the all-zero sentinel vector of the configured
//! dimension. A failed retrieval yields no context rather than an error.

use serde_json::{Map, Value};
use std::sync::Arc;
use umbra_core::{DurableStore, Embedder, MemoryRecord, StoreError};

pub struct SemanticMemory {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn DurableStore>,
    dimension: usize,
}

impl SemanticMemory {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn DurableStore>, dimension: usize) -> Self {
        Self {
            embedder,
            store,
            dimension,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Stand-in vector for text that could not be embedded.
    pub fn sentinel(&self) -> Vec<f32> {
        vec![0.0; self.dimension]
    }

    /// Embed `text`, or `None` if the provider failed or returned the wrong shape.
    async fn try_embed(&self, text: &str) -> Option<Vec<f32>> {
        let normalized = text.replace('\n', " ");
        match self.embedder.embed(&normalized).await {
            Ok(vector) if vector.len() == self.dimension => Some(vector),
            Ok(vector) => {
                tracing::warn!(
                    expected = self.dimension,
                    actual = vector.len(),
                    "Embedding provider returned wrong dimension"
                );
                None
            }
            Err(e) => {
                tracing::warn!("Embedding failed: {:#}", e);
                None
            }
        }
    }

    /// Build a record for `text` without persisting it.
    pub async fn prepare(&self, text: &str, provenance: &str, metadata: Map<String, Value>) -> MemoryRecord {
        let embedding = match self.try_embed(text).await {
            Some(vector) => vector,
            None => self.sentinel(),
        };
        MemoryRecord::new(text, embedding, provenance, metadata)
    }

    /// Embed and append a new memory.
    pub async fn store(
        &self,
        text: &str,
        provenance: &str,
        metadata: Map<String, Value>,
    ) -> Result<MemoryRecord, StoreError> {
        let record = self.prepare(text, provenance, metadata).await;
        self.store.append_memory(&record).await?;
        tracing::info!(provenance, "Memory stored: '{}...'", text.chars().take(30).collect::<String>());
        Ok(record)
    }

    /// The `limit` records nearest to `query_text`, most relevant first.
    pub async fn retrieve(&self, query_text: &str, limit: usize) -> Vec<MemoryRecord> {
        if limit == 0 {
            return Vec::new();
        }
        let Some(query) = self.try_embed(query_text).await else {
            return Vec::new();
        };
        match self.store.nearest_memories(&query, limit).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Memory retrieval failed: {}", e);
                Vec::new()
            }
        }
    }
}
