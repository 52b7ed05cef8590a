pub mod affect;
pub mod config;
pub mod error;
pub mod plan;
pub mod random;
pub mod records;
pub mod stimulus;

pub use affect::{Affect, MoodQuadrant, MoodSnapshot, SYSTEM_START_DESCRIPTION};
pub use config::UmbraConfig;
pub use error::{FeedError, StoreError};
pub use plan::{ActionKind, ActionPlan, LoggedAction};
pub use random::{FixedSequence, RandomSource, SeededRandom, ThreadRandom};
pub use records::{
    ActionLogEntry, AffectRecord, MemoryRecord, PersistUnit, PROVENANCE_EXTERNAL_STIMULUS,
    PROVENANCE_SELF_REFLECTION,
};
pub use stimulus::{Payload, Post, Stimulus, StimulusKind, StimulusView};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the generation service decided to say, and how it moved the mood.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedThought {
    pub content: String,
    pub rationale: String,
    pub valence_delta: f32,
    pub arousal_delta: f32,
}

/// The social platform, seen from the agent's single account.
#[async_trait]
pub trait FeedClient: Send + Sync {
    /// (Re)establish the session. Must be safe to call repeatedly.
    async fn login(&self) -> Result<(), FeedError>;

    /// Most recent post of `account`, if any.
    async fn latest_post(&self, account: &str) -> Result<Option<Stimulus>, FeedError>;

    /// Pending mentions, newest first.
    async fn pending_mentions(&self, limit: usize) -> Result<Vec<Stimulus>, FeedError>;

    /// Publish `text`. At most one of `reply_to` / `quote_of` is set.
    /// Returns the platform id of the new post.
    async fn publish(
        &self,
        text: &str,
        reply_to: Option<&str>,
        quote_of: Option<&str>,
    ) -> Result<String, FeedError>;
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(
        &self,
        stimulus_text: &str,
        mood_description: &str,
        memory_texts: &[String],
    ) -> anyhow::Result<GeneratedThought>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> anyhow::Result<Vec<f32>>;
}

/// Append-only persistence for the action log, the affect log and semantic memory.
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Idempotency witness: has any logged action targeted `stimulus_id`?
    async fn has_action_for(&self, stimulus_id: &str) -> Result<bool, StoreError>;

    /// Creation time of the most recent log entry of the given kind.
    async fn last_action_at(&self, action: LoggedAction)
        -> Result<Option<DateTime<Utc>>, StoreError>;

    async fn latest_affect(&self) -> Result<Option<AffectRecord>, StoreError>;

    async fn append_affect(&self, record: &AffectRecord) -> Result<(), StoreError>;

    async fn append_memory(&self, record: &MemoryRecord) -> Result<(), StoreError>;

    /// Up to `limit` records ordered by ascending cosine distance to `query`.
    async fn nearest_memories(
        &self,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<MemoryRecord>, StoreError>;

    /// Write log entry, affect record and memory record as one unit.
    async fn commit_unit(&self, unit: &PersistUnit) -> Result<(), StoreError>;
}
