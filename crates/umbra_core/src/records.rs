//! Append-only records written by a completed cycle.

use crate::affect::{Affect, MoodSnapshot};
use crate::plan::LoggedAction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub const PROVENANCE_EXTERNAL_STIMULUS: &str = "external-stimulus";
pub const PROVENANCE_SELF_REFLECTION: &str = "self-reflection";

/// One entry of the affect log. The current mood is always derived from the
/// newest entry; entries are never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffectRecord {
    pub valence: f32,
    pub arousal: f32,
    /// What caused the change, e.g. `post_published`.
    pub stimulus_tag: String,
    pub description: String,
    pub recorded_at: DateTime<Utc>,
}

impl AffectRecord {
    pub fn new(affect: Affect, stimulus_tag: &str, description: &str) -> Self {
        Self {
            valence: affect.valence,
            arousal: affect.arousal,
            stimulus_tag: stimulus_tag.to_string(),
            description: description.to_string(),
            recorded_at: Utc::now(),
        }
    }

    pub fn affect(&self) -> Affect {
        Affect::new(self.valence, self.arousal)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: Uuid,
    pub content: String,
    pub embedding: Vec<f32>,
    pub provenance: String,
    /// Opaque to the store.
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    pub fn new(
        content: &str,
        embedding: Vec<f32>,
        provenance: &str,
        metadata: Map<String, Value>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.to_string(),
            embedding,
            provenance: provenance.to_string(),
            metadata,
            created_at: Utc::now(),
        }
    }
}

/// Written once per published action. Its presence for a stimulus id is the
/// idempotency witness consulted by the next cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionLogEntry {
    pub stimulus_id: Option<String>,
    pub action: LoggedAction,
    pub input_context: String,
    pub produced_content: String,
    pub affect_snapshot: MoodSnapshot,
    /// Filled in later from engagement; 0.0 at creation.
    pub reward_score: f32,
    pub created_at: DateTime<Utc>,
}

/// Everything one successful cycle persists, committed together or not at all.
#[derive(Debug, Clone, PartialEq)]
pub struct PersistUnit {
    pub log: ActionLogEntry,
    pub affect: AffectRecord,
    pub memory: MemoryRecord,
}
