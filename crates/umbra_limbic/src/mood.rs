use std::sync::Arc;
use umbra_core::config::AffectConfig;
use umbra_core::{Affect, AffectRecord, DurableStore, MoodSnapshot, StoreError, SYSTEM_START_DESCRIPTION};

/// The affect model. Constructed once at process start and shared by reference.
pub struct MoodEngine {
    store: Arc<dyn DurableStore>,
    decay_factor: f32,
}

impl MoodEngine {
    pub fn new(store: Arc<dyn DurableStore>, config: &AffectConfig) -> Self {
        Self::with_decay(store, config.decay_factor)
    }

    pub fn with_decay(store: Arc<dyn DurableStore>, decay_factor: f32) -> Self {
        Self {
            store,
            decay_factor: decay_factor.clamp(0.0, 1.0),
        }
    }

    pub fn decay_factor(&self) -> f32 {
        self.decay_factor
    }

    /// Newest recorded state, decayed once, with its behavioral description.
    pub async fn current_state(&self) -> Result<MoodSnapshot, StoreError> {
        let latest = self.store.latest_affect().await?;
        Ok(self.derive(latest.as_ref()))
    }

    /// Pure read path: what `current_state` returns for a given newest record.
    pub fn derive(&self, latest: Option<&AffectRecord>) -> MoodSnapshot {
        match latest {
            None => MoodSnapshot {
                valence: 0.0,
                arousal: 0.0,
                description: SYSTEM_START_DESCRIPTION.to_string(),
            },
            Some(record) => MoodSnapshot::from(record.affect().decayed(self.decay_factor)),
        }
    }

    /// Build the next log entry from a state read earlier in the same cycle,
    /// without writing it. The caller persists it alongside its other records.
    pub fn stage(
        &self,
        current: &MoodSnapshot,
        delta_valence: f32,
        delta_arousal: f32,
        stimulus_tag: &str,
        description: &str,
    ) -> AffectRecord {
        let next: Affect = current.affect().shifted(delta_valence, delta_arousal);
        tracing::debug!(
            valence = next.valence,
            arousal = next.arousal,
            stimulus_tag,
            "Staged affect record"
        );
        AffectRecord::new(next, stimulus_tag, description)
    }

    /// Read the current state, apply the deltas and append the result.
    pub async fn record(
        &self,
        delta_valence: f32,
        delta_arousal: f32,
        stimulus_tag: &str,
        description: &str,
    ) -> Result<AffectRecord, StoreError> {
        let current = self.current_state().await?;
        let record = self.stage(&current, delta_valence, delta_arousal, stimulus_tag, description);
        self.store.append_affect(&record).await?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use umbra_core::MoodQuadrant;
    use umbra_memory::SqliteStore;

    async fn engine() -> MoodEngine {
        let store = SqliteStore::open(":memory:", 4).await.unwrap();
        MoodEngine::with_decay(Arc::new(store), 0.95)
    }

    #[tokio::test]
    async fn test_default_state_on_empty_log() {
        let engine = engine().await;
        let state = engine.current_state().await.unwrap();
        assert_eq!(state.valence, 0.0);
        assert_eq!(state.arousal, 0.0);
        assert_eq!(state.description, SYSTEM_START_DESCRIPTION);
    }

    #[tokio::test]
    async fn test_read_applies_decay_once() {
        let engine = engine().await;
        // From the origin, deltas land exactly on (0.5, -0.2)
        engine.record(0.5, -0.2, "test", "seed").await.unwrap();

        let state = engine.current_state().await.unwrap();
        assert!((state.valence - 0.475).abs() < 1e-6);
        assert!((state.arousal + 0.19).abs() < 1e-6);

        // Reading again does not compound the decay
        let again = engine.current_state().await.unwrap();
        assert_eq!(state, again);
    }

    #[tokio::test]
    async fn test_record_builds_on_decayed_state() {
        let engine = engine().await;
        engine.record(0.5, 0.0, "test", "first").await.unwrap();
        let second = engine.record(0.1, 0.0, "test", "second").await.unwrap();
        // 0.5 * 0.95 + 0.1
        assert!((second.valence - 0.575).abs() < 1e-6);
        assert_eq!(second.description, "second");
        assert_eq!(second.stimulus_tag, "test");
    }

    #[tokio::test]
    async fn test_record_clamps() {
        let engine = engine().await;
        engine.record(0.9, -0.9, "test", "seed").await.unwrap();
        let record = engine.record(5.0, -5.0, "test", "spike").await.unwrap();
        assert_eq!(record.valence, 1.0);
        assert_eq!(record.arousal, -1.0);
    }

    #[tokio::test]
    async fn test_stage_does_not_write() {
        let engine = engine().await;
        let current = engine.current_state().await.unwrap();
        let staged = engine.stage(&current, 0.6, 0.6, "test", "staged");
        assert_eq!(staged.affect().quadrant(), MoodQuadrant::Euphoric);

        let unchanged = engine.current_state().await.unwrap();
        assert_eq!(unchanged.description, SYSTEM_START_DESCRIPTION);
    }

    #[tokio::test]
    async fn test_description_follows_decayed_values() {
        let engine = engine().await;
        // 0.32 decays to 0.304: still above the threshold
        engine.record(0.32, 0.32, "test", "seed").await.unwrap();
        let state = engine.current_state().await.unwrap();
        assert_eq!(state.description, MoodQuadrant::Euphoric.directive());

        // 0.31 decays to 0.2945: falls back to neutral
        engine.record(0.31 - state.valence, 0.31 - state.arousal, "test", "edge").await.unwrap();
        let state = engine.current_state().await.unwrap();
        assert_eq!(state.description, MoodQuadrant::Analytical.directive());
    }
}
