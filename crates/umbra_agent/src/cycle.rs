use chrono::{DateTime, FixedOffset, Local, Utc};
use serde_json::{json, Map};
use std::sync::Arc;
use umbra_core::config::{CycleConfig, UmbraConfig};
use umbra_core::{
    ActionKind, ActionLogEntry, ActionPlan, DurableStore, Embedder, FeedClient, Generator,
    LoggedAction, PersistUnit, RandomSource, Stimulus, StimulusView, PROVENANCE_SELF_REFLECTION,
};
use umbra_expression::{ActionPlanner, DailyWindow};
use umbra_limbic::MoodEngine;
use umbra_memory::SemanticMemory;

use crate::error::CycleError;
use crate::retry::with_retry;

/// Affect log tag for the mood shift caused by our own post.
pub const POST_PUBLISHED_TAG: &str = "post_published";

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Nothing worth acting on this cycle.
    Idle,
    Published {
        post_id: String,
        action: LoggedAction,
        stimulus_id: Option<String>,
        /// False if the post went out but its records could not be committed.
        persisted: bool,
    },
}

/// What the feed currently offers, already filtered against the action log.
#[derive(Debug, Default)]
pub struct Perception {
    pub host: Option<Stimulus>,
    pub mentions: Vec<Stimulus>,
}

/// One agent: perceive, plan, recall, generate, publish, persist.
///
/// All collaborators are constructed once by the caller and handed in.
/// Cycles take `&mut self`, so two can never overlap.
pub struct Agent {
    feed: Arc<dyn FeedClient>,
    generator: Arc<dyn Generator>,
    store: Arc<dyn DurableStore>,
    mood: MoodEngine,
    memory: SemanticMemory,
    planner: ActionPlanner,
    window: DailyWindow,
    rng: Box<dyn RandomSource>,
    host_account: String,
    mention_limit: usize,
    cycle: CycleConfig,
}

impl Agent {
    pub fn new(
        config: &UmbraConfig,
        feed: Arc<dyn FeedClient>,
        generator: Arc<dyn Generator>,
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn DurableStore>,
        rng: Box<dyn RandomSource>,
    ) -> anyhow::Result<Self> {
        let planner = ActionPlanner::new(config.planner.clone())?;
        let window = DailyWindow::from_config(&config.planner)?;
        Ok(Self {
            mood: MoodEngine::new(store.clone(), &config.affect),
            memory: SemanticMemory::new(embedder, store.clone(), config.embedding.dimension),
            feed,
            generator,
            store,
            planner,
            window,
            rng,
            host_account: config.feed.host_account.clone(),
            mention_limit: config.feed.mention_limit,
            cycle: config.cycle.clone(),
        })
    }

    pub async fn login(&self) -> Result<(), CycleError> {
        self.feed
            .login()
            .await
            .map_err(|e| CycleError::from_feed(e, CycleError::Perception))
    }

    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, CycleError> {
        self.run_cycle_at(Local::now().fixed_offset()).await
    }

    /// One full cycle as of `now`, read in its own offset for the daily window.
    pub async fn run_cycle_at(&mut self, now: DateTime<FixedOffset>) -> Result<CycleOutcome, CycleError> {
        let perception = self.perceive().await?;
        let daily_allowed = self.daily_allowed(&now).await;

        let plan = self.planner.decide(
            perception.host.as_ref(),
            &perception.mentions,
            daily_allowed,
            &now,
            self.rng.as_mut(),
        );
        let Some(plan) = plan else {
            tracing::info!("No pending actions this cycle");
            return Ok(CycleOutcome::Idle);
        };

        let action = plan.logged_action();
        let target_id = plan.target_id();
        let target_text = plan.target_text();
        tracing::info!(
            action = %action,
            stimulus_id = target_id.as_deref().unwrap_or("-"),
            "Planned: {}",
            plan.rationale
        );

        // Recall
        let mood = self.mood.current_state().await?;
        tracing::info!(valence = mood.valence, arousal = mood.arousal, "Mood: {}", mood.description);
        let memories: Vec<String> = self
            .memory
            .retrieve(&target_text, self.cycle.retrieve_limit)
            .await
            .into_iter()
            .map(|m| m.content)
            .collect();
        tracing::debug!("Recalled {} memories", memories.len());

        // Generate
        let thought = self
            .generator
            .generate(&target_text, &mood.description, &memories)
            .await
            .map_err(CycleError::Generation)?;
        self.validate(&thought.content)?;

        // Publish
        let post_id = self.publish(&plan, &thought.content).await?;
        tracing::info!(post_id = %post_id, action = %action, "Published");

        // Persist
        let description = format!(
            "reaction ({}) to {}",
            action,
            target_id.as_deref().unwrap_or("daily_post")
        );
        let affect = self.mood.stage(
            &mood,
            thought.valence_delta,
            thought.arousal_delta,
            POST_PUBLISHED_TAG,
            &description,
        );
        let mut metadata = Map::new();
        metadata.insert("post_id".to_string(), json!(post_id));
        metadata.insert("action".to_string(), json!(action.as_str()));
        if let Some(id) = &target_id {
            metadata.insert("stimulus_id".to_string(), json!(id));
        }
        let memory = self
            .memory
            .prepare(&format!("I said: {}", thought.content), PROVENANCE_SELF_REFLECTION, metadata)
            .await;
        let unit = PersistUnit {
            log: ActionLogEntry {
                stimulus_id: target_id.clone(),
                action,
                input_context: target_text,
                produced_content: thought.content,
                affect_snapshot: mood,
                reward_score: 0.0,
                created_at: now.with_timezone(&Utc),
            },
            affect,
            memory,
        };

        let persisted = match self.store.commit_unit(&unit).await {
            Ok(()) => true,
            Err(e) => {
                // The post is live; retrying the cycle would publish it twice
                tracing::error!(
                    post_id = %post_id,
                    stimulus_id = target_id.as_deref().unwrap_or("-"),
                    "Persistence failed after publish: {}",
                    e
                );
                false
            }
        };

        Ok(CycleOutcome::Published {
            post_id,
            action,
            stimulus_id: target_id,
            persisted,
        })
    }

    /// Latest host post and pending mentions, minus anything already acted on.
    /// Stimuli without an id cannot be deduplicated and are dropped.
    pub async fn perceive(&self) -> Result<Perception, CycleError> {
        let mut perception = Perception::default();

        if !self.host_account.is_empty() {
            tracing::debug!("Scanning @{}", self.host_account);
            let latest = self
                .feed
                .latest_post(&self.host_account)
                .await
                .map_err(|e| CycleError::from_feed(e, CycleError::Perception))?;
            if let Some(post) = latest {
                if self.is_fresh(&post).await? {
                    perception.host = Some(post);
                }
            }
        }

        let mentions = self
            .feed
            .pending_mentions(self.mention_limit)
            .await
            .map_err(|e| CycleError::from_feed(e, CycleError::Perception))?;
        for mention in mentions {
            if self.is_fresh(&mention).await? {
                perception.mentions.push(mention);
            }
        }

        tracing::debug!(
            host = perception.host.is_some(),
            mentions = perception.mentions.len(),
            "Perceived"
        );
        Ok(perception)
    }

    async fn is_fresh(&self, stimulus: &Stimulus) -> Result<bool, CycleError> {
        match stimulus.get_id() {
            Some(id) => Ok(!self.store.has_action_for(&id).await?),
            None => {
                tracing::debug!("Dropping stimulus without id");
                Ok(false)
            }
        }
    }

    /// No daily post yet on `now`'s local date. A failed lookup counts as "already posted".
    pub async fn daily_allowed(&self, now: &DateTime<FixedOffset>) -> bool {
        match self.store.last_action_at(LoggedAction::DailyPost).await {
            Ok(last) => self.window.allows_today(last, now),
            Err(e) => {
                tracing::warn!("Daily post lookup failed: {}", e);
                false
            }
        }
    }

    fn validate(&self, content: &str) -> Result<(), CycleError> {
        if content.trim().is_empty() {
            return Err(CycleError::Validation("empty content".to_string()));
        }
        let len = content.chars().count();
        if len > self.cycle.max_post_chars {
            return Err(CycleError::Validation(format!(
                "{} characters exceeds the {} limit",
                len, self.cycle.max_post_chars
            )));
        }
        Ok(())
    }

    async fn publish(&self, plan: &ActionPlan, content: &str) -> Result<String, CycleError> {
        let target_id = plan.target_id();
        let (reply_to, quote_of) = match (plan.kind, plan.emit_as_quote) {
            (ActionKind::Daily, _) => (None, None),
            (_, true) => (None, target_id.as_deref()),
            (_, false) => (target_id.as_deref(), None),
        };
        let feed = &self.feed;
        with_retry(&self.cycle.publish_retry, "publish", || feed.publish(content, reply_to, quote_of))
            .await
            .map_err(|e| CycleError::from_feed(e, CycleError::Publish))
    }
}
