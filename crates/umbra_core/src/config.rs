use anyhow::{Context, Result};
use chrono::NaiveTime;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UmbraConfig {
    pub feed: FeedConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub planner: PlannerConfig,
    pub affect: AffectConfig,
    pub cycle: CycleConfig,
    pub storage: StorageConfig,
}

impl UmbraConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: UmbraConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from path; only a missing file falls back to defaults with env overrides.
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Self::load(path);
        }
        tracing::info!("Config file {} not found, using defaults", path.display());
        let mut cfg = Self::default();
        cfg.apply_env_overrides();
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("X_USERNAME") {
            self.feed.host_account = v;
        }
        if let Ok(v) = std::env::var("FEED_BASE_URL") {
            self.feed.base_url = v;
        }
        if let Ok(v) = std::env::var("DEEPSEEK_BASE_URL") {
            self.llm.base_url = v;
        }
        if let Ok(v) = std::env::var("DEEPSEEK_MODEL") {
            self.llm.model = v;
        }
        if let Ok(v) = std::env::var("EMBEDDING_BASE_URL") {
            self.embedding.base_url = v;
        }
        if let Ok(v) = std::env::var("CHECK_INTERVAL_MIN") {
            if let Ok(n) = v.parse() {
                self.cycle.interval_min_secs = n;
            }
        }
        if let Ok(v) = std::env::var("CHECK_INTERVAL_MAX") {
            if let Ok(n) = v.parse() {
                self.cycle.interval_max_secs = n;
            }
        }
        if let Ok(v) = std::env::var("UMBRA_DB_PATH") {
            self.storage.db_path = v;
        }
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.cycle.interval_min_secs > self.cycle.interval_max_secs {
            anyhow::bail!(
                "cycle.interval_min_secs ({}) exceeds cycle.interval_max_secs ({})",
                self.cycle.interval_min_secs,
                self.cycle.interval_max_secs
            );
        }
        if self.embedding.dimension == 0 {
            anyhow::bail!("embedding.dimension must be positive");
        }
        if self.embedding.provider == EmbeddingProvider::Local
            && self.embedding.dimension != LOCAL_EMBEDDING_DIMENSION
        {
            anyhow::bail!(
                "embedding.provider = \"local\" produces {}-dimension vectors, but embedding.dimension is {}",
                LOCAL_EMBEDDING_DIMENSION,
                self.embedding.dimension
            );
        }
        if self.cycle.max_post_chars == 0 {
            anyhow::bail!("cycle.max_post_chars must be positive");
        }
        if self.cycle.publish_retry.max_attempts == 0 {
            anyhow::bail!("cycle.publish_retry.max_attempts must be at least 1");
        }
        self.planner.cutoff_time()?;
        for p in [self.planner.quote_probability_high, self.planner.quote_probability_base] {
            if !(0.0..=1.0).contains(&p) {
                anyhow::bail!("quote probabilities must lie in [0, 1], got {}", p);
            }
        }
        Ok(())
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Platform bridge endpoint.
    pub base_url: String,
    /// Account whose posts the agent shadows.
    pub host_account: String,
    /// Exported session cookies; the client never logs in with a password.
    pub session_path: String,
    pub mention_limit: usize,
    pub request_timeout_secs: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8787".to_string(),
            host_account: String::new(),
            session_path: "data/cookies/cookies.json".to_string(),
            mention_limit: 10,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Persona name and handle injected into the system prompt.
    pub persona_name: String,
    pub persona_handle: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.deepseek.com".to_string(),
            model: "deepseek-reasoner".to_string(),
            persona_name: "the host".to_string(),
            persona_handle: "@umbra".to_string(),
            timeout_secs: 120,
        }
    }
}

/// Vector size of the on-device model (multilingual-e5-small).
pub const LOCAL_EMBEDDING_DIMENSION: usize = 384;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible `/embeddings` endpoint
    #[default]
    Openai,
    /// On-device model (requires the `local-embeddings` feature)
    Local,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub base_url: String,
    pub model: String,
    /// Every stored vector must have exactly this many components.
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Openai,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimension: 1536,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlannerConfig {
    pub short_text_threshold: usize,
    pub media_text_threshold: usize,
    /// Local time-of-day (`HH:MM`) after which no daily post is planned.
    pub daily_cutoff: String,
    /// Likes or reposts strictly above this count as high engagement.
    pub high_engagement_threshold: i64,
    pub quote_probability_high: f64,
    pub quote_probability_base: f64,
    pub daily_prompt: String,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            short_text_threshold: 40,
            media_text_threshold: 150,
            daily_cutoff: "22:00".to_string(),
            high_engagement_threshold: 2,
            quote_probability_high: 0.7,
            quote_probability_base: 0.5,
            daily_prompt: "Write today's unprompted reflection, with no post to react to."
                .to_string(),
        }
    }
}

impl PlannerConfig {
    pub fn cutoff_time(&self) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(&self.daily_cutoff, "%H:%M")
            .with_context(|| format!("Invalid planner.daily_cutoff: {:?}", self.daily_cutoff))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AffectConfig {
    pub decay_factor: f32,
}

impl Default for AffectConfig {
    fn default() -> Self {
        Self { decay_factor: 0.95 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    pub interval_min_secs: u64,
    pub interval_max_secs: u64,
    /// Platform length limit for generated content, in characters.
    pub max_post_chars: usize,
    pub retrieve_limit: usize,
    pub publish_retry: RetryConfig,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            interval_min_secs: 300,
            interval_max_secs: 900,
            max_post_chars: 280,
            retrieve_limit: 3,
            publish_retry: RetryConfig::default(),
        }
    }
}

/// Bounded exponential backoff.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum number of attempts (including the first).
    pub max_attempts: u32,
    pub initial_delay_secs: f64,
    pub max_delay_secs: f64,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_secs: 4.0,
            max_delay_secs: 10.0,
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn initial_delay(&self) -> Duration {
        Duration::from_secs_f64(self.initial_delay_secs.max(0.0))
    }

    pub fn max_delay(&self) -> Duration {
        Duration::from_secs_f64(self.max_delay_secs.max(0.0))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub db_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: "umbra.db".to_string(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
