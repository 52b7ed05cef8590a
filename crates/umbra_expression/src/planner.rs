use anyhow::Result;
use chrono::{DateTime, NaiveTime, TimeZone};
use umbra_core::config::PlannerConfig;
use umbra_core::{ActionKind, ActionPlan, RandomSource, Stimulus, StimulusView};

use crate::filters::{should_ignore, should_quote};
use crate::presence::DailyWindow;

// ============================================================================
// Planning input
// ============================================================================

/// Everything one planning pass looks at.
pub struct PlanContext<'a> {
    pub host: Option<&'a Stimulus>,
    pub mentions: &'a [Stimulus],
    pub daily_allowed: bool,
    pub local_time: NaiveTime,
}

/// What a rule selected, before the quote/reply draw.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Target(ActionKind, Stimulus),
    Daily,
}

// ============================================================================
// PlanRule trait
// ============================================================================

pub trait PlanRule: Send + Sync {
    /// Return a selection, or None to pass to the next rule.
    fn evaluate(&self, ctx: &PlanContext<'_>) -> Option<Selection>;

    /// Name for logging.
    fn name(&self) -> &str;
}

/// Answer the watched account's latest post.
pub struct HostReplyRule {
    config: PlannerConfig,
}

impl PlanRule for HostReplyRule {
    fn evaluate(&self, ctx: &PlanContext<'_>) -> Option<Selection> {
        let host = ctx.host?;
        if should_ignore(host, &self.config) {
            tracing::debug!(stimulus_id = ?host.get_id(), "Host post filtered out");
            return None;
        }
        Some(Selection::Target(ActionKind::HostReply, host.clone()))
    }

    fn name(&self) -> &str { "host_reply" }
}

/// Today's unprompted post, while the window is open.
pub struct DailyRule {
    window: DailyWindow,
}

impl PlanRule for DailyRule {
    fn evaluate(&self, ctx: &PlanContext<'_>) -> Option<Selection> {
        (ctx.daily_allowed && self.window.is_open(ctx.local_time)).then_some(Selection::Daily)
    }

    fn name(&self) -> &str { "daily" }
}

/// Only the first pending mention is considered.
pub struct MentionRule {
    config: PlannerConfig,
}

impl PlanRule for MentionRule {
    fn evaluate(&self, ctx: &PlanContext<'_>) -> Option<Selection> {
        let mention = ctx.mentions.first()?;
        if should_ignore(mention, &self.config) {
            tracing::debug!(stimulus_id = ?mention.get_id(), "Mention filtered out");
            return None;
        }
        Some(Selection::Target(ActionKind::Mention, mention.clone()))
    }

    fn name(&self) -> &str { "mention" }
}

// ============================================================================
// ActionPlanner
// ============================================================================

/// Priority state machine: host reply, then daily post, then first mention.
pub struct ActionPlanner {
    config: PlannerConfig,
    rules: Vec<Box<dyn PlanRule>>,
}

impl ActionPlanner {
    pub fn new(config: PlannerConfig) -> Result<Self> {
        let window = DailyWindow::from_config(&config)?;
        let rules: Vec<Box<dyn PlanRule>> = vec![
            Box::new(HostReplyRule { config: config.clone() }),
            Box::new(DailyRule { window }),
            Box::new(MentionRule { config: config.clone() }),
        ];
        Ok(Self { config, rules })
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Pick at most one action. `now` is read in its own timezone for the
    /// daily cutoff. Draws from `rng` only when a targeted plan is produced.
    pub fn decide<Tz: TimeZone>(
        &self,
        host: Option<&Stimulus>,
        mentions: &[Stimulus],
        daily_allowed: bool,
        now: &DateTime<Tz>,
        rng: &mut dyn RandomSource,
    ) -> Option<ActionPlan> {
        let ctx = PlanContext {
            host,
            mentions,
            daily_allowed,
            local_time: now.time(),
        };

        let (rule, selection) = self
            .rules
            .iter()
            .find_map(|rule| rule.evaluate(&ctx).map(|s| (rule.name(), s)))?;
        tracing::debug!("ActionPlanner: rule '{}' matched", rule);

        let plan = match selection {
            Selection::Daily => ActionPlan {
                kind: ActionKind::Daily,
                target: None,
                emit_as_quote: false,
                rationale: format!("Daily post before {}", self.config.daily_cutoff),
                fallback_text: self.config.daily_prompt.clone(),
            },
            Selection::Target(kind, target) => {
                let emit_as_quote = should_quote(&target, &self.config, rng);
                let rationale = match kind {
                    ActionKind::HostReply => "Pending host post",
                    _ => "Pending mention",
                };
                ActionPlan {
                    kind,
                    target: Some(target),
                    emit_as_quote,
                    rationale: rationale.to_string(),
                    fallback_text: String::new(),
                }
            }
        };
        Some(plan)
    }
}
