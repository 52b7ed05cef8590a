use crate::stimulus::{Stimulus, StimulusView};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    HostReply,
    Mention,
    Daily,
}

/// Output of the action planner. Produced fresh each cycle, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionPlan {
    pub kind: ActionKind,
    pub target: Option<Stimulus>,
    pub emit_as_quote: bool,
    pub rationale: String,
    /// Prompt text used when there is no target stimulus.
    pub fallback_text: String,
}

impl ActionPlan {
    /// Text the cycle recalls against and generates from.
    pub fn target_text(&self) -> String {
        match &self.target {
            Some(target) => target.get_text(),
            None => self.fallback_text.clone(),
        }
    }

    pub fn target_id(&self) -> Option<String> {
        self.target.as_ref().and_then(StimulusView::get_id)
    }

    pub fn logged_action(&self) -> LoggedAction {
        match (self.kind, self.emit_as_quote) {
            (ActionKind::Daily, _) => LoggedAction::DailyPost,
            (_, true) => LoggedAction::ShadowQuote,
            (_, false) => LoggedAction::ShadowReply,
        }
    }
}

/// Action kind as recorded in the action log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoggedAction {
    DailyPost,
    ShadowReply,
    ShadowQuote,
}

impl LoggedAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            LoggedAction::DailyPost => "daily_post",
            LoggedAction::ShadowReply => "shadow_reply",
            LoggedAction::ShadowQuote => "shadow_quote",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily_post" => Some(LoggedAction::DailyPost),
            "shadow_reply" => Some(LoggedAction::ShadowReply),
            "shadow_quote" => Some(LoggedAction::ShadowQuote),
            _ => None,
        }
    }
}

impl std::fmt::Display for LoggedAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stimulus::Post;

    fn plan(kind: ActionKind, quote: bool, target: Option<Stimulus>) -> ActionPlan {
        ActionPlan {
            kind,
            target,
            emit_as_quote: quote,
            rationale: String::new(),
            fallback_text: "fallback".to_string(),
        }
    }

    #[test]
    fn test_target_text_prefers_stimulus() {
        let p = plan(ActionKind::HostReply, false, Some(Stimulus::host(Post::new("1", "body"))));
        assert_eq!(p.target_text(), "body");
        assert_eq!(p.target_id().as_deref(), Some("1"));

        let daily = plan(ActionKind::Daily, false, None);
        assert_eq!(daily.target_text(), "fallback");
        assert_eq!(daily.target_id(), None);
    }

    #[test]
    fn test_logged_action_mapping() {
        assert_eq!(plan(ActionKind::Daily, true, None).logged_action(), LoggedAction::DailyPost);
        assert_eq!(plan(ActionKind::Mention, true, None).logged_action(), LoggedAction::ShadowQuote);
        assert_eq!(plan(ActionKind::HostReply, false, None).logged_action(), LoggedAction::ShadowReply);
    }

    #[test]
    fn test_logged_action_str() {
        for action in [LoggedAction::DailyPost, LoggedAction::ShadowReply, LoggedAction::ShadowQuote] {
            assert_eq!(LoggedAction::parse(action.as_str()), Some(action));
        }
        assert_eq!(LoggedAction::parse("like"), None);
    }
}
