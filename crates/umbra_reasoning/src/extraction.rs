//! Parsing the model's JSON decision out of its reply text.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use umbra_core::GeneratedThought;

static RE_JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```json\s*(.*?)\s*```").unwrap());

/// Shape the persona prompt asks the model to answer with.
#[derive(Debug, Deserialize)]
struct ThoughtReply {
    tweet_content: String,
    #[serde(default)]
    thought_process: Option<String>,
    #[serde(default)]
    new_valence_delta: Option<f32>,
    #[serde(default)]
    new_arousal_delta: Option<f32>,
}

/// Body of the first fenced ```json block, or the whole reply trimmed.
pub fn strip_json_fence(text: &str) -> &str {
    match RE_JSON_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(body) => body.as_str(),
        None => text.trim(),
    }
}

/// Parse a generation reply. Missing deltas read as 0; a missing
/// `tweet_content` or invalid JSON is an error.
pub fn parse_thought(text: &str) -> Result<GeneratedThought> {
    let body = strip_json_fence(text);
    let reply: ThoughtReply = serde_json::from_str(body).with_context(|| {
        format!(
            "Generation reply is not a valid decision: {}",
            text.chars().take(100).collect::<String>()
        )
    })?;

    Ok(GeneratedThought {
        content: reply.tweet_content,
        rationale: reply.thought_process.unwrap_or_default(),
        valence_delta: reply.new_valence_delta.unwrap_or(0.0),
        arousal_delta: reply.new_arousal_delta.unwrap_or(0.0),
    })
}
