//! Stimuli the agent may react to.
//!
//! Posts reach the planner in two shapes: a structured [`Post`] built by a
//! client that knows the platform schema, or a loose JSON object passed
//! through from a bridge. Planning logic never inspects either shape
//! directly; it goes through [`StimulusView`], which never fails. A missing
//! or unreadable field reads as "no text", "no media" or "unknown metric".

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Fields whose truthiness marks a post as carrying media.
const MEDIA_FIELDS: &[&str] = &["media", "photos", "photo", "video", "videos", "media_keys"];

/// Narrow read-only capability over any stimulus shape.
pub trait StimulusView {
    fn get_id(&self) -> Option<String>;
    fn get_text(&self) -> String;
    fn get_media_flag(&self) -> bool;
    /// Integer counter stored under `name`, if present and parseable.
    fn get_metric(&self, name: &str) -> Option<i64>;
}

/// Structured post as produced by a schema-aware feed client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: Option<String>,
    pub text: String,
    pub like_count: Option<i64>,
    pub repost_count: Option<i64>,
    pub has_media: bool,
}

impl Post {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn with_engagement(mut self, likes: i64, reposts: i64) -> Self {
        self.like_count = Some(likes);
        self.repost_count = Some(reposts);
        self
    }

    pub fn with_media(mut self) -> Self {
        self.has_media = true;
        self
    }
}

impl StimulusView for Post {
    fn get_id(&self) -> Option<String> {
        self.id.clone()
    }

    fn get_text(&self) -> String {
        self.text.clone()
    }

    fn get_media_flag(&self) -> bool {
        self.has_media
    }

    fn get_metric(&self, name: &str) -> Option<i64> {
        match name {
            "favorite_count" | "favourites_count" | "like_count" => self.like_count,
            "retweet_count" | "repost_count" => self.repost_count,
            _ => None,
        }
    }
}

impl StimulusView for Map<String, Value> {
    fn get_id(&self) -> Option<String> {
        ["id", "id_str"].iter().find_map(|key| match self.get(*key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    fn get_text(&self) -> String {
        ["text", "full_text"]
            .iter()
            .find_map(|key| self.get(*key).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string()
    }

    fn get_media_flag(&self) -> bool {
        MEDIA_FIELDS
            .iter()
            .any(|field| self.get(*field).is_some_and(is_truthy))
    }

    fn get_metric(&self, name: &str) -> Option<i64> {
        match self.get(name)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64)),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(fields) => !fields.is_empty(),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Structured(Post),
    Loose(Map<String, Value>),
}

impl From<Post> for Payload {
    fn from(post: Post) -> Self {
        Payload::Structured(post)
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Payload::Loose(map)
    }
}

impl From<Value> for Payload {
    /// Non-object JSON carries nothing readable and becomes an empty map.
    fn from(value: Value) -> Self {
        match value {
            Value::Object(map) => Payload::Loose(map),
            _ => Payload::Loose(Map::new()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StimulusKind {
    HostPost,
    Mention,
    NoStimulus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stimulus {
    pub kind: StimulusKind,
    payload: Option<Payload>,
}

impl Stimulus {
    pub fn host(payload: impl Into<Payload>) -> Self {
        Self {
            kind: StimulusKind::HostPost,
            payload: Some(payload.into()),
        }
    }

    pub fn mention(payload: impl Into<Payload>) -> Self {
        Self {
            kind: StimulusKind::Mention,
            payload: Some(payload.into()),
        }
    }

    pub fn none() -> Self {
        Self {
            kind: StimulusKind::NoStimulus,
            payload: None,
        }
    }

    pub fn payload(&self) -> Option<&Payload> {
        self.payload.as_ref()
    }
}

impl StimulusView for Stimulus {
    fn get_id(&self) -> Option<String> {
        match &self.payload {
            Some(Payload::Structured(post)) => post.get_id(),
            Some(Payload::Loose(map)) => map.get_id(),
            None => None,
        }
    }

    fn get_text(&self) -> String {
        match &self.payload {
            Some(Payload::Structured(post)) => post.get_text(),
            Some(Payload::Loose(map)) => map.get_text(),
            None => String::new(),
        }
    }

    fn get_media_flag(&self) -> bool {
        match &self.payload {
            Some(Payload::Structured(post)) => post.get_media_flag(),
            Some(Payload::Loose(map)) => map.get_media_flag(),
            None => false,
        }
    }

    fn get_metric(&self, name: &str) -> Option<i64> {
        match &self.payload {
            Some(Payload::Structured(post)) => post.get_metric(name),
            Some(Payload::Loose(map)) => map.get_metric(name),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn loose(value: Value) -> Stimulus {
        Stimulus::mention(value)
    }

    #[test]
    fn test_structured_post_view() {
        let s = Stimulus::host(Post::new("42", "hello there").with_engagement(3, 1).with_media());
        assert_eq!(s.get_id().as_deref(), Some("42"));
        assert_eq!(s.get_text(), "hello there");
        assert!(s.get_media_flag());
        assert_eq!(s.get_metric("favorite_count"), Some(3));
        assert_eq!(s.get_metric("repost_count"), Some(1));
        assert_eq!(s.get_metric("quote_count"), None);
    }

    #[test]
    fn test_loose_numeric_id() {
        let s = loose(json!({"id": 1234567890123_i64, "text": "x"}));
        assert_eq!(s.get_id().as_deref(), Some("1234567890123"));
    }

    #[test]
    fn test_loose_missing_fields_default() {
        let s = loose(json!({"user": "someone"}));
        assert_eq!(s.get_id(), None);
        assert_eq!(s.get_text(), "");
        assert!(!s.get_media_flag());
        assert_eq!(s.get_metric("like_count"), None);
    }

    #[test]
    fn test_loose_wrong_types_do_not_panic() {
        let s = loose(json!({"text": 17, "media": null, "like_count": {"n": 3}}));
        assert_eq!(s.get_text(), "");
        assert!(!s.get_media_flag());
        assert_eq!(s.get_metric("like_count"), None);
    }

    #[test]
    fn test_loose_metric_parsing() {
        let s = loose(json!({"like_count": "7", "repost_count": 2.9, "favorite_count": "many"}));
        assert_eq!(s.get_metric("like_count"), Some(7));
        assert_eq!(s.get_metric("repost_count"), Some(2));
        assert_eq!(s.get_metric("favorite_count"), None);
    }

    #[test]
    fn test_loose_media_truthiness() {
        assert!(loose(json!({"photos": ["a.jpg"]})).get_media_flag());
        assert!(loose(json!({"video": true})).get_media_flag());
        assert!(!loose(json!({"photos": [], "video": false, "media": ""})).get_media_flag());
    }

    #[test]
    fn test_non_object_payload_is_empty() {
        let s = loose(json!("just a string"));
        assert_eq!(s.get_text(), "");
        assert_eq!(s.get_id(), None);
    }

    #[test]
    fn test_no_stimulus_view() {
        let s = Stimulus::none();
        assert_eq!(s.kind, StimulusKind::NoStimulus);
        assert_eq!(s.get_id(), None);
        assert_eq!(s.get_text(), "");
        assert!(!s.get_media_flag());
    }
}
