//! Ignore and quote heuristics applied to candidate stimuli.

use umbra_core::config::PlannerConfig;
use umbra_core::{RandomSource, StimulusView};

/// Like counters under every name the platform has used, most preferred first.
pub const LIKE_METRICS: &[&str] = &["favorite_count", "favourites_count", "like_count"];
/// Repost counters, most preferred first.
pub const REPOST_METRICS: &[&str] = &["retweet_count", "repost_count"];

/// Too short to be worth answering, or mostly media with a caption.
pub fn should_ignore(view: &dyn StimulusView, config: &PlannerConfig) -> bool {
    let len = view.get_text().trim().chars().count();
    if len < config.short_text_threshold {
        return true;
    }
    view.get_media_flag() && len < config.media_text_threshold
}

/// First readable counter among `names`. Absent and unparseable both read as unknown.
pub fn read_metric(view: &dyn StimulusView, names: &[&str]) -> Option<i64> {
    names.iter().find_map(|name| view.get_metric(name))
}

/// Either counter known and above the configured threshold.
pub fn is_high_engagement(view: &dyn StimulusView, config: &PlannerConfig) -> bool {
    let over = |n: Option<i64>| n.is_some_and(|n| n > config.high_engagement_threshold);
    over(read_metric(view, LIKE_METRICS)) || over(read_metric(view, REPOST_METRICS))
}

pub fn quote_probability(view: &dyn StimulusView, config: &PlannerConfig) -> f64 {
    if is_high_engagement(view, config) {
        config.quote_probability_high
    } else {
        config.quote_probability_base
    }
}

/// One draw from `rng`: quote iff it lands strictly below the quote probability.
pub fn should_quote(view: &dyn StimulusView, config: &PlannerConfig, rng: &mut dyn RandomSource) -> bool {
    let p = quote_probability(view, config);
    rng.next_unit() < p
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};
    use umbra_core::{FixedSequence, Post};

    fn loose(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn text(n: usize) -> String {
        "a".repeat(n)
    }

    #[test]
    fn test_short_text_ignored() {
        let cfg = PlannerConfig::default();
        assert!(should_ignore(&Post::new("1", "hola"), &cfg));
        assert!(!should_ignore(&Post::new("1", text(45)), &cfg));
    }

    #[test]
    fn test_whitespace_does_not_count() {
        let cfg = PlannerConfig::default();
        let padded = format!("   {}   ", text(39));
        assert!(should_ignore(&Post::new("1", padded), &cfg));
        assert!(!should_ignore(&Post::new("1", text(40)), &cfg));
    }

    #[test]
    fn test_media_threshold() {
        let cfg = PlannerConfig::default();
        assert!(should_ignore(&Post::new("1", text(100)).with_media(), &cfg));
        assert!(!should_ignore(&Post::new("1", text(160)).with_media(), &cfg));
        assert!(!should_ignore(&Post::new("1", text(100)), &cfg));
    }

    #[test]
    fn test_loose_map_defaults() {
        let cfg = PlannerConfig::default();
        // No text field at all reads as empty
        assert!(should_ignore(&loose(json!({"id": "9"})), &cfg));
        assert!(should_ignore(&loose(json!({"text": text(100), "photos": ["p"]})), &cfg));
        assert!(!should_ignore(&loose(json!({"text": text(100), "photos": []})), &cfg));
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        let cfg = PlannerConfig::default();
        // 39 two-byte characters
        assert!(should_ignore(&Post::new("1", "ñ".repeat(39)), &cfg));
    }

    #[test]
    fn test_read_metric_preference_order() {
        let map = loose(json!({"like_count": 9, "favorite_count": 1}));
        assert_eq!(read_metric(&map, LIKE_METRICS), Some(1));

        // Unparseable first name falls through to the next one
        let map = loose(json!({"favorite_count": "lots", "like_count": "7"}));
        assert_eq!(read_metric(&map, LIKE_METRICS), Some(7));

        let map = loose(json!({"favorite_count": null}));
        assert_eq!(read_metric(&map, LIKE_METRICS), None);
    }

    #[test]
    fn test_quote_probability_high_engagement() {
        let cfg = PlannerConfig::default();
        let post = Post::new("1", text(50)).with_engagement(3, 0);
        assert_eq!(quote_probability(&post, &cfg), 0.7);
        assert!(should_quote(&post, &cfg, &mut FixedSequence::new(vec![0.5])));
        assert!(!should_quote(&post, &cfg, &mut FixedSequence::new(vec![0.7])));
    }

    #[test]
    fn test_quote_probability_base() {
        let cfg = PlannerConfig::default();
        let post = Post::new("1", text(50)).with_engagement(1, 1);
        assert_eq!(quote_probability(&post, &cfg), 0.5);
        assert!(!should_quote(&post, &cfg, &mut FixedSequence::new(vec![0.6])));
        assert!(should_quote(&post, &cfg, &mut FixedSequence::new(vec![0.49])));
    }

    #[test]
    fn test_threshold_is_strict() {
        let cfg = PlannerConfig::default();
        let post = Post::new("1", text(50)).with_engagement(2, 2);
        assert!(!is_high_engagement(&post, &cfg));
    }

    #[test]
    fn test_loose_metrics() {
        let cfg = PlannerConfig::default();
        let map = loose(json!({"like_count": 5, "repost_count": 0}));
        assert!(should_quote(&map, &cfg, &mut FixedSequence::new(vec![0.2])));

        let map = loose(json!({"retweet_count": "4"}));
        assert!(is_high_engagement(&map, &cfg));

        let map = loose(json!({"favorite_count": {"nested": 10}}));
        assert!(!is_high_engagement(&map, &cfg));
    }
}
