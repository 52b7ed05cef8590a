//! Property-based tests for the action planner.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use umbra_core::config::PlannerConfig;
use umbra_core::{ActionKind, FixedSequence, Post, Stimulus};
use umbra_expression::{should_ignore, ActionPlanner};

fn planner() -> ActionPlanner {
    ActionPlanner::new(PlannerConfig::default()).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// A host post that survives the filter always wins, whatever else is pending.
    #[test]
    fn accepted_host_always_wins(
        extra in 40usize..400,
        media in any::<bool>(),
        daily in any::<bool>(),
        hour in 0u32..24,
        mention_count in 0usize..4,
        draw in 0.0f64..1.0,
    ) {
        let mut post = Post::new("host", "h".repeat(extra));
        if media {
            post = post.with_media();
        }
        let host = Stimulus::host(post);
        prop_assume!(!should_ignore(&host, &PlannerConfig::default()));

        let mentions: Vec<Stimulus> = (0..mention_count)
            .map(|i| Stimulus::mention(Post::new(format!("m{}", i), "m".repeat(80))))
            .collect();
        let now = Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap();
        let mut rng = FixedSequence::new(vec![draw]);

        let plan = planner().decide(Some(&host), &mentions, daily, &now, &mut rng).unwrap();
        prop_assert_eq!(plan.kind, ActionKind::HostReply);
        prop_assert_eq!(plan.emit_as_quote, draw < 0.5);
    }

    /// Text under the short threshold is ignored regardless of media.
    #[test]
    fn short_text_always_ignored(len in 0usize..40, media in any::<bool>()) {
        let mut post = Post::new("1", "x".repeat(len));
        post.has_media = media;
        prop_assert!(should_ignore(&post, &PlannerConfig::default()));
    }

    /// Without a host post or mentions, only the daily window can produce a plan.
    #[test]
    fn daily_follows_cutoff(hour in 0u32..24, minute in 0u32..60) {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, hour, minute, 0).unwrap();
        let mut rng = FixedSequence::new(vec![]);
        let plan = planner().decide(None, &[], true, &now, &mut rng);
        prop_assert_eq!(plan.is_some(), hour < 22);
    }
}
