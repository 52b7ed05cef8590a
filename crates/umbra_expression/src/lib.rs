//! Deciding whether and how to act on what the feed shows.
//!
//! The planner is pure: it never touches the network or the store. Its only
//! nondeterminism is the quote/reply draw, which comes from the injected
//! [`umbra_core::RandomSource`].

mod filters;
mod pacing;
mod planner;
mod presence;

pub use filters::{
    is_high_engagement, quote_probability, read_metric, should_ignore, should_quote, LIKE_METRICS,
    REPOST_METRICS,
};
pub use pacing::CyclePacer;
pub use planner::{ActionPlanner, PlanContext, PlanRule, Selection};
pub use presence::DailyWindow;
