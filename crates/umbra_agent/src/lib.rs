//! # Umbra Agent
//!
//! The orchestration cycle. Each cycle perceives the feed, lets the planner
//! pick at most one action, recalls memories and mood, asks the generator
//! for content, publishes it and commits the outcome as one unit.
//!
//! A stimulus is acted on at most once: the action log is the only
//! idempotency witness, and it is written after a successful publish.

mod cycle;
mod error;
pub mod retry;

pub use cycle::{Agent, CycleOutcome, Perception, POST_PUBLISHED_TAG};
pub use error::CycleError;
