//! # Umbra Limbic System
//!
//! Owns the agent's continuous emotional state. Nothing here holds a mutable
//! "current mood": the current state is always derived from the newest entry
//! of the append-only affect log, pulled toward neutral by a fixed decay
//! factor. This models emotion settling between events, not within one.
//!
//! ## Reading
//!
//! `current_state()` = newest record × decay, described by quadrant.
//! With no record the state is the origin, described as a system start.
//!
//! ## Writing
//!
//! `record()` = clamp(current_state + deltas), appended as a new entry.
//! The deltas come from the caller; the model never invents them.

mod mood;

pub use mood::MoodEngine;
