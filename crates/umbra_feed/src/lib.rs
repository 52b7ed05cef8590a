//! Social feed access through a local platform bridge.
//!
//! The bridge owns the platform protocol; this crate only speaks its small
//! JSON surface:
//!
//! - `POST /session` `{cookies}` → `{screen_name, id, cookies?}`
//! - `GET /posts?author=<account>&limit=1` → `[post]`
//! - `GET /mentions?limit=<n>` → `[post]`
//! - `POST /posts` `{text, reply_to?, quote_of?}` → `{id}`
//!
//! Posts are passed through untouched as loose JSON stimuli.

mod client;
mod session;

pub use client::{HttpFeedClient, SessionInfo, STATUS_URL_PREFIX, UNCONFIRMED_POST_ID};
pub use session::SessionFile;
