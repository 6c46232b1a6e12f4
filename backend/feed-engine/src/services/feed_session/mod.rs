// ============================================
// Feed Session Module
// ============================================
//
// Endless, duplicate-free feed delivery on top of a finite catalog:
// 1. Pages are fetched excluding everything already seen this generation
// 2. Empty pages are retried at an advancing offset after a short delay
// 3. When retries run out the seen set is cleared (recycling) so the feed
//    never dead-ends; repeats across generations are expected
//
// One load per session at a time. Filter changes replace the session
// atomically under a new epoch; late results from the old epoch are dropped.

pub mod engine;
pub mod state;

pub use engine::{FeedEngine, PageRequest, SessionHandle};
pub use state::{FeedSession, LoadStep, LoadTicket, SessionSnapshot, SessionState};

use thiserror::Error;

/// Errors surfaced to the feed consumer.
///
/// Empty pages never show up here; they are absorbed by retry/recycle.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("Transport error: {0}")]
    Transport(String),
}

pub type Result<T> = std::result::Result<T, FeedError>;
