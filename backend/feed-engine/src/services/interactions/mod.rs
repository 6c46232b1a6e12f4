// ============================================
// Interaction Store
// ============================================
//
// Append-only log of swipe/view/click events, owned by the host.
//
// Ordering contract: `get_history` returns the most recent `limit` events
// in chronological order (oldest first). The profile builder relies on it
// to compute the trailing "no" streak.

pub mod swipe_writer;

pub use swipe_writer::SwipeWriter;

use crate::models::InteractionEvent;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Interaction store transport error: {0}")]
    Transport(String),

    #[error("Interaction rejected: {0}")]
    Rejected(String),
}

pub type Result<T> = std::result::Result<T, StoreError>;

#[async_trait]
pub trait InteractionStore: Send + Sync {
    /// Most recent `limit` events for the user, oldest first
    async fn get_history(&self, user_id: &str, limit: usize) -> Result<Vec<InteractionEvent>>;

    async fn record_interaction(&self, user_id: &str, event: &InteractionEvent) -> Result<()>;
}

/// Store that remembers nothing, for hosts without interaction persistence
pub struct StubInteractionStore;

#[async_trait]
impl InteractionStore for StubInteractionStore {
    async fn get_history(&self, _user_id: &str, _limit: usize) -> Result<Vec<InteractionEvent>> {
        Ok(Vec::new())
    }

    async fn record_interaction(&self, _user_id: &str, _event: &InteractionEvent) -> Result<()> {
        Ok(())
    }
}
