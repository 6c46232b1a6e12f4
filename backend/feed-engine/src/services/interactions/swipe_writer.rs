// ============================================
// Swipe Writer
// ============================================
//
// Persists recorded swipes to the Interaction Store off the ranking path.
// Each write runs on its own task with exponential backoff; a write that
// exhausts its retries is logged and dropped.

use super::InteractionStore;
use crate::config::EngineConfig;
use crate::models::InteractionEvent;
use crate::utils::retry::{with_retry, RetryConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

#[derive(Clone)]
pub struct SwipeWriter {
    store: Arc<dyn InteractionStore>,
    retry: RetryConfig,
}

impl SwipeWriter {
    pub fn new(store: Arc<dyn InteractionStore>, retry: RetryConfig) -> Self {
        Self { store, retry }
    }

    pub fn from_config(store: Arc<dyn InteractionStore>, config: &EngineConfig) -> Self {
        let retry = RetryConfig {
            max_retries: config.persist_max_retries,
            initial_backoff: Duration::from_millis(config.persist_initial_backoff_ms),
            ..Default::default()
        };
        Self::new(store, retry)
    }

    /// Schedule a write and return immediately.
    ///
    /// Returns `None` when called outside a Tokio runtime; the event is then
    /// only reflected in the in-memory profile.
    pub fn submit(&self, user_id: &str, event: InteractionEvent) -> Option<JoinHandle<bool>> {
        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(
                    user_id = user_id,
                    product_id = %event.product_id,
                    "No async runtime, swipe not persisted"
                );
                return None;
            }
        };

        let store = self.store.clone();
        let retry = self.retry.clone();
        let user_id = user_id.to_string();

        Some(handle.spawn(async move {
            let result = with_retry(&retry, || store.record_interaction(&user_id, &event)).await;

            match result {
                Ok(()) => {
                    debug!(
                        user_id = %user_id,
                        product_id = %event.product_id,
                        kind = event.kind.as_str(),
                        "Swipe persisted"
                    );
                    true
                }
                Err(e) => {
                    error!(
                        user_id = %user_id,
                        product_id = %event.product_id,
                        "Failed to persist swipe: {}",
                        e
                    );
                    false
                }
            }
        }))
    }
}
