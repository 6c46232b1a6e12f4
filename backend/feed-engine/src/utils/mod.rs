// Utility functions for feed-engine

pub mod logging;
pub mod retry;

pub use logging::init_tracing;
pub use retry::{with_retry, RetryConfig, RetryError};
