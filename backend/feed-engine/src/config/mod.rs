use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Tunables for profile building, ranking and feed delivery.
///
/// Every field has a default, so `EngineConfig::default()` and an empty
/// environment produce the same values.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-tag delta for an explicit like
    pub tag_weight_yes: f64,
    /// Per-tag delta for an explicit dislike (weaker than a like)
    pub tag_weight_no: f64,
    pub tag_weight_view: f64,
    pub tag_weight_click: f64,
    /// Length cap of `UserPreferenceProfile::top_tags`
    pub top_tags_limit: usize,
    /// 0.0 = pure relevance order, 1.0 = maximal spread
    pub diversity_factor: f64,
    /// Trailing "no" streak that switches ranking to exploration
    pub exploration_consecutive_no_threshold: u32,
    /// Empty pages tolerated before the session recycles
    pub max_retries: u32,
    pub page_size: usize,
    pub retry_delay_ms: u64,
    /// Interaction window loaded when a session starts
    pub history_limit: usize,
    pub fetch_timeout_ms: u64,
    pub persist_max_retries: u32,
    pub persist_initial_backoff_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tag_weight_yes: 1.0,
            tag_weight_no: -0.5,
            tag_weight_view: 0.1,
            tag_weight_click: 0.3,
            top_tags_limit: 5,
            diversity_factor: 0.5,
            exploration_consecutive_no_threshold: 3,
            max_retries: 5,
            page_size: 20,
            retry_delay_ms: 100,
            history_limit: 200,
            fetch_timeout_ms: 5_000,
            persist_max_retries: 3,
            persist_initial_backoff_ms: 100,
        }
    }
}

impl EngineConfig {
    /// Load from `FEED_*` environment variables, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config: EngineConfig = envy::prefixed("FEED_").from_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::Invalid("page_size must be > 0".into()));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid("max_retries must be > 0".into()));
        }

        let weights = [
            ("tag_weight_yes", self.tag_weight_yes),
            ("tag_weight_no", self.tag_weight_no),
            ("tag_weight_view", self.tag_weight_view),
            ("tag_weight_click", self.tag_weight_click),
            ("diversity_factor", self.diversity_factor),
        ];
        for (name, value) in weights {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{name} must be finite")));
            }
        }

        if self.tag_weight_yes <= 0.0 {
            return Err(ConfigError::Invalid("tag_weight_yes must be positive".into()));
        }

        Ok(())
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn clamped_diversity_factor(&self) -> f64 {
        self.diversity_factor.clamp(0.0, 1.0)
    }
}
