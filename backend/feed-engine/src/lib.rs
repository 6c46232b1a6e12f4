pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::EngineConfig;
pub use models::{
    CandidateItem, FeedFilters, FeedPage, InteractionEvent, InteractionKind, RankedItem,
    ScoredCandidate, UpdatedProfileSummary,
};
pub use services::{
    rank, CatalogError, CatalogQuery, CatalogSource, FeedEngine, FeedError, InteractionStore,
    PageRequest, ProfileBuilder, RankOptions, RankingStrategy, SessionHandle, StoreError,
    UserPreferenceProfile,
};
pub use utils::logging::init_tracing;
