pub mod diversity;
pub mod exploration;
pub mod feed_session;
pub mod interactions;
pub mod profile_builder;
pub mod ranking;
pub mod recall;

pub use diversity::DiversityLayer;
pub use exploration::ExplorationScorer;
pub use feed_session::{FeedEngine, FeedError, PageRequest, SessionHandle};
pub use interactions::{InteractionStore, StoreError, StubInteractionStore};
pub use profile_builder::{ProfileBuilder, UserPreferenceProfile};
pub use ranking::{rank, RankOptions, RankingStrategy};
pub use recall::{CandidateFetcher, CatalogError, CatalogQuery, CatalogSource, FetchResult};
