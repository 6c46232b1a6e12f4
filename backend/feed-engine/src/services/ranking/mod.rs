/// Ranking Module
///
/// Orders a page of candidates for one user.
///
/// # Strategies
/// - **Relevance**: mean profile score over the candidate's tags
/// - **Exploration**: favors tags with the smallest nonzero profile magnitude,
///   used to break a run of consecutive dislikes
///
/// # Workflow
/// 1. Score every candidate with the selected strategy
/// 2. Stable sort by score descending (ties keep fetcher order)
/// 3. Greedy diversity re-rank over the profile's top tags
///
/// Ranking is pure and deterministic: no I/O, same input, same output.
pub mod simple;

pub use simple::{base_score, score_and_sort};

use crate::models::{CandidateItem, ScoredCandidate};
use crate::services::diversity::DiversityLayer;
use crate::services::exploration::ExplorationScorer;
use crate::services::profile_builder::UserPreferenceProfile;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingStrategy {
    Relevance,
    Exploration,
}

impl RankingStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankingStrategy::Relevance => "relevance",
            RankingStrategy::Exploration => "exploration",
        }
    }

    /// Strategy the engine picks when the caller does not choose one
    pub fn auto(profile: &UserPreferenceProfile, consecutive_no_threshold: u32) -> Self {
        if profile.consecutive_nos >= consecutive_no_threshold {
            RankingStrategy::Exploration
        } else {
            RankingStrategy::Relevance
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RankOptions {
    pub diversity_factor: f64,
    pub strategy: RankingStrategy,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            diversity_factor: 0.5,
            strategy: RankingStrategy::Relevance,
        }
    }
}

/// Rank candidates against a profile.
///
/// An empty profile scores everything 0 and leaves the fetcher's
/// (popularity) order untouched.
pub fn rank(
    candidates: Vec<CandidateItem>,
    profile: &UserPreferenceProfile,
    options: RankOptions,
) -> Vec<ScoredCandidate> {
    let count = candidates.len();

    let scored = match options.strategy {
        RankingStrategy::Relevance => score_and_sort(candidates, |item| base_score(item, profile)),
        RankingStrategy::Exploration => {
            let explorer = ExplorationScorer::new(profile);
            score_and_sort(candidates, |item| explorer.score(item, profile))
        }
    };

    let ranked = DiversityLayer::new(options.diversity_factor).rerank(scored, &profile.top_tags);

    debug!(
        candidates = count,
        strategy = options.strategy.as_str(),
        diversity_factor = options.diversity_factor,
        "Ranked candidates"
    );

    ranked
}
