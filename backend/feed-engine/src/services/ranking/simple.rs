use crate::models::{CandidateItem, ScoredCandidate};
use crate::services::profile_builder::UserPreferenceProfile;
use std::cmp::Ordering;

/// Relevance score: mean profile score over the item's tags.
///
/// Normalizing by tag count keeps heavily-tagged items from winning on
/// volume alone. Untagged items and empty profiles score 0.
pub fn base_score(item: &CandidateItem, profile: &UserPreferenceProfile) -> f64 {
    if item.tags.is_empty() {
        return 0.0;
    }

    let total: f64 = item.tags.iter().map(|t| profile.tag_score(t)).sum();
    let score = total / item.tags.len() as f64;

    if score.is_finite() {
        score
    } else {
        0.0
    }
}

/// Score with `score_fn` and sort descending.
///
/// The sort is stable, so ties keep the fetcher's order.
pub fn score_and_sort<F>(candidates: Vec<CandidateItem>, score_fn: F) -> Vec<ScoredCandidate>
where
    F: Fn(&CandidateItem) -> f64,
{
    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|item| {
            let score = score_fn(&item);
            ScoredCandidate {
                item,
                score,
                diversity_penalty: 0.0,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));

    scored
}
