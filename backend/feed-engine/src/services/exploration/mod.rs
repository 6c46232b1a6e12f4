// ============================================
// Exploration Scoring
// ============================================
//
// Breaks a negative-feedback spiral by favoring tags the profile knows
// little about. For every tag of a candidate with a nonzero profile score:
//
//   novelty(tag) = 1 - |score(tag)| / max_abs_score
//
// The candidate's exploration score is the mean novelty over those tags.
// Tags absent from the profile (or scored exactly zero) carry no signal
// and are skipped; a candidate with no known tags scores 0.

use crate::models::CandidateItem;
use crate::services::profile_builder::UserPreferenceProfile;

/// Scores candidates by how under-represented their tags are
pub struct ExplorationScorer {
    max_abs_score: f64,
}

impl ExplorationScorer {
    pub fn new(profile: &UserPreferenceProfile) -> Self {
        let max_abs_score = profile
            .tag_scores
            .values()
            .map(|s| s.abs())
            .filter(|s| s.is_finite())
            .fold(0.0, f64::max);

        Self { max_abs_score }
    }

    pub fn score(&self, item: &CandidateItem, profile: &UserPreferenceProfile) -> f64 {
        if self.max_abs_score <= 0.0 {
            return 0.0;
        }

        let novelties: Vec<f64> = item
            .tags
            .iter()
            .map(|t| profile.tag_score(t))
            .filter(|s| *s != 0.0 && s.is_finite())
            .map(|s| 1.0 - s.abs() / self.max_abs_score)
            .collect();

        if novelties.is_empty() {
            return 0.0;
        }

        novelties.iter().sum::<f64>() / novelties.len() as f64
    }
}
