// ============================================
// Profile Updater
// ============================================
//
// Folds a single new swipe into the live profile without rescanning history.
// Returns a new profile; the input is left untouched.

use super::interest_builder::{ProfileBuilder, UserPreferenceProfile};
use crate::models::{InteractionEvent, UpdatedProfileSummary};

impl ProfileBuilder {
    /// Apply one event on top of `profile`.
    pub fn apply_swipe(
        &self,
        profile: &UserPreferenceProfile,
        event: &InteractionEvent,
    ) -> UserPreferenceProfile {
        let mut updated = profile.clone();
        updated.absorb(event, &self.weights);
        updated.refresh_top_tags(self.top_tags_limit);
        updated
    }

    pub fn summarize(
        &self,
        profile: &UserPreferenceProfile,
        exploration_threshold: u32,
    ) -> UpdatedProfileSummary {
        UpdatedProfileSummary {
            top_tags: profile.top_tags.clone(),
            top_categories: profile.top_categories(self.top_tags_limit),
            consecutive_nos: profile.consecutive_nos,
            exploration_active: profile.consecutive_nos >= exploration_threshold,
            events_applied: profile.events_applied,
        }
    }
}
