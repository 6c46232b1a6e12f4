// ============================================
// Interest Builder
// ============================================
//
// Builds a UserPreferenceProfile from a chronological (oldest-first) window
// of interaction events.
//
// score(tag) = SUM(kind_weight) over every event carrying the tag
//
// consecutive_nos counts the trailing run of "no" swipes. A "yes" resets it;
// views and clicks leave it untouched.

use super::ProfileWeights;
use crate::config::EngineConfig;
use crate::models::{InteractionEvent, InteractionKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Derived summary of a user's taste for the active session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserPreferenceProfile {
    /// Signed score per tag ever seen
    pub tag_scores: HashMap<String, f64>,
    /// Signed score per category ever seen
    pub category_scores: HashMap<String, f64>,
    /// `tag_scores` keys sorted by score desc, capped
    pub top_tags: Vec<String>,
    pub consecutive_nos: u32,
    pub last_updated: Option<DateTime<Utc>>,
    pub events_applied: u64,
    /// Sequence number of the latest event carrying each tag
    #[serde(skip)]
    tag_last_seen: HashMap<String, u64>,
    #[serde(skip)]
    category_last_seen: HashMap<String, u64>,
}

impl UserPreferenceProfile {
    pub fn empty() -> Self {
        Self::default()
    }

    /// No signal at all; rankers fall back to catalog (popularity) order.
    pub fn is_empty(&self) -> bool {
        self.tag_scores.is_empty() && self.category_scores.is_empty()
    }

    pub fn tag_score(&self, tag: &str) -> f64 {
        self.tag_scores.get(tag).copied().unwrap_or(0.0)
    }

    pub fn category_score(&self, category: &str) -> f64 {
        self.category_scores.get(category).copied().unwrap_or(0.0)
    }

    pub fn top_categories(&self, limit: usize) -> Vec<String> {
        rank_keys(&self.category_scores, &self.category_last_seen, limit)
    }

    /// Fold one event into the maps. Does not refresh `top_tags`.
    pub(super) fn absorb(&mut self, event: &InteractionEvent, weights: &ProfileWeights) {
        let weight = weights.weight(event.kind);
        let seq = self.events_applied;

        let mut seen_in_event: HashSet<&str> = HashSet::new();
        for tag in &event.tags {
            let tag = tag.trim();
            if tag.is_empty() || !seen_in_event.insert(tag) {
                continue;
            }
            *self.tag_scores.entry(tag.to_string()).or_insert(0.0) += weight;
            self.tag_last_seen.insert(tag.to_string(), seq);
        }

        if let Some(category) = event.category.as_deref().map(str::trim) {
            if !category.is_empty() {
                *self
                    .category_scores
                    .entry(category.to_string())
                    .or_insert(0.0) += weight;
                self.category_last_seen.insert(category.to_string(), seq);
            }
        }

        match event.kind {
            InteractionKind::No => self.consecutive_nos += 1,
            InteractionKind::Yes => self.consecutive_nos = 0,
            InteractionKind::View | InteractionKind::Click => {}
        }

        self.events_applied += 1;
        self.last_updated = Some(event.timestamp);
    }

    pub(super) fn refresh_top_tags(&mut self, limit: usize) {
        self.top_tags = rank_keys(&self.tag_scores, &self.tag_last_seen, limit);
    }
}

/// Keys sorted by score desc, then most recent occurrence, then name.
fn rank_keys(
    scores: &HashMap<String, f64>,
    last_seen: &HashMap<String, u64>,
    limit: usize,
) -> Vec<String> {
    let mut keys: Vec<(&String, f64, u64)> = scores
        .iter()
        .map(|(k, s)| (k, *s, last_seen.get(k).copied().unwrap_or(0)))
        .collect();

    keys.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.2.cmp(&a.2))
            .then_with(|| a.0.cmp(b.0))
    });

    keys.into_iter()
        .take(limit)
        .map(|(k, _, _)| k.clone())
        .collect()
}

/// Builds and incrementally updates preference profiles
#[derive(Debug, Clone)]
pub struct ProfileBuilder {
    pub(super) weights: ProfileWeights,
    pub(super) top_tags_limit: usize,
}

impl Default for ProfileBuilder {
    fn default() -> Self {
        Self {
            weights: ProfileWeights::default(),
            top_tags_limit: 5,
        }
    }
}

impl ProfileBuilder {
    pub fn new(weights: ProfileWeights, top_tags_limit: usize) -> Self {
        Self {
            weights,
            top_tags_limit,
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(ProfileWeights::from_config(config), config.top_tags_limit)
    }

    /// Build a profile from oldest-first events.
    ///
    /// An empty window yields an empty profile, never an error.
    pub fn build_profile(&self, events: &[InteractionEvent]) -> UserPreferenceProfile {
        let mut profile = UserPreferenceProfile::empty();
        for event in events {
            profile.absorb(event, &self.weights);
        }
        profile.refresh_top_tags(self.top_tags_limit);

        debug!(
            events = events.len(),
            tags = profile.tag_scores.len(),
            consecutive_nos = profile.consecutive_nos,
            "Built preference profile"
        );

        profile
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn event(kind: InteractionKind, tags: &[&str]) -> InteractionEvent {
        InteractionEvent::new("p", kind, tags)
    }

    #[test]
    fn test_default_weights_scenario() {
        let builder = ProfileBuilder::default();
        let events = vec![
            event(InteractionKind::Yes, &["a", "b"]),
            event(InteractionKind::Yes, &["a", "c"]),
            event(InteractionKind::No, &["b"]),
        ];

        let profile = builder.build_profile(&events);

        assert_eq!(profile.tag_score("a"), 2.0);
        assert_eq!(profile.tag_score("b"), 0.5);
        assert_eq!(profile.tag_score("c"), 1.0);
        assert_eq!(profile.tag_scores.len(), 3);
        assert_eq!(profile.top_tags, vec!["a", "c", "b"]);
        assert_eq!(profile.consecutive_nos, 1);
    }

    #[test]
    fn test_empty_history_is_empty_profile() {
        let profile = ProfileBuilder::default().build_profile(&[]);

        assert!(profile.is_empty());
        assert!(profile.top_tags.is_empty());
        assert_eq!(profile.consecutive_nos, 0);
        assert_eq!(profile.last_updated, None);
    }

    #[test]
    fn test_consecutive_nos_trailing_run() {
        let builder = ProfileBuilder::default();
        let events = vec![
            event(InteractionKind::No, &["x"]),
            event(InteractionKind::Yes, &["y"]),
            event(InteractionKind::No, &["x"]),
            event(InteractionKind::View, &["x"]),
            event(InteractionKind::No, &["z"]),
            event(InteractionKind::No, &["z"]),
        ];

        let profile = builder.build_profile(&events);
        assert_eq!(profile.consecutive_nos, 3);
    }

    #[test]
    fn test_engagement_weights() {
        let builder = ProfileBuilder::default();
        let events = vec![
            event(InteractionKind::View, &["denim"]),
            event(InteractionKind::Click, &["denim"]),
        ];

        let profile = builder.build_profile(&events);
        assert!((profile.tag_score("denim") - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_top_tags_tie_breaks_on_recency() {
        let builder = ProfileBuilder::default();
        let events = vec![
            event(InteractionKind::Yes, &["older"]),
            event(InteractionKind::Yes, &["newer"]),
        ];

        let profile = builder.build_profile(&events);
        assert_eq!(profile.top_tags, vec!["newer", "older"]);
    }

    #[test]
    fn test_top_tags_capped() {
        let builder = ProfileBuilder::default();
        let events = vec![event(
            InteractionKind::Yes,
            &["a", "b", "c", "d", "e", "f", "g"],
        )];

        let profile = builder.build_profile(&events);
        assert_eq!(profile.top_tags.len(), 5);
        assert_eq!(profile.tag_scores.len(), 7);
    }

    #[test]
    fn test_duplicate_tags_counted_once_per_event() {
        let builder = ProfileBuilder::default();
        let profile = builder.build_profile(&[event(InteractionKind::Yes, &["a", "a", " "])]);

        assert_eq!(profile.tag_score("a"), 1.0);
        assert_eq!(profile.tag_scores.len(), 1);
    }

    #[test]
    fn test_category_affinity() {
        let builder = ProfileBuilder::default();
        let now = Utc::now();
        let events = vec![
            event(InteractionKind::Yes, &["a"])
                .with_category("shoes")
                .at(now - Duration::minutes(2)),
            event(InteractionKind::No, &["b"])
                .with_category("bags")
                .at(now - Duration::minutes(1)),
            event(InteractionKind::Yes, &["c"]).with_category("shoes").at(now),
        ];

        let profile = builder.build_profile(&events);

        assert_eq!(profile.category_score("shoes"), 2.0);
        assert_eq!(profile.category_score("bags"), -0.5);
        assert_eq!(profile.top_categories(1), vec!["shoes"]);
        assert_eq!(profile.last_updated, Some(now));
    }
}
