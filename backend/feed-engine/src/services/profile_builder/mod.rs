// ============================================
// Preference Profile Builder
// ============================================
//
// Turns swipe history into a signed tag-score map:
// 1. Full build from a bounded, chronological event window (session start)
// 2. Incremental fold of each new swipe into the live profile
//
// Both paths share one per-event rule, so folding `apply_swipe` over a
// window always equals `build_profile` over the same window.
//
// Per-tag weights (defaults):
// - yes:   +1.0
// - no:    -0.5
// - view:  +0.1
// - click: +0.3
//
// Category affinity uses the same weights on the event's category.

pub mod interest_builder;
pub mod profile_updater;

pub use interest_builder::{ProfileBuilder, UserPreferenceProfile};

use crate::config::EngineConfig;
use crate::models::InteractionKind;

/// Per-kind score deltas applied to every tag of an event
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileWeights {
    pub yes: f64,
    pub no: f64,
    pub view: f64,
    pub click: f64,
}

impl Default for ProfileWeights {
    fn default() -> Self {
        Self {
            yes: 1.0,
            no: -0.5,
            view: 0.1,
            click: 0.3,
        }
    }
}

impl ProfileWeights {
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            yes: config.tag_weight_yes,
            no: config.tag_weight_no,
            view: config.tag_weight_view,
            click: config.tag_weight_click,
        }
    }

    pub fn weight(&self, kind: InteractionKind) -> f64 {
        match kind {
            InteractionKind::Yes => self.yes,
            InteractionKind::No => self.no,
            InteractionKind::View => self.view,
            InteractionKind::Click => self.click,
        }
    }
}
