use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of user interaction recorded against a product card
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Yes,  // right swipe
    No,   // left swipe
    View, // card shown
    Click,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Yes => "yes",
            InteractionKind::No => "no",
            InteractionKind::View => "view",
            InteractionKind::Click => "click",
        }
    }
}

/// One immutable swipe/view/click event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    pub product_id: String,
    pub kind: InteractionKind,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub response_time_ms: Option<u64>,
}

impl InteractionEvent {
    pub fn new(product_id: impl Into<String>, kind: InteractionKind, tags: &[&str]) -> Self {
        Self {
            product_id: product_id.into(),
            kind,
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: None,
            timestamp: Utc::now(),
            response_time_ms: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// A product eligible for the feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CandidateItem {
    pub id: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl CandidateItem {
    pub fn new(id: impl Into<String>, tags: &[&str]) -> Self {
        Self {
            id: id.into(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            category: None,
            price: 0.0,
            metadata: Map::new(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }
}

/// Candidate plus its ranking score. Never persisted.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub item: CandidateItem,
    pub score: f64,
    pub diversity_penalty: f64,
}

/// Filters a feed session is opened with
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FeedFilters {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub min_price: Option<f64>,
    #[serde(default)]
    pub max_price: Option<f64>,
}

impl FeedFilters {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.tags.is_empty()
            && self.min_price.is_none()
            && self.max_price.is_none()
    }

    /// Whether an item satisfies every filter that is set
    pub fn matches(&self, item: &CandidateItem) -> bool {
        if let Some(category) = &self.category {
            if item.category.as_deref() != Some(category.as_str()) {
                return false;
            }
        }
        if !self.tags.is_empty() && !self.tags.iter().any(|t| item.tags.contains(t)) {
            return false;
        }
        if self.min_price.is_some_and(|min| item.price < min) {
            return false;
        }
        if self.max_price.is_some_and(|max| item.price > max) {
            return false;
        }
        true
    }
}

/// Item handed to the UI consumer
#[derive(Debug, Clone, Serialize)]
pub struct RankedItem {
    pub item: CandidateItem,
    pub score: f64,
    pub position: usize,
    pub generation: u32,
}

/// One `next_page` result
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    pub items: Vec<RankedItem>,
    pub has_more: bool,
}

impl FeedPage {
    pub fn empty(has_more: bool) -> Self {
        Self {
            items: Vec::new(),
            has_more,
        }
    }

    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|r| r.item.id.as_str()).collect()
    }
}

/// Profile view returned after each recorded swipe
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UpdatedProfileSummary {
    pub top_tags: Vec<String>,
    pub top_categories: Vec<String>,
    pub consecutive_nos: u32,
    pub exploration_active: bool,
    pub events_applied: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_kind_serde() {
        let json = serde_json::to_string(&InteractionKind::Yes).unwrap();
        assert_eq!(json, "\"yes\"");

        let kind: InteractionKind = serde_json::from_str("\"click\"").unwrap();
        assert_eq!(kind, InteractionKind::Click);
    }

    #[test]
    fn test_event_deserializes_camel_case() {
        let json = r#"{
            "productId": "p1",
            "kind": "no",
            "tags": ["casual"],
            "timestamp": "2024-05-01T10:00:00Z",
            "responseTimeMs": 420
        }"#;
        let event: InteractionEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.product_id, "p1");
        assert_eq!(event.kind, InteractionKind::No);
        assert_eq!(event.category, None);
        assert_eq!(event.response_time_ms, Some(420));
    }

    #[test]
    fn test_filters_match() {
        let item = CandidateItem::new("p1", &["casual", "cotton"])
            .with_category("tops")
            .with_price(25.0);

        assert!(FeedFilters::default().matches(&item));
        assert!(FeedFilters::category("tops").matches(&item));
        assert!(!FeedFilters::category("shoes").matches(&item));

        let price_filter = FeedFilters {
            max_price: Some(20.0),
            ..Default::default()
        };
        assert!(!price_filter.matches(&item));

        let tag_filter = FeedFilters {
            tags: vec!["cotton".into(), "linen".into()],
            ..Default::default()
        };
        assert!(tag_filter.matches(&item));
    }
}
