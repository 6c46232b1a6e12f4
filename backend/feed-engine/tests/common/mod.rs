#![allow(dead_code)]

use async_trait::async_trait;
use feed_engine::services::interactions::Result as StoreResult;
use feed_engine::{
    CandidateItem, CatalogError, CatalogQuery, CatalogSource, EngineConfig, InteractionEvent,
    InteractionStore, StoreError,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory catalog; honors `exclude_ids` unless told otherwise
pub struct InMemoryCatalog {
    items: Vec<CandidateItem>,
    ignore_exclusion: bool,
    latency: Duration,
    fail: AtomicBool,
    calls: AtomicUsize,
    queries: Mutex<Vec<CatalogQuery>>,
}

impl InMemoryCatalog {
    pub fn new(items: Vec<CandidateItem>) -> Self {
        Self {
            items,
            ignore_exclusion: false,
            latency: Duration::ZERO,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Returns `offset..offset+limit` of the full list, ignoring exclusions
    pub fn ignoring_exclusion(mut self) -> Self {
        self.ignore_exclusion = true;
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn queries(&self) -> Vec<CatalogQuery> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl CatalogSource for InMemoryCatalog {
    async fn query_products(&self, query: &CatalogQuery) -> Result<Vec<CandidateItem>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().push(query.clone());

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(CatalogError::Transport("catalog unreachable".into()));
        }

        let excluded: HashSet<&str> = if self.ignore_exclusion {
            HashSet::new()
        } else {
            query.exclude_ids.iter().map(String::as_str).collect()
        };

        Ok(self
            .items
            .iter()
            .filter(|item| query.filters.matches(item))
            .filter(|item| !excluded.contains(item.id.as_str()))
            .skip(query.offset)
            .take(query.limit)
            .cloned()
            .collect())
    }
}

/// Always returns the same items, whatever the query says
pub struct StuckCatalog {
    items: Vec<CandidateItem>,
    calls: AtomicUsize,
}

impl StuckCatalog {
    pub fn new(items: Vec<CandidateItem>) -> Self {
        Self {
            items,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogSource for StuckCatalog {
    async fn query_products(&self, _query: &CatalogQuery) -> Result<Vec<CandidateItem>, CatalogError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.items.clone())
    }
}

#[derive(Default)]
pub struct InMemoryStore {
    history: Vec<InteractionEvent>,
    unavailable: bool,
    recorded: Mutex<Vec<(String, InteractionEvent)>>,
    history_requests: AtomicUsize,
}

impl InMemoryStore {
    pub fn with_history(history: Vec<InteractionEvent>) -> Self {
        Self {
            history,
            ..Default::default()
        }
    }

    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    pub fn recorded(&self) -> Vec<(String, InteractionEvent)> {
        self.recorded.lock().clone()
    }

    pub fn history_requests(&self) -> usize {
        self.history_requests.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InteractionStore for InMemoryStore {
    async fn get_history(&self, _user_id: &str, limit: usize) -> StoreResult<Vec<InteractionEvent>> {
        self.history_requests.fetch_add(1, Ordering::SeqCst);
        if self.unavailable {
            return Err(StoreError::Transport("store unreachable".into()));
        }
        let start = self.history.len().saturating_sub(limit);
        Ok(self.history[start..].to_vec())
    }

    async fn record_interaction(&self, user_id: &str, event: &InteractionEvent) -> StoreResult<()> {
        if self.unavailable {
            return Err(StoreError::Transport("store unreachable".into()));
        }
        self.recorded
            .lock()
            .push((user_id.to_string(), event.clone()));
        Ok(())
    }
}

/// Defaults with timers disabled
pub fn test_config(page_size: usize, max_retries: u32) -> EngineConfig {
    EngineConfig {
        page_size,
        max_retries,
        retry_delay_ms: 0,
        persist_initial_backoff_ms: 1,
        ..Default::default()
    }
}

/// `n` products cycling through a few tag pairs and two categories
pub fn catalog_items(n: usize) -> Vec<CandidateItem> {
    const TAGS: [[&str; 2]; 4] = [
        ["casual", "cotton"],
        ["formal", "wool"],
        ["street", "denim"],
        ["boho", "linen"],
    ];
    (0..n)
        .map(|i| {
            let category = if i % 2 == 0 { "tops" } else { "bottoms" };
            CandidateItem::new(format!("p{:03}", i), &TAGS[i % TAGS.len()])
                .with_category(category)
                .with_price(10.0 + i as f64)
        })
        .collect()
}
