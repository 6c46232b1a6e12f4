// ============================================
// Candidate Fetcher Adapter
// ============================================
//
// Wraps the Catalog Source behind one query contract:
// - Mixed:    no filters, popularity / personalized mix from the catalog
// - Category: a single category filter
// - Filtered: any other filter combination
//
// The adapter owns the I/O timeout and never returns an error: transport
// failures and timeouts come back as `FetchResult { success: false, .. }`
// so the feed session decides between retry and surfacing.

use crate::models::{CandidateItem, FeedFilters};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog transport error: {0}")]
    Transport(String),

    #[error("Invalid catalog query: {0}")]
    InvalidQuery(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    Mixed,
    Category,
    Filtered,
}

impl QueryMode {
    pub fn for_filters(filters: &FeedFilters) -> Self {
        if filters.is_empty() {
            QueryMode::Mixed
        } else if filters.category.is_some()
            && filters.tags.is_empty()
            && filters.min_price.is_none()
            && filters.max_price.is_none()
        {
            QueryMode::Category
        } else {
            QueryMode::Filtered
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMode::Mixed => "mixed",
            QueryMode::Category => "category",
            QueryMode::Filtered => "filtered",
        }
    }
}

/// One paged catalog lookup
#[derive(Debug, Clone, Serialize)]
pub struct CatalogQuery {
    /// `None` for anonymous (popularity) queries
    pub user_id: Option<String>,
    pub limit: usize,
    pub offset: usize,
    pub mode: QueryMode,
    pub filters: FeedFilters,
    pub exclude_ids: Vec<String>,
}

/// Paged, filterable product lookup provided by the host
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn query_products(&self, query: &CatalogQuery) -> Result<Vec<CandidateItem>, CatalogError>;
}

/// Adapter result; `success = false` carries the error text
#[derive(Debug, Clone, Default)]
pub struct FetchResult {
    pub items: Vec<CandidateItem>,
    /// Items the source returned before filter checks
    pub raw_count: usize,
    pub success: bool,
    pub error: Option<String>,
}

impl FetchResult {
    pub fn ok(items: Vec<CandidateItem>, raw_count: usize) -> Self {
        Self {
            items,
            raw_count,
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            items: Vec::new(),
            raw_count: 0,
            success: false,
            error: Some(error.into()),
        }
    }
}

pub struct CandidateFetcher {
    source: Arc<dyn CatalogSource>,
    timeout: Duration,
}

impl CandidateFetcher {
    pub fn new(source: Arc<dyn CatalogSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    pub async fn fetch(
        &self,
        user_id: Option<&str>,
        limit: usize,
        offset: usize,
        filters: &FeedFilters,
        exclude_ids: &[String],
    ) -> FetchResult {
        let query = CatalogQuery {
            user_id: user_id.map(str::to_string),
            limit,
            offset,
            mode: QueryMode::for_filters(filters),
            filters: filters.clone(),
            exclude_ids: exclude_ids.to_vec(),
        };

        let response = match tokio::time::timeout(self.timeout, self.source.query_products(&query)).await {
            Ok(Ok(items)) => items,
            Ok(Err(e)) => {
                warn!(mode = query.mode.as_str(), offset = offset, "Catalog query failed: {}", e);
                return FetchResult::failed(e.to_string());
            }
            Err(_) => {
                warn!(
                    mode = query.mode.as_str(),
                    offset = offset,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Catalog query timed out"
                );
                return FetchResult::failed(format!(
                    "catalog query timed out after {}ms",
                    self.timeout.as_millis()
                ));
            }
        };

        let raw_count = response.len();
        let items: Vec<CandidateItem> = if query.mode == QueryMode::Mixed {
            response
        } else {
            response.into_iter().filter(|i| filters.matches(i)).collect()
        };

        if items.len() < raw_count {
            debug!(
                dropped = raw_count - items.len(),
                mode = query.mode.as_str(),
                "Dropped catalog items outside the active filters"
            );
        }

        debug!(
            mode = query.mode.as_str(),
            limit = limit,
            offset = offset,
            excluded = exclude_ids.len(),
            returned = raw_count,
            anonymous = user_id.is_none(),
            "Catalog query completed"
        );

        FetchResult::ok(items, raw_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    struct FixedCatalog {
        items: Vec<CandidateItem>,
        last_query: Mutex<Option<CatalogQuery>>,
    }

    #[async_trait]
    impl CatalogSource for FixedCatalog {
        async fn query_products(&self, query: &CatalogQuery) -> Result<Vec<CandidateItem>, CatalogError> {
            *self.last_query.lock() = Some(query.clone());
            Ok(self.items.clone())
        }
    }

    struct FailingCatalog;

    #[async_trait]
    impl CatalogSource for FailingCatalog {
        async fn query_products(&self, _query: &CatalogQuery) -> Result<Vec<CandidateItem>, CatalogError> {
            Err(CatalogError::Transport("connection refused".into()))
        }
    }

    struct SlowCatalog;

    #[async_trait]
    impl CatalogSource for SlowCatalog {
        async fn query_products(&self, _query: &CatalogQuery) -> Result<Vec<CandidateItem>, CatalogError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(Vec::new())
        }
    }

    #[test]
    fn test_query_mode_for_filters() {
        assert_eq!(QueryMode::for_filters(&FeedFilters::default()), QueryMode::Mixed);
        assert_eq!(
            QueryMode::for_filters(&FeedFilters::category("shoes")),
            QueryMode::Category
        );
        let filters = FeedFilters {
            category: Some("shoes".into()),
            max_price: Some(50.0),
            ..Default::default()
        };
        assert_eq!(QueryMode::for_filters(&filters), QueryMode::Filtered);
    }

    #[tokio::test]
    async fn test_fetch_passes_query_through() {
        let catalog = Arc::new(FixedCatalog {
            items: vec![CandidateItem::new("p1", &["a"])],
            last_query: Mutex::new(None),
        });
        let fetcher = CandidateFetcher::new(catalog.clone(), Duration::from_secs(1));

        let result = fetcher
            .fetch(None, 10, 20, &FeedFilters::default(), &["seen".to_string()])
            .await;

        assert!(result.success);
        assert_eq!(result.raw_count, 1);

        let query = catalog.last_query.lock().clone().unwrap();
        assert_eq!(query.user_id, None);
        assert_eq!(query.limit, 10);
        assert_eq!(query.offset, 20);
        assert_eq!(query.mode, QueryMode::Mixed);
        assert_eq!(query.exclude_ids, vec!["seen".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_drops_items_outside_filters() {
        let catalog = Arc::new(FixedCatalog {
            items: vec![
                CandidateItem::new("s1", &["a"]).with_category("shoes"),
                CandidateItem::new("b1", &["a"]).with_category("bags"),
            ],
            last_query: Mutex::new(None),
        });
        let fetcher = CandidateFetcher::new(catalog, Duration::from_secs(1));

        let result = fetcher
            .fetch(Some("u1"), 10, 0, &FeedFilters::category("shoes"), &[])
            .await;

        assert!(result.success);
        assert_eq!(result.raw_count, 2);
        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].id, "s1");
    }

    #[tokio::test]
    async fn test_transport_error_becomes_failed_result() {
        let fetcher = CandidateFetcher::new(Arc::new(FailingCatalog), Duration::from_secs(1));

        let result = fetcher.fetch(Some("u1"), 10, 0, &FeedFilters::default(), &[]).await;

        assert!(!result.success);
        assert!(result.items.is_empty());
        assert!(result.error.unwrap().contains("connection refused"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_becomes_failed_result() {
        let fetcher = CandidateFetcher::new(Arc::new(SlowCatalog), Duration::from_millis(50));

        let result = fetcher.fetch(None, 10, 0, &FeedFilters::default(), &[]).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("timed out"));
    }
}
