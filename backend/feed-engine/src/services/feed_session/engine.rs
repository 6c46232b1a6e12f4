use super::state::{FeedSession, LoadStep, SessionSnapshot};
use super::{FeedError, Result};
use crate::config::{ConfigError, EngineConfig};
use crate::models::{
    FeedFilters, FeedPage, InteractionEvent, InteractionKind, RankedItem, UpdatedProfileSummary,
};
use crate::services::interactions::{InteractionStore, SwipeWriter};
use crate::services::profile_builder::{ProfileBuilder, UserPreferenceProfile};
use crate::services::ranking::{rank, RankOptions, RankingStrategy};
use crate::services::recall::{CandidateFetcher, CatalogSource};
use chrono::Utc;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Per-call overrides for `next_page_with`
#[derive(Debug, Clone, Copy, Default)]
pub struct PageRequest {
    /// Defaults to `EngineConfig::page_size`
    pub max_items: Option<usize>,
    /// `None` picks exploration automatically after a run of dislikes
    pub strategy: Option<RankingStrategy>,
    pub diversity_factor: Option<f64>,
}

struct SessionSlot {
    session: FeedSession,
    profile: UserPreferenceProfile,
}

/// Caller-owned handle to one browsing context.
///
/// Clones share the same session; separate `init_session` calls never do.
#[derive(Clone)]
pub struct SessionHandle {
    id: Uuid,
    slot: Arc<Mutex<SessionSlot>>,
}

impl SessionHandle {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.slot.lock().session.snapshot()
    }

    pub fn profile(&self) -> UserPreferenceProfile {
        self.slot.lock().profile.clone()
    }

    pub fn filters(&self) -> FeedFilters {
        self.slot.lock().session.filters().clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.slot.lock().session.user_id().map(str::to_string)
    }
}

/// Clears the in-flight flag of its epoch when a load ends or is cancelled.
struct InFlightGuard {
    slot: Arc<Mutex<SessionSlot>>,
    epoch: u64,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.slot.lock().session.finish_load(self.epoch);
    }
}

/// Personalization & feed delivery engine
pub struct FeedEngine {
    config: EngineConfig,
    builder: ProfileBuilder,
    fetcher: CandidateFetcher,
    store: Arc<dyn InteractionStore>,
    writer: SwipeWriter,
}

impl FeedEngine {
    pub fn new(
        config: EngineConfig,
        catalog: Arc<dyn CatalogSource>,
        store: Arc<dyn InteractionStore>,
    ) -> std::result::Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            builder: ProfileBuilder::from_config(&config),
            fetcher: CandidateFetcher::new(catalog, config.fetch_timeout()),
            writer: SwipeWriter::from_config(store.clone(), &config),
            store,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Open a feed for `user_id` (`None` = anonymous).
    ///
    /// The profile is built once from recent history. A failing history
    /// lookup degrades to an empty profile (catalog order) rather than an error.
    pub async fn init_session(&self, user_id: Option<&str>, filters: FeedFilters) -> SessionHandle {
        let profile = match user_id {
            Some(user_id) => self.load_profile(user_id).await,
            None => UserPreferenceProfile::empty(),
        };

        let handle = SessionHandle {
            id: Uuid::new_v4(),
            slot: Arc::new(Mutex::new(SessionSlot {
                session: FeedSession::new(
                    user_id.map(str::to_string),
                    filters,
                    0,
                    self.config.max_retries,
                ),
                profile,
            })),
        };

        info!(
            session_id = %handle.id,
            user_id = user_id.unwrap_or("anonymous"),
            "Feed session started"
        );

        handle
    }

    async fn load_profile(&self, user_id: &str) -> UserPreferenceProfile {
        match self.store.get_history(user_id, self.config.history_limit).await {
            Ok(mut events) => {
                // keep the most recent window, oldest first
                if events.len() > self.config.history_limit {
                    events = events.split_off(events.len() - self.config.history_limit);
                }
                self.builder.build_profile(&events)
            }
            Err(e) => {
                warn!(
                    user_id = user_id,
                    "Interaction history unavailable, using empty profile: {}", e
                );
                UserPreferenceProfile::empty()
            }
        }
    }

    /// Replace the session (filter change or explicit reset).
    ///
    /// Seen ids, page and retry counters start over under a new epoch; the
    /// live profile is kept. A load still in flight for the old epoch is
    /// discarded when it completes.
    pub fn reset_session(&self, handle: &SessionHandle, filters: FeedFilters) {
        let mut slot = handle.slot.lock();
        let epoch = slot.session.epoch() + 1;
        let user_id = slot.session.user_id().map(str::to_string);
        slot.session = FeedSession::new(user_id, filters, epoch, self.config.max_retries);

        info!(session_id = %handle.id, epoch = epoch, "Feed session reset");
    }

    pub async fn next_page(&self, handle: &SessionHandle) -> Result<FeedPage> {
        self.next_page_with(handle, PageRequest::default()).await
    }

    /// Deliver the next ranked page.
    ///
    /// Returns an empty page with `has_more = true` when another load for
    /// this session is already in flight, and `has_more = false` only when
    /// the catalog has nothing for the session's filters.
    pub async fn next_page_with(&self, handle: &SessionHandle, request: PageRequest) -> Result<FeedPage> {
        let limit = request.max_items.unwrap_or(self.config.page_size).max(1);

        let (mut ticket, user_id, filters) = {
            let mut slot = handle.slot.lock();
            match slot.session.begin_load(limit) {
                Some(ticket) => (
                    ticket,
                    slot.session.user_id().map(str::to_string),
                    slot.session.filters().clone(),
                ),
                None => {
                    debug!(session_id = %handle.id, "Load already in flight, skipping");
                    return Ok(FeedPage::empty(true));
                }
            }
        };
        let epoch = ticket.epoch;
        let _guard = InFlightGuard {
            slot: handle.slot.clone(),
            epoch,
        };

        let max_attempts = (self.config.max_retries as usize + 1) * 2;
        let mut recycled = false;

        for _ in 0..max_attempts {
            let result = self
                .fetcher
                .fetch(
                    user_id.as_deref(),
                    limit,
                    ticket.offset,
                    &filters,
                    &ticket.exclude_ids,
                )
                .await;

            let (step, snapshot) = {
                let mut slot = handle.slot.lock();
                let step = slot.session.complete_load(&ticket, result);
                (step, slot.session.snapshot())
            };

            match step {
                LoadStep::Deliver(items) => {
                    let (profile, generation) = {
                        let slot = handle.slot.lock();
                        (slot.profile.clone(), slot.session.recycle_generation())
                    };
                    let options = RankOptions {
                        diversity_factor: request
                            .diversity_factor
                            .unwrap_or_else(|| self.config.clamped_diversity_factor()),
                        strategy: request.strategy.unwrap_or_else(|| {
                            RankingStrategy::auto(
                                &profile,
                                self.config.exploration_consecutive_no_threshold,
                            )
                        }),
                    };

                    let ranked: Vec<RankedItem> = rank(items, &profile, options)
                        .into_iter()
                        .enumerate()
                        .map(|(position, scored)| RankedItem {
                            item: scored.item,
                            score: scored.score,
                            position,
                            generation,
                        })
                        .collect();

                    debug!(
                        session_id = %handle.id,
                        page = snapshot.page,
                        generation = generation,
                        delivered = ranked.len(),
                        strategy = options.strategy.as_str(),
                        "Page delivered"
                    );

                    return Ok(FeedPage {
                        items: ranked,
                        has_more: true,
                    });
                }
                LoadStep::Failed(error) => {
                    warn!(session_id = %handle.id, page = snapshot.page, "Page load failed: {}", error);
                    return Err(FeedError::Transport(error));
                }
                LoadStep::Stale => {
                    debug!(session_id = %handle.id, epoch = epoch, "Discarding stale page");
                    return Ok(FeedPage::empty(true));
                }
                LoadStep::Exhausted => {
                    info!(session_id = %handle.id, "Catalog has no items for this session");
                    return Ok(FeedPage::empty(false));
                }
                LoadStep::Retry => {
                    debug!(
                        session_id = %handle.id,
                        state = snapshot.state.as_str(),
                        retry_count = snapshot.retry_count,
                        offset = snapshot.offset,
                        "Empty page, retrying"
                    );
                }
                LoadStep::Recycle => {
                    if recycled {
                        warn!(session_id = %handle.id, "Recycled twice in one load, giving up");
                        return Ok(FeedPage::empty(true));
                    }
                    recycled = true;
                    info!(
                        session_id = %handle.id,
                        state = snapshot.state.as_str(),
                        generation = snapshot.recycle_generation,
                        "Catalog exhausted, recycling seen items"
                    );
                }
            }

            tokio::time::sleep(self.config.retry_delay()).await;

            ticket = match handle.slot.lock().session.next_ticket(epoch, limit) {
                Some(ticket) => ticket,
                None => return Ok(FeedPage::empty(true)),
            };
        }

        warn!(session_id = %handle.id, attempts = max_attempts, "No items after retry budget");
        Ok(FeedPage::empty(true))
    }

    /// Fold a swipe into the live profile and persist it in the background.
    ///
    /// The profile update is synchronous so the next page already reflects
    /// it; the store write never blocks ranking.
    pub fn record_swipe(
        &self,
        handle: &SessionHandle,
        product_id: &str,
        tags: &[String],
        category: Option<&str>,
        kind: InteractionKind,
    ) -> UpdatedProfileSummary {
        let event = InteractionEvent {
            product_id: product_id.to_string(),
            kind,
            tags: tags.to_vec(),
            category: category.map(str::to_string),
            timestamp: Utc::now(),
            response_time_ms: None,
        };

        let (summary, user_id) = {
            let mut slot = handle.slot.lock();
            slot.profile = self.builder.apply_swipe(&slot.profile, &event);
            slot.session.mark_seen(product_id);
            (
                self.builder.summarize(
                    &slot.profile,
                    self.config.exploration_consecutive_no_threshold,
                ),
                slot.session.user_id().map(str::to_string),
            )
        };

        debug!(
            session_id = %handle.id,
            product_id = product_id,
            kind = kind.as_str(),
            consecutive_nos = summary.consecutive_nos,
            "Swipe applied to profile"
        );

        if let Some(user_id) = user_id {
            self.writer.submit(&user_id, event);
        }

        summary
    }
}
