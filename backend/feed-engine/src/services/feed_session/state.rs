// ============================================
// Feed Session State Machine
// ============================================
//
//   Idle ──begin──▶ Loading ──new items──▶ Ready ──begin──▶ Loading ...
//                      │
//                      ├─ full page, nothing new ─▶ ExhaustedRetry ─(max_retries)─▶ Recycling ─▶ Ready
//                      ├─ short page, nothing new ─▶ Recycling ─▶ Ready
//                      └─ nothing at all, nothing seen ─▶ Exhausted
//
// Transitions are pure and synchronous; the engine drives I/O and delays.
// Every transition that completes a fetch checks the ticket epoch first so
// results from a replaced session are dropped untouched.

use crate::models::{CandidateItem, FeedFilters};
use crate::services::recall::FetchResult;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Loading,
    Ready,
    ExhaustedRetry,
    Recycling,
    /// Catalog returned nothing even with an empty exclusion set
    Exhausted,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Loading => "loading",
            SessionState::Ready => "ready",
            SessionState::ExhaustedRetry => "exhausted_retry",
            SessionState::Recycling => "recycling",
            SessionState::Exhausted => "exhausted",
        }
    }
}

/// Parameters of one fetch issued on behalf of a session
#[derive(Debug, Clone)]
pub struct LoadTicket {
    pub epoch: u64,
    pub offset: usize,
    pub limit: usize,
    pub exclude_ids: Vec<String>,
}

/// What the engine must do after a fetch completes
#[derive(Debug, Clone, PartialEq)]
pub enum LoadStep {
    /// New, never-seen items; already recorded in `seen_ids`
    Deliver(Vec<CandidateItem>),
    /// Nothing new on a full page; fetch again at the advanced offset
    Retry,
    /// Exclusion set cleared; fetch again from offset 0
    Recycle,
    /// Nothing to show at all
    Exhausted,
    Failed(String),
    /// Session was replaced while the fetch was in flight
    Stale,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub epoch: u64,
    pub state: SessionState,
    pub page: u32,
    pub retry_count: u32,
    pub recycle_generation: u32,
    pub seen_count: usize,
    pub offset: usize,
    pub exhausted: bool,
    pub in_flight: bool,
}

/// One continuous browsing pass
#[derive(Debug, Clone)]
pub struct FeedSession {
    user_id: Option<String>,
    filters: FeedFilters,
    epoch: u64,
    state: SessionState,
    /// Grows within a generation, cleared on recycle
    seen_ids: HashSet<String>,
    page: u32,
    retry_count: u32,
    recycle_generation: u32,
    exhausted: bool,
    offset: usize,
    /// Furthest catalog position read this generation
    read_until: usize,
    /// Adapter returned ids it was told to exclude; it pages the unfiltered list
    ignores_exclusion: bool,
    in_flight: bool,
    max_retries: u32,
}

impl FeedSession {
    pub fn new(user_id: Option<String>, filters: FeedFilters, epoch: u64, max_retries: u32) -> Self {
        Self {
            user_id,
            filters,
            epoch,
            state: SessionState::Idle,
            seen_ids: HashSet::new(),
            page: 0,
            retry_count: 0,
            recycle_generation: 0,
            exhausted: false,
            offset: 0,
            read_until: 0,
            ignores_exclusion: false,
            in_flight: false,
            max_retries: max_retries.max(1),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn filters(&self) -> &FeedFilters {
        &self.filters
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn recycle_generation(&self) -> u32 {
        self.recycle_generation
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn ignores_exclusion(&self) -> bool {
        self.ignores_exclusion
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    pub fn has_seen(&self, id: &str) -> bool {
        self.seen_ids.contains(id)
    }

    pub fn seen_count(&self) -> usize {
        self.seen_ids.len()
    }

    pub fn mark_seen(&mut self, id: &str) {
        self.seen_ids.insert(id.to_string());
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            epoch: self.epoch,
            state: self.state,
            page: self.page,
            retry_count: self.retry_count,
            recycle_generation: self.recycle_generation,
            seen_count: self.seen_ids.len(),
            offset: self.offset,
            exhausted: self.exhausted,
            in_flight: self.in_flight,
        }
    }

    /// Start a page load. `None` when one is already in flight.
    pub fn begin_load(&mut self, limit: usize) -> Option<LoadTicket> {
        if self.in_flight {
            return None;
        }

        if self.state == SessionState::Exhausted {
            self.offset = 0;
            self.read_until = 0;
            self.retry_count = 0;
        }

        self.in_flight = true;
        self.state = SessionState::Loading;
        Some(self.ticket(limit))
    }

    /// Follow-up fetch within the same load (retry or post-recycle).
    pub fn next_ticket(&self, epoch: u64, limit: usize) -> Option<LoadTicket> {
        if epoch != self.epoch || !self.in_flight {
            return None;
        }
        Some(self.ticket(limit))
    }

    fn ticket(&self, limit: usize) -> LoadTicket {
        let mut exclude_ids: Vec<String> = self.seen_ids.iter().cloned().collect();
        exclude_ids.sort_unstable();

        LoadTicket {
            epoch: self.epoch,
            offset: self.offset,
            limit,
            exclude_ids,
        }
    }

    /// Fold a fetch result into the session and decide the next step.
    pub fn complete_load(&mut self, ticket: &LoadTicket, result: FetchResult) -> LoadStep {
        if ticket.epoch != self.epoch {
            return LoadStep::Stale;
        }

        if !result.success {
            self.state = self.settled_state();
            return LoadStep::Failed(
                result
                    .error
                    .unwrap_or_else(|| "catalog query failed".to_string()),
            );
        }

        // Re-check exclusion: adapters are not trusted to honor it, and a
        // single response may repeat an id.
        let mut fresh: Vec<CandidateItem> = Vec::with_capacity(result.items.len());
        let mut in_response: HashSet<String> = HashSet::new();
        let mut returned_excluded = false;
        for item in result.items {
            if ticket.exclude_ids.binary_search(&item.id).is_ok() {
                returned_excluded = true;
            }
            if self.seen_ids.contains(&item.id) || !in_response.insert(item.id.clone()) {
                continue;
            }
            fresh.push(item);
        }

        let newly_detected = returned_excluded && !self.ignores_exclusion;
        if newly_detected {
            self.ignores_exclusion = true;
        }

        self.read_until = self.read_until.max(ticket.offset + result.raw_count);
        let undelivered = fresh.len().saturating_sub(ticket.limit);
        if self.ignores_exclusion {
            // Offsets index the unfiltered list: skip everything read so far.
            self.offset = self.read_until.saturating_sub(undelivered);
        } else {
            // Offsets index the filtered list: step over only what was skipped.
            self.offset += result.raw_count.saturating_sub(fresh.len());
        }

        if !fresh.is_empty() {
            fresh.truncate(ticket.limit);
            for item in &fresh {
                self.seen_ids.insert(item.id.clone());
            }
            self.page += 1;
            self.retry_count = 0;
            self.exhausted = false;
            self.state = SessionState::Ready;
            return LoadStep::Deliver(fresh);
        }

        if result.raw_count >= ticket.limit {
            if newly_detected {
                // a re-read of delivered items, not a sign the catalog ran dry
                self.state = SessionState::ExhaustedRetry;
                return LoadStep::Retry;
            }
            self.retry_count += 1;
            if self.retry_count >= self.max_retries {
                self.recycle();
                return LoadStep::Recycle;
            }
            self.state = SessionState::ExhaustedRetry;
            return LoadStep::Retry;
        }

        if self.seen_ids.is_empty() {
            self.exhausted = true;
            self.state = SessionState::Exhausted;
            return LoadStep::Exhausted;
        }

        self.recycle();
        LoadStep::Recycle
    }

    fn recycle(&mut self) {
        self.seen_ids.clear();
        self.recycle_generation += 1;
        self.retry_count = 0;
        self.offset = 0;
        self.read_until = 0;
        self.exhausted = false;
        self.state = SessionState::Recycling;
    }

    /// Release the in-flight flag taken by `begin_load`.
    pub fn finish_load(&mut self, epoch: u64) {
        if epoch != self.epoch {
            return;
        }
        self.in_flight = false;
        if matches!(
            self.state,
            SessionState::Loading | SessionState::ExhaustedRetry | SessionState::Recycling
        ) {
            self.state = self.settled_state();
        }
    }

    fn settled_state(&self) -> SessionState {
        if self.page == 0 {
            SessionState::Idle
        } else {
            SessionState::Ready
        }
    }
}
