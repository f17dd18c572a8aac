use crate::analysis::bucketing::{anchor_date, bucket};
use crate::commands::cache::ContributionCache;
use crate::commands::db::{KeyValueStore, HANDLE_KEY};
use crate::commands::fetch::SubmissionSource;
use crate::models::grid::ContributionGrid;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GridSource {
    /// Fetched and bucketed just now.
    Fresh,
    /// Fetch failed, last good grid served instead.
    Cached,
    /// Fetch failed and nothing usable was cached.
    Empty,
}

impl GridSource {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fresh => "fresh",
            Self::Cached => "cached",
            Self::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshOutcome {
    pub handle: String,
    pub grid: ContributionGrid,
    pub source: GridSource,
    pub refreshed_at: DateTime<Utc>,
}

/// Owns the active handle and decides between fresh, cached and empty grids.
///
/// Refreshes are serialized: the async mutex is held across fetch and cache write, and it
/// hands out the lock in request order, so refreshes finish in the order they started.
pub struct RefreshCoordinator {
    source: Arc<dyn SubmissionSource>,
    store: Arc<dyn KeyValueStore>,
    cache: ContributionCache,
    cache_enabled: bool,
    clock: Clock,
    handle: Mutex<Option<String>>,
    latest: Mutex<Option<RefreshOutcome>>,
    in_flight: tokio::sync::Mutex<()>,
}

impl RefreshCoordinator {
    pub fn new(
        source: Arc<dyn SubmissionSource>,
        store: Arc<dyn KeyValueStore>,
        cache_enabled: bool,
    ) -> Self {
        let stored_handle = match store.get(HANDLE_KEY) {
            Ok(handle) => handle.filter(|h| !h.trim().is_empty()),
            Err(err) => {
                log::warn!("Could not read stored handle: {err}");
                None
            }
        };

        Self {
            source,
            cache: ContributionCache::new(store.clone()),
            store,
            cache_enabled,
            clock: Arc::new(Utc::now),
            handle: Mutex::new(stored_handle),
            latest: Mutex::new(None),
            in_flight: tokio::sync::Mutex::new(()),
        }
    }

    /// Replaces the wall clock, mainly so tests can pin "today".
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn cache(&self) -> &ContributionCache {
        &self.cache
    }

    pub fn handle(&self) -> Option<String> {
        self.handle.lock().ok().and_then(|lock| lock.clone())
    }

    /// Stores `handle` as the active one. Blank input is ignored and reported as `false`.
    pub fn set_handle(&self, handle: &str) -> bool {
        let handle = handle.trim();
        if handle.is_empty() {
            return false;
        }

        if let Err(err) = self.store.set(HANDLE_KEY, handle) {
            log::warn!("Could not persist handle {handle}: {err}");
        }
        if let Ok(mut lock) = self.handle.lock() {
            if lock.as_deref() != Some(handle) {
                log::info!("Active handle is now {handle}");
            }
            *lock = Some(handle.to_string());
        }
        true
    }

    /// Forgets the handle together with its cached grid.
    pub async fn clear_handle(&self) -> Result<(), String> {
        let _guard = self.in_flight.lock().await;

        self.store.clear(HANDLE_KEY)?;
        self.cache.clear().map_err(|e| e.to_string())?;

        if let Ok(mut lock) = self.handle.lock() {
            *lock = None;
        }
        if let Ok(mut lock) = self.latest.lock() {
            *lock = None;
        }
        Ok(())
    }

    /// Outcome of the most recent refresh in this process.
    pub fn current_grid(&self) -> Option<RefreshOutcome> {
        self.latest.lock().ok().and_then(|lock| lock.clone())
    }

    /// Refreshes whatever handle is currently stored. `None` if there is none.
    pub async fn refresh_stored(&self) -> Option<RefreshOutcome> {
        let handle = self.handle()?;
        self.refresh(&handle).await
    }

    /// Fetches, buckets and caches the grid for `handle`, falling back to the cache (or an
    /// empty grid) on any fetch failure. Never fails; a blank handle is a no-op.
    pub async fn refresh(&self, handle: &str) -> Option<RefreshOutcome> {
        let handle = handle.trim();
        if handle.is_empty() {
            log::debug!("No handle stored; nothing to refresh");
            return None;
        }

        // Stored under the guard so the active handle follows lock order.
        let _guard = self.in_flight.lock().await;
        self.set_handle(handle);
        let outcome = self.refresh_locked(handle).await;

        log::info!(
            "Contributions for {} are {} ({} accepted in window)",
            outcome.handle,
            outcome.source.as_str(),
            outcome.grid.total()
        );

        if let Ok(mut lock) = self.latest.lock() {
            *lock = Some(outcome.clone());
        }
        Some(outcome)
    }

    async fn refresh_locked(&self, handle: &str) -> RefreshOutcome {
        let now = (self.clock)();

        let (grid, source) = match self.source.fetch_submissions(handle).await {
            Ok(submissions) => {
                let grid = bucket(&submissions, anchor_date(now));
                self.persist(handle, &grid);
                (grid, GridSource::Fresh)
            }
            Err(err) => {
                log::warn!("Fetching submissions for {handle} failed: {err}");
                match self.cached_grid() {
                    Some(grid) => (grid, GridSource::Cached),
                    None => (ContributionGrid::empty(), GridSource::Empty),
                }
            }
        };

        RefreshOutcome {
            handle: handle.to_string(),
            grid,
            source,
            refreshed_at: now,
        }
    }

    fn persist(&self, handle: &str, grid: &ContributionGrid) {
        if !self.cache_enabled {
            return;
        }
        if let Err(err) = self.cache.save(grid) {
            log::warn!("Could not cache contributions for {handle}: {err}");
        }
    }

    /// Last good grid, or `None` when caching is off or nothing usable is stored.
    pub fn cached_grid(&self) -> Option<ContributionGrid> {
        if !self.cache_enabled {
            return None;
        }

        let grid = self.cache.load();
        if grid.is_none() {
            log::info!("No cached contributions available");
        }
        grid
    }
}
