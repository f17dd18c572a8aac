use crate::commands::db::{KeyValueStore, CACHED_GRID_KEY};
use crate::models::grid::ContributionGrid;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CacheError {
    #[error("no cached contributions")]
    Miss,
    #[error("cached contributions are unreadable: {0}")]
    Corrupt(String),
    #[error("cache storage error: {0}")]
    Storage(String),
}

/// Last good grid, stored as a JSON array of 7 row arrays under a single key.
#[derive(Clone)]
pub struct ContributionCache {
    store: Arc<dyn KeyValueStore>,
}

impl ContributionCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn save(&self, grid: &ContributionGrid) -> Result<(), CacheError> {
        let raw = serde_json::to_string(grid.rows())
            .map_err(|e| CacheError::Storage(format!("Failed to serialize grid: {e}")))?;
        // Single upsert: the previous entry is replaced whole.
        self.store
            .set(CACHED_GRID_KEY, &raw)
            .map_err(CacheError::Storage)
    }

    pub fn try_load(&self) -> Result<ContributionGrid, CacheError> {
        let raw = self
            .store
            .get(CACHED_GRID_KEY)
            .map_err(CacheError::Storage)?
            .ok_or(CacheError::Miss)?;

        let rows: Vec<Vec<u32>> =
            serde_json::from_str(&raw).map_err(|e| CacheError::Corrupt(e.to_string()))?;
        ContributionGrid::from_rows(&rows).map_err(CacheError::Corrupt)
    }

    /// Cached grid, or `None` when nothing usable is stored.
    pub fn load(&self) -> Option<ContributionGrid> {
        match self.try_load() {
            Ok(grid) => Some(grid),
            Err(CacheError::Miss) => None,
            Err(err) => {
                log::warn!("Ignoring cached contributions: {err}");
                None
            }
        }
    }

    pub fn clear(&self) -> Result<(), CacheError> {
        self.store
            .clear(CACHED_GRID_KEY)
            .map_err(CacheError::Storage)
    }
}
