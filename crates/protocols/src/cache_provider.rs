//! Loading tick arrays from a [`StateStore`] ahead of a swap.
//!
//! The engine never performs I/O. Before quoting, the provider fetches the
//! array containing the current tick plus `prefetch_radius` neighbours on
//! each side (and the array just below when the tick opens its array) and
//! keeps them in a [`TickArrayCache`]. A swap that walks past
//! the loaded window fails with a cache miss and the caller reloads.

use crate::StateStore;
use crate::error::{PoolError, Result, StoreError};
use crate::locator::TickArrayLocator;
use clmm_quote_domain::address::Address;
use clmm_quote_domain::error::{ClmmError, Result as ClmmResult};
use clmm_quote_domain::math::tick_math::{MAX_TICK, MIN_TICK};
use clmm_quote_domain::tick::{TickArray, tick_array_start_index, ticks_in_array};
use clmm_quote_simulation::tick_directory::{TickArrayCache, TickDirectory};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Largest accepted prefetch radius, a window of 15 arrays.
pub const MAX_PREFETCH_RADIUS: u8 = 7;

/// Cache loading configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Arrays fetched on each side of the current one.
    pub prefetch_radius: u8,
}

impl CacheConfig {
    /// Sets the prefetch radius.
    #[must_use]
    pub fn with_prefetch_radius(mut self, prefetch_radius: u8) -> Self {
        self.prefetch_radius = prefetch_radius;
        self
    }

    /// Rejects a radius above [`MAX_PREFETCH_RADIUS`].
    pub fn validate(&self) -> Result<()> {
        if self.prefetch_radius > MAX_PREFETCH_RADIUS {
            return Err(PoolError::InvalidConfig(format!(
                "prefetch radius {} exceeds {}",
                self.prefetch_radius, MAX_PREFETCH_RADIUS
            )));
        }
        Ok(())
    }

    /// Start indices of the window around `tick`, clamped to the tick domain.
    ///
    /// The array holding `tick - 1` is always part of the window: a swap
    /// towards lower prices from an array's first tick steps into it
    /// immediately.
    ///
    /// # Errors
    /// [`ClmmError::InvalidSwapParameters`] when `tick_spacing` is zero.
    pub fn window(&self, tick: i32, tick_spacing: u16) -> Result<Vec<i32>> {
        let span = ticks_in_array(tick_spacing);
        let centre = tick_array_start_index(tick, tick_spacing)?;
        let below = tick_array_start_index(tick.saturating_sub(1), tick_spacing)?;
        let lowest = tick_array_start_index(MIN_TICK, tick_spacing)?;
        let highest = tick_array_start_index(MAX_TICK, tick_spacing)?;
        let radius = i32::from(self.prefetch_radius);
        let mut starts: Vec<i32> = (-radius..=radius)
            .map(|offset| centre + offset * span)
            .collect();
        if !starts.contains(&below) {
            starts.insert(0, below);
        }
        Ok(starts
            .into_iter()
            .filter(|start| (lowest..=highest).contains(start))
            .collect())
    }
}

/// Tick arrays of one pool, fetched from a state store.
pub struct CacheDataProvider {
    pool: Address,
    locator: Arc<dyn TickArrayLocator>,
    store: Arc<dyn StateStore>,
    config: CacheConfig,
    cache: TickArrayCache,
}

impl std::fmt::Debug for CacheDataProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheDataProvider")
            .field("pool", &self.pool)
            .field("config", &self.config)
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl CacheDataProvider {
    /// Creates a provider with an empty cache.
    ///
    /// # Errors
    /// [`PoolError::InvalidConfig`] when the configuration is rejected.
    pub fn new(
        pool: Address,
        locator: Arc<dyn TickArrayLocator>,
        store: Arc<dyn StateStore>,
        config: CacheConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pool,
            locator,
            store,
            config,
            cache: TickArrayCache::new(),
        })
    }

    #[must_use]
    pub fn pool(&self) -> Address {
        self.pool
    }

    #[must_use]
    pub fn config(&self) -> CacheConfig {
        self.config
    }

    #[must_use]
    pub fn cache(&self) -> &TickArrayCache {
        &self.cache
    }

    pub(crate) fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    /// Replaces the cache with the window around `tick`.
    ///
    /// On error the previous cache is left untouched.
    pub async fn load_tick_array_cache(&mut self, tick: i32, tick_spacing: u16) -> Result<()> {
        let cache = self.fetch_window(tick, tick_spacing).await?;
        self.install(cache);
        Ok(())
    }

    /// Fetches the window around `tick` without touching the current cache.
    ///
    /// Arrays the store does not know are cached empty. Any other store
    /// failure aborts the load.
    pub async fn fetch_window(&self, tick: i32, tick_spacing: u16) -> Result<TickArrayCache> {
        let window = self.config.window(tick, tick_spacing)?;
        let mut cache = TickArrayCache::new();
        for start_index in &window {
            let address = self.locator.tick_array_address(&self.pool, *start_index);
            let array = match self.store.fetch_tick_array(&address, *start_index).await {
                Ok(array) => {
                    check_fetched(&array, *start_index, tick_spacing)?;
                    array
                }
                Err(StoreError::NotFound { .. }) => {
                    warn!(
                        pool = %self.pool,
                        start_index,
                        address = %address,
                        "Tick array not found, caching it empty"
                    );
                    TickArray::empty(address, *start_index, tick_spacing)?
                }
                Err(err) => return Err(err.into()),
            };
            cache.insert(array);
        }
        info!(
            pool = %self.pool,
            tick,
            arrays = cache.len(),
            initialized = cache.initialized_tick_count(),
            "Loaded tick array cache"
        );
        Ok(cache)
    }

    pub(crate) fn install(&mut self, cache: TickArrayCache) {
        self.cache = cache;
    }
}

fn check_fetched(array: &TickArray, start_index: i32, tick_spacing: u16) -> Result<()> {
    if array.start_index() != start_index || array.tick_spacing() != tick_spacing {
        return Err(ClmmError::InvalidTickArray {
            start_index,
            reason: format!(
                "store returned array at {} with spacing {}",
                array.start_index(),
                array.tick_spacing()
            ),
        }
        .into());
    }
    Ok(())
}

impl TickDirectory for CacheDataProvider {
    fn tick_array(&self, start_index: i32) -> ClmmResult<&TickArray> {
        self.cache.tick_array(start_index)
    }
}
