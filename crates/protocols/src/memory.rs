//! Map-backed [`StateStore`] for tests, fixtures and offline quoting.

use crate::StateStore;
use crate::error::StoreError;
use crate::locator::TickArrayLocator;
use async_trait::async_trait;
use clmm_quote_domain::address::Address;
use clmm_quote_domain::error::Result as ClmmResult;
use clmm_quote_domain::pool::PoolState;
use clmm_quote_domain::tick::{Tick, TickArray, tick_array_start_index};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// A pool snapshot with its initialized ticks, as stored in JSON fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolFixture {
    pub address: Address,
    pub state: PoolState,
    /// Initialized ticks; arrays are derived from them.
    #[serde(default)]
    pub ticks: Vec<Tick>,
}

impl PoolFixture {
    /// Parses a JSON array of fixtures.
    pub fn parse_list(json: &str) -> serde_json::Result<Vec<Self>> {
        serde_json::from_str(json)
    }

    /// Groups the fixture's ticks into tick arrays addressed by `locator`.
    pub fn tick_arrays(&self, locator: &dyn TickArrayLocator) -> ClmmResult<Vec<TickArray>> {
        let spacing = self.state.tick_spacing;
        let mut by_start: BTreeMap<i32, Vec<Tick>> = BTreeMap::new();
        for tick in &self.ticks {
            by_start
                .entry(tick_array_start_index(tick.tick, spacing)?)
                .or_default()
                .push(*tick);
        }
        by_start
            .into_iter()
            .map(|(start, ticks)| {
                let address = locator.tick_array_address(&self.address, start);
                TickArray::from_initialized(address, start, spacing, ticks)
            })
            .collect()
    }
}

/// In-memory state store.
#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    pools: RwLock<HashMap<Address, PoolState>>,
    tick_arrays: RwLock<HashMap<Address, TickArray>>,
    offline: AtomicBool,
}

impl InMemoryStateStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store holding every fixture's pool and tick arrays.
    pub fn from_fixtures<'a>(
        fixtures: impl IntoIterator<Item = &'a PoolFixture>,
        locator: &dyn TickArrayLocator,
    ) -> ClmmResult<Self> {
        let mut pools = HashMap::new();
        let mut tick_arrays = HashMap::new();
        for fixture in fixtures {
            fixture.state.validate()?;
            pools.insert(fixture.address, fixture.state.clone());
            for array in fixture.tick_arrays(locator)? {
                tick_arrays.insert(array.address(), array);
            }
        }
        Ok(Self {
            pools: RwLock::new(pools),
            tick_arrays: RwLock::new(tick_arrays),
            offline: AtomicBool::new(false),
        })
    }

    /// Replaces the stored state of `pool`.
    pub async fn insert_pool(&self, pool: Address, state: PoolState) {
        self.pools.write().await.insert(pool, state);
    }

    /// Stores `array` under its own address.
    pub async fn insert_tick_array(&self, array: TickArray) {
        self.tick_arrays.write().await.insert(array.address(), array);
    }

    /// Makes every fetch fail with [`StoreError::Network`] while set.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Network("store is offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn fetch_pool_state(&self, pool: &Address) -> Result<PoolState, StoreError> {
        self.check_online()?;
        self.pools
            .read()
            .await
            .get(pool)
            .cloned()
            .ok_or(StoreError::NotFound { address: *pool })
    }

    async fn fetch_tick_array(
        &self,
        address: &Address,
        start_index: i32,
    ) -> Result<TickArray, StoreError> {
        self.check_online()?;
        let array = self
            .tick_arrays
            .read()
            .await
            .get(address)
            .cloned()
            .ok_or(StoreError::NotFound { address: *address })?;
        debug!(address = %address, start_index, "Fetched tick array");
        Ok(array)
    }
}
