//! Pool facade, tick array loading and routing over an external state store.
//!
//! Everything that may suspend lives here: the swap engine itself is
//! synchronous and only sees tick arrays that were loaded beforehand.

pub mod cache_provider;
pub mod error;
pub mod locator;
pub mod memory;
pub mod pool;
pub mod prelude;
pub mod router;

use async_trait::async_trait;
use clmm_quote_domain::address::Address;
use clmm_quote_domain::pool::PoolState;
use clmm_quote_domain::tick::TickArray;
use error::StoreError;

/// Source of authoritative pool and tick array state.
#[async_trait]
pub trait StateStore: Send + Sync {
    async fn fetch_pool_state(&self, pool: &Address) -> Result<PoolState, StoreError>;

    async fn fetch_tick_array(
        &self,
        address: &Address,
        start_index: i32,
    ) -> Result<TickArray, StoreError>;
}
