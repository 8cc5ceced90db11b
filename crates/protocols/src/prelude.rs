//! Prelude module for convenient imports.
//!
//! # Example
//!
//! ```rust
//! use clmm_quote_protocols::prelude::*;
//! ```

pub use crate::StateStore;
pub use crate::cache_provider::{CacheConfig, CacheDataProvider, MAX_PREFETCH_RADIUS};
pub use crate::error::{PoolError, StoreError};
pub use crate::locator::{SeedLocator, TickArrayLocator};
pub use crate::memory::{InMemoryStateStore, PoolFixture};
pub use crate::pool::{AmmPool, Quote};
pub use crate::router::{HopQuote, RouteQuote, quote_route_exact_input};
