//! Errors raised by pool loading and quoting.

use clmm_quote_domain::address::Address;
use clmm_quote_domain::error::ClmmError;
use thiserror::Error;

/// Failures reported by a [`crate::StateStore`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The account does not exist.
    #[error("account {address} not found")]
    NotFound {
        /// Requested account.
        address: Address,
    },
    /// The store could not be reached or returned garbage.
    #[error("state store error: {0}")]
    Network(String),
}

/// Errors returned by [`crate::pool::AmmPool`] and the router.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// Math, cache or validation failure.
    #[error(transparent)]
    Clmm(#[from] ClmmError),
    /// State store failure, passed through unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Rejected configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PoolError {
    /// Returns true when the caching phase must run again before retrying.
    #[must_use]
    pub fn is_cache_miss(&self) -> bool {
        matches!(self, PoolError::Clmm(err) if err.is_cache_miss())
    }
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, PoolError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_core_errors_transparently() {
        let err: PoolError = ClmmError::ChunkNotCached { start_index: 600 }.into();
        assert!(err.is_cache_miss());
        assert_eq!(err.to_string(), "tick array starting at 600 is not cached");
    }

    #[test]
    fn test_store_errors_pass_through() {
        let err: PoolError = StoreError::Network("timeout".to_string()).into();
        assert!(!err.is_cache_miss());
        assert_eq!(err, PoolError::Store(StoreError::Network("timeout".to_string())));
    }
}
