//! Error taxonomy shared by the math, directory and swap layers.

use thiserror::Error;

/// Errors raised by the concentrated-liquidity core.
///
/// Every variant carries the inputs that triggered it so callers can surface
/// them unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClmmError {
    /// Tick outside `[MIN_TICK, MAX_TICK]`.
    #[error("tick {tick} out of range [{min}, {max}]")]
    TickOutOfRange {
        /// Offending tick.
        tick: i32,
        /// Lower bound.
        min: i32,
        /// Upper bound.
        max: i32,
    },

    /// Square-root price outside `[MIN_SQRT_PRICE_X64, MAX_SQRT_PRICE_X64]`.
    #[error("sqrt price {sqrt_price_x64} out of range [{min}, {max}]")]
    SqrtPriceOutOfRange {
        /// Offending price.
        sqrt_price_x64: u128,
        /// Lower bound.
        min: u128,
        /// Upper bound.
        max: u128,
    },

    /// Decimal price that cannot be represented in the 64.64 domain.
    #[error("price {price} cannot be represented as a sqrt price")]
    PriceOutOfRange {
        /// Offending price, formatted.
        price: String,
    },

    /// Swap parameters rejected before the loop starts.
    #[error("invalid swap parameters: {reason}")]
    InvalidSwapParameters {
        /// What was wrong.
        reason: String,
    },

    /// Price limit on the wrong side of the current price or outside the domain.
    #[error(
        "invalid price limit {limit} for {direction} swap at sqrt price {current}"
    )]
    InvalidPriceLimit {
        /// Requested limit.
        limit: u128,
        /// Current pool price.
        current: u128,
        /// Trade direction label.
        direction: &'static str,
    },

    /// Active liquidity would become negative.
    #[error("liquidity underflow: {liquidity} + ({delta})")]
    LiquidityUnderflow {
        /// Liquidity before the delta.
        liquidity: u128,
        /// Signed delta.
        delta: i128,
    },

    /// Active liquidity would exceed `u128::MAX`.
    #[error("liquidity overflow: {liquidity} + {delta}")]
    LiquidityOverflow {
        /// Liquidity before the delta.
        liquidity: u128,
        /// Signed delta.
        delta: i128,
    },

    /// A tick array needed by the lookup was never loaded into the cache.
    #[error("tick array starting at {start_index} is not cached")]
    ChunkNotCached {
        /// Start index of the missing array.
        start_index: i32,
    },

    /// The array owning a tick was never loaded into the cache.
    #[error("tick {tick} is not cached (array {start_index})")]
    TickNotCached {
        /// Requested tick.
        tick: i32,
        /// Start index of the array that would own it.
        start_index: i32,
    },

    /// The swap loop hit its step cap before finishing.
    #[error("swap exceeded {max_steps} steps with {amount_remaining} left at tick {tick}")]
    StepLimitExceeded {
        /// Configured cap.
        max_steps: usize,
        /// Unfilled amount when the cap was hit.
        amount_remaining: u128,
        /// Tick reached when the cap was hit.
        tick: i32,
    },

    /// Mint is neither of the pool's tokens.
    #[error("mint {mint} is not part of pool {pool}")]
    UnknownMint {
        /// Requested mint.
        mint: String,
        /// Pool address.
        pool: String,
    },

    /// Price update requested against empty liquidity.
    #[error("cannot move sqrt price {sqrt_price_x64} with zero liquidity")]
    ZeroLiquidity {
        /// Price at which the update was requested.
        sqrt_price_x64: u128,
    },

    /// Token amount does not fit in 128 bits.
    #[error("token amount overflow")]
    AmountOverflow,

    /// Price update left the representable range.
    #[error("sqrt price overflow from {sqrt_price_x64} with amount {amount}")]
    PriceOverflow {
        /// Starting price.
        sqrt_price_x64: u128,
        /// Amount being applied.
        amount: u128,
    },

    /// Pool snapshot violates one of its invariants.
    #[error("invalid pool state: {reason}")]
    InvalidPoolState {
        /// Violated invariant.
        reason: String,
    },

    /// Tick array content does not match its declared layout.
    #[error("invalid tick array at {start_index}: {reason}")]
    InvalidTickArray {
        /// Declared start index.
        start_index: i32,
        /// Layout problem.
        reason: String,
    },
}

impl ClmmError {
    /// Returns true for the errors that mean "run the caching phase again".
    #[must_use]
    pub fn is_cache_miss(&self) -> bool {
        matches!(
            self,
            ClmmError::ChunkNotCached { .. } | ClmmError::TickNotCached { .. }
        )
    }
}

/// Result alias for the core.
pub type Result<T> = std::result::Result<T, ClmmError>;
