//! Swap configuration, running state and results.
//!
//! [`SwapParams`] captures everything the engine needs from a pool snapshot
//! plus the trade itself. [`SwapState`] is threaded through the step loop
//! and [`SwapResult`] is what remains once the loop terminates.

use clmm_quote_domain::error::{ClmmError, Result};
use clmm_quote_domain::fees::is_valid_fee_rate;
use clmm_quote_domain::math::tick_math::{MAX_SQRT_PRICE_X64, MIN_SQRT_PRICE_X64, is_valid_sqrt_price};
use clmm_quote_domain::pool::PoolState;
use clmm_quote_domain::tick::TickArrayRef;
use serde::{Deserialize, Serialize};

/// Step cap applied when none is configured.
pub const DEFAULT_MAX_SWAP_STEPS: usize = 10;

/// Which token is sold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapDirection {
    /// Sell token0 for token1; the price decreases.
    ZeroForOne,
    /// Sell token1 for token0; the price increases.
    OneForZero,
}

impl SwapDirection {
    #[must_use]
    pub fn is_zero_for_one(self) -> bool {
        matches!(self, SwapDirection::ZeroForOne)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SwapDirection::ZeroForOne => "zero_for_one",
            SwapDirection::OneForZero => "one_for_zero",
        }
    }
}

/// The side of the trade fixed by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapAmount {
    /// Spend exactly this much input, fees included.
    ExactInput(u128),
    /// Receive exactly this much output.
    ExactOutput(u128),
}

impl SwapAmount {
    #[must_use]
    pub fn value(self) -> u128 {
        match self {
            SwapAmount::ExactInput(amount) | SwapAmount::ExactOutput(amount) => amount,
        }
    }

    #[must_use]
    pub fn is_exact_input(self) -> bool {
        matches!(self, SwapAmount::ExactInput(_))
    }
}

/// Input of one swap simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapParams {
    pub direction: SwapDirection,
    pub amount: SwapAmount,
    /// Fee in parts per million.
    pub fee_rate: u32,
    /// Active liquidity at the starting price.
    pub liquidity: u128,
    pub tick_current: i32,
    pub tick_spacing: u16,
    /// Starting 64.64 square-root price.
    pub sqrt_price_x64: u128,
    /// Price at which the swap stops; defaults to one unit inside the domain.
    pub sqrt_price_limit_x64: Option<u128>,
    /// Maximum number of steps before the swap fails.
    pub max_steps: usize,
}

impl SwapParams {
    /// Creates parameters for a swap against `pool`.
    #[must_use]
    pub fn from_pool(pool: &PoolState, direction: SwapDirection, amount: SwapAmount) -> Self {
        Self {
            direction,
            amount,
            fee_rate: pool.fee_rate,
            liquidity: pool.liquidity,
            tick_current: pool.tick,
            tick_spacing: pool.tick_spacing,
            sqrt_price_x64: pool.sqrt_price_x64,
            sqrt_price_limit_x64: None,
            max_steps: DEFAULT_MAX_SWAP_STEPS,
        }
    }

    /// Sets the price limit.
    #[must_use]
    pub fn with_price_limit(mut self, sqrt_price_limit_x64: Option<u128>) -> Self {
        self.sqrt_price_limit_x64 = sqrt_price_limit_x64;
        self
    }

    /// Sets the step cap.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Checks the parameters and returns the effective price limit.
    ///
    /// # Errors
    /// [`ClmmError::InvalidSwapParameters`] for a zero amount, fee rate,
    /// spacing or starting price out of range, and
    /// [`ClmmError::InvalidPriceLimit`] for a limit behind the current
    /// price or on the domain edge.
    pub fn validate(&self) -> Result<u128> {
        let invalid = |reason: String| Err(ClmmError::InvalidSwapParameters { reason });
        if self.amount.value() == 0 {
            return invalid("amount must be non-zero".to_string());
        }
        if !is_valid_fee_rate(self.fee_rate) {
            return invalid(format!("fee rate {} out of range", self.fee_rate));
        }
        if self.tick_spacing == 0 {
            return invalid("tick spacing must be positive".to_string());
        }
        if !is_valid_sqrt_price(self.sqrt_price_x64) {
            return invalid(format!("sqrt price {} out of range", self.sqrt_price_x64));
        }

        let current = self.sqrt_price_x64;
        let limit = match (self.sqrt_price_limit_x64, self.direction) {
            (Some(limit), _) => limit,
            (None, SwapDirection::ZeroForOne) => MIN_SQRT_PRICE_X64 + 1,
            (None, SwapDirection::OneForZero) => MAX_SQRT_PRICE_X64 - 1,
        };
        let in_range = match self.direction {
            SwapDirection::ZeroForOne => limit > MIN_SQRT_PRICE_X64 && limit <= current,
            SwapDirection::OneForZero => limit >= current && limit < MAX_SQRT_PRICE_X64,
        };
        if !in_range {
            return Err(ClmmError::InvalidPriceLimit {
                limit,
                current,
                direction: self.direction.label(),
            });
        }
        Ok(limit)
    }
}

/// Values threaded through the step loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapState {
    /// Specified amount not yet filled.
    pub amount_remaining: u128,
    /// Amount accumulated on the other side of the trade.
    pub amount_calculated: u128,
    pub sqrt_price_x64: u128,
    pub tick: i32,
    pub liquidity: u128,
    pub steps: usize,
}

impl SwapState {
    /// Initial state for `params`.
    #[must_use]
    pub fn new(params: &SwapParams) -> Self {
        Self {
            amount_remaining: params.amount.value(),
            amount_calculated: 0,
            sqrt_price_x64: params.sqrt_price_x64,
            tick: params.tick_current,
            liquidity: params.liquidity,
            steps: 0,
        }
    }
}

/// Outcome of a completed swap simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SwapResult {
    /// Output for exact input, input including fees for exact output.
    pub amount_calculated: u128,
    /// Unfilled part of the specified amount; non-zero when the price limit
    /// or the domain edge stopped the swap.
    pub amount_remaining: u128,
    pub sqrt_price_x64: u128,
    pub liquidity: u128,
    pub tick: i32,
    /// Arrays referenced by the swap, in first-use order.
    pub touched_arrays: Vec<TickArrayRef>,
    pub steps: usize,
}

impl SwapResult {
    /// Whether the whole specified amount was filled.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.amount_remaining == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clmm_quote_domain::address::Address;
    use clmm_quote_domain::math::Q64;

    fn pool() -> PoolState {
        PoolState {
            tick: 0,
            sqrt_price_x64: Q64,
            liquidity: 1_000,
            tick_spacing: 10,
            fee_rate: 2_500,
            token_mint0: Address::new([1u8; 32]),
            token_mint1: Address::new([2u8; 32]),
        }
    }

    #[test]
    fn test_params_from_pool() {
        let params = SwapParams::from_pool(&pool(), SwapDirection::ZeroForOne, SwapAmount::ExactInput(5))
            .with_max_steps(3);
        assert_eq!(params.fee_rate, 2_500);
        assert_eq!(params.max_steps, 3);
        assert_eq!(params.sqrt_price_limit_x64, None);
        assert_eq!(SwapState::new(&params).amount_remaining, 5);
    }

    #[test]
    fn test_default_limits() {
        let down = SwapParams::from_pool(&pool(), SwapDirection::ZeroForOne, SwapAmount::ExactInput(5));
        assert_eq!(down.validate().unwrap(), MIN_SQRT_PRICE_X64 + 1);
        let up = SwapParams::from_pool(&pool(), SwapDirection::OneForZero, SwapAmount::ExactOutput(5));
        assert_eq!(up.validate().unwrap(), MAX_SQRT_PRICE_X64 - 1);
    }

    #[test]
    fn test_limit_must_be_ahead_of_price() {
        let down = SwapParams::from_pool(&pool(), SwapDirection::ZeroForOne, SwapAmount::ExactInput(5));
        assert_eq!(down.clone().with_price_limit(Some(Q64)).validate().unwrap(), Q64);
        assert_eq!(
            down.clone().with_price_limit(Some(Q64 + 1)).validate(),
            Err(ClmmError::InvalidPriceLimit {
                limit: Q64 + 1,
                current: Q64,
                direction: "zero_for_one",
            })
        );
        assert!(down.with_price_limit(Some(MIN_SQRT_PRICE_X64)).validate().is_err());

        let up = SwapParams::from_pool(&pool(), SwapDirection::OneForZero, SwapAmount::ExactInput(5));
        assert!(up.clone().with_price_limit(Some(Q64 - 1)).validate().is_err());
        assert!(up.with_price_limit(Some(MAX_SQRT_PRICE_X64)).validate().is_err());
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let base = SwapParams::from_pool(&pool(), SwapDirection::ZeroForOne, SwapAmount::ExactInput(0));
        assert!(matches!(base.validate(), Err(ClmmError::InvalidSwapParameters { .. })));

        let mut params = base.clone();
        params.amount = SwapAmount::ExactInput(1);
        params.fee_rate = 1_000_000;
        assert!(params.validate().is_err());

        let mut params = base.clone();
        params.amount = SwapAmount::ExactInput(1);
        params.tick_spacing = 0;
        assert!(params.validate().is_err());

        let mut params = base;
        params.amount = SwapAmount::ExactInput(1);
        params.sqrt_price_x64 = 0;
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_result_completion() {
        let mut result = SwapResult {
            amount_calculated: 1,
            amount_remaining: 0,
            sqrt_price_x64: Q64 - 10,
            liquidity: 7,
            tick: -1,
            touched_arrays: Vec::new(),
            steps: 1,
        };
        assert!(result.is_complete());
        result.amount_remaining = 3;
        assert!(!result.is_complete());
    }

    #[test]
    fn test_amount_serialization() {
        let json = serde_json::to_string(&SwapAmount::ExactOutput(9)).unwrap();
        assert_eq!(json, r#"{"exact_output":9}"#);
    }
}
