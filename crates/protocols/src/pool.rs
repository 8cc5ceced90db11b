//! Quoting facade over a single pool.
//!
//! [`AmmPool`] owns the pool snapshot and its tick array cache. Quotes run
//! the swap engine against a copy of the snapshot; `quote_*` commits the
//! resulting price, tick and liquidity, `simulate_*` does not. Committed
//! quotes drift the local state so consecutive quotes chain, and
//! [`AmmPool::reload`] resynchronises with the state store.

use crate::StateStore;
use crate::cache_provider::{CacheConfig, CacheDataProvider};
use crate::error::Result;
use crate::locator::TickArrayLocator;
use clmm_quote_domain::address::Address;
use clmm_quote_domain::error::ClmmError;
use clmm_quote_domain::math::price_tick::sqrt_price_x64_to_price;
use clmm_quote_domain::pool::PoolState;
use clmm_quote_domain::tick::TickArrayRef;
use clmm_quote_domain::value_objects::{Percentage, Price};
use clmm_quote_simulation::prelude::*;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Outcome of a quote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    /// The amount the caller fixed.
    pub specified: SwapAmount,
    pub direction: SwapDirection,
    /// Output for exact input, input including fees for exact output.
    pub amount: u128,
    /// Part of the specified amount left unfilled at the price limit.
    pub amount_remaining: u128,
    /// Tick arrays the swap reads, in first-use order.
    pub touched_arrays: Vec<TickArrayRef>,
    pub sqrt_price_after: u128,
    pub tick_after: i32,
    pub liquidity_after: u128,
}

impl Quote {
    fn from_result(specified: SwapAmount, direction: SwapDirection, result: SwapResult) -> Self {
        Self {
            specified,
            direction,
            amount: result.amount_calculated,
            amount_remaining: result.amount_remaining,
            touched_arrays: result.touched_arrays,
            sqrt_price_after: result.sqrt_price_x64,
            tick_after: result.tick,
            liquidity_after: result.liquidity,
        }
    }

    /// Amount of the input token spent.
    #[must_use]
    pub fn amount_in(&self) -> u128 {
        match self.specified {
            SwapAmount::ExactInput(amount) => amount - self.amount_remaining,
            SwapAmount::ExactOutput(_) => self.amount,
        }
    }

    /// Amount of the output token received.
    #[must_use]
    pub fn amount_out(&self) -> u128 {
        match self.specified {
            SwapAmount::ExactInput(_) => self.amount,
            SwapAmount::ExactOutput(amount) => amount - self.amount_remaining,
        }
    }

    /// Smallest output acceptable under `slippage`, rounded down.
    ///
    /// # Errors
    /// [`ClmmError::InvalidSwapParameters`] unless `slippage` is in `[0, 1]`.
    pub fn min_amount_out(&self, slippage: Percentage) -> Result<u128> {
        check_slippage(slippage)?;
        Ok(slippage
            .discount(self.amount_out())
            .ok_or(ClmmError::AmountOverflow)?)
    }

    /// Largest input acceptable under `slippage`, rounded up.
    ///
    /// # Errors
    /// [`ClmmError::InvalidSwapParameters`] unless `slippage` is in `[0, 1]`,
    /// [`ClmmError::AmountOverflow`] if the bound does not fit.
    pub fn max_amount_in(&self, slippage: Percentage) -> Result<u128> {
        check_slippage(slippage)?;
        Ok(slippage
            .premium(self.amount_in())
            .ok_or(ClmmError::AmountOverflow)?)
    }
}

fn check_slippage(slippage: Percentage) -> Result<()> {
    if !slippage.is_unit_fraction() {
        return Err(ClmmError::InvalidSwapParameters {
            reason: format!("slippage {} outside [0, 1]", slippage.0),
        }
        .into());
    }
    Ok(())
}

/// A pool snapshot, its tick array cache and the store it came from.
#[derive(Debug)]
pub struct AmmPool {
    address: Address,
    state: PoolState,
    provider: CacheDataProvider,
    max_steps: usize,
}

impl AmmPool {
    /// Wraps an already fetched snapshot. The cache starts empty.
    ///
    /// # Errors
    /// [`ClmmError::InvalidPoolState`] when the snapshot is inconsistent, or
    /// when `provider` serves another pool.
    pub fn new(address: Address, state: PoolState, provider: CacheDataProvider) -> Result<Self> {
        state.validate()?;
        if provider.pool() != address {
            return Err(ClmmError::InvalidPoolState {
                reason: format!("provider serves {} instead of {address}", provider.pool()),
            }
            .into());
        }
        Ok(Self {
            address,
            state,
            provider,
            max_steps: DEFAULT_MAX_SWAP_STEPS,
        })
    }

    /// Fetches the pool from `store` and loads the tick arrays around its
    /// current tick.
    pub async fn load(
        address: Address,
        store: Arc<dyn StateStore>,
        locator: Arc<dyn TickArrayLocator>,
        config: CacheConfig,
    ) -> Result<Self> {
        let state = store.fetch_pool_state(&address).await?;
        let provider = CacheDataProvider::new(address, locator, store, config)?;
        let mut pool = Self::new(address, state, provider)?;
        pool.load_tick_arrays().await?;
        info!(
            pool = %address,
            tick = pool.state.tick,
            liquidity = pool.state.liquidity,
            "Loaded pool"
        );
        Ok(pool)
    }

    /// Sets the step cap used by every quote.
    #[must_use]
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    #[must_use]
    pub fn state(&self) -> &PoolState {
        &self.state
    }

    #[must_use]
    pub fn provider(&self) -> &CacheDataProvider {
        &self.provider
    }

    /// Whether `mint` is one of the pool's tokens.
    #[must_use]
    pub fn contains_mint(&self, mint: &Address) -> bool {
        self.state.contains_mint(mint)
    }

    /// Price of token0 in units of token1.
    pub fn token0_price(&self) -> Result<Price> {
        Ok(Price::new(sqrt_price_x64_to_price(self.state.sqrt_price_x64)?))
    }

    /// Price of token1 in units of token0.
    pub fn token1_price(&self) -> Result<Price> {
        Ok(self.token0_price()?.invert())
    }

    /// Quotes selling exactly `amount_in` of `input_mint` without
    /// committing.
    pub fn simulate_exact_input(
        &self,
        input_mint: &Address,
        amount_in: u128,
        sqrt_price_limit_x64: Option<u128>,
    ) -> Result<Quote> {
        let direction = if *input_mint == self.state.token_mint0 {
            SwapDirection::ZeroForOne
        } else if *input_mint == self.state.token_mint1 {
            SwapDirection::OneForZero
        } else {
            return Err(self.unknown_mint(input_mint));
        };
        self.simulate(
            direction,
            SwapAmount::ExactInput(amount_in),
            sqrt_price_limit_x64,
        )
    }

    /// Quotes buying exactly `amount_out` of `output_mint` without
    /// committing.
    pub fn simulate_exact_output(
        &self,
        output_mint: &Address,
        amount_out: u128,
        sqrt_price_limit_x64: Option<u128>,
    ) -> Result<Quote> {
        let direction = if *output_mint == self.state.token_mint1 {
            SwapDirection::ZeroForOne
        } else if *output_mint == self.state.token_mint0 {
            SwapDirection::OneForZero
        } else {
            return Err(self.unknown_mint(output_mint));
        };
        self.simulate(
            direction,
            SwapAmount::ExactOutput(amount_out),
            sqrt_price_limit_x64,
        )
    }

    /// Like [`Self::simulate_exact_input`], then commits the new price.
    pub fn quote_exact_input(
        &mut self,
        input_mint: &Address,
        amount_in: u128,
        sqrt_price_limit_x64: Option<u128>,
    ) -> Result<Quote> {
        let quote = self.simulate_exact_input(input_mint, amount_in, sqrt_price_limit_x64)?;
        self.commit(&quote);
        Ok(quote)
    }

    /// Like [`Self::simulate_exact_output`], then commits the new price.
    pub fn quote_exact_output(
        &mut self,
        output_mint: &Address,
        amount_out: u128,
        sqrt_price_limit_x64: Option<u128>,
    ) -> Result<Quote> {
        let quote = self.simulate_exact_output(output_mint, amount_out, sqrt_price_limit_x64)?;
        self.commit(&quote);
        Ok(quote)
    }

    /// Refetches the tick arrays around the current tick.
    pub async fn load_tick_arrays(&mut self) -> Result<()> {
        self.provider
            .load_tick_array_cache(self.state.tick, self.state.tick_spacing)
            .await
    }

    /// Replaces the local snapshot with the store's.
    ///
    /// The tick array cache is refreshed when the tick moved. Nothing is
    /// changed if any fetch or validation fails.
    pub async fn reload(&mut self) -> Result<()> {
        let state = self.provider.store().fetch_pool_state(&self.address).await?;
        state.validate()?;
        let moved = state.tick != self.state.tick || state.tick_spacing != self.state.tick_spacing;
        if moved {
            let cache = self
                .provider
                .fetch_window(state.tick, state.tick_spacing)
                .await?;
            self.provider.install(cache);
        }
        info!(
            pool = %self.address,
            tick = state.tick,
            previous_tick = self.state.tick,
            refreshed = moved,
            "Reloaded pool"
        );
        self.state = state;
        Ok(())
    }

    pub(crate) fn commit(&mut self, quote: &Quote) {
        self.state.sqrt_price_x64 = quote.sqrt_price_after;
        self.state.tick = quote.tick_after;
        self.state.liquidity = quote.liquidity_after;
    }

    fn simulate(
        &self,
        direction: SwapDirection,
        amount: SwapAmount,
        sqrt_price_limit_x64: Option<u128>,
    ) -> Result<Quote> {
        let params = SwapParams::from_pool(&self.state, direction, amount)
            .with_price_limit(sqrt_price_limit_x64)
            .with_max_steps(self.max_steps);
        let result = simulate_swap(&self.provider, &params)?;
        debug!(
            pool = %self.address,
            direction = direction.label(),
            specified = amount.value(),
            calculated = result.amount_calculated,
            remaining = result.amount_remaining,
            tick = result.tick,
            steps = result.steps,
            "Quoted swap"
        );
        Ok(Quote::from_result(amount, direction, result))
    }

    fn unknown_mint(&self, mint: &Address) -> crate::error::PoolError {
        ClmmError::UnknownMint {
            mint: mint.to_string(),
            pool: self.address.to_string(),
        }
        .into()
    }
}
