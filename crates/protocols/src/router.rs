//! Exact-input quotes chained across several pools.

use crate::error::Result;
use crate::pool::{AmmPool, Quote};
use clmm_quote_domain::address::Address;
use clmm_quote_domain::error::ClmmError;
use clmm_quote_domain::tick::TickArrayRef;
use serde::Serialize;
use tracing::debug;

/// One leg of a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HopQuote {
    pub pool: Address,
    pub input_mint: Address,
    pub output_mint: Address,
    pub amount_in: u128,
    pub quote: Quote,
}

/// Result of [`quote_route_exact_input`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteQuote {
    /// Output of the last hop.
    pub amount_out: u128,
    pub hops: Vec<HopQuote>,
}

impl RouteQuote {
    /// Tick arrays of every hop, in hop order.
    #[must_use]
    pub fn remaining_accounts(&self) -> Vec<TickArrayRef> {
        self.hops
            .iter()
            .flat_map(|hop| hop.quote.touched_arrays.iter().copied())
            .collect()
    }

    /// Number of tick arrays contributed by each hop.
    #[must_use]
    pub fn accounts_per_hop(&self) -> Vec<usize> {
        self.hops
            .iter()
            .map(|hop| hop.quote.touched_arrays.len())
            .collect()
    }
}

/// Sells `amount_in` of `input_mint` through `pools` in order, each hop's
/// output feeding the next hop.
///
/// Every hop is simulated first. Pool states are committed only when the
/// whole route succeeds.
///
/// # Errors
/// [`ClmmError::InvalidSwapParameters`] for an empty route,
/// [`ClmmError::UnknownMint`] when a pool does not trade the running mint,
/// and any error of the individual quotes.
pub fn quote_route_exact_input(
    pools: &mut [AmmPool],
    input_mint: &Address,
    amount_in: u128,
) -> Result<RouteQuote> {
    if pools.is_empty() {
        return Err(ClmmError::InvalidSwapParameters {
            reason: "route has no pools".to_string(),
        }
        .into());
    }

    let mut hops = Vec::with_capacity(pools.len());
    let mut mint = *input_mint;
    let mut amount = amount_in;
    for pool in pools.iter() {
        let output_mint = pool
            .state()
            .counterpart(&mint)
            .ok_or_else(|| ClmmError::UnknownMint {
                mint: mint.to_string(),
                pool: pool.address().to_string(),
            })?;
        let quote = pool.simulate_exact_input(&mint, amount, None)?;
        debug!(
            pool = %pool.address(),
            hop = hops.len(),
            amount_in = amount,
            amount_out = quote.amount,
            "Quoted hop"
        );
        hops.push(HopQuote {
            pool: pool.address(),
            input_mint: mint,
            output_mint,
            amount_in: amount,
            quote: quote.clone(),
        });
        mint = output_mint;
        amount = quote.amount;
    }

    for (pool, hop) in pools.iter_mut().zip(&hops) {
        pool.commit(&hop.quote);
    }
    Ok(RouteQuote {
        amount_out: amount,
        hops,
    })
}
