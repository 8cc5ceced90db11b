//! One step of a swap between two prices at constant liquidity.

use clmm_quote_domain::error::{ClmmError, Result};
use clmm_quote_domain::fees::{amount_less_fee, fee_on_net_amount};
use clmm_quote_domain::math::concentrated_liquidity::{
    token0_amount_for_liquidity, token1_amount_for_liquidity,
};
use clmm_quote_domain::math::sqrt_price::{next_sqrt_price_from_input, next_sqrt_price_from_output};

/// Amounts exchanged by a single step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SwapStep {
    /// Price reached by the step.
    pub sqrt_price_next: u128,
    /// Input amount excluding the fee.
    pub amount_in: u128,
    pub amount_out: u128,
    pub fee_amount: u128,
}

/// Input needed to move the price to `to`, rounded up.
fn amount_in_between(from: u128, to: u128, liquidity: u128, zero_for_one: bool) -> Result<u128> {
    if zero_for_one {
        token0_amount_for_liquidity(to, from, liquidity, true)
    } else {
        token1_amount_for_liquidity(from, to, liquidity, true)
    }
}

/// Output released by moving the price to `to`, rounded down.
fn amount_out_between(from: u128, to: u128, liquidity: u128, zero_for_one: bool) -> Result<u128> {
    if zero_for_one {
        token1_amount_for_liquidity(to, from, liquidity, false)
    } else {
        token0_amount_for_liquidity(from, to, liquidity, false)
    }
}

/// Swaps as much of `amount_remaining` as fits between the current and the
/// target price.
///
/// The direction follows from the prices: `current >= target` trades token0
/// for token1. An amount too large to represent when computed towards the
/// target means the target is out of reach, and the price is derived from
/// the amount instead.
///
/// For exact input `amount_in + fee_amount <= amount_remaining`; for exact
/// output `amount_out <= amount_remaining`.
pub fn compute_swap_step(
    sqrt_price_current: u128,
    sqrt_price_target: u128,
    liquidity: u128,
    amount_remaining: u128,
    fee_rate: u32,
    exact_input: bool,
) -> Result<SwapStep> {
    let zero_for_one = sqrt_price_current >= sqrt_price_target;

    let mut to_target_in = None;
    let mut to_target_out = None;
    let sqrt_price_next = if exact_input {
        let amount_less_fee = amount_less_fee(amount_remaining, fee_rate);
        to_target_in =
            amount_in_between(sqrt_price_current, sqrt_price_target, liquidity, zero_for_one).ok();
        match to_target_in {
            Some(needed) if amount_less_fee >= needed => sqrt_price_target,
            _ => next_sqrt_price_from_input(
                sqrt_price_current,
                liquidity,
                amount_less_fee,
                zero_for_one,
            )?,
        }
    } else {
        to_target_out =
            amount_out_between(sqrt_price_current, sqrt_price_target, liquidity, zero_for_one).ok();
        match to_target_out {
            Some(available) if amount_remaining >= available => sqrt_price_target,
            _ => next_sqrt_price_from_output(
                sqrt_price_current,
                liquidity,
                amount_remaining,
                zero_for_one,
            )?,
        }
    };

    let reached_target = sqrt_price_next == sqrt_price_target;
    let amount_in = match to_target_in {
        Some(amount) if reached_target && exact_input => amount,
        _ => amount_in_between(sqrt_price_current, sqrt_price_next, liquidity, zero_for_one)?,
    };
    let mut amount_out = match to_target_out {
        Some(amount) if reached_target && !exact_input => amount,
        _ => amount_out_between(sqrt_price_current, sqrt_price_next, liquidity, zero_for_one)?,
    };

    if !exact_input && amount_out > amount_remaining {
        amount_out = amount_remaining;
    }

    let fee_amount = if exact_input && !reached_target {
        // The rest of the input is absorbed as fee, rounding included.
        amount_remaining
            .checked_sub(amount_in)
            .ok_or(ClmmError::AmountOverflow)?
    } else {
        fee_on_net_amount(amount_in, fee_rate).ok_or(ClmmError::AmountOverflow)?
    };

    Ok(SwapStep {
        sqrt_price_next,
        amount_in,
        amount_out,
        fee_amount,
    })
}
