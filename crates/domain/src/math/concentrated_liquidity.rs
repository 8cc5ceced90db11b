//! Token amounts and liquidity over a square-root price interval.
//!
//! All prices are 64.64 fixed point. Amounts owed to the pool round up and
//! amounts paid out round down.

use crate::error::{ClmmError, Result};
use crate::math::full_math::{div_ceil, mul_div_ceil, mul_div_floor, q64, to_u128};
use crate::math::tick_math::{MAX_SQRT_PRICE_X64, MIN_SQRT_PRICE_X64};
use primitive_types::U256;

fn sorted(sqrt_price_a: u128, sqrt_price_b: u128) -> (u128, u128) {
    if sqrt_price_a <= sqrt_price_b {
        (sqrt_price_a, sqrt_price_b)
    } else {
        (sqrt_price_b, sqrt_price_a)
    }
}

/// Calculates the amount of token0 spanned by `liquidity` between two prices.
/// delta_x = L * 2^64 * (sqrt(P_b) - sqrt(P_a)) / (sqrt(P_b) * sqrt(P_a))
pub fn token0_amount_for_liquidity(
    sqrt_price_a: u128,
    sqrt_price_b: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u128> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    if lower == 0 {
        return Err(ClmmError::SqrtPriceOutOfRange {
            sqrt_price_x64: 0,
            min: MIN_SQRT_PRICE_X64,
            max: MAX_SQRT_PRICE_X64,
        });
    }

    let numerator1 = U256::from(liquidity) * q64();
    let numerator2 = U256::from(upper - lower);
    let lower = U256::from(lower);
    let upper = U256::from(upper);

    let amount = if round_up {
        mul_div_ceil(numerator1, numerator2, upper).and_then(|v| div_ceil(v, lower))
    } else {
        mul_div_floor(numerator1, numerator2, upper).map(|v| v / lower)
    };
    amount.and_then(to_u128).ok_or(ClmmError::AmountOverflow)
}

/// Calculates the amount of token1 spanned by `liquidity` between two prices.
/// delta_y = L * (sqrt(P_b) - sqrt(P_a)) / 2^64
pub fn token1_amount_for_liquidity(
    sqrt_price_a: u128,
    sqrt_price_b: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<u128> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    let liquidity = U256::from(liquidity);
    let diff = U256::from(upper - lower);

    let amount = if round_up {
        mul_div_ceil(liquidity, diff, q64())
    } else {
        mul_div_floor(liquidity, diff, q64())
    };
    amount.and_then(to_u128).ok_or(ClmmError::AmountOverflow)
}

/// Applies a signed liquidity delta.
///
/// # Errors
/// [`ClmmError::LiquidityUnderflow`] below zero and
/// [`ClmmError::LiquidityOverflow`] above `u128::MAX`.
pub fn add_delta(liquidity: u128, delta: i128) -> Result<u128> {
    if delta < 0 {
        liquidity
            .checked_sub(delta.unsigned_abs())
            .ok_or(ClmmError::LiquidityUnderflow { liquidity, delta })
    } else {
        liquidity
            .checked_add(delta.unsigned_abs())
            .ok_or(ClmmError::LiquidityOverflow { liquidity, delta })
    }
}

/// Calculates liquidity for a given amount of token0 and price range.
/// L = amount0 * (sqrt(P_a) * sqrt(P_b)) / (sqrt(P_b) - sqrt(P_a))
pub fn liquidity_from_amount0(sqrt_price_a: u128, sqrt_price_b: u128, amount0: u128) -> Result<u128> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    if lower == upper {
        return Err(ClmmError::InvalidSwapParameters {
            reason: "empty price range".to_string(),
        });
    }
    let intermediate = mul_div_floor(U256::from(lower), U256::from(upper), q64())
        .ok_or(ClmmError::AmountOverflow)?;
    mul_div_floor(U256::from(amount0), intermediate, U256::from(upper - lower))
        .and_then(to_u128)
        .ok_or(ClmmError::AmountOverflow)
}

/// Calculates liquidity for a given amount of token1 and price range.
/// L = amount1 / (sqrt(P_b) - sqrt(P_a))
pub fn liquidity_from_amount1(sqrt_price_a: u128, sqrt_price_b: u128, amount1: u128) -> Result<u128> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    if lower == upper {
        return Err(ClmmError::InvalidSwapParameters {
            reason: "empty price range".to_string(),
        });
    }
    mul_div_floor(U256::from(amount1), q64(), U256::from(upper - lower))
        .and_then(to_u128)
        .ok_or(ClmmError::AmountOverflow)
}

/// Largest liquidity that both amounts can fund for a position over
/// `[sqrt_price_a, sqrt_price_b]` at the current price.
pub fn liquidity_from_amounts(
    sqrt_price_current: u128,
    sqrt_price_a: u128,
    sqrt_price_b: u128,
    amount0: u128,
    amount1: u128,
) -> Result<u128> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    if sqrt_price_current <= lower {
        liquidity_from_amount0(lower, upper, amount0)
    } else if sqrt_price_current < upper {
        let from0 = liquidity_from_amount0(sqrt_price_current, upper, amount0)?;
        let from1 = liquidity_from_amount1(lower, sqrt_price_current, amount1)?;
        Ok(from0.min(from1))
    } else {
        liquidity_from_amount1(lower, upper, amount1)
    }
}

/// Token amounts backing `liquidity` over `[sqrt_price_a, sqrt_price_b]` at
/// the current price, as `(amount0, amount1)`.
pub fn amounts_for_liquidity(
    sqrt_price_current: u128,
    sqrt_price_a: u128,
    sqrt_price_b: u128,
    liquidity: u128,
    round_up: bool,
) -> Result<(u128, u128)> {
    let (lower, upper) = sorted(sqrt_price_a, sqrt_price_b);
    if sqrt_price_current < lower {
        Ok((token0_amount_for_liquidity(lower, upper, liquidity, round_up)?, 0))
    } else if sqrt_price_current < upper {
        Ok((
            token0_amount_for_liquidity(sqrt_price_current, upper, liquidity, round_up)?,
            token1_amount_for_liquidity(lower, sqrt_price_current, liquidity, round_up)?,
        ))
    } else {
        Ok((0, token1_amount_for_liquidity(lower, upper, liquidity, round_up)?))
    }
}
