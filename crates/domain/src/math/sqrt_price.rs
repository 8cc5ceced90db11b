//! Square-root price updates for a given token amount and liquidity.

use crate::error::{ClmmError, Result};
use crate::math::full_math::{div_ceil, mul_div_ceil, q64, to_u128};
use primitive_types::U256;

/// Next price after adding (`add`) or removing token0.
///
/// `L * √P / (L ± amount * √P)`, always rounded up so the price moves no
/// further than the exact amount allows.
///
/// # Errors
/// [`ClmmError::ZeroLiquidity`] when `liquidity` is zero,
/// [`ClmmError::PriceOverflow`] when the result leaves the `u128` range.
pub fn next_sqrt_price_from_amount0_rounding_up(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount: u128,
    add: bool,
) -> Result<u128> {
    if liquidity == 0 {
        return Err(ClmmError::ZeroLiquidity { sqrt_price_x64 });
    }
    if amount == 0 {
        return Ok(sqrt_price_x64);
    }
    let overflow = ClmmError::PriceOverflow {
        sqrt_price_x64,
        amount,
    };
    let numerator = U256::from(liquidity) * q64();
    let price = U256::from(sqrt_price_x64);
    let product = U256::from(amount) * price;

    let denominator = if add {
        numerator.checked_add(product).ok_or(overflow.clone())?
    } else {
        if numerator <= product {
            return Err(overflow);
        }
        numerator - product
    };

    mul_div_ceil(numerator, price, denominator)
        .and_then(to_u128)
        .ok_or(overflow)
}

/// Next price after adding (`add`) or removing token1.
///
/// `√P ± amount * 2^64 / L`, rounded down in both directions.
///
/// # Errors
/// [`ClmmError::ZeroLiquidity`] when `liquidity` is zero.
pub fn next_sqrt_price_from_amount1_rounding_down(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount: u128,
    add: bool,
) -> Result<u128> {
    if liquidity == 0 {
        return Err(ClmmError::ZeroLiquidity { sqrt_price_x64 });
    }
    let overflow = ClmmError::PriceOverflow {
        sqrt_price_x64,
        amount,
    };
    let scaled = U256::from(amount) * q64();
    let liquidity = U256::from(liquidity);
    let price = U256::from(sqrt_price_x64);

    if add {
        let quotient = scaled / liquidity;
        price
            .checked_add(quotient)
            .and_then(to_u128)
            .ok_or(overflow)
    } else {
        let quotient = div_ceil(scaled, liquidity).ok_or(overflow.clone())?;
        if price <= quotient {
            return Err(overflow);
        }
        to_u128(price - quotient).ok_or(overflow)
    }
}

/// Next price after swapping `amount_in` into the pool.
///
/// # Errors
/// [`ClmmError::ZeroLiquidity`] when `liquidity` is zero.
pub fn next_sqrt_price_from_input(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount_in: u128,
    zero_for_one: bool,
) -> Result<u128> {
    check_inputs(sqrt_price_x64, liquidity)?;
    if zero_for_one {
        next_sqrt_price_from_amount0_rounding_up(sqrt_price_x64, liquidity, amount_in, true)
    } else {
        next_sqrt_price_from_amount1_rounding_down(sqrt_price_x64, liquidity, amount_in, true)
    }
}

/// Next price after taking `amount_out` out of the pool.
///
/// # Errors
/// [`ClmmError::ZeroLiquidity`] when `liquidity` is zero,
/// [`ClmmError::PriceOverflow`] when the curve cannot supply `amount_out`.
pub fn next_sqrt_price_from_output(
    sqrt_price_x64: u128,
    liquidity: u128,
    amount_out: u128,
    zero_for_one: bool,
) -> Result<u128> {
    check_inputs(sqrt_price_x64, liquidity)?;
    if zero_for_one {
        next_sqrt_price_from_amount1_rounding_down(sqrt_price_x64, liquidity, amount_out, false)
    } else {
        next_sqrt_price_from_amount0_rounding_up(sqrt_price_x64, liquidity, amount_out, false)
    }
}

fn check_inputs(sqrt_price_x64: u128, liquidity: u128) -> Result<()> {
    if sqrt_price_x64 == 0 {
        return Err(ClmmError::SqrtPriceOutOfRange {
            sqrt_price_x64,
            min: crate::math::tick_math::MIN_SQRT_PRICE_X64,
            max: crate::math::tick_math::MAX_SQRT_PRICE_X64,
        });
    }
    if liquidity == 0 {
        return Err(ClmmError::ZeroLiquidity { sqrt_price_x64 });
    }
    Ok(())
}
