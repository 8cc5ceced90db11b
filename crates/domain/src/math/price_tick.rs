use crate::error::{ClmmError, Result};
use crate::math::full_math::{Q64, to_u128};
use crate::math::tick_math::{
    MAX_SQRT_PRICE_X64, MIN_SQRT_PRICE_X64, sqrt_price_at_tick, tick_at_sqrt_price,
};
use primitive_types::U256;
use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal::prelude::*;

/// Significant digits kept when a price is turned into a [`Decimal`].
const PRICE_DIGITS: u32 = 28;

fn q64_decimal() -> Decimal {
    Decimal::from_i128_with_scale(Q64 as i128, 0)
}

fn out_of_range(price: Decimal) -> ClmmError {
    ClmmError::PriceOutOfRange {
        price: price.to_string(),
    }
}

/// Converts a raw token1/token0 price into a 64.64 square-root price.
/// sqrt_price_x64 = round(sqrt(P) * 2^64)
pub fn price_to_sqrt_price_x64(price: Decimal) -> Result<u128> {
    if price <= Decimal::ZERO {
        return Err(out_of_range(price));
    }
    let scaled = price
        .sqrt()
        .and_then(|root| root.checked_mul(q64_decimal()))
        .ok_or_else(|| out_of_range(price))?;
    let sqrt_price_x64 = scaled
        .round()
        .to_u128()
        .ok_or_else(|| out_of_range(price))?;
    if !(MIN_SQRT_PRICE_X64..=MAX_SQRT_PRICE_X64).contains(&sqrt_price_x64) {
        return Err(out_of_range(price));
    }
    Ok(sqrt_price_x64)
}

/// Converts a 64.64 square-root price into the raw token1/token0 price.
/// P = sqrt_price_x64^2 / 2^128
///
/// The square is exact; the result is rounded half up once, at the finest
/// scale that keeps 28 significant digits. Near the top of the range that
/// leaves 8 fractional digits.
pub fn sqrt_price_x64_to_price(sqrt_price_x64: u128) -> Result<Decimal> {
    let out_of_domain = || ClmmError::SqrtPriceOutOfRange {
        sqrt_price_x64,
        min: MIN_SQRT_PRICE_X64,
        max: MAX_SQRT_PRICE_X64,
    };
    if !(MIN_SQRT_PRICE_X64..=MAX_SQRT_PRICE_X64).contains(&sqrt_price_x64) {
        return Err(out_of_domain());
    }
    let squared = U256::from(sqrt_price_x64) * U256::from(sqrt_price_x64);
    let integer = squared >> 128u32;
    let fraction = squared - (integer << 128u32);

    let integer_digits = to_u128(integer)
        .ok_or_else(out_of_domain)?
        .checked_ilog10()
        .map_or(0, |log| log + 1);
    let scale = PRICE_DIGITS.saturating_sub(integer_digits);
    let unit = U256::exp10(scale as usize);
    let half = U256::one() << 127u32;
    let mantissa = integer * unit + ((fraction * unit + half) >> 128u32);
    let mantissa = to_u128(mantissa)
        .and_then(|value| i128::try_from(value).ok())
        .ok_or_else(out_of_domain)?;
    Decimal::try_from_i128_with_scale(mantissa, scale).map_err(|_| out_of_domain())
}

/// Returns the price corresponding to a given tick.
/// P = 1.0001 ^ tick
pub fn tick_to_price(tick: i32) -> Result<Decimal> {
    sqrt_price_x64_to_price(sqrt_price_at_tick(tick)?)
}

/// Returns the greatest tick whose price does not exceed `price`.
/// tick = floor(log_1.0001(P))
pub fn price_to_tick(price: Decimal) -> Result<i32> {
    tick_at_sqrt_price(price_to_sqrt_price_x64(price)?)
}
