//! Conversions between tick indices and 64.64 square-root prices.
//!
//! `sqrt_price(tick) = sqrt(1.0001^tick) * 2^64`.

use crate::error::{ClmmError, Result};

/// The minimum tick.
pub const MIN_TICK: i32 = -443_636;
/// The maximum tick.
pub const MAX_TICK: i32 = -MIN_TICK;

/// `sqrt_price_at_tick(MIN_TICK)`.
pub const MIN_SQRT_PRICE_X64: u128 = 4_295_048_016;
/// `sqrt_price_at_tick(MAX_TICK)`.
pub const MAX_SQRT_PRICE_X64: u128 = 79_226_673_521_066_979_257_578_248_091;

/// `1.0001^(-2^i / 2)` in 64.64, one entry per bit of `|tick|`.
const BIT_RATIOS_X64: [u128; 19] = [
    0xfffcb933bd6fb800,
    0xfff97272373d4000,
    0xfff2e50f5f657000,
    0xffe5caca7e10f000,
    0xffcb9843d60f7000,
    0xff973b41fa98e800,
    0xff2ea16466c9b000,
    0xfe5dee046a9a3800,
    0xfcbe86c7900bb000,
    0xf987a7253ac65800,
    0xf3392b0822bb6000,
    0xe7159475a2caf000,
    0xd097f3bdfd2f2000,
    0xa9f746462d9f8000,
    0x70d869a156f31c00,
    0x31be135f97ed3200,
    0x09aa508b5b85a500,
    0x005d6af8dedc582c,
    0x00002216e584f5fa,
];

/// `log_sqrt(1.0001)` base 2 as a 64.64 multiplier for a 32.32 log2.
const LOG_SQRT_10001_X64: i128 = 59_543_866_431_248;
/// Lower error bound of the log approximation.
const TICK_LOW_ERROR_X64: i128 = 184_467_440_737_095_516;
/// Upper error bound of the log approximation.
const TICK_HIGH_ERROR_X64: i128 = 15_793_534_762_490_258_745;
/// Fractional bits of log2 computed by repeated squaring.
const LOG2_FRACTION_BITS: u32 = 16;

/// Returns `true` when `tick` is inside `[MIN_TICK, MAX_TICK]`.
#[must_use]
pub fn is_valid_tick(tick: i32) -> bool {
    (MIN_TICK..=MAX_TICK).contains(&tick)
}

/// Returns `true` when `sqrt_price_x64` is inside the price domain.
#[must_use]
pub fn is_valid_sqrt_price(sqrt_price_x64: u128) -> bool {
    (MIN_SQRT_PRICE_X64..=MAX_SQRT_PRICE_X64).contains(&sqrt_price_x64)
}

/// Calculates `sqrt(1.0001^tick) * 2^64`.
///
/// The ratio is built for `-|tick|` from one precomputed factor per set bit
/// and inverted for positive ticks, so prices are strictly increasing in
/// the tick.
///
/// # Errors
/// [`ClmmError::TickOutOfRange`] outside `[MIN_TICK, MAX_TICK]`.
pub fn sqrt_price_at_tick(tick: i32) -> Result<u128> {
    if !is_valid_tick(tick) {
        return Err(ClmmError::TickOutOfRange {
            tick,
            min: MIN_TICK,
            max: MAX_TICK,
        });
    }
    let abs_tick = tick.unsigned_abs();

    let mut ratio: u128 = if abs_tick & 0x1 != 0 {
        BIT_RATIOS_X64[0]
    } else {
        1u128 << 64
    };
    for (bit, factor) in BIT_RATIOS_X64.iter().enumerate().skip(1) {
        if abs_tick & (1 << bit) != 0 {
            // ratio <= 2^64 and factor < 2^64, so the product fits.
            ratio = (ratio * factor) >> 64;
        }
    }

    if tick > 0 {
        ratio = u128::MAX / ratio;
    }
    Ok(ratio)
}

/// Calculates the greatest tick such that `sqrt_price_at_tick(tick) <= sqrt_price_x64`.
///
/// # Errors
/// [`ClmmError::SqrtPriceOutOfRange`] outside
/// `[MIN_SQRT_PRICE_X64, MAX_SQRT_PRICE_X64]`.
pub fn tick_at_sqrt_price(sqrt_price_x64: u128) -> Result<i32> {
    if !is_valid_sqrt_price(sqrt_price_x64) {
        return Err(ClmmError::SqrtPriceOutOfRange {
            sqrt_price_x64,
            min: MIN_SQRT_PRICE_X64,
            max: MAX_SQRT_PRICE_X64,
        });
    }
    if sqrt_price_x64 == MAX_SQRT_PRICE_X64 {
        return Ok(MAX_TICK);
    }

    // Integer part of log2, as 32.32 fixed point relative to 2^64.
    let msb = 127 - sqrt_price_x64.leading_zeros();
    let log2_integer_x32 = (i128::from(msb) - 64) << 32;

    // Normalise to [2^63, 2^64) and extract fractional bits by squaring.
    let mut r = if msb >= 64 {
        sqrt_price_x64 >> (msb - 63)
    } else {
        sqrt_price_x64 << (63 - msb)
    };
    let mut bit: i128 = 0x8000_0000_0000_0000;
    let mut log2_fraction_x64: i128 = 0;
    for _ in 0..LOG2_FRACTION_BITS {
        r *= r;
        let is_r_more_than_two = r >> 127;
        r >>= 63 + is_r_more_than_two;
        log2_fraction_x64 += bit * is_r_more_than_two as i128;
        bit >>= 1;
    }

    let log2_x32 = log2_integer_x32 + (log2_fraction_x64 >> 32);
    let log_sqrt_10001_x64 = log2_x32 * LOG_SQRT_10001_X64;

    let tick_low = ((log_sqrt_10001_x64 - TICK_LOW_ERROR_X64) >> 64) as i32;
    let tick_high = ((log_sqrt_10001_x64 + TICK_HIGH_ERROR_X64) >> 64) as i32;

    if tick_low == tick_high {
        return Ok(tick_low);
    }
    if sqrt_price_at_tick(tick_high)? <= sqrt_price_x64 {
        Ok(tick_high)
    } else {
        Ok(tick_low)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_sqrt_price_at_tick_10() {
        assert_eq!(sqrt_price_at_tick(10).unwrap(), 18_455_969_290_605_287_889);
        assert_eq!(tick_at_sqrt_price(18_455_969_290_605_287_889).unwrap(), 10);
    }

    #[test]
    fn test_tick_zero_is_one() {
        assert_eq!(sqrt_price_at_tick(0).unwrap(), 1u128 << 64);
        assert_eq!(tick_at_sqrt_price(1u128 << 64).unwrap(), 0);
    }

    #[test]
    fn test_boundaries() {
        assert_eq!(sqrt_price_at_tick(MIN_TICK).unwrap(), MIN_SQRT_PRICE_X64);
        assert_eq!(sqrt_price_at_tick(MAX_TICK).unwrap(), MAX_SQRT_PRICE_X64);
        assert_eq!(tick_at_sqrt_price(MIN_SQRT_PRICE_X64).unwrap(), MIN_TICK);
        assert_eq!(tick_at_sqrt_price(MAX_SQRT_PRICE_X64).unwrap(), MAX_TICK);
        assert_eq!(tick_at_sqrt_price(MAX_SQRT_PRICE_X64 - 1).unwrap(), MAX_TICK - 1);
    }

    #[test]
    fn test_out_of_range() {
        assert!(matches!(
            sqrt_price_at_tick(MAX_TICK + 1),
            Err(ClmmError::TickOutOfRange { tick, .. }) if tick == MAX_TICK + 1
        ));
        assert!(sqrt_price_at_tick(MIN_TICK - 1).is_err());
        assert!(matches!(
            tick_at_sqrt_price(MIN_SQRT_PRICE_X64 - 1),
            Err(ClmmError::SqrtPriceOutOfRange { .. })
        ));
        assert!(tick_at_sqrt_price(MAX_SQRT_PRICE_X64 + 1).is_err());
    }

    #[test]
    fn test_prices_between_ticks_round_down() {
        for tick in [-50_000, -100, -1, 1, 100, 1000, 50_000] {
            let price = sqrt_price_at_tick(tick).unwrap();
            assert_eq!(tick_at_sqrt_price(price - 1).unwrap(), tick - 1);
            assert_eq!(tick_at_sqrt_price(price + 1).unwrap(), tick);
        }
    }

    #[test]
    fn test_round_trip_near_zero() {
        for tick in -2000..2000 {
            let price = sqrt_price_at_tick(tick).unwrap();
            assert_eq!(tick_at_sqrt_price(price).unwrap(), tick);
        }
    }

    #[test]
    fn test_round_trip_and_monotonic_random() {
        let mut rng = rand::rng();
        for _ in 0..5000 {
            let tick = rng.random_range(MIN_TICK..MAX_TICK);
            let price = sqrt_price_at_tick(tick).unwrap();
            let next = sqrt_price_at_tick(tick + 1).unwrap();
            assert!(price < next, "not monotonic at {tick}");
            assert_eq!(tick_at_sqrt_price(price).unwrap(), tick);
        }
    }
}
