//! Swap fee arithmetic in parts per million.

use crate::math::full_math::{mul_div_ceil, mul_div_floor, to_u128};
use primitive_types::U256;
use rust_decimal::Decimal;

/// Denominator of `fee_rate`.
pub const FEE_RATE_DENOMINATOR: u32 = 1_000_000;

/// Whether `fee_rate` is a valid fraction below 100%.
#[must_use]
pub fn is_valid_fee_rate(fee_rate: u32) -> bool {
    fee_rate < FEE_RATE_DENOMINATOR
}

/// Fee rate as a decimal fraction, e.g. `2500 -> 0.0025`.
#[must_use]
pub fn fee_rate_to_decimal(fee_rate: u32) -> Decimal {
    Decimal::from(fee_rate) / Decimal::from(FEE_RATE_DENOMINATOR)
}

/// Part of `amount` left after the fee, rounded down.
#[must_use]
pub fn amount_less_fee(amount: u128, fee_rate: u32) -> u128 {
    let kept = U256::from(FEE_RATE_DENOMINATOR - fee_rate.min(FEE_RATE_DENOMINATOR));
    // amount * kept / D <= amount
    mul_div_floor(U256::from(amount), kept, U256::from(FEE_RATE_DENOMINATOR))
        .and_then(to_u128)
        .unwrap_or(amount)
}

/// Fee charged on top of a net `amount_in`, rounded up.
/// fee = amount_in * fee_rate / (D - fee_rate)
#[must_use]
pub fn fee_on_net_amount(amount_in: u128, fee_rate: u32) -> Option<u128> {
    if !is_valid_fee_rate(fee_rate) {
        return None;
    }
    mul_div_ceil(
        U256::from(amount_in),
        U256::from(fee_rate),
        U256::from(FEE_RATE_DENOMINATOR - fee_rate),
    )
    .and_then(to_u128)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fee_rate_decimal() {
        assert_eq!(fee_rate_to_decimal(2_500), dec!(0.0025));
        assert_eq!(fee_rate_to_decimal(0), Decimal::ZERO);
    }

    #[test]
    fn test_amount_less_fee_rounds_down() {
        assert_eq!(amount_less_fee(100_000, 2_500), 99_750);
        assert_eq!(amount_less_fee(1, 2_500), 0);
        assert_eq!(amount_less_fee(u128::MAX, 0), u128::MAX);
    }

    #[test]
    fn test_fee_on_net_amount_rounds_up() {
        assert_eq!(fee_on_net_amount(99_750, 2_500), Some(250));
        assert_eq!(fee_on_net_amount(1, 2_500), Some(1));
        assert_eq!(fee_on_net_amount(0, 2_500), Some(0));
        assert_eq!(fee_on_net_amount(10, FEE_RATE_DENOMINATOR), None);
    }
}
