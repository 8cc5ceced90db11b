use rust_decimal::Decimal;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};

/// A fraction such as a slippage tolerance, `0.01` meaning 1%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Percentage(pub Decimal);

impl Percentage {
    pub fn from_bps(bps: u32) -> Self {
        Self(Decimal::from(bps) / Decimal::from(10000))
    }

    pub fn to_bps(&self) -> u32 {
        (self.0 * Decimal::from(10000)).to_u32().unwrap_or(0)
    }

    /// Whether the fraction lies in `[0, 1]`.
    #[must_use]
    pub fn is_unit_fraction(&self) -> bool {
        self.0 >= Decimal::ZERO && self.0 <= Decimal::ONE
    }

    /// `floor(amount * (1 - self))`, or `None` if `amount` is not
    /// representable as a decimal.
    #[must_use]
    pub fn discount(&self, amount: u128) -> Option<u128> {
        let amount = Decimal::from_u128(amount)?;
        amount
            .checked_mul(Decimal::ONE - self.0)?
            .floor()
            .to_u128()
    }

    /// `ceil(amount * (1 + self))`, or `None` on overflow.
    #[must_use]
    pub fn premium(&self, amount: u128) -> Option<u128> {
        let amount = Decimal::from_u128(amount)?;
        amount
            .checked_mul(Decimal::ONE + self.0)?
            .ceil()
            .to_u128()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_bps_conversion() {
        assert_eq!(Percentage::from_bps(50).0, dec!(0.005));
        assert_eq!(Percentage(dec!(0.01)).to_bps(), 100);
    }

    #[test]
    fn test_discount_and_premium_round_against_trader() {
        let slippage = Percentage(dec!(0.01));
        assert_eq!(slippage.discount(99_749), Some(98_751));
        assert_eq!(slippage.premium(50_127), Some(50_629));
        assert_eq!(Percentage(Decimal::ZERO).discount(7), Some(7));
    }

    #[test]
    fn test_unit_fraction() {
        assert!(Percentage(dec!(0.5)).is_unit_fraction());
        assert!(!Percentage(dec!(1.5)).is_unit_fraction());
        assert!(!Percentage(dec!(-0.1)).is_unit_fraction());
    }
}
