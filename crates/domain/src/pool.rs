use crate::address::Address;
use crate::error::{ClmmError, Result};
use crate::fees::is_valid_fee_rate;
use crate::math::tick_math::{is_valid_sqrt_price, is_valid_tick, tick_at_sqrt_price};
use serde::{Deserialize, Serialize};

/// Snapshot of a concentrated-liquidity pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolState {
    /// Current tick.
    pub tick: i32,
    /// Current 64.64 square-root price.
    pub sqrt_price_x64: u128,
    /// Active liquidity at the current price.
    pub liquidity: u128,
    pub tick_spacing: u16,
    /// Swap fee in parts per million.
    pub fee_rate: u32,
    pub token_mint0: Address,
    pub token_mint1: Address,
}

impl PoolState {
    /// Checks the snapshot invariants.
    ///
    /// The tick must be the tick of the price, or one below it when the
    /// price sits exactly on a tick that was crossed downwards.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(ClmmError::InvalidPoolState { reason });

        if self.token_mint0 >= self.token_mint1 {
            return invalid(format!(
                "mint0 {} must sort before mint1 {}",
                self.token_mint0, self.token_mint1
            ));
        }
        if self.tick_spacing == 0 {
            return invalid("tick spacing must be positive".to_string());
        }
        if !is_valid_fee_rate(self.fee_rate) {
            return invalid(format!("fee rate {} out of range", self.fee_rate));
        }
        if !is_valid_tick(self.tick) {
            return invalid(format!("tick {} out of range", self.tick));
        }
        if !is_valid_sqrt_price(self.sqrt_price_x64) {
            return invalid(format!("sqrt price {} out of range", self.sqrt_price_x64));
        }
        let price_tick = tick_at_sqrt_price(self.sqrt_price_x64)?;
        if self.tick != price_tick && self.tick != price_tick - 1 {
            return invalid(format!(
                "tick {} does not match sqrt price tick {price_tick}",
                self.tick
            ));
        }
        Ok(())
    }

    /// Whether `mint` is one of the pool's tokens.
    #[must_use]
    pub fn contains_mint(&self, mint: &Address) -> bool {
        *mint == self.token_mint0 || *mint == self.token_mint1
    }

    /// The pool's other token, or `None` if `mint` is not in the pool.
    #[must_use]
    pub fn counterpart(&self, mint: &Address) -> Option<Address> {
        if *mint == self.token_mint0 {
            Some(self.token_mint1)
        } else if *mint == self.token_mint1 {
            Some(self.token_mint0)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::full_math::Q64;
    use crate::math::tick_math::sqrt_price_at_tick;

    fn state() -> PoolState {
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
    fn test_valid_state() {
        assert!(state().validate().is_ok());
        let crossed_down = PoolState {
            tick: -121,
            sqrt_price_x64: sqrt_price_at_tick(-120).unwrap(),
            ..state()
        };
        assert!(crossed_down.validate().is_ok());
    }

    #[test]
    fn test_invalid_states() {
        let swapped = PoolState {
            token_mint0: Address::new([2u8; 32]),
            token_mint1: Address::new([1u8; 32]),
            ..state()
        };
        assert!(matches!(swapped.validate(), Err(ClmmError::InvalidPoolState { .. })));
        assert!(PoolState { tick_spacing: 0, ..state() }.validate().is_err());
        assert!(PoolState { fee_rate: 1_000_000, ..state() }.validate().is_err());
        assert!(PoolState { tick: 50, ..state() }.validate().is_err());
        assert!(PoolState { sqrt_price_x64: 1, ..state() }.validate().is_err());
    }

    #[test]
    fn test_mint_membership() {
        let pool = state();
        let outsider = Address::new([9u8; 32]);
        assert!(pool.contains_mint(&pool.token_mint0));
        assert!(!pool.contains_mint(&outsider));
        assert_eq!(pool.counterpart(&pool.token_mint0), Some(pool.token_mint1));
        assert_eq!(pool.counterpart(&outsider), None);
    }

    #[test]
    fn test_json_round_trip_keeps_u128() {
        let pool = PoolState {
            sqrt_price_x64: 79_226_673_521_066_979_257_578_248_091,
            tick: 443_636,
            ..state()
        };
        let json = serde_json::to_string(&pool).unwrap();
        let back: PoolState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pool);
    }
}
