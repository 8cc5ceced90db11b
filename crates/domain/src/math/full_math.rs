//! Full-precision multiply/divide helpers.
//!
//! Products of two 256-bit operands are formed in 512 bits so that
//! `a * b / d` never loses bits before the division.

use primitive_types::{U256, U512};

/// Number of fractional bits in a 64.64 fixed-point value.
pub const RESOLUTION: u32 = 64;

/// `2^64` as a plain integer.
pub const Q64: u128 = 1u128 << RESOLUTION;

/// `2^64` as a [`U256`].
#[must_use]
pub fn q64() -> U256 {
    U256::from(Q64)
}

fn widen(value: U256) -> U512 {
    let U256(limbs) = value;
    U512([limbs[0], limbs[1], limbs[2], limbs[3], 0, 0, 0, 0])
}

fn narrow(value: U512) -> Option<U256> {
    let U512(limbs) = value;
    if limbs[4..].iter().any(|&limb| limb != 0) {
        return None;
    }
    Some(U256([limbs[0], limbs[1], limbs[2], limbs[3]]))
}

/// `floor(a * b / denominator)`, or `None` on a zero denominator or a
/// quotient wider than 256 bits.
#[must_use]
pub fn mul_div_floor(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let product = widen(a) * widen(b);
    narrow(product / widen(denominator))
}

/// `ceil(a * b / denominator)`, or `None` on a zero denominator or a
/// quotient wider than 256 bits.
#[must_use]
pub fn mul_div_ceil(a: U256, b: U256, denominator: U256) -> Option<U256> {
    if denominator.is_zero() {
        return None;
    }
    let product = widen(a) * widen(b);
    let denominator = widen(denominator);
    let mut quotient = product / denominator;
    if !(product % denominator).is_zero() {
        quotient = quotient + U512::one();
    }
    narrow(quotient)
}

/// `ceil(a / b)`, or `None` when `b` is zero.
#[must_use]
pub fn div_ceil(a: U256, b: U256) -> Option<U256> {
    if b.is_zero() {
        return None;
    }
    let quotient = a / b;
    if (a % b).is_zero() {
        Some(quotient)
    } else {
        quotient.checked_add(U256::one())
    }
}

/// Narrows to `u128` when the value fits.
#[must_use]
pub fn to_u128(value: U256) -> Option<u128> {
    if value > U256::from(u128::MAX) {
        None
    } else {
        Some(value.low_u128())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_rounding() {
        let a = U256::from(10u64);
        let b = U256::from(10u64);
        let d = U256::from(3u64);
        assert_eq!(mul_div_floor(a, b, d), Some(U256::from(33u64)));
        assert_eq!(mul_div_ceil(a, b, d), Some(U256::from(34u64)));
        assert_eq!(mul_div_ceil(a, b, U256::from(4u64)), Some(U256::from(25u64)));
    }

    #[test]
    fn test_mul_div_keeps_wide_intermediate() {
        // (2^200 * 2^100) / 2^150 = 2^150
        let a = U256::one() << 200u32;
        let b = U256::one() << 100u32;
        let d = U256::one() << 150u32;
        assert_eq!(mul_div_floor(a, b, d), Some(U256::one() << 150u32));
    }

    #[test]
    fn test_mul_div_overflow_and_zero_denominator() {
        assert_eq!(mul_div_floor(U256::MAX, U256::MAX, U256::one()), None);
        assert_eq!(mul_div_ceil(U256::one(), U256::one(), U256::zero()), None);
        assert_eq!(div_ceil(U256::one(), U256::zero()), None);
    }

    #[test]
    fn test_div_ceil_and_narrow() {
        assert_eq!(div_ceil(U256::from(7u64), U256::from(2u64)), Some(U256::from(4u64)));
        assert_eq!(div_ceil(U256::from(8u64), U256::from(2u64)), Some(U256::from(4u64)));
        assert_eq!(to_u128(U256::from(u128::MAX)), Some(u128::MAX));
        assert_eq!(to_u128(U256::from(u128::MAX) + U256::one()), None);
    }
}
