//! Fixed-point price and liquidity math.

pub mod concentrated_liquidity;
pub mod full_math;
pub mod price_tick;
pub mod sqrt_price;
pub mod tick_math;

pub use full_math::Q64;
pub use tick_math::{MAX_SQRT_PRICE_X64, MAX_TICK, MIN_SQRT_PRICE_X64, MIN_TICK};
