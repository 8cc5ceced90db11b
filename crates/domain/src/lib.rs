//! Core types and fixed-point math for concentrated-liquidity pools.
//!
//! Prices are 64.64 square roots, ticks are powers of 1.0001 and liquidity is
//! grouped into arrays of [`tick::TICK_ARRAY_SIZE`] ticks.

pub mod address;
pub mod error;
pub mod fees;
pub mod math;
pub mod pool;
pub mod tick;
pub mod value_objects;

pub use address::Address;
pub use error::{ClmmError, Result};
pub use pool::PoolState;
pub use tick::{TICK_ARRAY_SIZE, Tick, TickArray, TickArrayRef};
