//! Swap simulation over cached tick arrays.
//!
//! [`swap::simulate_swap`] steps through a [`tick_directory::TickDirectory`],
//! using [`swap_math::compute_swap_step`] between consecutive boundaries.

pub mod prelude;
pub mod state;
pub mod swap;
pub mod swap_math;
pub mod tick_directory;
