//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types from the crate.
//!
//! # Example
//!
//! ```rust
//! use clmm_quote_simulation::prelude::*;
//! ```

// Engine
pub use crate::swap::simulate_swap;

// Step math
pub use crate::swap_math::{SwapStep, compute_swap_step};

// State management
pub use crate::state::{
    DEFAULT_MAX_SWAP_STEPS, SwapAmount, SwapDirection, SwapParams, SwapResult, SwapState,
};

// Tick lookup
pub use crate::tick_directory::{NextTick, TickArrayCache, TickDirectory};
