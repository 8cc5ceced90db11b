//! Tick-by-tick swap simulation.
//!
//! The engine walks the price curve one initialized tick (or array edge) at
//! a time, crossing liquidity boundaries as it goes. It is synchronous and
//! reads tick data only from a [`TickDirectory`] that was filled beforehand.

use crate::state::{SwapParams, SwapResult, SwapState};
use crate::swap_math::compute_swap_step;
use crate::tick_directory::TickDirectory;
use clmm_quote_domain::error::{ClmmError, Result};
use clmm_quote_domain::math::concentrated_liquidity::add_delta;
use clmm_quote_domain::math::tick_math::{
    MAX_TICK, MIN_TICK, sqrt_price_at_tick, tick_at_sqrt_price,
};
use clmm_quote_domain::tick::TickArrayRef;
use tracing::trace;

fn record_touched(touched: &mut Vec<TickArrayRef>, array: TickArrayRef) {
    if !touched.iter().any(|seen| seen.start_index == array.start_index) {
        touched.push(array);
    }
}

/// Simulates a swap against the tick arrays held by `directory`.
///
/// Stops when the specified amount is filled, the price limit is reached or
/// the tick leaves the open domain `(MIN_TICK, MAX_TICK)`.
///
/// # Errors
/// Parameter and price-limit validation errors, cache misses from the
/// directory, and [`ClmmError::StepLimitExceeded`] when more than
/// `params.max_steps` steps would be needed.
pub fn simulate_swap<D>(directory: &D, params: &SwapParams) -> Result<SwapResult>
where
    D: TickDirectory + ?Sized,
{
    let sqrt_price_limit = params.validate()?;
    let zero_for_one = params.direction.is_zero_for_one();
    let exact_input = params.amount.is_exact_input();

    let mut state = SwapState::new(params);
    let mut touched = Vec::with_capacity(params.max_steps + 1);

    while state.amount_remaining != 0
        && state.sqrt_price_x64 != sqrt_price_limit
        && state.tick > MIN_TICK
        && state.tick < MAX_TICK
    {
        if state.steps == params.max_steps {
            return Err(ClmmError::StepLimitExceeded {
                max_steps: params.max_steps,
                amount_remaining: state.amount_remaining,
                tick: state.tick,
            });
        }

        let sqrt_price_start = state.sqrt_price_x64;
        let next = directory.next_initialized_tick_in_same_array(
            state.tick,
            params.tick_spacing,
            zero_for_one,
        )?;
        record_touched(&mut touched, next.array);

        let tick_next = next.tick.clamp(MIN_TICK, MAX_TICK);
        let sqrt_price_next = sqrt_price_at_tick(tick_next)?;
        let sqrt_price_target = if zero_for_one {
            sqrt_price_next.max(sqrt_price_limit)
        } else {
            sqrt_price_next.min(sqrt_price_limit)
        };

        let step = compute_swap_step(
            sqrt_price_start,
            sqrt_price_target,
            state.liquidity,
            state.amount_remaining,
            params.fee_rate,
            exact_input,
        )?;
        state.sqrt_price_x64 = step.sqrt_price_next;

        let paid = step
            .amount_in
            .checked_add(step.fee_amount)
            .ok_or(ClmmError::AmountOverflow)?;
        let (filled, calculated) = if exact_input {
            (paid, step.amount_out)
        } else {
            (step.amount_out, paid)
        };
        state.amount_remaining = state
            .amount_remaining
            .checked_sub(filled)
            .ok_or(ClmmError::AmountOverflow)?;
        state.amount_calculated = state
            .amount_calculated
            .checked_add(calculated)
            .ok_or(ClmmError::AmountOverflow)?;
        state.steps += 1;

        if step.sqrt_price_next == sqrt_price_next {
            if next.initialized {
                let (liquidity_net, array) =
                    directory.liquidity_net_at(tick_next, params.tick_spacing)?;
                record_touched(&mut touched, array);
                let delta = if zero_for_one {
                    liquidity_net.checked_neg().ok_or(ClmmError::LiquidityOverflow {
                        liquidity: state.liquidity,
                        delta: liquidity_net,
                    })?
                } else {
                    liquidity_net
                };
                state.liquidity = add_delta(state.liquidity, delta)?;
            }
            state.tick = if zero_for_one { tick_next - 1 } else { tick_next };
        } else if step.sqrt_price_next != sqrt_price_start {
            state.tick = tick_at_sqrt_price(step.sqrt_price_next)?;
        }

        trace!(
            step = state.steps,
            tick_next,
            initialized = next.initialized,
            amount_in = step.amount_in,
            amount_out = step.amount_out,
            fee = step.fee_amount,
            sqrt_price = state.sqrt_price_x64,
            liquidity = state.liquidity,
            tick = state.tick,
            "Swap step"
        );
    }

    Ok(SwapResult {
        amount_calculated: state.amount_calculated,
        amount_remaining: state.amount_remaining,
        sqrt_price_x64: state.sqrt_price_x64,
        liquidity: state.liquidity,
        tick: state.tick,
        touched_arrays: touched,
        steps: state.steps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{SwapAmount, SwapDirection};
    use crate::tick_directory::TickArrayCache;
    use crate::tick_directory::tests::{L1, L2, SPACING, build_cache, layered_pool, narrow_pool};
    use clmm_quote_domain::math::Q64;
    use clmm_quote_domain::tick::Tick;

    fn params(liquidity: u128, direction: SwapDirection, amount: SwapAmount) -> SwapParams {
        SwapParams {
            direction,
            amount,
            fee_rate: 2_500,
            liquidity,
            tick_current: 0,
            tick_spacing: SPACING,
            sqrt_price_x64: Q64,
            sqrt_price_limit_x64: None,
            max_steps: crate::state::DEFAULT_MAX_SWAP_STEPS,
        }
    }

    fn starts(result: &SwapResult) -> Vec<i32> {
        result.touched_arrays.iter().map(|a| a.start_index).collect()
    }

    #[test]
    fn test_crossing_below_zero_liquidity_fails() {
        let cache = build_cache(&[-600, 0], &[Tick::new(-120, 100, 100)]);
        let result = simulate_swap(
            &cache,
            &params(10, SwapDirection::ZeroForOne, SwapAmount::ExactInput(1_000_000_000)),
        );
        assert_eq!(
            result,
            Err(ClmmError::LiquidityUnderflow {
                liquidity: 10,
                delta: -100,
            })
        );
    }

    #[test]
    fn test_exact_input_within_one_range() {
        let result = simulate_swap(
            &narrow_pool(),
            &params(L1, SwapDirection::ZeroForOne, SwapAmount::ExactInput(100_000)),
        )
        .unwrap();
        assert_eq!(result.amount_calculated, 99_749);
        assert_eq!(result.amount_remaining, 0);
        assert_eq!(result.sqrt_price_x64, 18_446_708_703_330_228_141);
        assert_eq!(result.liquidity, L1);
        assert_eq!(result.tick, -1);
        assert_eq!(starts(&result), vec![0, -600]);
        assert_eq!(result.steps, 2);
    }

    #[test]
    fn test_exact_output_within_one_range() {
        let result = simulate_swap(
            &narrow_pool(),
            &params(L1, SwapDirection::ZeroForOne, SwapAmount::ExactOutput(50_000)),
        )
        .unwrap();
        assert_eq!(result.amount_calculated, 50_127);
        assert_eq!(result.sqrt_price_x64, 18_446_726_344_162_111_061);
        assert_eq!(result.tick, -1);
        assert!(result.is_complete());
    }

    #[test]
    fn test_one_for_zero_stays_in_first_array() {
        let result = simulate_swap(
            &narrow_pool(),
            &params(L1, SwapDirection::OneForZero, SwapAmount::ExactInput(100_000)),
        )
        .unwrap();
        assert_eq!(result.amount_calculated, 99_749);
        assert_eq!(result.sqrt_price_x64, 18_446_779_444_156_695_522);
        assert_eq!(result.tick, 0);
        assert_eq!(starts(&result), vec![0]);
        assert_eq!(result.steps, 1);

        let result = simulate_swap(
            &narrow_pool(),
            &params(L1, SwapDirection::OneForZero, SwapAmount::ExactOutput(50_000)),
        )
        .unwrap();
        assert_eq!(result.amount_calculated, 50_127);
        assert_eq!(result.sqrt_price_x64, 18_446_761_803_274_032_423);
    }

    #[test]
    fn test_crossing_a_tick_changes_liquidity() {
        let result = simulate_swap(
            &layered_pool(),
            &params(L1 + L2, SwapDirection::ZeroForOne, SwapAmount::ExactInput(10_000_000_000)),
        )
        .unwrap();
        assert_eq!(result.amount_calculated, 9_880_667_586);
        assert_eq!(result.sqrt_price_x64, 18_270_218_287_959_617_053);
        assert_eq!(result.liquidity, L2);
        assert_eq!(result.tick, -193);
        assert_eq!(starts(&result), vec![0, -600]);
        assert_eq!(result.steps, 3);
    }

    #[test]
    fn test_crossing_with_exact_output() {
        let result = simulate_swap(
            &layered_pool(),
            &params(L1 + L2, SwapDirection::ZeroForOne, SwapAmount::ExactOutput(9_000_000_000)),
        )
        .unwrap();
        assert_eq!(result.amount_calculated, 9_100_781_801);
        assert_eq!(result.sqrt_price_x64, 18_286_463_737_550_679_668);
        assert_eq!(result.liquidity, L2);
        assert_eq!(result.tick, -175);
    }

    #[test]
    fn test_crossing_upwards() {
        let result = simulate_swap(
            &layered_pool(),
            &params(L1 + L2, SwapDirection::OneForZero, SwapAmount::ExactInput(10_000_000_000)),
        )
        .unwrap();
        assert_eq!(result.amount_calculated, 9_880_667_586);
        assert_eq!(result.sqrt_price_x64, 18_624_975_441_327_392_358);
        assert_eq!(result.liquidity, L2);
        assert_eq!(result.tick, 192);
        assert_eq!(starts(&result), vec![0]);
    }

    #[test]
    fn test_price_limit_leaves_remainder() {
        let limit = sqrt_price_at_tick(-60).unwrap();
        let result = simulate_swap(
            &layered_pool(),
            &params(L1 + L2, SwapDirection::ZeroForOne, SwapAmount::ExactInput(10_000_000_000))
                .with_price_limit(Some(limit)),
        )
        .unwrap();
        assert_eq!(limit, 18_391_489_527_427_966_291);
        assert_eq!(result.amount_calculated, 3_151_181_116);
        assert_eq!(result.amount_remaining, 6_831_430_194);
        assert_eq!(result.sqrt_price_x64, limit);
        assert_eq!(result.liquidity, L1 + L2);
        assert_eq!(result.tick, -60);
        assert!(!result.is_complete());
    }

    #[test]
    fn test_limit_at_current_price_is_a_no_op() {
        let result = simulate_swap(
            &narrow_pool(),
            &params(L1, SwapDirection::ZeroForOne, SwapAmount::ExactInput(100))
                .with_price_limit(Some(Q64)),
        )
        .unwrap();
        assert_eq!(result.amount_calculated, 0);
        assert_eq!(result.amount_remaining, 100);
        assert_eq!(result.steps, 0);
        assert!(result.touched_arrays.is_empty());
    }

    #[test]
    fn test_missing_array_fails() {
        let err = simulate_swap(
            &narrow_pool(),
            &params(L1, SwapDirection::OneForZero, SwapAmount::ExactInput(1_000_000_000_000)),
        )
        .unwrap_err();
        assert_eq!(err, ClmmError::ChunkNotCached { start_index: 600 });
        assert!(err.is_cache_miss());

        let err = simulate_swap(
            &narrow_pool(),
            &params(L1, SwapDirection::ZeroForOne, SwapAmount::ExactOutput(1_000_000_000_000)),
        )
        .unwrap_err();
        assert_eq!(err, ClmmError::ChunkNotCached { start_index: -1200 });
    }

    #[test]
    fn test_step_cap() {
        let err = simulate_swap(
            &narrow_pool(),
            &params(L1, SwapDirection::ZeroForOne, SwapAmount::ExactInput(100_000)).with_max_steps(1),
        )
        .unwrap_err();
        assert_eq!(
            err,
            ClmmError::StepLimitExceeded {
                max_steps: 1,
                amount_remaining: 100_000,
                tick: -1,
            }
        );

        // Exactly enough steps succeeds.
        assert!(
            simulate_swap(
                &narrow_pool(),
                &params(L1, SwapDirection::ZeroForOne, SwapAmount::ExactInput(100_000))
                    .with_max_steps(2),
            )
            .is_ok()
        );
    }

    #[test]
    fn test_invalid_parameters_fail_before_lookup() {
        let empty = TickArrayCache::new();
        assert!(matches!(
            simulate_swap(&empty, &params(L1, SwapDirection::ZeroForOne, SwapAmount::ExactInput(0))),
            Err(ClmmError::InvalidSwapParameters { .. })
        ));
        assert!(matches!(
            simulate_swap(
                &empty,
                &params(L1, SwapDirection::OneForZero, SwapAmount::ExactInput(1))
                    .with_price_limit(Some(Q64 - 1)),
            ),
            Err(ClmmError::InvalidPriceLimit { .. })
        ));
    }

    #[test]
    fn test_chained_swaps_drift() {
        let cache = narrow_pool();
        let first = simulate_swap(
            &cache,
            &params(L1, SwapDirection::ZeroForOne, SwapAmount::ExactInput(100_000)),
        )
        .unwrap();
        let mut second = params(L1, SwapDirection::ZeroForOne, SwapAmount::ExactInput(100_000));
        second.sqrt_price_x64 = first.sqrt_price_x64;
        second.tick_current = first.tick;
        second.liquidity = first.liquidity;
        let second = simulate_swap(&cache, &second).unwrap();
        assert_eq!(second.amount_calculated, 99_749);
        assert_eq!(second.sqrt_price_x64, 18_446_673_333_086_545_007);
        assert_eq!(starts(&second), vec![-600]);
        assert_eq!(second.steps, 1);
    }
}
