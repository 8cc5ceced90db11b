//! Tick records and fixed-size tick arrays.

use crate::address::Address;
use crate::error::{ClmmError, Result};
use crate::math::tick_math::{MAX_TICK, MIN_TICK};
use serde::{Deserialize, Serialize};

/// Number of tick slots in one array.
pub const TICK_ARRAY_SIZE: usize = 60;

/// Number of ticks spanned by one array for a given spacing.
#[must_use]
pub fn ticks_in_array(tick_spacing: u16) -> i32 {
    TICK_ARRAY_SIZE as i32 * i32::from(tick_spacing)
}

/// Start index of the array that owns `tick`.
///
/// Floors towards negative infinity, so tick `-1` belongs to the array
/// starting at `-60 * tick_spacing`.
///
/// # Errors
/// [`ClmmError::InvalidSwapParameters`] when `tick_spacing` is zero.
pub fn tick_array_start_index(tick: i32, tick_spacing: u16) -> Result<i32> {
    if tick_spacing == 0 {
        return Err(ClmmError::InvalidSwapParameters {
            reason: "tick spacing must be positive".to_string(),
        });
    }
    let span = ticks_in_array(tick_spacing);
    Ok(tick.div_euclid(span) * span)
}

/// A liquidity boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tick {
    /// Tick index.
    pub tick: i32,
    /// Liquidity added when the price crosses this tick upwards.
    pub liquidity_net: i128,
    /// Total liquidity referencing this tick. Zero means uninitialized.
    pub liquidity_gross: u128,
}

impl Tick {
    /// Creates a tick record.
    #[must_use]
    pub fn new(tick: i32, liquidity_net: i128, liquidity_gross: u128) -> Self {
        Self {
            tick,
            liquidity_net,
            liquidity_gross,
        }
    }

    /// An empty slot.
    #[must_use]
    pub fn uninitialized(tick: i32) -> Self {
        Self::new(tick, 0, 0)
    }

    /// Virtual tick standing in for `MIN_TICK` or `MAX_TICK` when no
    /// initialized tick exists before the domain edge.
    #[must_use]
    pub fn boundary(towards_lower: bool) -> Self {
        Self::uninitialized(if towards_lower { MIN_TICK } else { MAX_TICK })
    }

    /// Whether any position references this tick.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.liquidity_gross > 0
    }
}

/// Reference to a tick array touched by a swap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickArrayRef {
    /// First tick of the array.
    pub start_index: i32,
    /// Account holding the array.
    pub address: Address,
}

/// `TICK_ARRAY_SIZE` consecutive tick slots spaced `tick_spacing` apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickArray {
    address: Address,
    start_index: i32,
    tick_spacing: u16,
    ticks: Vec<Tick>,
}

impl TickArray {
    /// Builds an array from a full slot vector.
    ///
    /// # Errors
    /// [`ClmmError::InvalidTickArray`] when the start index is not aligned,
    /// the slot count is wrong or a slot holds the wrong tick index.
    pub fn new(
        address: Address,
        start_index: i32,
        tick_spacing: u16,
        ticks: Vec<Tick>,
    ) -> Result<Self> {
        check_layout(start_index, tick_spacing)?;
        if ticks.len() != TICK_ARRAY_SIZE {
            return Err(ClmmError::InvalidTickArray {
                start_index,
                reason: format!("expected {TICK_ARRAY_SIZE} slots, got {}", ticks.len()),
            });
        }
        for (slot, tick) in ticks.iter().enumerate() {
            let expected = slot_tick(start_index, tick_spacing, slot);
            if tick.tick != expected {
                return Err(ClmmError::InvalidTickArray {
                    start_index,
                    reason: format!("slot {slot} holds tick {}, expected {expected}", tick.tick),
                });
            }
        }
        Ok(Self {
            address,
            start_index,
            tick_spacing,
            ticks,
        })
    }

    /// Builds an array with no initialized ticks.
    pub fn empty(address: Address, start_index: i32, tick_spacing: u16) -> Result<Self> {
        check_layout(start_index, tick_spacing)?;
        let ticks = (0..TICK_ARRAY_SIZE)
            .map(|slot| Tick::uninitialized(slot_tick(start_index, tick_spacing, slot)))
            .collect();
        Ok(Self {
            address,
            start_index,
            tick_spacing,
            ticks,
        })
    }

    /// Builds an array from its initialized ticks only; the other slots are
    /// left empty.
    ///
    /// # Errors
    /// [`ClmmError::InvalidTickArray`] when a tick lies outside the array or
    /// off the spacing grid.
    pub fn from_initialized(
        address: Address,
        start_index: i32,
        tick_spacing: u16,
        initialized: impl IntoIterator<Item = Tick>,
    ) -> Result<Self> {
        let mut array = Self::empty(address, start_index, tick_spacing)?;
        for tick in initialized {
            let slot = array.slot_of(tick.tick).ok_or_else(|| ClmmError::InvalidTickArray {
                start_index,
                reason: format!("tick {} is not a slot of this array", tick.tick),
            })?;
            array.ticks[slot] = tick;
        }
        Ok(array)
    }

    /// Account holding the array.
    #[must_use]
    pub fn address(&self) -> Address {
        self.address
    }

    /// First tick of the array.
    #[must_use]
    pub fn start_index(&self) -> i32 {
        self.start_index
    }

    /// Tick of the last slot.
    #[must_use]
    pub fn last_tick(&self) -> i32 {
        slot_tick(self.start_index, self.tick_spacing, TICK_ARRAY_SIZE - 1)
    }

    #[must_use]
    pub fn tick_spacing(&self) -> u16 {
        self.tick_spacing
    }

    /// All slots in ascending tick order.
    #[must_use]
    pub fn ticks(&self) -> &[Tick] {
        &self.ticks
    }

    /// Slot index holding `tick`, if the tick is on this array's grid.
    #[must_use]
    pub fn slot_of(&self, tick: i32) -> Option<usize> {
        let offset = tick - self.start_index;
        let spacing = i32::from(self.tick_spacing);
        if offset < 0 || offset % spacing != 0 {
            return None;
        }
        let slot = (offset / spacing) as usize;
        (slot < TICK_ARRAY_SIZE).then_some(slot)
    }

    /// Record for `tick`, if it is a slot of this array.
    #[must_use]
    pub fn get(&self, tick: i32) -> Option<&Tick> {
        self.slot_of(tick).map(|slot| &self.ticks[slot])
    }

    /// Iterates over the initialized slots.
    pub fn initialized_ticks(&self) -> impl Iterator<Item = &Tick> {
        self.ticks.iter().filter(|tick| tick.is_initialized())
    }

    /// Reference emitted in swap results.
    #[must_use]
    pub fn reference(&self) -> TickArrayRef {
        TickArrayRef {
            start_index: self.start_index,
            address: self.address,
        }
    }
}

fn slot_tick(start_index: i32, tick_spacing: u16, slot: usize) -> i32 {
    start_index + slot as i32 * i32::from(tick_spacing)
}

fn check_layout(start_index: i32, tick_spacing: u16) -> Result<()> {
    if tick_spacing == 0 {
        return Err(ClmmError::InvalidTickArray {
            start_index,
            reason: "tick spacing must be positive".to_string(),
        });
    }
    if start_index % ticks_in_array(tick_spacing) != 0 {
        return Err(ClmmError::InvalidTickArray {
            start_index,
            reason: format!("not a multiple of {}", ticks_in_array(tick_spacing)),
        });
    }
    let lowest = tick_array_start_index(MIN_TICK, tick_spacing)?;
    let highest = tick_array_start_index(MAX_TICK, tick_spacing)?;
    if !(lowest..=highest).contains(&start_index) {
        return Err(ClmmError::InvalidTickArray {
            start_index,
            reason: format!("outside [{lowest}, {highest}]"),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address::new([3u8; 32])
    }

    #[test]
    fn test_start_index_floors_negative_ticks() {
        assert_eq!(tick_array_start_index(0, 10).unwrap(), 0);
        assert_eq!(tick_array_start_index(599, 10).unwrap(), 0);
        assert_eq!(tick_array_start_index(600, 10).unwrap(), 600);
        assert_eq!(tick_array_start_index(-1, 10).unwrap(), -600);
        assert_eq!(tick_array_start_index(-600, 10).unwrap(), -600);
        assert_eq!(tick_array_start_index(-601, 10).unwrap(), -1200);
        assert_eq!(tick_array_start_index(MIN_TICK, 1).unwrap(), -443_640);
    }

    #[test]
    fn test_start_index_rejects_zero_spacing() {
        assert!(matches!(
            tick_array_start_index(42, 0),
            Err(ClmmError::InvalidSwapParameters { .. })
        ));
    }

    #[test]
    fn test_sparse_construction() {
        let array = TickArray::from_initialized(
            address(),
            -600,
            10,
            [Tick::new(-120, 5, 5), Tick::new(-10, -2, 2)],
        )
        .unwrap();
        assert_eq!(array.ticks().len(), TICK_ARRAY_SIZE);
        assert_eq!(array.last_tick(), -10);
        assert_eq!(array.slot_of(-120), Some(48));
        assert_eq!(array.get(-120).unwrap().liquidity_net, 5);
        assert!(!array.get(-110).unwrap().is_initialized());
        assert_eq!(array.initialized_ticks().count(), 2);
        assert_eq!(array.reference().start_index, -600);
    }

    #[test]
    fn test_slot_lookup_rejects_foreign_ticks() {
        let array = TickArray::empty(address(), 0, 10).unwrap();
        assert_eq!(array.slot_of(5), None);
        assert_eq!(array.slot_of(600), None);
        assert_eq!(array.slot_of(-10), None);
        assert_eq!(array.slot_of(590), Some(59));
    }

    #[test]
    fn test_layout_validation() {
        assert!(matches!(
            TickArray::empty(address(), 10, 10),
            Err(ClmmError::InvalidTickArray { start_index: 10, .. })
        ));
        assert!(TickArray::empty(address(), 0, 0).is_err());
        assert!(TickArray::empty(address(), 444_000, 10).is_err());
        assert!(TickArray::new(address(), 0, 10, vec![Tick::default(); 10]).is_err());

        let mut ticks: Vec<Tick> = (0..60).map(|i| Tick::uninitialized(i * 10)).collect();
        assert!(TickArray::new(address(), 0, 10, ticks.clone()).is_ok());
        ticks[3].tick = 31;
        assert!(TickArray::new(address(), 0, 10, ticks).is_err());

        assert!(TickArray::from_initialized(address(), 0, 10, [Tick::new(605, 1, 1)]).is_err());
    }

    #[test]
    fn test_boundary_ticks() {
        assert_eq!(Tick::boundary(true).tick, MIN_TICK);
        assert_eq!(Tick::boundary(false).tick, MAX_TICK);
        assert!(!Tick::boundary(true).is_initialized());
    }
}
