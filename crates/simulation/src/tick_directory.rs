//! Lookup of initialized ticks across cached tick arrays.
//!
//! The swap engine reaches tick data only through [`TickDirectory`], so a
//! hand-built fixture and a cache filled from a state store are
//! interchangeable. Lookups never fetch: a missing array is reported as
//! [`ClmmError::ChunkNotCached`] and must be loaded before the swap runs.

use clmm_quote_domain::error::{ClmmError, Result};
use clmm_quote_domain::math::tick_math::{MAX_TICK, MIN_TICK};
use clmm_quote_domain::tick::{Tick, TickArray, TickArrayRef, tick_array_start_index};
use std::collections::BTreeMap;

/// Result of a scan inside one tick array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextTick {
    /// The initialized tick found, or the array's edge tick.
    pub tick: i32,
    /// Whether `tick` holds liquidity.
    pub initialized: bool,
    /// The array that was scanned.
    pub array: TickArrayRef,
}

/// Read access to tick arrays already resident in memory.
pub trait TickDirectory {
    /// Cached array starting at `start_index`.
    fn tick_array(&self, start_index: i32) -> Result<&TickArray>;

    /// Scans the array holding the next tick in the trade direction.
    ///
    /// Towards lower prices the scan includes the slot at `tick` and ends on
    /// the array's first tick. Towards higher prices it starts one slot above
    /// `tick` and ends on the array's last tick.
    fn next_initialized_tick_in_same_array(
        &self,
        tick: i32,
        tick_spacing: u16,
        towards_lower: bool,
    ) -> Result<NextTick> {
        if tick_spacing == 0 {
            return Err(ClmmError::InvalidSwapParameters {
                reason: "tick spacing must be positive".to_string(),
            });
        }
        let spacing = i32::from(tick_spacing);
        let compressed = tick.div_euclid(spacing);
        let from = if towards_lower {
            compressed * spacing
        } else {
            (compressed + 1) * spacing
        };
        let array = self.tick_array(tick_array_start_index(from, tick_spacing)?)?;
        let slot = ((from - array.start_index()) / spacing) as usize;

        let found = if towards_lower {
            array.ticks()[..=slot]
                .iter()
                .rev()
                .find(|t| t.is_initialized())
        } else {
            array.ticks()[slot..].iter().find(|t| t.is_initialized())
        };

        Ok(match found {
            Some(t) => NextTick {
                tick: t.tick,
                initialized: true,
                array: array.reference(),
            },
            None => NextTick {
                tick: if towards_lower {
                    array.start_index()
                } else {
                    array.last_tick()
                },
                initialized: false,
                array: array.reference(),
            },
        })
    }

    /// Walks adjacent arrays until an initialized tick is found.
    ///
    /// Returns `None` once the array holding the domain edge has been
    /// scanned without a hit; callers then use [`Tick::boundary`].
    fn next_initialized_tick(
        &self,
        tick: i32,
        tick_spacing: u16,
        towards_lower: bool,
    ) -> Result<Option<(Tick, TickArrayRef)>> {
        let mut cursor = tick;
        loop {
            let next = self.next_initialized_tick_in_same_array(cursor, tick_spacing, towards_lower)?;
            if next.initialized {
                let array = self.tick_array(next.array.start_index)?;
                let record = array.get(next.tick).copied().ok_or(ClmmError::TickNotCached {
                    tick: next.tick,
                    start_index: next.array.start_index,
                })?;
                return Ok(Some((record, next.array)));
            }
            if towards_lower {
                if next.tick <= MIN_TICK {
                    return Ok(None);
                }
                cursor = next.tick - 1;
            } else {
                if next.tick >= MAX_TICK {
                    return Ok(None);
                }
                cursor = next.tick;
            }
        }
    }

    /// Liquidity delta stored at `tick`.
    fn liquidity_net_at(&self, tick: i32, tick_spacing: u16) -> Result<(i128, TickArrayRef)> {
        let start_index = tick_array_start_index(tick, tick_spacing)?;
        let array = self
            .tick_array(start_index)
            .map_err(|_| ClmmError::TickNotCached { tick, start_index })?;
        let record = array.get(tick).ok_or_else(|| ClmmError::InvalidTickArray {
            start_index,
            reason: format!("tick {tick} is not on the spacing grid"),
        })?;
        Ok((record.liquidity_net, array.reference()))
    }
}

/// In-memory tick arrays of one pool, keyed by start index.
#[derive(Debug, Clone, Default)]
pub struct TickArrayCache {
    arrays: BTreeMap<i32, TickArray>,
}

impl TickArrayCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cache holding `arrays`.
    #[must_use]
    pub fn from_arrays(arrays: impl IntoIterator<Item = TickArray>) -> Self {
        let mut cache = Self::new();
        cache.extend(arrays);
        cache
    }

    /// Stores `array`, returning the array it replaced.
    pub fn insert(&mut self, array: TickArray) -> Option<TickArray> {
        self.arrays.insert(array.start_index(), array)
    }

    pub fn extend(&mut self, arrays: impl IntoIterator<Item = TickArray>) {
        for array in arrays {
            self.insert(array);
        }
    }

    pub fn remove(&mut self, start_index: i32) -> Option<TickArray> {
        self.arrays.remove(&start_index)
    }

    pub fn clear(&mut self) {
        self.arrays.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.arrays.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arrays.is_empty()
    }

    #[must_use]
    pub fn contains(&self, start_index: i32) -> bool {
        self.arrays.contains_key(&start_index)
    }

    /// Cached start indices in ascending order.
    pub fn start_indices(&self) -> impl Iterator<Item = i32> + '_ {
        self.arrays.keys().copied()
    }

    /// Number of initialized ticks across all cached arrays.
    #[must_use]
    pub fn initialized_tick_count(&self) -> usize {
        self.arrays
            .values()
            .map(|array| array.initialized_ticks().count())
            .sum()
    }
}

impl TickDirectory for TickArrayCache {
    fn tick_array(&self, start_index: i32) -> Result<&TickArray> {
        self.arrays
            .get(&start_index)
            .ok_or(ClmmError::ChunkNotCached { start_index })
    }
}
