//! Construction-time configuration for the three maps.
//!
//! Unlike the teacher's `IndexConfig` (validated with a panicking `assert!`),
//! out-of-range values here return `ArgumentOutOfRange` as a recoverable
//! error, not a logic bug, since capacity and load factor are often derived
//! from caller-supplied, not hard-coded, values.

use crate::error::{Result, TriphashError};

pub(crate) fn round_up_capacity(capacity: usize, floor: usize) -> Result<usize> {
    if capacity == 0 {
        return Err(TriphashError::capacity(capacity));
    }
    Ok(capacity.max(floor).next_power_of_two())
}

pub(crate) fn validate_load_factor(load_factor: f32, max: f32) -> Result<f32> {
    if load_factor > 0.0 && load_factor <= max {
        Ok(load_factor)
    } else {
        Err(TriphashError::load_factor(load_factor))
    }
}

/// Configuration for [`DenseMap`](crate::dense::DenseMap).
///
/// `initial_capacity` is rounded up to a power of two, clamped to at least
/// 16. `load_factor` is clamped to at most 0.875.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DenseMapConfig {
    pub initial_capacity: usize,
    pub load_factor: f32,
}

impl Default for DenseMapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
            load_factor: 0.875,
        }
    }
}

impl DenseMapConfig {
    pub(crate) const MIN_CAPACITY: usize = 16;
    pub(crate) const MAX_LOAD_FACTOR: f32 = 0.875;

    pub(crate) fn validated(self) -> Result<(usize, f32)> {
        let capacity = round_up_capacity(self.initial_capacity, Self::MIN_CAPACITY)?;
        let load_factor = validate_load_factor(self.load_factor, Self::MAX_LOAD_FACTOR)?;
        Ok((capacity, load_factor))
    }
}

/// Configuration for [`BlitzMap`](crate::blitz::BlitzMap).
///
/// `initial_capacity` is rounded up to a power of two, clamped to at least 2.
/// `load_factor` must lie in `(0, 1)` and is clamped to at most 0.9.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlitzMapConfig {
    pub initial_capacity: usize,
    pub load_factor: f32,
}

impl Default for BlitzMapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 2,
            load_factor: 0.9,
        }
    }
}

impl BlitzMapConfig {
    pub(crate) const MIN_CAPACITY: usize = 2;
    pub(crate) const MAX_LOAD_FACTOR: f32 = 0.9;

    pub(crate) fn validated(self) -> Result<(usize, f32)> {
        let capacity = round_up_capacity(self.initial_capacity, Self::MIN_CAPACITY)?;
        let load_factor = validate_load_factor(self.load_factor, Self::MAX_LOAD_FACTOR)?;
        Ok((capacity, load_factor))
    }
}

/// Configuration for [`CMap`](crate::cmap::CMap).
///
/// `initial_capacity` is rounded up to a power of two, clamped to at least
/// 16. CMap uses the canonical, newer migration policy: resize is triggered
/// by probe jump-distance, not by a load factor, so there is no
/// `load_factor` field here — see DESIGN.md for the Open Question this
/// resolves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CMapConfig {
    pub initial_capacity: usize,
}

impl Default for CMapConfig {
    fn default() -> Self {
        Self {
            initial_capacity: 16,
        }
    }
}

impl CMapConfig {
    pub(crate) const MIN_CAPACITY: usize = 16;

    pub(crate) fn validated(self) -> Result<usize> {
        round_up_capacity(self.initial_capacity, Self::MIN_CAPACITY)
    }
}
