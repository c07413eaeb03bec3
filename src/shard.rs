//! Shard partitioning.
//!
//! Every unit has a global position: its index in key order. Shard `i` of `n`
//! owns exactly the units whose position is congruent to `i` modulo `n`. Since
//! positions only depend on the unit keys, running the same tree with the same
//! `n` on any machine gives every shard the same workload, and the `n` shards
//! together cover every unit exactly once.

use std::{fmt, num::NonZeroUsize};

use crate::{
    config::ConfigError,
    unit::{TestUnit, TestUnits},
};

/// A validated shard index and shard count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shard {
    index: usize,
    total: NonZeroUsize,
}

impl Default for Shard {
    fn default() -> Self {
        Self::SINGLE
    }
}

impl Shard {
    /// The only shard of an unsharded run.
    pub const SINGLE: Shard = Shard {
        index: 0,
        total: NonZeroUsize::MIN,
    };

    pub fn new(index: usize, total: usize) -> Result<Self, ConfigError> {
        let total = NonZeroUsize::new(total).ok_or(ConfigError::InvalidShardCount(0))?;
        if index >= total.get() {
            return Err(ConfigError::ShardIndexOutOfRange {
                index: index as i64,
                total: total.get(),
            });
        }
        Ok(Self { index, total })
    }

    /// Validate shard parameters as they come from the environment, where
    /// nothing stops them from being negative.
    pub fn from_signed(index: i64, total: i64) -> Result<Self, ConfigError> {
        let total = usize::try_from(total)
            .ok()
            .filter(|total| *total > 0)
            .ok_or(ConfigError::InvalidShardCount(total))?;
        let index = usize::try_from(index).map_err(|_| ConfigError::ShardIndexOutOfRange {
            index,
            total,
        })?;
        Self::new(index, total)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn total(&self) -> usize {
        self.total.get()
    }

    /// Whether the unit at global `position` belongs to this shard.
    pub fn owns(&self, position: usize) -> bool {
        position % self.total == self.index
    }

    /// Upper bound on how many of `total_units` units any shard receives.
    pub fn expected_upper_bound(&self, total_units: usize) -> usize {
        total_units.div_ceil(self.total.get())
    }

    /// Select this shard's units out of all discovered units.
    pub fn partition<'u>(&self, units: &'u TestUnits) -> ShardAssignment<'u> {
        let selected: Vec<_> = units
            .iter()
            .enumerate()
            .filter(|(position, _)| self.owns(*position))
            .map(|(_, unit)| unit)
            .collect();

        tracing::info!(
            shard = %self,
            selected = selected.len(),
            expected_upper_bound = self.expected_upper_bound(units.len()),
            total_units = units.len(),
            "partitioned test units"
        );

        ShardAssignment {
            shard: *self,
            units: selected,
            total_units: units.len(),
        }
    }
}

impl fmt::Display for Shard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index, self.total)
    }
}

/// The units one shard is responsible for.
#[derive(Debug, Clone)]
pub struct ShardAssignment<'u> {
    pub shard: Shard,
    /// This shard's units, in global position order.
    pub units: Vec<&'u TestUnit>,
    /// Number of units over all shards.
    pub total_units: usize,
}

impl ShardAssignment<'_> {
    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// `ceil(total_units / total_shards)`.
    pub fn expected_upper_bound(&self) -> usize {
        self.shard.expected_upper_bound(self.total_units)
    }
}
