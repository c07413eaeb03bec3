//! Unit filtering.
//!
//! A filter narrows down the units of this shard before anything runs.
//! Filtering happens after partitioning, so it never moves a unit to another
//! shard; it only decides whether this shard looks at it. Filtered units are
//! not part of the run at all and do not count towards the expected total.
//!
//! Implement [`UnitFilter`] to define a filter strategy.

use crate::unit::TestUnit;

/// The result of applying a [`UnitFilter`].
#[derive(Debug, Clone)]
pub struct FilteredUnits<'u> {
    /// The units that are included in the run, in their original order.
    pub units: Vec<&'u TestUnit>,

    /// The number of units that were filtered out.
    pub filtered_out: usize,
}

pub trait UnitFilter {
    fn filter<'u>(&self, units: &[&'u TestUnit]) -> FilteredUnits<'u>;
}

/// A [`UnitFilter`] that keeps every unit.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct NoFilter;

impl NoFilter {
    pub fn new() -> Self {
        Self
    }
}

impl UnitFilter for NoFilter {
    fn filter<'u>(&self, units: &[&'u TestUnit]) -> FilteredUnits<'u> {
        FilteredUnits {
            units: units.to_vec(),
            filtered_out: 0,
        }
    }
}

/// Keep units whose key matches any filter and no skip pattern.
///
/// Matching is by substring, or by equality when `exact` is set. An empty
/// filter list matches everything.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct DefaultFilter {
    exact: bool,
    filter: Vec<String>,
    skip: Vec<String>,
}

impl DefaultFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exact(self, exact: bool) -> Self {
        Self { exact, ..self }
    }

    pub fn with_filter(self, filter: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            filter: filter.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    pub fn with_skip(self, skip: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            skip: skip.into_iter().map(Into::into).collect(),
            ..self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filter.is_empty() && self.skip.is_empty()
    }

    fn matches(&self, key: &str, pattern: &str) -> bool {
        match self.exact {
            true => key == pattern,
            false => key.contains(pattern),
        }
    }
}

impl UnitFilter for DefaultFilter {
    fn filter<'u>(&self, units: &[&'u TestUnit]) -> FilteredUnits<'u> {
        if self.is_empty() {
            return NoFilter.filter(units);
        }

        let mut remaining = Vec::new();
        let mut filtered_out = 0;
        for unit in units {
            let key = unit.key.as_str();
            let in_filter = self.filter.is_empty()
                || self.filter.iter().any(|filter| self.matches(key, filter));
            let skipped = self.skip.iter().any(|skip| self.matches(key, skip));

            match in_filter && !skipped {
                true => remaining.push(*unit),
                false => filtered_out += 1,
            }
        }

        FilteredUnits {
            units: remaining,
            filtered_out,
        }
    }
}
