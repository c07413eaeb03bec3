//! Format transfer objects that are used by multiple formatters.

use std::time::Duration;

use crate::{formatter::*, outcome::UnitStatus};

/// The part of a unit outcome the console formatters print.
#[derive(Debug, Clone)]
pub struct UnitResult<'u> {
    pub key: &'u str,
    pub status: UnitStatus,
    pub duration: Duration,
}

impl<'u> From<FmtUnitOutcome<'u>> for UnitResult<'u> {
    fn from(value: FmtUnitOutcome<'u>) -> Self {
        Self {
            key: value.unit.key.as_str(),
            status: value.outcome.status,
            duration: value.outcome.duration,
        }
    }
}

/// A unit key and how many files the unit has.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnitListing<'u> {
    pub key: &'u str,
    pub files: usize,
}

impl<'u> From<FmtListUnit<'u>> for UnitListing<'u> {
    fn from(value: FmtListUnit<'u>) -> Self {
        Self {
            key: value.unit.key.as_str(),
            files: value.unit.files.len(),
        }
    }
}
