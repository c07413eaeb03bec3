//! Output formatting for shard runs and listings.
//!
//! The harness describes what happens as a stream of events. Each event is
//! built as an `Fmt*` struct and converted into the formatter's associated
//! type for that event before it is handed over. A formatter only pays for
//! the data it asks for: `()` as an associated type drops the event entirely.
//!
//! During a run, unit events are passed to a dedicated formatting thread, so
//! the per-unit associated types must be [`Send`].

use std::time::Duration;

use crate::{
    outcome::{UnitOutcome, UnitStatus},
    shard::Shard,
    unit::TestUnit,
};

pub mod common;
pub mod no;
pub mod pretty;
pub mod terse;

mod console;
pub use console::*;

/// The run is about to start.
#[derive(Debug, Clone, Copy)]
pub struct FmtRunStart {
    pub shard: Shard,
    /// Units this shard will run.
    pub active: usize,
    /// Units of this shard removed by the filter.
    pub filtered_out: usize,
    /// Units over all shards.
    pub total_units: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct FmtUnitStart<'u> {
    pub unit: &'u TestUnit,
    /// Zero-based index of this unit within the run.
    pub position: usize,
    pub active: usize,
}

#[derive(Debug, Clone)]
pub struct FmtUnitOutcome<'u> {
    pub unit: &'u TestUnit,
    pub outcome: UnitOutcome,
    pub position: usize,
    pub active: usize,
}

/// The run has finished.
#[derive(Debug, Clone)]
pub struct FmtRunOutcomes<'u> {
    pub shard: Shard,
    pub passed: usize,
    pub expected: usize,
    pub filtered_out: usize,
    pub duration: Duration,
    /// Every unit that did not pass, in run order.
    pub failures: Vec<(&'u str, UnitStatus)>,
}

#[derive(Debug, Clone, Copy)]
pub struct FmtListUnit<'u> {
    pub unit: &'u TestUnit,
}

#[derive(Debug, Clone, Copy)]
pub struct FmtEndListing {
    pub shard: Shard,
    pub listed: usize,
    pub filtered_out: usize,
}

/// Formats the events of a shard run.
pub trait UnitFormatter<'u> {
    type Error: Send;

    type RunStart: From<FmtRunStart>;
    fn fmt_run_start(&mut self, data: Self::RunStart) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    type UnitStart: From<FmtUnitStart<'u>> + Send;
    fn fmt_unit_start(&mut self, data: Self::UnitStart) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    type UnitOutcome: From<FmtUnitOutcome<'u>> + Send;
    fn fmt_unit_outcome(&mut self, data: Self::UnitOutcome) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    type RunOutcomes: From<FmtRunOutcomes<'u>>;
    fn fmt_run_outcomes(&mut self, data: Self::RunOutcomes) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }
}

/// Formats a listing of this shard's units.
pub trait UnitListFormatter<'u> {
    type Error;

    type ListUnit: From<FmtListUnit<'u>>;
    fn fmt_list_unit(&mut self, data: Self::ListUnit) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }

    type EndListing: From<FmtEndListing>;
    fn fmt_end_listing(&mut self, data: Self::EndListing) -> Result<(), Self::Error> {
        let _ = data;
        Ok(())
    }
}

/// Which formatter call produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatError {
    RunStart,
    UnitStart,
    UnitOutcome,
    RunOutcomes,
    ListUnit,
    EndListing,
}

pub(crate) enum FmtUnitData<S, O> {
    Start(S),
    Outcome(O),
}

pub(crate) trait FmtErrors<E> {
    fn push_on_error(&mut self, res: (FormatError, Result<(), E>));
}

impl<E> FmtErrors<E> for Vec<(FormatError, E)> {
    fn push_on_error(&mut self, (kind, res): (FormatError, Result<(), E>)) {
        if let Err(err) = res {
            self.push((kind, err));
        }
    }
}

/// Tag a formatter call with the [`FormatError`] variant of the same name.
macro_rules! named_fmt {
    ($fmt:ident.fmt_run_start($data:expr)) => {
        ($crate::formatter::FormatError::RunStart, $fmt.fmt_run_start($data))
    };
    ($fmt:ident.fmt_unit_start($data:expr)) => {
        ($crate::formatter::FormatError::UnitStart, $fmt.fmt_unit_start($data))
    };
    ($fmt:ident.fmt_unit_outcome($data:expr)) => {
        ($crate::formatter::FormatError::UnitOutcome, $fmt.fmt_unit_outcome($data))
    };
    ($fmt:ident.fmt_run_outcomes($data:expr)) => {
        ($crate::formatter::FormatError::RunOutcomes, $fmt.fmt_run_outcomes($data))
    };
    ($fmt:ident.fmt_list_unit($data:expr)) => {
        ($crate::formatter::FormatError::ListUnit, $fmt.fmt_list_unit($data))
    };
    ($fmt:ident.fmt_end_listing($data:expr)) => {
        ($crate::formatter::FormatError::EndListing, $fmt.fmt_end_listing($data))
    };
}

pub(crate) use named_fmt;
