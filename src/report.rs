use std::{process::ExitCode, time::Duration};

use crate::{formatter::FormatError, outcome::UnitOutcome, shard::Shard};

pub type UnitOutcomes<'u> = Vec<(&'u str, UnitOutcome)>;

/// What a shard run did.
///
/// A shard succeeded when every unit assigned to it ran and passed. Units a
/// filter removed count as not run, so a filtered shard never succeeds.
#[derive(Debug)]
#[non_exhaustive]
pub struct ShardReport<'u, FmtError: 'u> {
    pub shard: Shard,
    pub outcomes: UnitOutcomes<'u>,
    /// Units assigned to this shard, filtered ones included.
    pub expected: usize,
    /// `ceil(total_units / total_shards)`.
    pub expected_upper_bound: usize,
    pub filtered_out: usize,
    /// Units over all shards.
    pub total_units: usize,
    pub duration: Duration,
    pub fmt_errors: Vec<(FormatError, FmtError)>,
}

impl<FmtError> ShardReport<'_, FmtError> {
    pub fn passed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.passed())
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    /// Units assigned to this shard that produced no outcome.
    pub fn not_run(&self) -> usize {
        self.expected.saturating_sub(self.outcomes.len())
    }

    /// Whether every assigned unit produced an outcome and the assignment
    /// stayed within the partitioner's upper bound.
    pub fn complete(&self) -> bool {
        self.outcomes.len() == self.expected && self.expected <= self.expected_upper_bound
    }

    pub fn success(&self) -> bool {
        self.complete() && self.passed() == self.expected
    }

    pub fn exit_code(&self) -> ExitCode {
        match self.success() {
            true => ExitCode::SUCCESS,
            false => ExitCode::FAILURE,
        }
    }
}
