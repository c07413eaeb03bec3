use std::{path::Path, thread, time::Instant};

use crate::{
    filter::{FilteredUnits, UnitFilter},
    fixture::FixtureSet,
    formatter::*,
    outcome::{UnitOutcome, UnitStatus},
    pipeline::{Pipeline, PipelineStage, Stage, StageContext},
    report::ShardReport,
    unit::TestUnit,
    workdir::WorkDir,
};

use super::Harness;

/// Formatter events that may queue up while the formatter thread is busy.
const FORMAT_QUEUE: usize = 16;

impl<'u, Filter, Compile, Assemble, Run, Formatter>
    Harness<'u, Filter, Compile, Assemble, Run, Formatter>
where
    Filter: UnitFilter,
    Compile: PipelineStage,
    Assemble: PipelineStage,
    Run: PipelineStage,
    Formatter: UnitFormatter<'u> + Send + 'u,
{
    /// Run every unit of the shard that passes the filter.
    ///
    /// Units run one at a time in key order. A unit's failure never stops the
    /// shard; it is recorded and the next unit starts in a fresh working
    /// directory. The report still expects every assigned unit, so filtered
    /// units leave the shard incomplete.
    pub fn run(self) -> ShardReport<'u, Formatter::Error> {
        let now = Instant::now();
        let shard = self.assignment.shard;

        let mut formatter = self.formatter;
        let mut fmt_errors = Vec::new();

        let FilteredUnits {
            units,
            filtered_out,
        } = self.filter.filter(&self.assignment.units);
        let active = units.len();
        fmt_errors.push_on_error(named_fmt!(
            formatter.fmt_run_start(
                FmtRunStart {
                    shard,
                    active,
                    filtered_out,
                    total_units: self.assignment.total_units,
                }
                .into()
            )
        ));

        let runner = UnitRunner {
            pipeline: &self.pipeline,
            fixtures: &self.fixtures,
            workdir: &self.workdir,
            timeout: self.timeout,
        };

        let (outcomes, mut formatter, mut fmt_errors) = thread::scope(move |scope| {
            let (ftx, frx) = crossbeam_channel::bounded(FORMAT_QUEUE);
            let fmt_thread = scope.spawn(move || {
                while let Ok(fmt_data) = frx.recv() {
                    fmt_errors.push_on_error(match fmt_data {
                        FmtUnitData::Start(data) => named_fmt!(formatter.fmt_unit_start(data)),
                        FmtUnitData::Outcome(data) => named_fmt!(formatter.fmt_unit_outcome(data)),
                    });
                }
                (formatter, fmt_errors)
            });

            let outcomes: Vec<_> = units
                .into_iter()
                .enumerate()
                .map(|(position, unit)| {
                    let _ = ftx.send(FmtUnitData::Start(
                        FmtUnitStart {
                            unit,
                            position,
                            active,
                        }
                        .into(),
                    ));

                    let outcome = runner.run(unit);

                    let _ = ftx.send(FmtUnitData::Outcome(
                        FmtUnitOutcome {
                            unit,
                            outcome: outcome.clone(),
                            position,
                            active,
                        }
                        .into(),
                    ));
                    (unit.key.as_str(), outcome)
                })
                .collect();

            drop(ftx);
            let (formatter, fmt_errors) = fmt_thread
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));

            (outcomes, formatter, fmt_errors)
        });

        let duration = now.elapsed();
        let expected = self.assignment.len();
        let passed = outcomes
            .iter()
            .filter(|(_, outcome)| outcome.passed())
            .count();
        let failures = outcomes
            .iter()
            .filter(|(_, outcome)| outcome.failed())
            .map(|(key, outcome)| (*key, outcome.status.clone()))
            .collect();
        fmt_errors.push_on_error(named_fmt!(
            formatter.fmt_run_outcomes(
                FmtRunOutcomes {
                    shard,
                    passed,
                    expected,
                    filtered_out,
                    duration,
                    failures,
                }
                .into()
            )
        ));

        ShardReport {
            shard,
            outcomes,
            expected,
            expected_upper_bound: self.assignment.expected_upper_bound(),
            filtered_out,
            total_units: self.assignment.total_units,
            duration,
            fmt_errors,
        }
    }
}

impl<'u, Filter, Compile, Assemble, Run, Formatter>
    Harness<'u, Filter, Compile, Assemble, Run, Formatter>
where
    Filter: UnitFilter,
    Formatter: UnitListFormatter<'u>,
{
    /// Describe the units [`run`](Self::run) would execute without running
    /// anything.
    pub fn list(self) -> Vec<(FormatError, Formatter::Error)> {
        let mut formatter = self.formatter;
        let mut fmt_errors = Vec::new();

        let FilteredUnits {
            units,
            filtered_out,
        } = self.filter.filter(&self.assignment.units);
        for unit in units.iter().copied() {
            fmt_errors.push_on_error(named_fmt!(
                formatter.fmt_list_unit(FmtListUnit { unit }.into())
            ));
        }

        fmt_errors.push_on_error(named_fmt!(
            formatter.fmt_end_listing(
                FmtEndListing {
                    shard: self.assignment.shard,
                    listed: units.len(),
                    filtered_out,
                }
                .into()
            )
        ));

        fmt_errors
    }
}

/// What every unit of a run shares.
struct UnitRunner<'h, Compile, Assemble, Run> {
    pipeline: &'h Pipeline<Compile, Assemble, Run>,
    fixtures: &'h FixtureSet,
    workdir: &'h Path,
    timeout: Option<std::time::Duration>,
}

impl<Compile, Assemble, Run> UnitRunner<'_, Compile, Assemble, Run>
where
    Compile: PipelineStage,
    Assemble: PipelineStage,
    Run: PipelineStage,
{
    fn run(&self, unit: &TestUnit) -> UnitOutcome {
        let span = tracing::info_span!("unit", key = %unit.key);
        let _entered = span.enter();

        let now = Instant::now();
        let status = self.execute(unit);
        if !status.passed() {
            tracing::warn!(%status, "unit failed");
        }
        UnitOutcome::new(status, now.elapsed())
    }

    fn execute(&self, unit: &TestUnit) -> UnitStatus {
        let workdir = match WorkDir::acquire(self.workdir) {
            Ok(workdir) => workdir,
            Err(err) => return UnitStatus::error(Stage::Setup, err),
        };
        if let Err(err) = self.fixtures.seed_into(workdir.path()) {
            return UnitStatus::error(Stage::Setup, err);
        }

        let status = self.pipeline.execute(&StageContext {
            unit,
            workdir: workdir.path(),
            fixtures: self.fixtures,
            timeout: self.timeout,
        });

        if let Err(err) = workdir.release() {
            tracing::warn!(path = %self.workdir.display(), %err, "failed to remove working directory");
        }
        status
    }
}
