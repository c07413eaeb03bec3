use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
    time::Duration,
};

mod run;

use crate::{
    config::HarnessConfig,
    discovery::discover,
    error::{Error, Result},
    filter::{DefaultFilter, NoFilter},
    fixture::FixtureSet,
    formatter::{ConsoleFormatter, no::NoFormatter},
    pipeline::{AssembleStage, CompileStage, Pipeline, RunStage},
    shard::ShardAssignment,
};

/// Runs the units of one shard, one after another, in a scoped working
/// directory each.
///
/// Start from [`Harness::new`] and swap strategies in with the `with_*`
/// methods.
pub struct Harness<'u, Filter, Compile, Assemble, Run, Formatter> {
    pub(crate) assignment: ShardAssignment<'u>,
    pub(crate) workdir: PathBuf,
    pub(crate) fixtures: FixtureSet,
    pub(crate) timeout: Option<Duration>,
    pub(crate) pipeline: Pipeline<Compile, Assemble, Run>,
    pub(crate) filter: Filter,
    pub(crate) formatter: Formatter,
}

impl<'u, Compile, Assemble, Run> Harness<'u, NoFilter, Compile, Assemble, Run, NoFormatter> {
    /// A harness that runs every unit of `assignment` in `workdir` without
    /// fixtures, timeout or output.
    pub fn new(
        assignment: ShardAssignment<'u>,
        workdir: impl Into<PathBuf>,
        pipeline: Pipeline<Compile, Assemble, Run>,
    ) -> Self {
        Self {
            assignment,
            workdir: workdir.into(),
            fixtures: FixtureSet::new(),
            timeout: None,
            pipeline,
            filter: NoFilter,
            formatter: NoFormatter,
        }
    }
}

/// The harness described by `config`, printing to stdout.
pub fn harness<'u>(
    config: &HarnessConfig,
    assignment: ShardAssignment<'u>,
) -> Harness<'u, DefaultFilter, CompileStage, AssembleStage, RunStage, ConsoleFormatter> {
    let pipeline = Pipeline::external(&config.compiler, &config.assembler, &config.program);
    Harness::new(assignment, config.workdir(), pipeline)
        .with_fixtures(config.fixtures.clone())
        .with_timeout(config.timeout)
        .with_filter(config.filter.clone())
        .with_formatter(ConsoleFormatter::new(config.format, config.color))
}

/// Run the shard `config` describes and return the process exit code.
///
/// The exit code is only a success if every unit this shard was expected to
/// run passed.
pub fn execute(config: &HarnessConfig) -> Result<ExitCode> {
    if let Some(status_file) = &config.status_file {
        write_status_file(status_file)?;
    }

    let units = discover(&config.tests_dir)?;
    let assignment = config.shard.partition(&units);
    let harness = harness(config, assignment);

    if config.list {
        let fmt_errors = harness.list();
        if !fmt_errors.is_empty() {
            tracing::warn!(count = fmt_errors.len(), "failed to write listing");
        }
        return Ok(ExitCode::SUCCESS);
    }

    let report = harness.run();
    for (kind, err) in report.fmt_errors.iter() {
        tracing::warn!(?kind, %err, "formatter failed");
    }
    Ok(report.exit_code())
}

fn write_status_file(path: &Path) -> Result<()> {
    fs::write(path, b"").map_err(|source| Error::StatusFile {
        path: path.to_owned(),
        source,
    })
}

impl<'u, Filter, Compile, Assemble, Run, Formatter>
    Harness<'u, Filter, Compile, Assemble, Run, Formatter>
{
    pub fn with_fixtures(self, fixtures: FixtureSet) -> Self {
        Self { fixtures, ..self }
    }

    pub fn with_timeout(self, timeout: Option<Duration>) -> Self {
        Self { timeout, ..self }
    }

    pub fn with_filter<WithFilter>(
        self,
        filter: WithFilter,
    ) -> Harness<'u, WithFilter, Compile, Assemble, Run, Formatter> {
        Harness {
            assignment: self.assignment,
            workdir: self.workdir,
            fixtures: self.fixtures,
            timeout: self.timeout,
            pipeline: self.pipeline,
            filter,
            formatter: self.formatter,
        }
    }

    pub fn with_pipeline<WithCompile, WithAssemble, WithRun>(
        self,
        pipeline: Pipeline<WithCompile, WithAssemble, WithRun>,
    ) -> Harness<'u, Filter, WithCompile, WithAssemble, WithRun, Formatter> {
        Harness {
            assignment: self.assignment,
            workdir: self.workdir,
            fixtures: self.fixtures,
            timeout: self.timeout,
            pipeline,
            filter: self.filter,
            formatter: self.formatter,
        }
    }

    pub fn with_formatter<WithFormatter>(
        self,
        formatter: WithFormatter,
    ) -> Harness<'u, Filter, Compile, Assemble, Run, WithFormatter> {
        Harness {
            assignment: self.assignment,
            workdir: self.workdir,
            fixtures: self.fixtures,
            timeout: self.timeout,
            pipeline: self.pipeline,
            filter: self.filter,
            formatter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{formatter::OutputFormat, formatter::common::color::ColorSetting, shard::Shard};

    fn config(tests_dir: &Path, work_root: &Path) -> HarnessConfig {
        HarnessConfig {
            shard: Shard::SINGLE,
            status_file: None,
            tests_dir: tests_dir.to_owned(),
            fixtures: FixtureSet::new(),
            compiler: PathBuf::from("/nonexistent/compiler"),
            assembler: PathBuf::from("/nonexistent/assembler"),
            program: PathBuf::from("a.out"),
            work_root: work_root.to_owned(),
            timeout: None,
            filter: DefaultFilter::new(),
            list: true,
            format: OutputFormat::Terse,
            color: ColorSetting::Never,
        }
    }

    #[test]
    fn status_file_is_written_before_discovery() {
        let root = tempfile::tempdir().unwrap();
        let status_file = root.path().join("status");
        let config = HarnessConfig {
            status_file: Some(status_file.clone()),
            ..config(&root.path().join("missing"), root.path())
        };

        let err = execute(&config).unwrap_err();
        assert!(matches!(err, Error::Discovery { .. }));
        assert_eq!(fs::read(&status_file).unwrap(), b"");
    }

    #[test]
    fn unwritable_status_file_is_an_error() {
        let root = tempfile::tempdir().unwrap();
        let config = HarnessConfig {
            status_file: Some(root.path().join("no/such/dir/status")),
            ..config(root.path(), root.path())
        };

        let err = execute(&config).unwrap_err();
        assert!(matches!(err, Error::StatusFile { .. }));
    }

    #[test]
    fn listing_runs_nothing() {
        let root = tempfile::tempdir().unwrap();
        let tests_dir = root.path().join("tests");
        fs::create_dir(&tests_dir).unwrap();
        fs::write(tests_dir.join("J1_a.java"), "").unwrap();

        let config = config(&tests_dir, root.path());
        execute(&config).unwrap();
        assert!(!config.workdir().exists());
    }

    #[test]
    fn failing_units_fail_the_shard() {
        let root = tempfile::tempdir().unwrap();
        let tests_dir = root.path().join("tests");
        fs::create_dir(&tests_dir).unwrap();
        fs::write(tests_dir.join("J1_a.java"), "").unwrap();

        let config = HarnessConfig {
            list: false,
            ..config(&tests_dir, root.path())
        };
        let exit = execute(&config).unwrap();
        assert_ne!(format!("{exit:?}"), format!("{:?}", ExitCode::SUCCESS));
        assert!(!config.workdir().exists());
    }

    #[test]
    fn empty_tree_succeeds() {
        let root = tempfile::tempdir().unwrap();
        let tests_dir = root.path().join("tests");
        fs::create_dir(&tests_dir).unwrap();

        let config = HarnessConfig {
            list: false,
            ..config(&tests_dir, root.path())
        };
        let exit = execute(&config).unwrap();
        assert_eq!(format!("{exit:?}"), format!("{:?}", ExitCode::SUCCESS));
    }
}
