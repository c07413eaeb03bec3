//! The compile, assemble and run pipeline.
//!
//! Each step is a [`PipelineStage`]. The process-backed stages in this module
//! invoke the external toolchain; tests swap them for closures returning
//! canned exit codes. [`Pipeline::execute`] strings three stages together and
//! turns their exits into a [`UnitStatus`].
//!
//! Stages run with the unit's working directory as their current directory.
//! Paths handed to them (tools, sources, fixtures) should therefore be
//! absolute.

use std::{
    ffi::OsStr,
    fmt, io,
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

use thiserror::Error;

use crate::{fixture::FixtureSet, outcome::UnitStatus, unit::TestUnit};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Preparing the working directory, before any tool runs.
    Setup,
    Compile,
    Assemble,
    Run,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Setup => "setup",
            Stage::Compile => "compile",
            Stage::Assemble => "assemble",
            Stage::Run => "run",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a stage's process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Exit {
    Code(i32),
    /// Ended without an exit code, i.e. killed by a signal.
    Terminated,
    /// Killed by the harness after exceeding the stage timeout.
    TimedOut,
}

impl Exit {
    pub fn success(&self) -> bool {
        matches!(self, Exit::Code(0))
    }
}

impl From<i32> for Exit {
    fn from(code: i32) -> Self {
        Exit::Code(code)
    }
}

impl From<ExitStatus> for Exit {
    fn from(status: ExitStatus) -> Self {
        status.code().map_or(Exit::Terminated, Exit::Code)
    }
}

impl fmt::Display for Exit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exit::Code(code) => write!(f, "exit code {code}"),
            Exit::Terminated => f.write_str("terminated by signal"),
            Exit::TimedOut => f.write_str("timed out"),
        }
    }
}

#[derive(Debug, Error)]
pub enum StageError {
    #[error("could not start {}: {source}", program.display())]
    Spawn { program: PathBuf, source: io::Error },

    #[error("lost track of {}: {source}", program.display())]
    Wait { program: PathBuf, source: io::Error },
}

/// Everything a stage gets to see about the unit it works on.
#[derive(Debug, Clone, Copy)]
pub struct StageContext<'a> {
    pub unit: &'a TestUnit,
    pub workdir: &'a Path,
    pub fixtures: &'a FixtureSet,
    pub timeout: Option<Duration>,
}

/// One step of the pipeline.
///
/// Implemented for `Fn(&StageContext) -> impl Into<Exit>`, so a closure can
/// stand in for an external tool.
pub trait PipelineStage {
    fn run(&self, ctx: &StageContext<'_>) -> Result<Exit, StageError>;
}

impl<F, E> PipelineStage for F
where
    F: Fn(&StageContext<'_>) -> E,
    E: Into<Exit>,
{
    fn run(&self, ctx: &StageContext<'_>) -> Result<Exit, StageError> {
        Ok(self(ctx).into())
    }
}

/// Invokes `compiler <unit files...> <fixture sources...>`.
#[derive(Debug, Clone)]
pub struct CompileStage {
    compiler: PathBuf,
}

impl CompileStage {
    pub fn new(compiler: impl Into<PathBuf>) -> Self {
        Self {
            compiler: compiler.into(),
        }
    }

    pub fn command(&self, ctx: &StageContext<'_>) -> Command {
        let mut command = Command::new(&self.compiler);
        command
            .args(&ctx.unit.files)
            .args(&ctx.fixtures.sources)
            .current_dir(ctx.workdir)
            .stdin(Stdio::null());
        command
    }
}

impl PipelineStage for CompileStage {
    fn run(&self, ctx: &StageContext<'_>) -> Result<Exit, StageError> {
        run_command(Stage::Compile, self.command(ctx), ctx.timeout)
    }
}

/// Invokes the assembler script without arguments; it picks up the
/// compiler's output from the working directory.
#[derive(Debug, Clone)]
pub struct AssembleStage {
    assembler: PathBuf,
}

impl AssembleStage {
    pub fn new(assembler: impl Into<PathBuf>) -> Self {
        Self {
            assembler: assembler.into(),
        }
    }

    pub fn command(&self, ctx: &StageContext<'_>) -> Command {
        let mut command = Command::new(&self.assembler);
        command.current_dir(ctx.workdir).stdin(Stdio::null());
        command
    }
}

impl PipelineStage for AssembleStage {
    fn run(&self, ctx: &StageContext<'_>) -> Result<Exit, StageError> {
        run_command(Stage::Assemble, self.command(ctx), ctx.timeout)
    }
}

/// Runs the assembled program. Its stdout is discarded.
#[derive(Debug, Clone)]
pub struct RunStage {
    /// Resolved against the working directory.
    program: PathBuf,
}

impl RunStage {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn command(&self, ctx: &StageContext<'_>) -> Command {
        let mut command = Command::new(ctx.workdir.join(&self.program));
        command
            .current_dir(ctx.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::null());
        command
    }
}

impl PipelineStage for RunStage {
    fn run(&self, ctx: &StageContext<'_>) -> Result<Exit, StageError> {
        run_command(Stage::Run, self.command(ctx), ctx.timeout)
    }
}

fn run_command(
    stage: Stage,
    mut command: Command,
    timeout: Option<Duration>,
) -> Result<Exit, StageError> {
    let program = PathBuf::from(command.get_program());
    tracing::debug!(
        %stage,
        program = %program.display(),
        args = command.get_args().len(),
        "invoking stage"
    );

    let mut child = command.spawn().map_err(|source| StageError::Spawn {
        program: program.clone(),
        source,
    })?;

    let exit = match timeout {
        None => child.wait().map(Exit::from),
        Some(timeout) => wait_with_timeout(&mut child, timeout),
    }
    .map_err(|source| StageError::Wait {
        program: program.clone(),
        source,
    })?;

    tracing::debug!(%stage, program = %display_name(&program), %exit, "stage finished");
    Ok(exit)
}

fn wait_with_timeout(child: &mut Child, timeout: Duration) -> io::Result<Exit> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(status.into());
        }

        let now = Instant::now();
        if now >= deadline {
            break;
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }

    child.kill()?;
    child.wait()?;
    Ok(Exit::TimedOut)
}

fn display_name(program: &Path) -> &str {
    program
        .file_name()
        .and_then(OsStr::to_str)
        .unwrap_or("<program>")
}

/// Compile, assemble and run, stopping at the first stage that fails.
#[derive(Debug, Clone)]
pub struct Pipeline<Compile, Assemble, Run> {
    pub compile: Compile,
    pub assemble: Assemble,
    pub run: Run,
}

impl Pipeline<CompileStage, AssembleStage, RunStage> {
    pub fn external(
        compiler: impl Into<PathBuf>,
        assembler: impl Into<PathBuf>,
        program: impl Into<PathBuf>,
    ) -> Self {
        Self {
            compile: CompileStage::new(compiler),
            assemble: AssembleStage::new(assembler),
            run: RunStage::new(program),
        }
    }
}

impl<Compile, Assemble, Run> Pipeline<Compile, Assemble, Run>
where
    Compile: PipelineStage,
    Assemble: PipelineStage,
    Run: PipelineStage,
{
    pub fn execute(&self, ctx: &StageContext<'_>) -> UnitStatus {
        match self.compile.run(ctx) {
            Ok(exit) if exit.success() => {}
            Ok(exit) => return UnitStatus::CompileFailure(exit),
            Err(err) => return UnitStatus::error(Stage::Compile, err),
        }

        match self.assemble.run(ctx) {
            Ok(exit) if exit.success() => {}
            Ok(exit) => return UnitStatus::AssembleFailure(exit),
            Err(err) => return UnitStatus::error(Stage::Assemble, err),
        }

        match self.run.run(ctx) {
            Ok(exit) => UnitStatus::from_run(exit),
            Err(err) => UnitStatus::error(Stage::Run, err),
        }
    }
}
