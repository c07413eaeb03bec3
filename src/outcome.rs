use std::{fmt, time::Duration};

use crate::pipeline::{Exit, Stage};

/// The one exit code of the run stage that counts as a pass.
///
/// Every other exit code fails the unit, including 0.
pub const SENTINEL_EXIT_CODE: i32 = 123;

#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct UnitOutcome {
    pub status: UnitStatus,
    pub duration: Duration,
}

impl UnitOutcome {
    pub fn new(status: UnitStatus, duration: Duration) -> Self {
        Self { status, duration }
    }

    pub fn passed(&self) -> bool {
        self.status.passed()
    }

    pub fn failed(&self) -> bool {
        !self.status.passed()
    }
}

/// How far a unit got through the pipeline and why it stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum UnitStatus {
    Passed,
    CompileFailure(Exit),
    AssembleFailure(Exit),
    /// The program ran but did not exit with [`SENTINEL_EXIT_CODE`].
    RunFailure(Exit),
    /// The harness itself could not carry out `stage`, for example because a
    /// tool could not be spawned or the working directory could not be set up.
    Error { stage: Stage, message: String },
}

impl UnitStatus {
    /// Classify the exit of the run stage.
    pub fn from_run(exit: Exit) -> Self {
        match exit {
            Exit::Code(SENTINEL_EXIT_CODE) => UnitStatus::Passed,
            exit => UnitStatus::RunFailure(exit),
        }
    }

    pub fn error(stage: Stage, message: impl fmt::Display) -> Self {
        UnitStatus::Error {
            stage,
            message: message.to_string(),
        }
    }

    pub fn passed(&self) -> bool {
        matches!(self, UnitStatus::Passed)
    }

    pub fn timed_out(&self) -> bool {
        matches!(
            self,
            UnitStatus::CompileFailure(Exit::TimedOut)
                | UnitStatus::AssembleFailure(Exit::TimedOut)
                | UnitStatus::RunFailure(Exit::TimedOut)
        )
    }

    /// The stage at which the unit stopped, if it did not pass.
    pub fn failed_stage(&self) -> Option<Stage> {
        match self {
            UnitStatus::Passed => None,
            UnitStatus::CompileFailure(_) => Some(Stage::Compile),
            UnitStatus::AssembleFailure(_) => Some(Stage::Assemble),
            UnitStatus::RunFailure(_) => Some(Stage::Run),
            UnitStatus::Error { stage, .. } => Some(*stage),
        }
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Passed => f.write_str("passed"),
            UnitStatus::CompileFailure(exit) => write!(f, "compile failed ({exit})"),
            UnitStatus::AssembleFailure(exit) => write!(f, "assemble failed ({exit})"),
            UnitStatus::RunFailure(exit) => write!(f, "run failed ({exit})"),
            UnitStatus::Error { stage, message } => write!(f, "{stage} error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_the_sentinel_passes() {
        assert_eq!(UnitStatus::from_run(Exit::Code(123)), UnitStatus::Passed);
        assert_eq!(
            UnitStatus::from_run(Exit::Code(0)),
            UnitStatus::RunFailure(Exit::Code(0))
        );
        assert_eq!(
            UnitStatus::from_run(Exit::Terminated),
            UnitStatus::RunFailure(Exit::Terminated)
        );
    }

    #[test]
    fn failed_stage_follows_variant() {
        assert_eq!(UnitStatus::Passed.failed_stage(), None);
        assert_eq!(
            UnitStatus::AssembleFailure(Exit::Code(2)).failed_stage(),
            Some(Stage::Assemble)
        );
        assert_eq!(
            UnitStatus::error(Stage::Setup, "disk full").failed_stage(),
            Some(Stage::Setup)
        );
        assert!(UnitStatus::CompileFailure(Exit::TimedOut).timed_out());
        assert!(!UnitStatus::CompileFailure(Exit::Code(1)).timed_out());
    }

    #[test]
    fn display() {
        assert_eq!(
            UnitStatus::CompileFailure(Exit::Code(1)).to_string(),
            "compile failed (exit code 1)"
        );
        assert_eq!(
            UnitStatus::RunFailure(Exit::TimedOut).to_string(),
            "run failed (timed out)"
        );
    }
}
