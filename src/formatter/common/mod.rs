//! Common helpers for formatter implementations.
//!
//! These are formatter focused and not meant as general purpose building
//! blocks for unrelated code.

use crate::{outcome::UnitStatus, pipeline::Exit};

pub mod color;
pub mod fto;

/// One line explaining why `key` did not pass.
pub fn failure_summary(key: &str, status: &UnitStatus) -> String {
    match status {
        UnitStatus::Passed => format!("Test {key} passed."),
        UnitStatus::CompileFailure(exit) => format!("Failed to compile {key}! {}.", ret(exit)),
        UnitStatus::AssembleFailure(exit) => format!("Failed to assemble {key}! {}.", ret(exit)),
        UnitStatus::RunFailure(exit) => format!("Test {key} failed! {}.", ret(exit)),
        UnitStatus::Error { stage, message } => {
            format!("Could not {stage} {key}: {message}.")
        }
    }
}

fn ret(exit: &Exit) -> String {
    match exit {
        Exit::Code(code) => format!("Ret={code}"),
        Exit::Terminated => "Terminated by signal".to_owned(),
        Exit::TimedOut => "Timed out".to_owned(),
    }
}
