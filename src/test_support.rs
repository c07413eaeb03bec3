use std::{
    io,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use crate::{
    Harness,
    filter::NoFilter,
    formatter::{common::color::SupportsColor, no::NoFormatter},
    outcome::SENTINEL_EXIT_CODE,
    pipeline::{Pipeline, StageContext},
    shard::ShardAssignment,
};

pub type FakeStage = fn(&StageContext<'_>) -> i32;

pub fn passing(_: &StageContext<'_>) -> i32 {
    0
}

pub fn sentinel(_: &StageContext<'_>) -> i32 {
    SENTINEL_EXIT_CODE
}

/// A silent harness whose pipeline passes every unit without spawning
/// anything.
pub fn harness<'u>(
    assignment: ShardAssignment<'u>,
    workdir: impl Into<PathBuf>,
) -> Harness<'u, NoFilter, FakeStage, FakeStage, FakeStage, NoFormatter> {
    Harness::new(
        assignment,
        workdir,
        Pipeline {
            compile: passing as FakeStage,
            assemble: passing as FakeStage,
            run: sentinel as FakeStage,
        },
    )
}

/// Shared in-memory formatter target.
#[derive(Debug, Default, Clone)]
pub struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Buffer {
    pub fn text(&self) -> String {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes).unwrap()
    }
}

impl io::Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl SupportsColor for Buffer {
    fn supports_color(&self) -> bool {
        false
    }
}
