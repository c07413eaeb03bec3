use std::{io, path::PathBuf};

use thiserror::Error;

use crate::config::ConfigError;

/// Errors that stop a shard run as a whole.
///
/// Anything that goes wrong inside a single unit is not an `Error`; it is
/// recorded on that unit's [`UnitStatus`](crate::outcome::UnitStatus) and the
/// shard moves on.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to read test directory {}: {source}", path.display())]
    Discovery { path: PathBuf, source: io::Error },

    #[error("failed to write shard status file {}: {source}", path.display())]
    StatusFile { path: PathBuf, source: io::Error },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
