//! Command line and environment configuration.
//!
//! Shard parameters follow the test-sharding protocol of common build
//! systems: `TEST_SHARD_INDEX`, `TEST_TOTAL_SHARDS` and
//! `TEST_SHARD_STATUS_FILE` are read from the environment, with command line
//! flags taking precedence. Everything else defaults to the conventional
//! repository layout.

use std::{
    path::{self, Component, Path, PathBuf},
    time::Duration,
};

use clap::Parser;
use thiserror::Error;

use crate::{
    filter::DefaultFilter,
    fixture::FixtureSet,
    formatter::{OutputFormat, common::color::ColorSetting},
    shard::Shard,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("total shard count must be positive, got {0}")]
    InvalidShardCount(i64),

    #[error("shard index {index} is out of range for {total} shards")]
    ShardIndexOutOfRange { index: i64, total: usize },

    #[error("test directory {} does not exist", .0.display())]
    MissingTestsDir(PathBuf),

    #[error("cannot resolve path {}", .0.display())]
    InvalidPath(PathBuf),
}

/// Compile, assemble and run a tree of compiler test cases, one shard at a time.
#[derive(Debug, Parser)]
#[command(name = "aotest", version, about, long_about = None)]
pub struct Cli {
    /// Zero-based index of the shard to run.
    #[arg(
        long,
        env = "TEST_SHARD_INDEX",
        default_value_t = 0,
        allow_negative_numbers = true
    )]
    pub shard_index: i64,

    /// Number of shards the test tree is split into.
    #[arg(
        long,
        env = "TEST_TOTAL_SHARDS",
        default_value_t = 1,
        allow_negative_numbers = true
    )]
    pub total_shards: i64,

    /// File to create to acknowledge sharding support.
    #[arg(long, env = "TEST_SHARD_STATUS_FILE", value_name = "PATH")]
    pub shard_status_file: Option<PathBuf>,

    /// Root of the test tree.
    #[arg(long, default_value = "third_party/cs444/assignment_testcases/a5")]
    pub tests_dir: PathBuf,

    /// Standard library sources handed to the compiler with every unit.
    #[arg(long, default_value = "third_party/cs444/stdlib/5.0")]
    pub stdlib_dir: PathBuf,

    #[arg(long, default_value = "bazel-bin/joosc")]
    pub compiler: PathBuf,

    #[arg(long, default_value = "./asm.sh")]
    pub assembler: PathBuf,

    /// Program produced by the assembler, relative to the working directory.
    #[arg(long, default_value = "a.out")]
    pub program: PathBuf,

    /// Where per-shard working directories are created [default: system temp dir]
    #[arg(long, value_name = "DIR")]
    pub work_root: Option<PathBuf>,

    /// Kill a stage after this many seconds.
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    #[arg(long, value_enum, default_value_t)]
    pub format: OutputFormat,

    #[arg(long, value_enum, default_value_t)]
    pub color: ColorSetting,

    /// List this shard's units instead of running them.
    #[arg(long)]
    pub list: bool,

    /// Match filters against unit keys exactly.
    #[arg(long)]
    pub exact: bool,

    /// Skip units matching this pattern. May be repeated.
    #[arg(long, value_name = "PATTERN")]
    pub skip: Vec<String>,

    /// Only run units whose key contains one of these patterns.
    #[arg(value_name = "FILTER")]
    pub filters: Vec<String>,
}

/// Validated settings for one shard run.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    pub shard: Shard,
    pub status_file: Option<PathBuf>,
    pub tests_dir: PathBuf,
    pub fixtures: FixtureSet,
    pub compiler: PathBuf,
    pub assembler: PathBuf,
    pub program: PathBuf,
    pub work_root: PathBuf,
    pub timeout: Option<Duration>,
    pub filter: DefaultFilter,
    pub list: bool,
    pub format: OutputFormat,
    pub color: ColorSetting,
}

impl HarnessConfig {
    /// The working directory of this shard.
    ///
    /// Named after the shard index, so shards of one run never share it.
    pub fn workdir(&self) -> PathBuf {
        self.work_root.join(format!("aotest-shard-{}", self.shard.index()))
    }
}

impl Cli {
    pub fn into_config(self) -> Result<HarnessConfig, ConfigError> {
        let shard = Shard::from_signed(self.shard_index, self.total_shards)?;

        let tests_dir = absolute(&self.tests_dir)?;
        if !tests_dir.is_dir() {
            return Err(ConfigError::MissingTestsDir(tests_dir));
        }

        let work_root = match self.work_root {
            Some(work_root) => absolute(&work_root)?,
            None => std::env::temp_dir(),
        };

        Ok(HarnessConfig {
            shard,
            status_file: self.shard_status_file,
            tests_dir,
            fixtures: FixtureSet::stdlib(&absolute(&self.stdlib_dir)?),
            compiler: tool(&self.compiler)?,
            assembler: tool(&self.assembler)?,
            program: self.program,
            work_root,
            timeout: self.timeout.map(Duration::from_secs),
            filter: DefaultFilter::new()
                .with_exact(self.exact)
                .with_filter(self.filters)
                .with_skip(self.skip),
            list: self.list,
            format: self.format,
            color: self.color,
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigError> {
    path::absolute(path).map_err(|_| ConfigError::InvalidPath(path.to_owned()))
}

/// Tools given as a bare name are looked up on `PATH`, anything else is
/// resolved against the current directory.
fn tool(path: &Path) -> Result<PathBuf, ConfigError> {
    let mut components = path.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(path.to_owned()),
        _ => absolute(path),
    }
}
