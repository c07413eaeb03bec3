//! Sharded execution of ahead-of-time compiler test suites.
//!
//! A test tree is grouped into [units](unit::TestUnit), the units are split
//! over shards by their position in key order, and each shard pushes its
//! units through compile, assemble and run in a fresh working directory.
//! A unit passes when the produced program exits with
//! [`SENTINEL_EXIT_CODE`](outcome::SENTINEL_EXIT_CODE).

pub mod config;
pub mod discovery;
pub mod error;
pub mod filter;
pub mod fixture;
pub mod formatter;
pub mod outcome;
pub mod pipeline;
pub mod shard;
pub mod unit;
pub mod workdir;

mod harness;
pub use harness::*;

mod report;
pub use report::*;

#[cfg(test)]
mod test_support;
