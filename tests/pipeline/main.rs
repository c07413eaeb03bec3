#![cfg(unix)]

use std::{collections::BTreeMap, fs, process::Command, time::Duration};

use aotest::{
    Harness,
    discovery::discover,
    fixture::{FixtureSet, STDLIB_SOURCES},
    outcome::UnitStatus,
    pipeline::{Exit, Pipeline, Stage},
    shard::Shard,
};
use pretty_assertions::assert_eq;

mod toolchain;
use toolchain::Toolchain;

fn run(toolchain: &Toolchain, timeout: Option<Duration>) -> BTreeMap<String, UnitStatus> {
    let units = discover(&toolchain.tests_dir()).unwrap();
    let (object, runtime) = toolchain.stdlib();
    let pipeline = Pipeline::external(toolchain.compiler(), toolchain.assembler(), "a.out");

    let report = Harness::new(Shard::SINGLE.partition(&units), toolchain.workdir(), pipeline)
        .with_fixtures(
            FixtureSet::new()
                .with_sources([object])
                .with_seed(runtime, "output/runtime.s"),
        )
        .with_timeout(timeout)
        .run();

    assert!(report.complete());
    report
        .outcomes
        .into_iter()
        .map(|(key, outcome)| (key.to_owned(), outcome.status))
        .collect()
}

#[test]
fn stages_decide_the_outcome() {
    let toolchain = Toolchain::new();
    toolchain.test("J1_pass.java", "exit 123\n");
    toolchain.test("J1_zero.java", "exit 0\n");
    toolchain.test("J1_compile.java", "# compile-error\nexit 123\n");
    toolchain.test("J1_assemble.java", "# assemble-error\nexit 123\n");

    let statuses = run(&toolchain, None);
    assert_eq!(
        statuses,
        BTreeMap::from([
            ("J1_assemble.java".to_owned(), UnitStatus::AssembleFailure(Exit::Code(2))),
            ("J1_compile.java".to_owned(), UnitStatus::CompileFailure(Exit::Code(1))),
            ("J1_pass.java".to_owned(), UnitStatus::Passed),
            ("J1_zero.java".to_owned(), UnitStatus::RunFailure(Exit::Code(0))),
        ])
    );
    assert!(!toolchain.workdir().exists());
}

#[test]
fn grouped_files_compile_together_in_order() {
    let toolchain = Toolchain::new();
    toolchain.test("J2_multi/Main.java", "true\n");
    toolchain.test("J2_multi/sub/deep/Helper.java", "exit 123\n");
    toolchain.test("J2_order/A.java", "exit 123\n");
    toolchain.test("J2_order/B.java", "exit 5\n");

    let statuses = run(&toolchain, None);
    assert_eq!(
        statuses,
        BTreeMap::from([
            ("J2_multi".to_owned(), UnitStatus::Passed),
            ("J2_order".to_owned(), UnitStatus::Passed),
        ])
    );
}

#[test]
fn signal_and_timeout() {
    let toolchain = Toolchain::new();
    toolchain.test("J1_killed.java", "kill -9 $$\n");
    toolchain.test("J1_slow.java", "sleep 10\nexit 123\n");

    let statuses = run(&toolchain, Some(Duration::from_secs(1)));
    assert_eq!(
        statuses,
        BTreeMap::from([
            ("J1_killed.java".to_owned(), UnitStatus::RunFailure(Exit::Terminated)),
            ("J1_slow.java".to_owned(), UnitStatus::RunFailure(Exit::TimedOut)),
        ])
    );
    assert!(!toolchain.workdir().exists());
}

#[test]
fn missing_compiler_is_a_compile_error() {
    let toolchain = Toolchain::new();
    toolchain.test("J1_pass.java", "exit 123\n");
    let units = discover(&toolchain.tests_dir()).unwrap();
    let pipeline = Pipeline::external(
        toolchain.path("bin/missing"),
        toolchain.assembler(),
        "a.out",
    );

    let report = Harness::new(Shard::SINGLE.partition(&units), toolchain.workdir(), pipeline).run();

    let status = &report.outcomes[0].1.status;
    assert_eq!(status.failed_stage(), Some(Stage::Compile));
    assert!(matches!(status, UnitStatus::Error { .. }));
    assert!(!report.success());
}

fn binary(toolchain: &Toolchain) -> Command {
    for source in STDLIB_SOURCES {
        toolchain.file(&format!("stdlib/{source}"), ": fixture\n");
    }

    let mut command = Command::new(env!("CARGO_BIN_EXE_aotest"));
    command
        .arg("--tests-dir")
        .arg(toolchain.tests_dir())
        .arg("--stdlib-dir")
        .arg(toolchain.path("stdlib"))
        .arg("--compiler")
        .arg(toolchain.compiler())
        .arg("--assembler")
        .arg(toolchain.assembler())
        .arg("--work-root")
        .arg(toolchain.path("work"))
        .arg("--color")
        .arg("never")
        .env_remove("TEST_SHARD_INDEX")
        .env_remove("TEST_TOTAL_SHARDS")
        .env_remove("TEST_SHARD_STATUS_FILE");
    command
}

#[test]
fn binary_runs_one_shard() {
    let toolchain = Toolchain::new();
    toolchain.test("a.java", "exit 123\n");
    toolchain.test("b.java", "exit 1\n");
    toolchain.test("c.java", "exit 123\n");
    let status_file = toolchain.path("status");

    let output = binary(&toolchain)
        .env("TEST_SHARD_INDEX", "0")
        .env("TEST_TOTAL_SHARDS", "2")
        .env("TEST_SHARD_STATUS_FILE", &status_file)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "..\nPassed 2/2 tests.\n\n");
    assert!(status_file.exists());

    let output = binary(&toolchain)
        .env("TEST_SHARD_INDEX", "1")
        .env("TEST_TOTAL_SHARDS", "2")
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "\nTest b.java failed! Ret=1.\n\nPassed 0/1 tests.\n\n"
    );
    assert!(!toolchain.path("work/aotest-shard-1").exists());
}

#[test]
fn binary_fails_when_filter_removes_the_shard() {
    let toolchain = Toolchain::new();
    toolchain.test("a.java", "exit 123\n");
    toolchain.test("b.java", "exit 123\n");

    let output = binary(&toolchain).arg("--skip").arg("").output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        "\nPassed 0/2 tests. 2 filtered out.\n\n"
    );

    let output = binary(&toolchain)
        .arg("--exact")
        .arg("a.java")
        .output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        ".\nPassed 1/2 tests. 1 filtered out.\n\n"
    );
}

#[test]
fn binary_rejects_bad_shard_config() {
    let toolchain = Toolchain::new();
    let status_file = toolchain.path("status");

    let output = binary(&toolchain)
        .env("TEST_TOTAL_SHARDS", "0")
        .env("TEST_SHARD_STATUS_FILE", &status_file)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
    assert!(!status_file.exists());
    assert!(output.stdout.is_empty());
}
