use predicates::prelude::*;
use predicates::str::contains;

use crate::common;

#[test]
fn test_spawn_duplicated_tmpdir_reaches_observer_twice() {
    common::spawn_command()
        .env("TMPDIR", "/original/tmp")
        .assert()
        .code(0)
        .stdout("TMPDIR = /original/tmp\nTMPDIR = asdfasdf\n")
        .stderr(contains("PARENT PROCESS"));
}

#[test]
fn test_spawn_without_ambient_tmpdir() {
    common::spawn_command()
        .env("PATH", "/usr/bin")
        .assert()
        .code(0)
        .stdout("TMPDIR = asdfasdf\n");
}

#[test]
fn test_spawn_normalized_mode_keeps_last_value_only() {
    common::spawn_command()
        .env("TMPDIR", "/original/tmp")
        .args(["--env-mode", "normalized"])
        .assert()
        .code(0)
        .stdout("TMPDIR = asdfasdf\n");
}

#[test]
fn test_spawn_multiple_entries_keep_order() {
    common::spawn_command()
        .env("TMPDIR", "/original/tmp")
        .args(["-e", "TMPDIR=/tmp/other-tmp-dir", "-e", "TMPDIR=a=b"])
        .assert()
        .code(0)
        .stdout("TMPDIR = /original/tmp\nTMPDIR = /tmp/other-tmp-dir\nTMPDIR = a=b\n");
}

#[test]
fn test_spawn_clear_ambient() {
    common::spawn_command()
        .env("TMPDIR", "/original/tmp")
        .arg("--clear-ambient")
        .assert()
        .code(0)
        .stdout("TMPDIR = asdfasdf\n");
}

#[test]
fn test_spawn_runs_every_probe_in_order() {
    let print = common::PRINT;
    common::spawn_command()
        .env("TMPDIR", "/original/tmp")
        .args([
            format!("{print}::first run"),
            format!("{print}::second run"),
        ])
        .assert()
        .code(0)
        .stdout(
            "TMPDIR = /original/tmp\nTMPDIR = asdfasdf\nTMPDIR = /original/tmp\nTMPDIR = \
             asdfasdf\n",
        )
        .stderr(contains("first run").and(contains("second run")));
}

#[test]
fn test_spawn_probe_from_env() {
    common::spawn_command()
        .env("DUPENV_PROBE", common::PRINT)
        .env("TMPDIR", "/original/tmp")
        .assert()
        .code(0)
        .stdout("TMPDIR = /original/tmp\nTMPDIR = asdfasdf\n");
}

#[test]
fn test_spawn_missing_probe_exits_with_error() {
    common::spawn_command()
        .arg("/this/probe/does/not/exist")
        .assert()
        .code(1)
        .stdout("")
        .stderr(contains(
            "dupenv_spawn: Error: Error launching '/this/probe/does/not/exist'",
        ));
}

#[test]
fn test_spawn_failing_probe_exits_successfully() {
    common::spawn_command()
        .env("PATH", "/usr/bin:/bin")
        .arg("false")
        .assert()
        .code(0)
        .stderr(contains("Error running"));
}

#[test]
fn test_spawn_invalid_entry_is_usage_error() {
    common::spawn_command()
        .args(["-e", "NOEQUALS"])
        .assert()
        .code(2)
        .stderr(contains("Expected the format KEY=VALUE"));
}
