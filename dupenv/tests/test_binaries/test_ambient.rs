//! Environment lists with entries `std::process::Command` can't express, launched through the
//! library's raw mode
use std::fs;
use std::path::Path;

use dupenv::env::{EnvEntry, EnvList};
use dupenv::launch::{Launch, Stdio};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

use crate::common;

fn run_to_file<'a, I>(program: &str, env: &[&str], args: I, out: &Path)
where
    I: IntoIterator<Item = &'a str>,
{
    let env: EnvList = env.iter().copied().map(EnvEntry::from).collect();
    let launch = args
        .into_iter()
        .fold(Launch::new(program, env), |launch, arg| launch.arg(arg))
        .stdout(Stdio::File(out.to_owned()))
        .stderr(Stdio::Null);

    assert!(launch.run().unwrap().success());
}

#[test]
fn test_spawn_passes_entry_without_equals_sign_to_the_child() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("env.out");

    run_to_file(
        common::SPAWN,
        &["FOOBAR", "TMPDIR=/original/tmp", "DUPENV_COLOR=never"],
        ["/usr/bin/env"],
        &out,
    );

    assert_eq!(
        fs::read_to_string(out).unwrap().lines().collect::<Vec<_>>(),
        vec![
            "FOOBAR",
            "TMPDIR=/original/tmp",
            "DUPENV_COLOR=never",
            "TMPDIR=asdfasdf"
        ]
    );
}

#[test]
fn test_print_index_counts_entry_without_equals_sign() {
    let dir = tempdir().unwrap();
    let out = dir.path().join("print.out");

    run_to_file(
        common::PRINT,
        &["FOOBAR", "TMPDIR=/original/tmp"],
        ["--show-index"],
        &out,
    );

    assert_eq!(fs::read_to_string(out).unwrap(), "[1] TMPDIR = /original/tmp\n");
}
