use rstest::rstest;

use crate::common;

#[test]
fn test_print_default_key() {
    common::print_command()
        .env("TMPDIR", "/original/tmp")
        .assert()
        .code(0)
        .stdout("TMPDIR = /original/tmp\n")
        .stderr("");
}

#[test]
fn test_print_missing_key_prints_nothing() {
    common::print_command()
        .env("PATH", "/usr/bin")
        .assert()
        .code(0)
        .stdout("")
        .stderr("");
}

#[test]
fn test_print_empty_environment() {
    assert_cmd::Command::new(common::PRINT)
        .env_clear()
        .assert()
        .code(0)
        .stdout("");
}

#[rstest]
#[case::value_with_equals("FOO", "a=b", "FOO = a=b\n")]
#[case::empty_value("FOO", "", "FOO = \n")]
fn test_print_custom_key(#[case] key: &str, #[case] value: &str, #[case] expected: &str) {
    common::print_command()
        .env(key, value)
        .env("TMPDIR", "/ignored")
        .arg(key)
        .assert()
        .code(0)
        .stdout(expected.to_owned());
}

#[test]
fn test_print_key_from_env() {
    common::print_command()
        .env("DUPENV_KEY", "HOME")
        .env("HOME", "/home/user")
        .env("TMPDIR", "/ignored")
        .assert()
        .code(0)
        .stdout("HOME = /home/user\n");
}

#[test]
fn test_print_show_index() {
    assert_cmd::Command::new(common::PRINT)
        .env_clear()
        .env("TMPDIR", "/original/tmp")
        .arg("--show-index")
        .assert()
        .code(0)
        .stdout("[0] TMPDIR = /original/tmp\n");
}
