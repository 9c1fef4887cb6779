use assert_cmd::Command;

pub const SPAWN: &str = env!("CARGO_BIN_EXE_dupenv-spawn");
pub const PRINT: &str = env!("CARGO_BIN_EXE_dupenv-print");

/// A command with an empty environment and colors switched off
///
/// `std::process::Command` can't express duplicate keys, so tests needing them have to go through
/// `dupenv-spawn`.
fn clean_command(path: &str) -> Command {
    let mut cmd = Command::new(path);
    cmd.env_clear().env("DUPENV_COLOR", "never");
    cmd
}

pub fn spawn_command() -> Command {
    clean_command(SPAWN)
}

pub fn print_command() -> Command {
    clean_command(PRINT)
}
