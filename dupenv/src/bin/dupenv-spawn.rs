//! The `dupenv-spawn` binary
//!
//! Runs probe programs with the current environment plus appended entries, keeping duplicate keys.
use clap::Parser;
use dupenv::spawner::SpawnArgs;
use log::error;

/// The main function of the `dupenv-spawn` binary
///
/// Exits with `1` if a probe can't be launched. The exit codes of the probes are not propagated.
fn main() {
    dupenv::logging::init();

    let args = SpawnArgs::parse();
    if let Err(error) = dupenv::spawner::run(args) {
        error!("{error}");
        std::process::exit(1)
    }
}
