//! The `dupenv-print` binary
use clap::Parser;
use dupenv::observer::PrintArgs;
use log::error;

fn main() {
    dupenv::logging::init();

    let args = PrintArgs::parse();
    if let Err(error) = dupenv::observer::run(&args) {
        error!("{error:#}");
        std::process::exit(1)
    }
}
