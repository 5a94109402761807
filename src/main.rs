use clap::Parser;
use folioledger::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
