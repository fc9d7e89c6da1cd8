use clap::Parser;
use quantscreen::cli::{Cli, run};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
