use std::process::ExitCode;

use clap::Parser;

use photolayers::cli::{self, CliArgs};
use photolayers::logger;

fn main() -> ExitCode {
    let args = CliArgs::parse();
    logger::init(args.verbose);
    if let Some(path) = logger::log_path() {
        log::debug!("session log at {}", path.display());
    }
    cli::run(args)
}
