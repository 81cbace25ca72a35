mod cli;
mod commands;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use multishot_core::RunContext;

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(err) = logging::init(&cli.log_file, cli.quiet) {
        eprintln!("error: {err:#}");
        return ExitCode::FAILURE;
    }
    // Created after the subscriber so the run span is recorded.
    let ctx = RunContext::new(cli.quiet);

    match commands::run_from_cli(cli, &ctx) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(commands::exit_code_for(&err))
        }
    }
}
