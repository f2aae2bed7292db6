use std::process::ExitCode;

use clap::Parser;

use layerpaint::{cli, logger};

fn main() -> ExitCode {
    let args = cli::CliArgs::parse();
    logger::init(args.verbose);
    cli::run(args)
}
