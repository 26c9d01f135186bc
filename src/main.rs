use std::io;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use hashr::cli::{self, Cli};
use hashr::hash::HashUtilityError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    cli::init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if let Some(e) = err.downcast_ref::<HashUtilityError>() {
                if e.is_broken_pipe() {
                    return ExitCode::SUCCESS;
                }
            }
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let engine = cli.engine();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    engine.scan(&cli.root, &mut out)?;
    Ok(())
}
