//! be-metagen binary entry point.
//!
//! Parses the command line, configures logging (informational output goes to
//! stdout; errors are written to stderr by the engine), runs one generation
//! pass, and maps the outcome to the process exit code.

use std::process::ExitCode;

use clap::Parser;

use be_meta_engine::cli::Arguments;
use be_meta_engine::engine::{self, RunOptions};

fn main() -> ExitCode {
    let args = Arguments::parse();

    env_logger::Builder::new()
        .filter_level(args.log_level())
        .format_timestamp(None)
        .format_target(false)
        .target(env_logger::Target::Stdout)
        .init();

    let options = RunOptions::from(&args);
    match engine::run(&options) {
        Ok(summary) if summary.errors == 0 => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(fatal) => {
            eprintln!("ERROR: {fatal}");
            ExitCode::from(1)
        }
    }
}
