//! dupecmp - duplicate file finder
//!
//! Entry point for the dupecmp CLI application.

use clap::Parser;
use dupecmp::{cli::Cli, error::ExitCode};

fn main() {
    let cli = Cli::parse();

    match dupecmp::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::for_error(&err);
            eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            std::process::exit(exit_code.as_i32());
        }
    }
}
