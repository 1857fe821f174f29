//! captureline CLI entry point
//!
//! Parses arguments, dispatches to the CLI module and prints errors to
//! stderr with a non-zero exit code. Configuration, logging and component
//! wiring all live in `cli::run`.

use captureline::cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}
