//! CLI module for captureline
//!
//! Provides command-line interface for:
//! - sync: One ingestion cycle
//! - ingest: Ingestion polling loop
//! - query: One paginated read
//! - checkpoint: Inspect the persisted high-water mark

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{checkpoint, ingest, query, run, run_command, sync};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, request_params, write_error, write_response};
