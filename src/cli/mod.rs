//! CLI module for antity
//!
//! Provides command-line access to:
//! - validate: run the pipeline over a batch of records
//! - normalize: sanitize and normalize without validating
//! - compile: turn a select request into SQL and arguments
//! - columns: print an operation's column catalog

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{columns, compile, normalize, run, run_command, validate};
pub use errors::{CliError, CliResult};
pub use io::{read_json, records_from, write_error, write_response};
