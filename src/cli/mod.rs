//! CLI module for aerofilter
//!
//! Provides command-line interface for:
//! - compile: Predicate to SQL
//! - query: Predicate evaluated against a JSON dataset
//! - check: Schema validation

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, FilterArgs};
pub use commands::{check, compile, query, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_json, write_error, write_response};
