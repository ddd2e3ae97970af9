//! CLI argument definitions using clap
//!
//! Commands:
//! - aerofilter compile --schema <path> --entity <name> --predicate <file|->
//! - aerofilter query --schema <path> --entity <name> --predicate <file|-> --data <file>
//! - aerofilter check --schema <path>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// aerofilter - compile JSON predicates into SQL filters
#[derive(Parser, Debug)]
#[command(name = "aerofilter")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Inputs shared by every command that compiles a predicate
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Schema file or directory of schema files
    #[arg(long)]
    pub schema: PathBuf,

    /// Entity the predicate filters
    #[arg(long)]
    pub entity: String,

    /// Predicate JSON file, or `-` for stdin
    #[arg(long, default_value = "-")]
    pub predicate: PathBuf,

    /// JSON object of context values (tenant id, resolver inputs)
    #[arg(long)]
    pub context: Option<PathBuf>,

    /// Compiler configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Report full error messages, including field names
    #[arg(long)]
    pub verbose_errors: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile a predicate and print the resulting SQL
    Compile {
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Compile a predicate and run it against a JSON dataset
    Query {
        #[command(flatten)]
        filter: FilterArgs,

        /// Dataset file: {"table": [rows..], ..}
        #[arg(long)]
        data: PathBuf,
    },

    /// Validate schema files
    Check {
        /// Schema file or directory of schema files
        #[arg(long)]
        schema: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
