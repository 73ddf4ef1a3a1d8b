//! CLI argument definitions using clap
//!
//! Commands:
//! - antity validate --entity <path> --records <path> [--op <intent>]
//! - antity normalize --entity <path> --records <path>
//! - antity compile --entity <path> --request <path>
//! - antity columns --entity <path> --op <operation> [--total]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Antity - declarative entity validation and SQL filter compilation
#[derive(Parser, Debug)]
#[command(name = "antity")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file; the environment is read when absent
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the validation pipeline over a batch of records
    Validate {
        /// Entity definition file
        #[arg(long)]
        entity: PathBuf,

        /// Records file: one object or an array of objects
        #[arg(long)]
        records: PathBuf,

        /// Operation or HTTP verb
        #[arg(long, default_value = "insert")]
        op: String,
    },

    /// Sanitize and normalize records without validating them
    Normalize {
        #[arg(long)]
        entity: PathBuf,

        #[arg(long)]
        records: PathBuf,
    },

    /// Compile a select request into SQL and arguments
    Compile {
        #[arg(long)]
        entity: PathBuf,

        /// Select request file (first, rows, sortField, sortOrder, filters, ...)
        #[arg(long)]
        request: PathBuf,
    },

    /// Print the column catalog of one operation
    Columns {
        #[arg(long)]
        entity: PathBuf,

        #[arg(long)]
        op: String,

        /// Append the window total to select columns
        #[arg(long)]
        total: bool,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
