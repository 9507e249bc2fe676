//! CLI argument definitions using clap
//!
//! Commands:
//! - metadef check --schema <dir>
//! - metadef validate --schema <dir> --category <name> [--patch] <document>
//! - metadef inspect --schema <dir> [name]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// metadef - A strict, deterministic metadata schema engine
#[derive(Parser, Debug)]
#[command(name = "metadef")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a schema directory, assemble it, and report registration
    /// and resolution errors
    Check {
        /// Path to the schema directory
        #[arg(long, default_value = "./schema")]
        schema: PathBuf,
    },

    /// Validate a JSON document against a category
    Validate {
        /// Path to the schema directory
        #[arg(long, default_value = "./schema")]
        schema: PathBuf,

        /// Category to validate against
        #[arg(long)]
        category: String,

        /// Validate as a partial update (skips missing required
        /// properties, rejects read-only ones)
        #[arg(long)]
        patch: bool,

        /// Path to the JSON document, or '-' for stdin
        document: PathBuf,
    },

    /// Print an assembled schema entity (or the whole registry) as JSON
    Inspect {
        /// Path to the schema directory
        #[arg(long, default_value = "./schema")]
        schema: PathBuf,

        /// Domain or category name; omit to list everything
        name: Option<String>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
