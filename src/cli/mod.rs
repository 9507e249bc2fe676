//! CLI module for metadef
//!
//! Provides the command-line interface:
//! - check: assemble a schema directory and report problems
//! - validate: validate a JSON document against a category
//! - inspect: print assembled entities as JSON

mod args;
mod commands;
mod errors;

pub use args::{Cli, Command};
pub use commands::{check, inspect, run, run_command, validate};
pub use errors::{CliError, CliErrorCode, CliResult};
