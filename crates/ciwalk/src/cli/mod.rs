//! CLI argument parsing and command dispatch.
//!
//! # Commands
//!
//! - `traverse`: Walk the relationship graph from a root CI
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format
//!
//! # Example
//!
//! ```bash
//! ciwalk traverse --root-name web01 --depth 2 --direction down
//! ciwalk traverse --root-id 4f2a... --class server --json
//! ciwalk traverse --root-name web01 --fixture snapshot.json
//! ```

mod args;
mod execute;
mod types;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::TraverseArgs;
pub use types::DirectionArg;

/// Ciwalk - dependency traversal for configuration items
///
/// Walks the relationship table of a configuration management database to
/// answer "what does X depend on" and "what depends on X".
#[derive(Parser, Debug)]
#[command(name = "ciwalk")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Walk dependencies of a configuration item
    ///
    /// Starts at the CI given by --root-id or --root-name and follows
    /// relationship rows up to --depth levels away.
    Traverse(TraverseArgs),
}

impl Cli {
    /// Parse command-line arguments
    #[must_use]
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse from an explicit argument list
    ///
    /// # Errors
    ///
    /// Returns the clap error when the arguments are invalid.
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the parsed command
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn execute(&self) -> Result<()> {
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        match &self.command {
            Commands::Traverse(args) => execute::execute_traverse(args, output_mode).await,
        }
    }
}
