//! Output formatting for CLI commands.
//!
//! Traversal results are printed either as pretty JSON or as one line per
//! reported relationship, indented by the depth it was found at.

pub mod color;

use crate::domain::{Edge, TraversalResult};
use serde::Serialize;
use std::env;
use std::io::{self, Write};

use color::{bold, dimmed, direction_arrow, info};

/// Output format selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Configuration for text output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether to use ASCII arrows instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create an `OutputConfig` with explicit values.
    #[must_use]
    pub fn new(use_ascii: bool, use_colors: bool) -> Self {
        Self {
            use_ascii,
            use_colors,
        }
    }

    /// Create an `OutputConfig` from environment variables.
    ///
    /// Reads:
    /// - `CIWALK_ASCII`: "1" or "true" for ASCII-only arrows
    /// - `NO_COLOR`: any value disables colors
    /// - `CIWALK_COLOR`: "0" or "false" disables colors
    #[must_use]
    pub fn from_env() -> Self {
        let use_ascii = env::var("CIWALK_ASCII")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        // https://no-color.org/
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("CIWALK_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            use_ascii,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Print a value as pretty JSON on stdout.
///
/// # Errors
///
/// Returns an error if serialization or writing fails.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)
}

/// Print a traversal result as text on stdout.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn print_traversal(result: &TraversalResult, config: &OutputConfig) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    for line in format_traversal(result, config) {
        writeln!(stdout, "{line}")?;
    }
    Ok(())
}

/// Render a traversal result as text lines.
#[must_use]
pub fn format_traversal(result: &TraversalResult, config: &OutputConfig) -> Vec<String> {
    let root = &result.root;
    let mut lines = vec![format!(
        "{} {} {}",
        info(&root.name, config),
        dimmed(&format!("({})", root.class), config),
        dimmed(&format!("[{}]", root.id), config),
    )];

    lines.extend(
        result
            .relationships
            .iter()
            .map(|edge| format_edge(edge, config)),
    );

    let meta = &result.meta;
    let noun = if meta.total == 1 {
        "relationship"
    } else {
        "relationships"
    };
    lines.push(bold(
        &format!(
            "{} {noun} (depth {}, direction {})",
            meta.total, meta.depth, meta.direction
        ),
        config,
    ));
    lines
}

fn format_edge(edge: &Edge, config: &OutputConfig) -> String {
    let indent = "  ".repeat(usize::from(edge.depth));
    let name = if edge.other_name.is_empty() {
        &edge.other_id
    } else {
        &edge.other_name
    };
    format!(
        "{indent}{} {} {} {}",
        direction_arrow(edge.direction, config),
        info(name, config),
        dimmed(&format!("({})", edge.other_class), config),
        dimmed(&edge.relation_type, config),
    )
}
