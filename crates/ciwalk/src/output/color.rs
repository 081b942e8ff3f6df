//! Color and styling helpers for CLI output.
//!
//! Semantic Color Theme:
//!   - Info/Reference: cyan    (CI names, root line)
//!   - Upstream:       yellow
//!   - Downstream:     green
//!   - Muted:          dimmed  (ids, classes, relation types)
//!   - Emphasis:       bold    (summary header)

use crate::domain::Direction;
use colored::Colorize;

use super::OutputConfig;

/// Apply semantic "info" color (cyan) to text.
pub fn info(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.cyan().to_string()
}

/// Dim text.
pub fn dimmed(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.dimmed().to_string()
}

/// Bold text.
pub fn bold(text: &str, config: &OutputConfig) -> String {
    if !config.use_colors {
        return text.to_string();
    }
    text.bold().to_string()
}

/// Arrow marking an edge's direction, colored by direction.
pub(crate) fn direction_arrow(direction: Direction, config: &OutputConfig) -> String {
    let arrow = match (direction, config.use_ascii) {
        (Direction::Upstream, false) => "↑",
        (Direction::Downstream, false) => "↓",
        (Direction::Upstream, true) => "^",
        (Direction::Downstream, true) => "v",
    };
    if !config.use_colors {
        return arrow.to_string();
    }
    match direction {
        Direction::Upstream => arrow.yellow().to_string(),
        Direction::Downstream => arrow.green().to_string(),
    }
}
