//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::domain::DirectionFilter;

/// Traversal direction for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DirectionArg {
    /// Follow only edges to CIs the node depends on
    #[value(name = "up", alias = "upstream")]
    Up,
    /// Follow only edges to CIs that depend on the node
    #[value(name = "down", alias = "downstream")]
    Down,
    /// Follow both directions
    #[default]
    Both,
}

impl std::fmt::Display for DirectionArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::Both => write!(f, "both"),
        }
    }
}

impl From<DirectionArg> for DirectionFilter {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::Up => Self::Upstream,
            DirectionArg::Down => Self::Downstream,
            DirectionArg::Both => Self::Both,
        }
    }
}
