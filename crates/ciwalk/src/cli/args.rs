//! CLI argument structs.

use clap::Parser;
use std::path::PathBuf;

use super::types::DirectionArg;
use crate::domain::TraversalRequest;

/// Arguments for the `traverse` command
#[derive(Parser, Debug, Clone)]
pub struct TraverseArgs {
    /// Identifier of the root CI
    #[arg(long, conflicts_with = "root_name", required_unless_present = "root_name")]
    pub root_id: Option<String>,

    /// Exact name of the root CI
    ///
    /// When several CIs share the name, the first one returned by the
    /// instance is used.
    #[arg(long)]
    pub root_name: Option<String>,

    /// Maximum traversal depth (values outside 1-5 are clamped)
    #[arg(short, long, allow_negative_numbers = true)]
    pub depth: Option<i64>,

    /// Edge direction to follow
    #[arg(long, value_enum, default_value_t = DirectionArg::Both)]
    pub direction: DirectionArg,

    /// Only follow relationships whose type contains this text
    #[arg(short = 't', long = "type")]
    pub relation_type: Option<String>,

    /// Only report CIs whose class contains this text
    ///
    /// Filtered CIs are still traversed, so their neighbours can appear.
    #[arg(short, long)]
    pub class: Option<String>,

    /// Configuration file (default: .ciwalk/config.yaml)
    #[arg(long, env = "CIWALK_CONFIG")]
    pub config: Option<PathBuf>,

    /// Traverse a JSON snapshot instead of a live instance
    #[arg(long)]
    pub fixture: Option<PathBuf>,
}

impl TraverseArgs {
    /// Build the traversal request described by these arguments.
    #[must_use]
    pub fn to_request(&self) -> TraversalRequest {
        TraversalRequest {
            root_id: self.root_id.clone(),
            root_name: self.root_name.clone(),
            max_depth: self.depth,
            direction: self.direction.into(),
            type_filter: self.relation_type.clone(),
            class_filter: self.class.clone(),
        }
    }
}
